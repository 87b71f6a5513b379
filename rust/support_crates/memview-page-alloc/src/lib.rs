//! Page-granular memory for the memview infrastructure: anonymous (direct) page
//! allocations and memory-mapped file regions, over a small per-platform layer.

pub mod align;
pub mod file_mapping;
pub mod page_allocation;

#[cfg_attr(unix, path = "mmap_unix.rs")]
#[cfg_attr(windows, path = "mmap_win.rs")]
#[cfg_attr(not(any(unix, windows)), path = "mmap_fallback.rs")]
pub mod mmap;

pub use file_mapping::FileMapping;
pub use page_allocation::PageAllocation;
