//! Bounds-checked, byte-order-aware access to fixed-size memory regions.
//!
//! A single access surface covers four kinds of storage:
//! - heap byte arrays, either allocated by this crate or wrapped from a caller-supplied
//!   `Vec<u8>` ([`Memory::wrap`], [`WritableMemory::allocate`]);
//! - off-heap ("direct") page allocations ([`WritableMemory::allocate_direct`]);
//! - memory-mapped file regions ([`Memory::map`], [`WritableMemory::map`]).
//!
//! Every view shares one [`ResourceState`] with all views derived from it through
//! `region`/`duplicate`. Each access validates the offset against the view's capacity
//! and the resource's validity, and converts between native and requested byte order.
//! Direct and mapped resources are owned by a [`Handle`] that releases them
//! deterministically and idempotently; any access through a view of a released
//! resource fails with [`ErrorKind::UseAfterRelease`].
//!
//! None of the types synchronize concurrent mutation: writes through one view are
//! immediately visible through every alias, and callers coordinate threads themselves.

#[macro_use]
mod macros;

mod bounds;
pub mod buffer;
pub mod codec;
pub mod direct;
pub mod handle;
pub mod map;
pub mod memory;
pub mod order;
pub mod platform;
pub mod state;
pub mod writable_memory;

pub use buffer::{Buffer, WritableBuffer};
pub use codec::Primitive;
pub use direct::DirectAllocation;
pub use handle::{Handle, Lifecycle, MapHandle, Resource, WritableHandle, WritableMapHandle};
pub use map::{MapOptions, MappedRegion};
pub use memory::Memory;
pub use memview_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use order::ByteOrder;
pub use state::{ResourceKind, ResourceState};
pub use writable_memory::WritableMemory;

#[cfg(test)]
mod tests;
