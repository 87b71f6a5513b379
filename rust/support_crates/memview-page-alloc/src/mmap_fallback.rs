use std::{
    alloc::{Layout, alloc_zeroed, dealloc},
    fs::File,
};

use crate::align::align_up;

/// Whether this platform layer can map files into memory.
pub const SUPPORTS_FILE_MAPPING: bool = false;

fn unsupported() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "file mapping is not supported on this platform",
    )
}

/// Allocates memory using standard pages (emulated on the global allocator).
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let page_size = get_page_size();
    let capacity = align_up(size.max(1), page_size).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "allocation size overflows the address space",
        )
    })?;

    let layout = Layout::from_size_align(capacity, page_size)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))?;

    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "Failed to allocate memory",
        ));
    }

    Ok((ptr as *mut std::ffi::c_void, capacity))
}

/// Frees memory that was allocated using [`allocate`].
///
/// # Safety
///
/// `ptr` and `size` must come from one [`allocate`] call and must not be freed twice.
pub unsafe fn free(ptr: *mut std::ffi::c_void, size: usize) -> std::io::Result<()> {
    let layout = Layout::from_size_align(size, get_page_size())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))?;
    unsafe {
        dealloc(ptr as *mut u8, layout);
    }
    Ok(())
}

pub fn map_file(
    _file: &File,
    _offset: u64,
    _len: usize,
    _read_only: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    Err(unsupported())
}

/// # Safety
///
/// Never called: [`map_file`] cannot succeed on this platform.
pub unsafe fn unmap_file(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Err(unsupported())
}

/// # Safety
///
/// Never called: [`map_file`] cannot succeed on this platform.
pub unsafe fn flush(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Err(unsupported())
}

/// # Safety
///
/// Never called: [`map_file`] cannot succeed on this platform.
pub unsafe fn prefetch(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Err(unsupported())
}

/// # Safety
///
/// Never called: [`map_file`] cannot succeed on this platform.
pub unsafe fn is_resident(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<bool> {
    Err(unsupported())
}

pub fn get_allocation_granularity() -> usize {
    get_page_size()
}

/// Returns the "standard page" size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}
