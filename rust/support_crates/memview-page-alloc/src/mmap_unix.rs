use std::{fs::File, os::unix::io::AsRawFd, sync::OnceLock};

use crate::align::align_up;

/// Whether this platform layer can map files into memory.
pub const SUPPORTS_FILE_MAPPING: bool = true;

/// Allocates memory using standard pages via an anonymous `mmap`.
///
/// # Arguments
///
/// * `size` - The number of bytes to allocate. The actual allocation will be rounded up
///   to the nearest page boundary.
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok((ptr, capacity))` - A tuple with a pointer to the allocated memory and the actual
///   capacity in bytes (which may be larger than the requested size due to page alignment)
/// - `Err(io::Error)` - An I/O error if the size overflows or the allocation fails
///
/// # Safety
///
/// The returned pointer must be deallocated using [`free`] with the same capacity value
/// to avoid memory leaks. The allocated memory is readable and writable.
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let page_size = get_page_size();
    let capacity = align_up(size.max(1), page_size).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "allocation size overflows the address space",
        )
    })?;
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            capacity,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok((ptr, capacity))
}

/// Frees memory that was allocated using [`allocate`].
///
/// # Safety
///
/// - `ptr` was returned by a previous call to [`allocate`]
/// - `size` matches the capacity returned by that allocation call
/// - The memory has not already been freed
pub unsafe fn free(ptr: *mut std::ffi::c_void, size: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, size) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Maps `len` bytes of `file`, starting at `offset`, into the address space.
///
/// `offset` must be a multiple of [`get_allocation_granularity`] and `len` must be
/// non-zero. The mapping is shared: writes through a writable mapping reach the file.
pub fn map_file(
    file: &File,
    offset: u64,
    len: usize,
    read_only: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    let offset: libc::off_t = offset.try_into().map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "file offset does not fit off_t",
        )
    })?;
    let prot = if read_only {
        libc::PROT_READ
    } else {
        libc::PROT_READ | libc::PROT_WRITE
    };
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            prot,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            offset,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok(ptr)
}

/// Removes a mapping created by [`map_file`].
///
/// # Safety
///
/// `ptr` and `len` must describe a live mapping returned by [`map_file`], and no
/// references into it may be used afterwards.
pub unsafe fn unmap_file(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    unsafe { free(ptr, len) }
}

/// Synchronously writes dirty pages of a shared file mapping back to the file.
///
/// # Safety
///
/// `ptr` must be page aligned and `[ptr, ptr + len)` must lie within a live mapping.
pub unsafe fn flush(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::msync(ptr, len, libc::MS_SYNC) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Advises the kernel that the range will be needed soon, so it can start
/// reading the pages in.
///
/// # Safety
///
/// `ptr` must be page aligned and `[ptr, ptr + len)` must lie within a live mapping.
pub unsafe fn prefetch(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::madvise(ptr, len, libc::MADV_WILLNEED) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Returns `true` if every page of the range is resident in physical memory.
///
/// The answer is a snapshot: pages may be evicted or faulted in right after
/// the query returns.
///
/// # Safety
///
/// `ptr` must be page aligned and `[ptr, ptr + len)` must lie within a live mapping.
pub unsafe fn is_resident(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<bool> {
    let page_size = get_page_size();
    let pages = len.div_ceil(page_size);
    let mut residency = vec![0u8; pages];
    let res = unsafe { libc::mincore(ptr, len, residency.as_mut_ptr() as *mut _) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(residency.iter().all(|&page| page & 1 != 0))
}

/// Gets the granularity at which file mappings may start.
///
/// On Unix this is the regular page size.
pub fn get_allocation_granularity() -> usize {
    get_page_size()
}

/// Gets the system's standard page size in bytes.
///
/// The value is cached after the first call. If the system's page size cannot be
/// determined, returns a default value of 4KB (4,096 bytes).
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_page_size().unwrap_or(4 * 1024))
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    usize::try_from(res).map_err(|_| std::io::Error::other("page size out of range"))
}
