use std::{fs::File, os::windows::io::AsRawHandle, sync::OnceLock};

use windows_sys::Win32::{
    Foundation::{CloseHandle, GetLastError, HANDLE},
    System::{
        Memory::{
            CreateFileMappingW, FILE_MAP_READ, FILE_MAP_WRITE, FlushViewOfFile, MEM_COMMIT,
            MEM_RELEASE, MEM_RESERVE, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, PAGE_READONLY,
            PAGE_READWRITE, PrefetchVirtualMemory, UnmapViewOfFile, VirtualAlloc, VirtualFree,
            WIN32_MEMORY_RANGE_ENTRY,
        },
        ProcessStatus::{PSAPI_WORKING_SET_EX_INFORMATION, QueryWorkingSetEx},
        SystemInformation::{GetSystemInfo, SYSTEM_INFO},
        Threading::GetCurrentProcess,
    },
};

use crate::align::align_up;

/// Whether this platform layer can map files into memory.
pub const SUPPORTS_FILE_MAPPING: bool = true;

fn last_error() -> std::io::Error {
    let error = unsafe { GetLastError() };
    std::io::Error::from_raw_os_error(error as i32)
}

/// Allocates memory using standard pages via `VirtualAlloc`.
///
/// # Arguments
///
/// * `size` - The number of bytes to allocate. The actual allocation will be rounded up
///   to the nearest page boundary.
///
/// # Returns
///
/// `Ok((ptr, capacity))` with the actual page-rounded capacity, or an I/O error.
///
/// # Safety
///
/// The returned pointer must be deallocated using [`free`] with the same capacity value.
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = align_up(size.max(1), get_page_size()).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "allocation size overflows the address space",
        )
    })?;

    let ptr = unsafe {
        VirtualAlloc(
            std::ptr::null_mut(),
            capacity,
            MEM_COMMIT | MEM_RESERVE,
            PAGE_READWRITE,
        )
    };
    if ptr.is_null() {
        return Err(last_error());
    }
    Ok((ptr, capacity))
}

/// Frees memory that was allocated using [`allocate`].
///
/// # Safety
///
/// - `ptr` was returned by a previous call to [`allocate`]
/// - The memory has not already been freed
pub unsafe fn free(ptr: *mut std::ffi::c_void, _size: usize) -> std::io::Result<()> {
    let result = unsafe { VirtualFree(ptr, 0, MEM_RELEASE) };
    if result == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Maps `len` bytes of `file`, starting at `offset`, into the address space.
///
/// `offset` must be a multiple of [`get_allocation_granularity`] and `len` must be
/// non-zero.
pub fn map_file(
    file: &File,
    offset: u64,
    len: usize,
    read_only: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    let (protect, access) = if read_only {
        (PAGE_READONLY, FILE_MAP_READ)
    } else {
        (PAGE_READWRITE, FILE_MAP_READ | FILE_MAP_WRITE)
    };

    unsafe {
        let mapping = CreateFileMappingW(
            file.as_raw_handle() as HANDLE,
            std::ptr::null(),
            protect,
            0,
            0,
            std::ptr::null(),
        );
        if mapping.is_null() {
            return Err(last_error());
        }

        let view = MapViewOfFile(
            mapping,
            access,
            (offset >> 32) as u32,
            (offset & 0xFFFF_FFFF) as u32,
            len,
        );
        // The view keeps the section object alive.
        let view_error = if view.Value.is_null() {
            Some(last_error())
        } else {
            None
        };
        CloseHandle(mapping);

        match view_error {
            Some(e) => Err(e),
            None => Ok(view.Value),
        }
    }
}

/// Removes a mapping created by [`map_file`].
///
/// # Safety
///
/// `ptr` must be a live view returned by [`map_file`].
pub unsafe fn unmap_file(ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    let result = unsafe { UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS { Value: ptr }) };
    if result == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Writes dirty pages of a file view back to the file.
///
/// # Safety
///
/// `[ptr, ptr + len)` must lie within a live view.
pub unsafe fn flush(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let result = unsafe { FlushViewOfFile(ptr, len) };
    if result == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Asks the memory manager to bring the range into the working set.
///
/// # Safety
///
/// `[ptr, ptr + len)` must lie within a live view.
pub unsafe fn prefetch(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let entry = WIN32_MEMORY_RANGE_ENTRY {
        VirtualAddress: ptr,
        NumberOfBytes: len,
    };
    let result = unsafe { PrefetchVirtualMemory(GetCurrentProcess(), 1, &entry, 0) };
    if result == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Returns `true` if every page of the range is currently in the process working set.
///
/// # Safety
///
/// `[ptr, ptr + len)` must lie within a live view.
pub unsafe fn is_resident(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<bool> {
    let page_size = get_page_size();
    let pages = len.div_ceil(page_size);
    let mut info: Vec<PSAPI_WORKING_SET_EX_INFORMATION> = (0..pages)
        .map(|i| {
            let mut entry: PSAPI_WORKING_SET_EX_INFORMATION = unsafe { std::mem::zeroed() };
            entry.VirtualAddress = unsafe { (ptr as *mut u8).add(i * page_size) } as _;
            entry
        })
        .collect();
    let cb = std::mem::size_of_val(info.as_slice()) as u32;
    let result =
        unsafe { QueryWorkingSetEx(GetCurrentProcess(), info.as_mut_ptr() as _, cb) };
    if result == 0 {
        return Err(last_error());
    }
    Ok(info
        .iter()
        .all(|entry| unsafe { entry.VirtualAttributes.Flags } & 1 != 0))
}

/// Gets the granularity at which file views may start (typically 64KB).
pub fn get_allocation_granularity() -> usize {
    static GRANULARITY: OnceLock<usize> = OnceLock::new();
    *GRANULARITY.get_or_init(|| system_info().dwAllocationGranularity as usize)
}

/// Gets the system's standard page size in bytes.
pub fn get_page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| system_info().dwPageSize as usize)
}

fn system_info() -> SYSTEM_INFO {
    unsafe {
        let mut system_info: SYSTEM_INFO = std::mem::zeroed();
        GetSystemInfo(&mut system_info);
        system_info
    }
}
