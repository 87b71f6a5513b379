//! Memory-mapped file regions.
//!
//! [`FileMapping`] maps an arbitrary byte range of an open file. The OS requires mappings
//! to start at an allocation-granularity boundary, so the mapping itself begins at the
//! aligned-down file offset and the exposed region starts `delta` bytes into it.

use std::fs::File;

use crate::{align::align_down_u64, mmap};

/// A mapped byte range `[offset, offset + len)` of a file.
///
/// Writable mappings are shared with the file: stores through [`FileMapping::as_ptr`]
/// become visible in the file, at the latest after [`FileMapping::flush`] or unmap.
pub struct FileMapping {
    /// Start of the OS mapping (granularity aligned), or null when nothing is mapped.
    base: *mut u8,
    /// Length of the OS mapping, including the leading `delta` bytes.
    mapped_len: usize,
    /// Distance from `base` to the first requested byte.
    delta: usize,
    /// Requested length in bytes.
    len: usize,
    read_only: bool,
}

impl FileMapping {
    /// Maps `len` bytes of `file` starting at `offset`.
    ///
    /// The caller is responsible for checking the range against the file length:
    /// touching pages beyond end-of-file faults. A zero `len` creates an empty
    /// mapping without any OS resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the range overflows or the OS refuses the mapping (e.g., a
    /// writable mapping of a file opened read-only).
    pub fn map(file: &File, offset: u64, len: usize, read_only: bool) -> std::io::Result<Self> {
        if len == 0 {
            return Ok(FileMapping {
                base: std::ptr::null_mut(),
                mapped_len: 0,
                delta: 0,
                len: 0,
                read_only,
            });
        }

        let granularity = mmap::get_allocation_granularity() as u64;
        let aligned_offset = align_down_u64(offset, granularity);
        let delta = (offset - aligned_offset) as usize;
        let mapped_len = len.checked_add(delta).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "mapping length overflows the address space",
            )
        })?;

        let base = mmap::map_file(file, aligned_offset, mapped_len, read_only)?;
        log::debug!(
            "mapped {len} bytes at file offset {offset} (read_only: {read_only}, delta: {delta})"
        );
        Ok(FileMapping {
            base: base as _,
            mapped_len,
            delta,
            len,
            read_only,
        })
    }

    /// Returns the address of the first requested byte.
    ///
    /// For an empty mapping this is a dangling, well-aligned pointer that must not
    /// be dereferenced.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        if self.base.is_null() {
            std::ptr::NonNull::dangling().as_ptr()
        } else {
            unsafe { self.base.add(self.delta) }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Synchronously writes modified pages back to the file.
    ///
    /// This is a no-op for read-only and empty mappings.
    pub fn flush(&self) -> std::io::Result<()> {
        if self.read_only || self.base.is_null() {
            return Ok(());
        }
        unsafe { mmap::flush(self.base as _, self.mapped_len) }
    }

    /// Hints the OS to read the mapped pages into physical memory.
    pub fn prefetch(&self) -> std::io::Result<()> {
        if self.base.is_null() {
            return Ok(());
        }
        unsafe { mmap::prefetch(self.base as _, self.mapped_len) }
    }

    /// Best-effort check whether all mapped pages are resident in physical memory.
    ///
    /// An empty mapping is trivially resident.
    pub fn is_resident(&self) -> std::io::Result<bool> {
        if self.base.is_null() {
            return Ok(true);
        }
        unsafe { mmap::is_resident(self.base as _, self.mapped_len) }
    }

    /// Flushes a writable mapping and removes it, reporting the first failure.
    ///
    /// The mapping is removed even if the flush fails.
    pub fn unmap(mut self) -> std::io::Result<()> {
        self.unmap_inner()
    }

    fn unmap_inner(&mut self) -> std::io::Result<()> {
        if self.base.is_null() {
            return Ok(());
        }
        let flushed = self.flush();
        let base = std::mem::replace(&mut self.base, std::ptr::null_mut());
        log::debug!("unmapping {} bytes", self.mapped_len);
        let unmapped = unsafe { mmap::unmap_file(base as _, self.mapped_len) };
        flushed.and(unmapped)
    }
}

impl Drop for FileMapping {
    fn drop(&mut self) {
        if let Err(e) = self.unmap_inner() {
            log::warn!("failed to unmap file region: {e}");
        }
    }
}

// SAFETY: FileMapping exclusively owns its mapping and removes it exactly once.
unsafe impl Send for FileMapping {}

// SAFETY: shared references only expose the address and OS hints; users must
// synchronize accesses to the mapped memory itself.
unsafe impl Sync for FileMapping {}

impl std::fmt::Debug for FileMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMapping")
            .field("base", &self.base)
            .field("delta", &self.delta)
            .field("len", &self.len)
            .field("read_only", &self.read_only)
            .finish()
    }
}
