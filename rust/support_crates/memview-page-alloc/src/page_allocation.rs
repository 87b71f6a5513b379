//! Anonymous page allocations backing off-heap ("direct") memory.
//!
//! A [`PageAllocation`] owns one OS-level allocation of whole pages. Its contents are
//! unspecified until written: the platform layer may or may not hand out zeroed pages,
//! and callers must not rely on either.

use crate::mmap;

/// An owned, page-aligned block of memory obtained directly from the OS.
///
/// The block is returned to the OS either explicitly through [`PageAllocation::free`],
/// which reports failures, or implicitly on drop.
pub struct PageAllocation {
    /// Start of the allocated block, or null once freed.
    ptr: *mut u8,
    /// The requested size of the block in bytes.
    len: usize,
    /// The page-rounded size actually allocated.
    capacity: usize,
}

impl PageAllocation {
    /// Returns the size of a regular memory page on the current system.
    pub fn page_size() -> usize {
        mmap::get_page_size()
    }

    /// Allocates at least `size` bytes of page-aligned memory.
    ///
    /// A zero `size` still reserves one page so the allocation has a unique,
    /// non-null address.
    ///
    /// # Errors
    ///
    /// Returns an error if the size overflows the address space after page rounding,
    /// or if the system cannot provide the memory.
    pub fn allocate(size: usize) -> std::io::Result<PageAllocation> {
        let (ptr, capacity) = mmap::allocate(size)?;
        debug_assert!((ptr as usize).is_multiple_of(Self::page_size()));
        log::debug!("allocated {size} bytes of direct memory ({capacity} bytes capacity)");
        Ok(PageAllocation {
            ptr: ptr as _,
            len: size,
            capacity,
        })
    }

    /// Returns the requested length of the allocation in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the allocation was requested with a size of 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the page-rounded capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a raw pointer to the beginning of the allocated memory.
    ///
    /// The pointer must not be used after the allocation is freed or dropped, and
    /// accesses must stay within `0..len`.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Returns the memory to the OS, reporting any failure.
    pub fn free(mut self) -> std::io::Result<()> {
        self.free_inner()
    }

    fn free_inner(&mut self) -> std::io::Result<()> {
        if self.ptr.is_null() {
            return Ok(());
        }
        let ptr = std::mem::replace(&mut self.ptr, std::ptr::null_mut());
        log::debug!("freeing {} bytes of direct memory", self.capacity);
        unsafe { mmap::free(ptr as _, self.capacity) }
    }
}

impl Drop for PageAllocation {
    fn drop(&mut self) {
        if let Err(e) = self.free_inner() {
            log::warn!("failed to free direct memory: {e}");
        }
    }
}

// SAFETY: PageAllocation exclusively owns its memory block and frees it exactly once.
unsafe impl Send for PageAllocation {}

// SAFETY: shared references only expose the address; users must synchronize
// accesses to the memory itself.
unsafe impl Sync for PageAllocation {}

impl std::fmt::Debug for PageAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAllocation")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}
