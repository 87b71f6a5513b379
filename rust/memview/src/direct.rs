//! Off-heap ("direct") memory resources.

use std::sync::{Arc, Mutex};

use memview_common::{Result, error::Error};
use memview_page_alloc::PageAllocation;

use crate::{handle::Resource, order::ByteOrder, state::ResourceState};

/// One off-heap page allocation together with the resource state that exposes it.
///
/// Released exactly once through [`Resource::release`]; the state is invalidated
/// before the pages are returned to the OS, so no view can touch freed memory.
pub struct DirectAllocation {
    pages: Mutex<Option<PageAllocation>>,
    state: Arc<ResourceState>,
}

impl DirectAllocation {
    /// Allocates `size` bytes of off-heap memory.
    ///
    /// The contents are unspecified until written.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if `size` does not fit the address space or the
    /// system cannot provide the memory.
    pub fn allocate(size: u64, order: ByteOrder) -> Result<DirectAllocation> {
        let len = usize::try_from(size).map_err(|_| {
            Error::allocation(
                size,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "size exceeds the address space",
                ),
            )
        })?;
        crate::platform::check_supported()?;
        let pages = PageAllocation::allocate(len).map_err(|e| Error::allocation(size, e))?;
        let state = unsafe { ResourceState::direct(pages.as_ptr(), size, order)? };
        Ok(DirectAllocation {
            pages: Mutex::new(Some(pages)),
            state,
        })
    }

    pub fn state(&self) -> &Arc<ResourceState> {
        &self.state
    }

    pub fn capacity(&self) -> u64 {
        self.state.capacity()
    }
}

impl Resource for DirectAllocation {
    fn release(&self) -> Result<()> {
        let pages = self
            .pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(pages) = pages else {
            return Ok(());
        };
        self.state.invalidate();
        log::debug!("releasing {} bytes of direct memory", self.state.capacity());
        pages
            .free()
            .map_err(|e| Error::io("free direct memory", e))
    }

    fn is_released(&self) -> bool {
        !self.state.is_valid()
    }
}

impl Drop for DirectAllocation {
    fn drop(&mut self) {
        // The pages are freed after this runs; views must already see the state as released.
        self.state.invalidate();
    }
}

impl std::fmt::Debug for DirectAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectAllocation")
            .field("state", &self.state)
            .finish()
    }
}
