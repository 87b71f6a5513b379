//! Owning handles for resources that must be released explicitly.
//!
//! A [`Handle`] pairs a view with the allocation or mapping behind it. Closing the
//! handle releases the resource once; the view it exposed (and every alias derived
//! from it) fails with `UseAfterRelease` afterwards.

use std::sync::atomic::{AtomicU8, Ordering};

use memview_common::{Result, error::Error};

use crate::{
    direct::DirectAllocation, map::MappedRegion, memory::Memory, writable_memory::WritableMemory,
};

/// A resource whose release is explicit and idempotent.
pub trait Resource: Send + Sync {
    /// Releases the resource. Calls after the first are no-ops.
    fn release(&self) -> Result<()>;

    fn is_released(&self) -> bool;
}

/// The lifecycle of a [`Handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    Open = 0,
    /// `close()` is releasing the resource.
    Closing = 1,
    Closed = 2,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Lifecycle {
        match value {
            0 => Lifecycle::Open,
            1 => Lifecycle::Closing,
            _ => Lifecycle::Closed,
        }
    }
}

/// Owns one resource and the view over it.
pub struct Handle<V, R: Resource> {
    lifecycle: AtomicU8,
    resource: R,
    view: V,
}

/// Off-heap memory.
pub type WritableHandle = Handle<WritableMemory, DirectAllocation>;

/// A read-only file mapping.
pub type MapHandle = Handle<Memory, MappedRegion>;

/// A writable file mapping.
pub type WritableMapHandle = Handle<WritableMemory, MappedRegion>;

impl<V, R: Resource> Handle<V, R> {
    pub(crate) fn new(view: V, resource: R) -> Self {
        Handle {
            lifecycle: AtomicU8::new(Lifecycle::Open as u8),
            resource,
            view,
        }
    }

    /// Returns the view, as long as the handle is open.
    ///
    /// # Errors
    ///
    /// Returns `UseAfterRelease` once `close()` has started.
    pub fn get(&self) -> Result<&V> {
        if self.is_open() {
            Ok(&self.view)
        } else {
            Err(Error::use_after_release())
        }
    }

    /// Releases the resource.
    ///
    /// Only the first call does anything; later and concurrent calls return `Ok(())`
    /// immediately. Must not race with accesses through views of this handle.
    pub fn close(&self) -> Result<()> {
        if self
            .lifecycle
            .compare_exchange(
                Lifecycle::Open as u8,
                Lifecycle::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }
        log::debug!("closing handle");
        let released = self.resource.release();
        self.lifecycle
            .store(Lifecycle::Closed as u8, Ordering::Release);
        released
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle() == Lifecycle::Open
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }
}

impl<V> Handle<V, MappedRegion> {
    /// See [`MappedRegion::load`].
    pub fn load(&self) -> Result<()> {
        self.resource.load()
    }

    /// See [`MappedRegion::is_loaded`].
    pub fn is_loaded(&self) -> Result<bool> {
        self.resource.is_loaded()
    }

    /// See [`MappedRegion::force`].
    pub fn force(&self) -> Result<()> {
        self.resource.force()
    }
}

impl<V, R: Resource> Drop for Handle<V, R> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("failed to release resource on drop: {e}");
        }
    }
}

impl<V, R: Resource + std::fmt::Debug> std::fmt::Debug for Handle<V, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("lifecycle", &self.lifecycle())
            .field("resource", &self.resource)
            .finish()
    }
}
