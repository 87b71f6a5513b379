//! The shared resource state behind every view.
//!
//! A [`ResourceState`] describes one backing store: its fixed capacity, the byte order
//! requested at creation, whether it may be written, whether it is still valid, and
//! where its bytes live. Views hold it through an `Arc` and check validity on every
//! access, so a released direct allocation or mapping can never be read through a
//! stale view.

use std::{
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use memview_common::{Result, error::Error};

use crate::{order::ByteOrder, platform};

/// The kind of storage backing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A heap byte array owned by the resource state.
    Heap,
    /// An off-heap page allocation owned by a [`DirectAllocation`](crate::DirectAllocation).
    Direct,
    /// A file region mapped by a [`MappedRegion`](crate::MappedRegion).
    Mapped,
}

/// Heap bytes owned by a resource, kept as a raw pointer so that aliasing views can
/// write through shared references.
struct HeapArray {
    ptr: NonNull<u8>,
    len: usize,
}

impl HeapArray {
    fn from_vec(bytes: Vec<u8>) -> HeapArray {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let ptr = NonNull::new(Box::into_raw(boxed) as *mut u8).unwrap_or(NonNull::dangling());
        HeapArray { ptr, len }
    }

    fn into_vec(self) -> Vec<u8> {
        let this = std::mem::ManuallyDrop::new(self);
        let slice = std::ptr::slice_from_raw_parts_mut(this.ptr.as_ptr(), this.len);
        unsafe { Box::from_raw(slice) }.into_vec()
    }
}

impl Drop for HeapArray {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        drop(unsafe { Box::from_raw(slice) });
    }
}

enum Storage {
    Heap(HeapArray),
    Direct { address: NonNull<u8> },
    Mapped { address: NonNull<u8>, file_length: u64 },
}

/// Order recorded for a resource of `capacity` bytes. Empty resources are always
/// little-endian.
fn resource_order(capacity: u64, order: ByteOrder) -> ByteOrder {
    if capacity == 0 {
        ByteOrder::LittleEndian
    } else {
        order
    }
}

pub struct ResourceState {
    capacity: u64,
    order: ByteOrder,
    read_only: bool,
    valid: AtomicBool,
    storage: Storage,
}

impl ResourceState {
    pub(crate) fn heap(bytes: Vec<u8>, order: ByteOrder, read_only: bool) -> Result<Arc<Self>> {
        platform::check_supported()?;
        let array = HeapArray::from_vec(bytes);
        let capacity = array.len as u64;
        Ok(Arc::new(ResourceState {
            capacity,
            order: resource_order(capacity, order),
            read_only,
            valid: AtomicBool::new(true),
            storage: Storage::Heap(array),
        }))
    }

    /// # Safety
    ///
    /// `address` must point to at least `capacity` writable bytes that stay allocated
    /// until [`ResourceState::invalidate`] has been called.
    pub(crate) unsafe fn direct(
        address: *mut u8,
        capacity: u64,
        order: ByteOrder,
    ) -> Result<Arc<Self>> {
        platform::check_supported()?;
        let address = NonNull::new(address)
            .ok_or_else(|| Error::invalid_arg("address", "direct address is null"))?;
        Ok(Arc::new(ResourceState {
            capacity,
            order: resource_order(capacity, order),
            read_only: false,
            valid: AtomicBool::new(true),
            storage: Storage::Direct { address },
        }))
    }

    /// # Safety
    ///
    /// `address` must point to at least `capacity` bytes of a live mapping (writable
    /// unless `read_only`) that stays mapped until [`ResourceState::invalidate`] has
    /// been called.
    pub(crate) unsafe fn mapped(
        address: *mut u8,
        capacity: u64,
        file_length: u64,
        order: ByteOrder,
        read_only: bool,
    ) -> Result<Arc<Self>> {
        platform::check_supported()?;
        let address = NonNull::new(address)
            .ok_or_else(|| Error::invalid_arg("address", "mapped address is null"))?;
        Ok(Arc::new(ResourceState {
            capacity,
            order: resource_order(capacity, order),
            read_only,
            valid: AtomicBool::new(true),
            storage: Storage::Mapped {
                address,
                file_length,
            },
        }))
    }

    /// Total number of addressable bytes. Never changes.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The byte order requested when the resource was created, or little-endian
    /// for an empty resource.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    #[inline]
    pub fn native_order(&self) -> ByteOrder {
        platform::NATIVE_ORDER
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `false` once the backing resource has been released.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn kind(&self) -> ResourceKind {
        match self.storage {
            Storage::Heap(_) => ResourceKind::Heap,
            Storage::Direct { .. } => ResourceKind::Direct,
            Storage::Mapped { .. } => ResourceKind::Mapped,
        }
    }

    /// Length of the mapped file at mapping time, for mapped resources.
    pub fn file_length(&self) -> Option<u64> {
        match self.storage {
            Storage::Mapped { file_length, .. } => Some(file_length),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn check_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::use_after_release())
        }
    }

    /// Marks the resource as released. Returns `true` for the call that flipped
    /// the flag.
    pub(crate) fn invalidate(&self) -> bool {
        self.valid.swap(false, Ordering::AcqRel)
    }

    /// Takes back the heap bytes of an unshared heap resource. Any other storage is
    /// handed back unchanged.
    pub(crate) fn into_heap_bytes(self) -> std::result::Result<Vec<u8>, ResourceState> {
        match self.storage {
            Storage::Heap(array) => Ok(array.into_vec()),
            storage => Err(ResourceState {
                capacity: self.capacity,
                order: self.order,
                read_only: self.read_only,
                valid: self.valid,
                storage,
            }),
        }
    }

    /// Address of byte 0 of the resource. Only meaningful while the state is valid.
    #[inline]
    pub(crate) fn base_address(&self) -> *mut u8 {
        match &self.storage {
            Storage::Heap(array) => array.ptr.as_ptr(),
            Storage::Direct { address } => address.as_ptr(),
            Storage::Mapped { address, .. } => address.as_ptr(),
        }
    }
}

// SAFETY: the state either owns its heap bytes or refers to memory whose release is
// ordered by the validity flag. Concurrent mutation through aliasing views is a data
// race the caller must prevent.
unsafe impl Send for ResourceState {}

// SAFETY: see `Send`.
unsafe impl Sync for ResourceState {}

impl std::fmt::Debug for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceState")
            .field("kind", &self.kind())
            .field("capacity", &self.capacity)
            .field("order", &self.order)
            .field("read_only", &self.read_only)
            .field("valid", &self.is_valid())
            .finish()
    }
}
