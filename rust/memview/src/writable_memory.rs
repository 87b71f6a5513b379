//! Writable, offset-addressed views.

use std::{ops::Deref, path::Path};

use memview_common::{Result, error::Error};

use crate::{
    buffer::WritableBuffer,
    codec::Primitive,
    direct::DirectAllocation,
    handle::{Handle, WritableHandle, WritableMapHandle},
    map::{MapOptions, MappedRegion},
    memory::Memory,
    order::ByteOrder,
    state::ResourceState,
};

/// A view that can write as well as read.
///
/// All read operations come from [`Memory`] through `Deref`. Writes take `&self`:
/// views alias freely, and concurrent mutation through aliases must be coordinated
/// by the caller.
#[derive(Clone)]
pub struct WritableMemory(Memory);

impl WritableMemory {
    pub(crate) fn from_memory(memory: Memory) -> WritableMemory {
        debug_assert!(!memory.is_read_only());
        WritableMemory(memory)
    }

    /// Allocates `size` zeroed bytes on the heap, in native byte order.
    pub fn allocate(size: usize) -> Result<WritableMemory> {
        Self::allocate_with_order(size, ByteOrder::native())
    }

    /// # Errors
    ///
    /// Returns `AllocationFailure` if the heap cannot provide `size` bytes.
    pub fn allocate_with_order(size: usize, order: ByteOrder) -> Result<WritableMemory> {
        let mut bytes = Vec::<u8>::new();
        bytes.try_reserve_exact(size).map_err(|e| {
            let source = std::io::Error::new(std::io::ErrorKind::OutOfMemory, e);
            Error::allocation(size as u64, source)
        })?;
        bytes.resize(size, 0);
        Self::wrap_with_order(bytes, order)
    }

    /// Wraps `bytes` as a writable view in native byte order.
    ///
    /// Writes go to the view's own copy of the bytes. A `Vec<u8>` is moved in
    /// without copying; take it back with [`WritableMemory::into_vec`].
    pub fn wrap(bytes: impl Into<Vec<u8>>) -> Result<WritableMemory> {
        Self::wrap_with_order(bytes, ByteOrder::native())
    }

    pub fn wrap_with_order(bytes: impl Into<Vec<u8>>, order: ByteOrder) -> Result<WritableMemory> {
        let state = ResourceState::heap(bytes.into(), order, false)?;
        let capacity = state.capacity();
        Ok(WritableMemory(Memory::new(state, 0, capacity, order)))
    }

    /// Allocates `size` bytes of off-heap memory in native byte order.
    ///
    /// The contents are unspecified until written. The memory is freed when the
    /// returned handle is closed or dropped.
    pub fn allocate_direct(size: u64) -> Result<WritableHandle> {
        Self::allocate_direct_with_order(size, ByteOrder::native())
    }

    pub fn allocate_direct_with_order(size: u64, order: ByteOrder) -> Result<WritableHandle> {
        let allocation = DirectAllocation::allocate(size, order)?;
        let state = allocation.state().clone();
        let view = WritableMemory(Memory::new(state, 0, size, order));
        Ok(Handle::new(view, allocation))
    }

    /// Maps a file region for reading and writing.
    ///
    /// The requested range must lie within the current file length. Changes are
    /// written back to the file on [`Handle::force`] and when the handle is closed.
    pub fn map(path: impl AsRef<Path>, options: &MapOptions) -> Result<WritableMapHandle> {
        let region = MappedRegion::map(path.as_ref(), options, false)?;
        let state = region.state().clone();
        let capacity = state.capacity();
        let view = WritableMemory(Memory::new(state, 0, capacity, options.order));
        Ok(Handle::new(view, region))
    }

    /// Writes `value` at `offset`.
    #[inline]
    pub fn put<T: Primitive>(&self, offset: u64, value: T) -> Result<()> {
        self.0.store(offset, value)
    }

    /// Writes `src[src_index..src_index + count]` starting at `offset`, converting each
    /// element's byte order.
    pub fn put_array<T: Primitive>(
        &self,
        offset: u64,
        src: &[T],
        src_index: usize,
        count: usize,
    ) -> Result<()> {
        self.0.store_array(offset, src, src_index, count)
    }

    offset_putters!(
        i8: i8,
        u8: u8,
        i16: i16,
        u16: u16,
        i32: i32,
        u32: u32,
        i64: i64,
        u64: u64,
        f32: f32,
        f64: f64,
    );

    /// Writes `1` for `true` and `0` for `false`.
    pub fn put_bool(&self, offset: u64, value: bool) -> Result<()> {
        self.0.store(offset, value as u8)
    }

    /// Writes `value` as one UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for characters outside the Basic Multilingual Plane.
    pub fn put_char(&self, offset: u64, value: char) -> Result<()> {
        self.0.store_char(offset, value)
    }

    pub fn put_char_array(
        &self,
        offset: u64,
        src: &[char],
        src_index: usize,
        count: usize,
    ) -> Result<()> {
        self.0.store_char_array(offset, src, src_index, count)
    }

    /// Sets `length` bytes starting at `offset` to `value`.
    pub fn fill(&self, offset: u64, length: u64, value: u8) -> Result<()> {
        self.0.fill_bytes(offset, length, value)
    }

    /// Zeroes the whole view.
    pub fn clear(&self) -> Result<()> {
        self.0.fill_bytes(0, self.capacity(), 0)
    }

    pub fn clear_range(&self, offset: u64, length: u64) -> Result<()> {
        self.0.fill_bytes(offset, length, 0)
    }

    /// Returns a writable view of `[offset, offset + length)`, in this view's order.
    pub fn writable_region(&self, offset: u64, length: u64) -> Result<WritableMemory> {
        Ok(WritableMemory(self.0.region(offset, length)?))
    }

    pub fn writable_region_with_order(
        &self,
        offset: u64,
        length: u64,
        order: ByteOrder,
    ) -> Result<WritableMemory> {
        Ok(WritableMemory(self.0.region_with_order(offset, length, order)?))
    }

    /// Returns a writable alias of the entire window.
    pub fn writable_duplicate(&self) -> Result<WritableMemory> {
        Ok(WritableMemory(self.0.duplicate()?))
    }

    pub fn writable_duplicate_with_order(&self, order: ByteOrder) -> Result<WritableMemory> {
        Ok(WritableMemory(self.0.duplicate_with_order(order)?))
    }

    /// Returns a writable sequential-access buffer over this view's window.
    pub fn as_writable_buffer(&self) -> Result<WritableBuffer> {
        Ok(WritableBuffer::new(self.0.duplicate()?))
    }

    /// Returns a read-only alias of this view.
    pub fn as_memory(&self) -> Memory {
        self.0.clone()
    }

    /// Takes back the bytes of a wrapped or heap-allocated resource. See
    /// [`Memory::into_vec`].
    pub fn into_vec(self) -> std::result::Result<Vec<u8>, WritableMemory> {
        self.0.into_vec().map_err(WritableMemory)
    }
}

impl Deref for WritableMemory {
    type Target = Memory;

    fn deref(&self) -> &Memory {
        &self.0
    }
}

impl std::fmt::Debug for WritableMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WritableMemory").field(&self.0).finish()
    }
}
