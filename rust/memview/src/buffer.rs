//! Sequential, position-based access layered on memory views.
//!
//! A buffer tracks `start <= position <= end <= capacity`. Sequential accessors
//! (`get_i32()`, `put_i32(v)`, ...) read or write at `position` and advance it by the
//! access width, failing with `OutOfBounds` rather than crossing `end`. The `_at`
//! accessors take an offset from the buffer base, are checked against `capacity`, and
//! leave the position alone.

use std::ops::{Deref, DerefMut};

use memview_common::{Result, error::Error, verify_arg};

use crate::{
    bounds::check_array_bounds,
    codec::Primitive,
    memory::Memory,
    order::ByteOrder,
    platform::CHAR_LAYOUT,
    writable_memory::WritableMemory,
};

/// A read-only cursor over a memory window.
#[derive(Clone)]
pub struct Buffer {
    memory: Memory,
    start: u64,
    position: u64,
    end: u64,
}

impl Buffer {
    pub(crate) fn new(memory: Memory) -> Buffer {
        let end = memory.capacity();
        Buffer {
            memory,
            start: 0,
            position: 0,
            end,
        }
    }

    /// Returns the position of an access of `length` bytes, if it fits before `end`.
    #[inline]
    fn check_window(&self, length: u64) -> Result<u64> {
        match self.position.checked_add(length) {
            Some(next) if next <= self.end => Ok(self.position),
            _ => Err(Error::out_of_bounds(self.position, length, self.end)),
        }
    }

    /// Reads the value of type `T` at the current position and advances past it.
    pub fn get_next<T: Primitive>(&mut self) -> Result<T> {
        let width = T::LAYOUT.size as u64;
        let pos = self.check_window(width)?;
        let value = self.memory.get::<T>(pos)?;
        self.position = pos + width;
        Ok(value)
    }

    /// Reads the value of type `T` at `offset` from the buffer base.
    #[inline]
    pub fn get_at<T: Primitive>(&self, offset: u64) -> Result<T> {
        self.memory.get::<T>(offset)
    }

    /// Reads `count` values of type `T` at the current position into
    /// `dst[dst_index..dst_index + count]` and advances past them.
    pub fn get_next_array<T: Primitive>(
        &mut self,
        dst: &mut [T],
        dst_index: usize,
        count: usize,
    ) -> Result<()> {
        check_array_bounds(dst_index, count, dst.len())?;
        let width = T::LAYOUT.byte_len(count) as u64;
        let pos = self.check_window(width)?;
        self.memory.get_array(pos, dst, dst_index, count)?;
        self.position = pos + width;
        Ok(())
    }

    sequential_getters!(
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

    pub fn get_bool(&mut self) -> Result<bool> {
        Ok(self.get_next::<u8>()? != 0)
    }

    pub fn get_bool_at(&self, offset: u64) -> Result<bool> {
        self.memory.get_bool(offset)
    }

    /// Reads the 2-byte character at the current position and advances past it.
    pub fn get_char(&mut self) -> Result<char> {
        let pos = self.check_window(CHAR_LAYOUT.size as u64)?;
        let value = self.memory.get_char(pos)?;
        self.position = pos + CHAR_LAYOUT.size as u64;
        Ok(value)
    }

    pub fn get_char_at(&self, offset: u64) -> Result<char> {
        self.memory.get_char(offset)
    }

    pub fn get_char_array(&mut self, dst: &mut [char], dst_index: usize, count: usize) -> Result<()> {
        check_array_bounds(dst_index, count, dst.len())?;
        let width = CHAR_LAYOUT.byte_len(count) as u64;
        let pos = self.check_window(width)?;
        self.memory.get_char_array(pos, dst, dst_index, count)?;
        self.position = pos + width;
        Ok(())
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.memory.capacity()
    }

    /// Number of bytes between the position and `end`.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.end - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.end
    }

    /// Moves the position to `position`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` unless `start <= position <= end`.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        if position < self.start || position > self.end {
            return Err(Error::out_of_bounds(position, 0, self.end));
        }
        self.position = position;
        Ok(())
    }

    /// Sets all three window markers at once.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `end` exceeds the capacity, and `InvalidArgument`
    /// unless `start <= position <= end`.
    pub fn set_start_position_end(&mut self, start: u64, position: u64, end: u64) -> Result<()> {
        if end > self.capacity() {
            return Err(Error::out_of_bounds(end, 0, self.capacity()));
        }
        verify_arg!(position, start <= position && position <= end);
        self.start = start;
        self.position = position;
        self.end = end;
        Ok(())
    }

    /// Moves the position by `increment` bytes.
    pub fn increment_position(&mut self, increment: u64) -> Result<()> {
        let position = self
            .position
            .checked_add(increment)
            .ok_or_else(|| Error::out_of_bounds(self.position, increment, self.end))?;
        self.set_position(position)
    }

    /// Moves the position back to `start`.
    pub fn reset_position(&mut self) {
        self.position = self.start;
    }

    pub fn order(&self) -> ByteOrder {
        self.memory.order()
    }

    /// The memory view this buffer reads through.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns a read-only memory alias of the buffer's whole window.
    pub fn as_memory(&self) -> Memory {
        self.memory.clone()
    }

    /// Returns a new buffer over `[position, end)`, in this buffer's order.
    pub fn region(&self) -> Result<Buffer> {
        let memory = self
            .memory
            .region(self.position, self.end - self.position)?;
        Ok(Buffer::new(memory))
    }

    /// Returns a new buffer over `[offset, offset + length)` of this buffer's window.
    pub fn region_at(&self, offset: u64, length: u64, order: ByteOrder) -> Result<Buffer> {
        Ok(Buffer::new(
            self.memory.region_with_order(offset, length, order)?,
        ))
    }

    /// Returns an alias of this buffer with the same window markers.
    pub fn duplicate(&self) -> Result<Buffer> {
        self.duplicate_with_order(self.memory.order())
    }

    /// Returns an alias of this buffer with the same window markers presenting
    /// values in `order`.
    pub fn duplicate_with_order(&self, order: ByteOrder) -> Result<Buffer> {
        Ok(Buffer {
            memory: self.memory.duplicate_with_order(order)?,
            start: self.start,
            position: self.position,
            end: self.end,
        })
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("start", &self.start)
            .field("position", &self.position)
            .field("end", &self.end)
            .field("memory", &self.memory)
            .finish()
    }
}

/// A cursor that can write as well as read.
///
/// Read operations come from [`Buffer`] through `Deref`/`DerefMut`.
#[derive(Clone)]
pub struct WritableBuffer(Buffer);

impl WritableBuffer {
    pub(crate) fn new(memory: Memory) -> WritableBuffer {
        debug_assert!(!memory.is_read_only());
        WritableBuffer(Buffer::new(memory))
    }

    /// Writes `value` at the current position and advances past it.
    pub fn put_next<T: Primitive>(&mut self, value: T) -> Result<()> {
        let width = T::LAYOUT.size as u64;
        let pos = self.0.check_window(width)?;
        self.0.memory.store(pos, value)?;
        self.0.position = pos + width;
        Ok(())
    }

    /// Writes `value` at `offset` from the buffer base.
    #[inline]
    pub fn put_at<T: Primitive>(&self, offset: u64, value: T) -> Result<()> {
        self.0.memory.store(offset, value)
    }

    /// Writes `src[src_index..src_index + count]` at the current position and
    /// advances past it.
    pub fn put_next_array<T: Primitive>(
        &mut self,
        src: &[T],
        src_index: usize,
        count: usize,
    ) -> Result<()> {
        check_array_bounds(src_index, count, src.len())?;
        let width = T::LAYOUT.byte_len(count) as u64;
        let pos = self.0.check_window(width)?;
        self.0.memory.store_array(pos, src, src_index, count)?;
        self.0.position = pos + width;
        Ok(())
    }

    sequential_putters!(
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

    pub fn put_bool(&mut self, value: bool) -> Result<()> {
        self.put_next(value as u8)
    }

    pub fn put_bool_at(&self, offset: u64, value: bool) -> Result<()> {
        self.put_at(offset, value as u8)
    }

    /// Writes `value` as one UTF-16 code unit at the current position and advances
    /// past it.
    pub fn put_char(&mut self, value: char) -> Result<()> {
        let pos = self.0.check_window(CHAR_LAYOUT.size as u64)?;
        self.0.memory.store_char(pos, value)?;
        self.0.position = pos + CHAR_LAYOUT.size as u64;
        Ok(())
    }

    pub fn put_char_at(&self, offset: u64, value: char) -> Result<()> {
        self.0.memory.store_char(offset, value)
    }

    pub fn put_char_array(&mut self, src: &[char], src_index: usize, count: usize) -> Result<()> {
        check_array_bounds(src_index, count, src.len())?;
        let width = CHAR_LAYOUT.byte_len(count) as u64;
        let pos = self.0.check_window(width)?;
        self.0.memory.store_char_array(pos, src, src_index, count)?;
        self.0.position = pos + width;
        Ok(())
    }

    /// Returns a writable buffer over `[position, end)`, in this buffer's order.
    pub fn writable_region(&self) -> Result<WritableBuffer> {
        Ok(WritableBuffer(self.0.region()?))
    }

    pub fn writable_region_at(
        &self,
        offset: u64,
        length: u64,
        order: ByteOrder,
    ) -> Result<WritableBuffer> {
        Ok(WritableBuffer(self.0.region_at(offset, length, order)?))
    }

    /// Returns a writable alias with the same window markers.
    pub fn writable_duplicate(&self) -> Result<WritableBuffer> {
        Ok(WritableBuffer(self.0.duplicate()?))
    }

    pub fn writable_duplicate_with_order(&self, order: ByteOrder) -> Result<WritableBuffer> {
        Ok(WritableBuffer(self.0.duplicate_with_order(order)?))
    }

    /// Returns a writable memory alias of the buffer's whole window.
    pub fn as_writable_memory(&self) -> WritableMemory {
        WritableMemory::from_memory(self.0.memory.clone())
    }
}

impl Deref for WritableBuffer {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        &self.0
    }
}

impl DerefMut for WritableBuffer {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut self.0
    }
}

impl std::fmt::Debug for WritableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WritableBuffer").field(&self.0).finish()
    }
}
