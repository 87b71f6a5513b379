//! Read-only, offset-addressed views.

use std::{cmp::Ordering, path::Path, sync::Arc};

use memview_common::{Result, error::Error};

use crate::{
    bounds::{check_array_bounds, check_bounds, checked_address, ranges_overlap},
    buffer::Buffer,
    codec::{self, Primitive},
    handle::{Handle, MapHandle},
    map::{MapOptions, MappedRegion},
    order::ByteOrder,
    platform::CHAR_LAYOUT,
    state::{ResourceKind, ResourceState},
    writable_memory::WritableMemory,
};

/// A read-only view over a window `[base, base + capacity)` of a shared resource.
///
/// Cloning a `Memory` is cheap and yields another alias of the same window. Views
/// derived through [`Memory::region`] or [`Memory::duplicate`] share the resource,
/// so writes through any writable alias are visible here immediately.
#[derive(Clone)]
pub struct Memory {
    state: Arc<ResourceState>,
    base: u64,
    capacity: u64,
    order: ByteOrder,
    swap: bool,
}

impl Memory {
    /// Creates a view over `[base, base + capacity)` of `state`.
    ///
    /// A zero-capacity view always presents little-endian order.
    pub(crate) fn new(
        state: Arc<ResourceState>,
        base: u64,
        capacity: u64,
        order: ByteOrder,
    ) -> Memory {
        let order = if capacity == 0 {
            ByteOrder::LittleEndian
        } else {
            order
        };
        Memory {
            state,
            base,
            capacity,
            order,
            swap: !order.is_native(),
        }
    }

    /// Wraps `bytes` as a read-only view in native byte order.
    ///
    /// The view takes ownership of the bytes. A `Vec<u8>` is moved in without
    /// copying; borrowed input such as `&[u8]` is copied first. Use
    /// [`Memory::into_vec`] to take the bytes back.
    pub fn wrap(bytes: impl Into<Vec<u8>>) -> Result<Memory> {
        Self::wrap_with_order(bytes, ByteOrder::native())
    }

    /// Wraps `bytes` as a read-only view presenting values in `order`.
    pub fn wrap_with_order(bytes: impl Into<Vec<u8>>, order: ByteOrder) -> Result<Memory> {
        let state = ResourceState::heap(bytes.into(), order, true)?;
        let capacity = state.capacity();
        Ok(Memory::new(state, 0, capacity, order))
    }

    /// Maps a file region read-only.
    ///
    /// The returned handle owns the mapping; closing (or dropping) it unmaps the
    /// region and invalidates every view derived from it.
    ///
    /// # Errors
    ///
    /// Returns `MappingFailure` if the file cannot be opened or the requested range
    /// lies outside the file, and `UnsupportedPlatform` if the host cannot map files.
    pub fn map(path: impl AsRef<Path>, options: &MapOptions) -> Result<MapHandle> {
        let region = MappedRegion::map(path.as_ref(), options, true)?;
        let state = region.state().clone();
        let capacity = state.capacity();
        Ok(Handle::new(Memory::new(state, 0, capacity, options.order), region))
    }

    /// Resolves the address of `length` bytes at `offset`, checking validity and bounds.
    #[inline]
    pub(crate) fn address(&self, offset: u64, length: u64) -> Result<*mut u8> {
        checked_address(&self.state, self.base, self.capacity, offset, length)
    }

    /// Reads the value of type `T` at `offset`.
    #[inline]
    pub fn get<T: Primitive>(&self, offset: u64) -> Result<T> {
        let src = self.address(offset, T::LAYOUT.size as u64)?;
        Ok(unsafe { codec::read::<T>(src, self.swap) })
    }

    /// Reads `count` values of type `T` starting at `offset` into
    /// `dst[dst_index..dst_index + count]`, converting each element's byte order.
    pub fn get_array<T: Primitive>(
        &self,
        offset: u64,
        dst: &mut [T],
        dst_index: usize,
        count: usize,
    ) -> Result<()> {
        check_array_bounds(dst_index, count, dst.len())?;
        let dst = &mut dst[dst_index..dst_index + count];
        let length = T::LAYOUT.byte_len(count) as u64;
        let src = self.address(offset, length)?;
        unsafe { codec::read_array(src, dst, self.swap) };
        Ok(())
    }

    offset_getters!(
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

    /// Reads one byte at `offset` as a boolean; any non-zero byte is `true`.
    pub fn get_bool(&self, offset: u64) -> Result<bool> {
        Ok(self.get::<u8>(offset)? != 0)
    }

    /// Reads the 2-byte character (one UTF-16 code unit) at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the stored unit is a surrogate.
    pub fn get_char(&self, offset: u64) -> Result<char> {
        let unit = self.get::<u16>(offset)?;
        codec::unit_to_char(unit).ok_or_else(|| invalid_char(offset, unit))
    }

    /// Reads `count` 2-byte characters starting at `offset` into
    /// `dst[dst_index..dst_index + count]`.
    pub fn get_char_array(
        &self,
        offset: u64,
        dst: &mut [char],
        dst_index: usize,
        count: usize,
    ) -> Result<()> {
        check_array_bounds(dst_index, count, dst.len())?;
        let src = self.address(offset, CHAR_LAYOUT.byte_len(count) as u64)?;
        for (i, slot) in dst[dst_index..dst_index + count].iter_mut().enumerate() {
            let at = CHAR_LAYOUT.byte_offset(i);
            let unit: u16 = unsafe { codec::read(src.add(at), self.swap) };
            *slot = codec::unit_to_char(unit).ok_or_else(|| invalid_char(offset + at as u64, unit))?;
        }
        Ok(())
    }

    /// Copies `length` bytes starting at `offset` out of the view.
    pub fn to_byte_vec(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_bounds(offset, length, self.capacity)?;
        let mut bytes = vec![0u8; length as usize];
        self.get_array(offset, &mut bytes, 0, length as usize)?;
        Ok(bytes)
    }

    /// Returns a view of `[offset, offset + length)` of this view, in this view's order.
    pub fn region(&self, offset: u64, length: u64) -> Result<Memory> {
        self.region_with_order(offset, length, self.order)
    }

    /// Returns a view of `[offset, offset + length)` of this view presenting values
    /// in `order`. The new view aliases the same bytes.
    pub fn region_with_order(&self, offset: u64, length: u64, order: ByteOrder) -> Result<Memory> {
        self.state.check_valid()?;
        check_bounds(offset, length, self.capacity)?;
        Ok(Memory::new(
            self.state.clone(),
            self.base + offset,
            length,
            order,
        ))
    }

    /// Returns an alias of this view's entire window.
    pub fn duplicate(&self) -> Result<Memory> {
        self.duplicate_with_order(self.order)
    }

    /// Returns an alias of this view's entire window presenting values in `order`.
    pub fn duplicate_with_order(&self, order: ByteOrder) -> Result<Memory> {
        self.region_with_order(0, self.capacity, order)
    }

    /// Returns a sequential-access buffer over this view's window.
    pub fn as_buffer(&self) -> Result<Buffer> {
        Ok(Buffer::new(self.duplicate()?))
    }

    /// Returns `true` if both views have the same capacity and identical bytes.
    ///
    /// Byte order is not considered: raw bytes are compared.
    pub fn equal_to(&self, other: &Memory) -> Result<bool> {
        if self.capacity != other.capacity {
            return Ok(false);
        }
        self.equal_to_range(0, other, 0, self.capacity)
    }

    /// Returns `true` if `length` bytes at `this_offset` match `length` bytes of
    /// `other` at `other_offset`.
    pub fn equal_to_range(
        &self,
        this_offset: u64,
        other: &Memory,
        other_offset: u64,
        length: u64,
    ) -> Result<bool> {
        let a = self.address(this_offset, length)?;
        let b = other.address(other_offset, length)?;
        if a == b {
            return Ok(true);
        }
        let len = length as usize;
        let (a, b) = unsafe {
            (
                std::slice::from_raw_parts(a as *const u8, len),
                std::slice::from_raw_parts(b as *const u8, len),
            )
        };
        Ok(a == b)
    }

    /// Compares two byte ranges lexicographically as unsigned bytes; a proper
    /// prefix orders first.
    pub fn compare_to(
        &self,
        this_offset: u64,
        this_length: u64,
        other: &Memory,
        other_offset: u64,
        other_length: u64,
    ) -> Result<Ordering> {
        let a = self.address(this_offset, this_length)?;
        let b = other.address(other_offset, other_length)?;
        let (a, b) = unsafe {
            (
                std::slice::from_raw_parts(a as *const u8, this_length as usize),
                std::slice::from_raw_parts(b as *const u8, other_length as usize),
            )
        };
        Ok(a.cmp(b))
    }

    /// Copies `length` raw bytes from `src_offset` of this view to `dst_offset` of
    /// `destination`. No byte-order conversion takes place.
    ///
    /// # Errors
    ///
    /// Returns `IllegalOverlap` if the source and destination ranges share any byte,
    /// and `OutOfBounds` if either range exceeds its view.
    pub fn copy_to(
        &self,
        src_offset: u64,
        destination: &WritableMemory,
        dst_offset: u64,
        length: u64,
    ) -> Result<()> {
        let src = self.address(src_offset, length)?;
        let dst = destination.address(dst_offset, length)?;
        check_disjoint(src, src_offset, dst, dst_offset, length)?;
        unsafe { std::ptr::copy_nonoverlapping(src as *const u8, dst, length as usize) };
        Ok(())
    }

    /// Writes `value` at `offset`. Only reachable through the writable types.
    #[inline]
    pub(crate) fn store<T: Primitive>(&self, offset: u64, value: T) -> Result<()> {
        debug_assert!(!self.state.is_read_only());
        let dst = self.address(offset, T::LAYOUT.size as u64)?;
        unsafe { codec::write(dst, value, self.swap) };
        Ok(())
    }

    pub(crate) fn store_array<T: Primitive>(
        &self,
        offset: u64,
        src: &[T],
        src_index: usize,
        count: usize,
    ) -> Result<()> {
        debug_assert!(!self.state.is_read_only());
        check_array_bounds(src_index, count, src.len())?;
        let src = &src[src_index..src_index + count];
        let length = T::LAYOUT.byte_len(count) as u64;
        let dst = self.address(offset, length)?;
        unsafe { codec::write_array(dst, src, self.swap) };
        Ok(())
    }

    pub(crate) fn store_char(&self, offset: u64, value: char) -> Result<()> {
        self.store::<u16>(offset, char_unit(value)?)
    }

    pub(crate) fn store_char_array(
        &self,
        offset: u64,
        src: &[char],
        src_index: usize,
        count: usize,
    ) -> Result<()> {
        check_array_bounds(src_index, count, src.len())?;
        let src = &src[src_index..src_index + count];
        let units = src.iter().map(|&c| char_unit(c)).collect::<Result<Vec<u16>>>()?;
        self.store_array(offset, &units, 0, units.len())
    }

    pub(crate) fn fill_bytes(&self, offset: u64, length: u64, value: u8) -> Result<()> {
        debug_assert!(!self.state.is_read_only());
        let dst = self.address(offset, length)?;
        unsafe { std::ptr::write_bytes(dst, value, length as usize) };
        Ok(())
    }

    /// Takes back the bytes of a wrapped or heap-allocated resource.
    ///
    /// Succeeds only for a view covering the whole heap resource when no other
    /// alias of it is alive; otherwise the view is returned unchanged.
    pub fn into_vec(self) -> std::result::Result<Vec<u8>, Memory> {
        if !self.is_heap() || self.base != 0 || self.capacity != self.state.capacity() {
            return Err(self);
        }
        let Memory {
            state,
            base,
            capacity,
            order,
            swap,
        } = self;
        let restore = |state| Memory {
            state,
            base,
            capacity,
            order,
            swap,
        };
        match Arc::try_unwrap(state) {
            Ok(state) => state
                .into_heap_bytes()
                .map_err(|state| restore(Arc::new(state))),
            Err(state) => Err(restore(state)),
        }
    }

    /// Number of bytes addressable through this view.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The byte order values are presented in.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The byte order requested when the underlying resource was created.
    /// Empty resources report little-endian.
    pub fn resource_order(&self) -> ByteOrder {
        self.state.order()
    }

    /// `true` if accesses through this view reverse the bytes of multi-byte values.
    #[inline]
    pub fn swap_bytes(&self) -> bool {
        self.swap
    }

    /// `false` once the underlying resource has been released.
    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    /// Whether the underlying resource rejects writes.
    pub fn is_read_only(&self) -> bool {
        self.state.is_read_only()
    }

    pub fn kind(&self) -> ResourceKind {
        self.state.kind()
    }

    pub fn is_heap(&self) -> bool {
        self.kind() == ResourceKind::Heap
    }

    pub fn is_direct(&self) -> bool {
        self.kind() == ResourceKind::Direct
    }

    pub fn is_mapped(&self) -> bool {
        self.kind() == ResourceKind::Mapped
    }

    /// Returns `true` if both views cover exactly the same window of the same resource.
    pub fn is_same_resource(&self, other: &Memory) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
            && self.base == other.base
            && self.capacity == other.capacity
    }

    /// The shared state of the underlying resource.
    pub fn resource(&self) -> &ResourceState {
        &self.state
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("kind", &self.kind())
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .field("order", &self.order)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Fails with `IllegalOverlap` if `length` bytes at `src` and at `dst` intersect.
fn check_disjoint(
    src: *const u8,
    src_offset: u64,
    dst: *const u8,
    dst_offset: u64,
    length: u64,
) -> Result<()> {
    if ranges_overlap(src as usize, dst as usize, length as usize) {
        Err(Error::illegal_overlap(src_offset, dst_offset, length))
    } else {
        Ok(())
    }
}

fn char_unit(value: char) -> Result<u16> {
    codec::char_to_unit(value).ok_or_else(|| {
        Error::invalid_arg(
            "value",
            format!("character U+{:04X} does not fit a single UTF-16 unit", value as u32),
        )
    })
}

#[cold]
fn invalid_char(offset: u64, unit: u16) -> Error {
    Error::invalid_format(
        "char",
        format!("unpaired surrogate 0x{unit:04X} at offset {offset}"),
    )
}
