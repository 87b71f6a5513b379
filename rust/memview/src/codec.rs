//! Byte-order conversion for scalar and bulk primitive transfers.
//!
//! Values are moved in native order and swapped whenever the view's order differs
//! from the host's. Bulk transfers swap element by element, never the whole block.

use crate::platform::ElementLayout;

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width primitive that can be stored in a view.
///
/// Implemented for `i8`, `u8`, `i16`, `u16`, `i32`, `u32`, `i64`, `u64`, `f32` and `f64`.
pub trait Primitive:
    bytemuck::Pod + Default + PartialEq + std::fmt::Debug + Send + Sync + sealed::Sealed + 'static
{
    const LAYOUT: ElementLayout;

    /// Reverses the byte order of the value's representation.
    fn swap_bytes(self) -> Self;
}

macro_rules! impl_primitive_int {
    ($($T:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $T {}

            impl Primitive for $T {
                const LAYOUT: ElementLayout = ElementLayout::of::<$T>();

                #[inline]
                fn swap_bytes(self) -> Self {
                    <$T>::swap_bytes(self)
                }
            }
        )*
    };
}

macro_rules! impl_primitive_float {
    ($($T:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $T {}

            impl Primitive for $T {
                const LAYOUT: ElementLayout = ElementLayout::of::<$T>();

                #[inline]
                fn swap_bytes(self) -> Self {
                    <$T>::from_bits(self.to_bits().swap_bytes())
                }
            }
        )*
    };
}

impl_primitive_int!(i8, u8, i16, u16, i32, u32, i64, u64);
impl_primitive_float!(f32, f64);

/// Reads one value stored at `src`.
///
/// # Safety
///
/// `src` must be valid for reads of `T::LAYOUT.size` bytes.
#[inline]
pub(crate) unsafe fn read<T: Primitive>(src: *const u8, swap: bool) -> T {
    let value = unsafe { std::ptr::read_unaligned(src as *const T) };
    if swap { value.swap_bytes() } else { value }
}

/// Stores one value at `dst`.
///
/// # Safety
///
/// `dst` must be valid for writes of `T::LAYOUT.size` bytes.
#[inline]
pub(crate) unsafe fn write<T: Primitive>(dst: *mut u8, value: T, swap: bool) {
    let value = if swap { value.swap_bytes() } else { value };
    unsafe { std::ptr::write_unaligned(dst as *mut T, value) };
}

/// Fills `dst` with `dst.len()` values stored contiguously at `src`.
///
/// # Safety
///
/// `src` must be valid for reads of `size_of_val(dst)` bytes and must not overlap `dst`.
pub(crate) unsafe fn read_array<T: Primitive>(src: *const u8, dst: &mut [T], swap: bool) {
    let dst_bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
    unsafe {
        std::ptr::copy_nonoverlapping(src, dst_bytes.as_mut_ptr(), dst_bytes.len());
    }
    if swap {
        dst.iter_mut().for_each(|v| *v = v.swap_bytes());
    }
}

/// Stores the values of `src` contiguously at `dst`.
///
/// # Safety
///
/// `dst` must be valid for writes of `size_of_val(src)` bytes and must not overlap `src`.
pub(crate) unsafe fn write_array<T: Primitive>(dst: *mut u8, src: &[T], swap: bool) {
    if swap {
        for (i, &value) in src.iter().enumerate() {
            unsafe { write(dst.add(T::LAYOUT.byte_offset(i)), value, true) };
        }
    } else {
        let src_bytes: &[u8] = bytemuck::cast_slice(src);
        unsafe {
            std::ptr::copy_nonoverlapping(src_bytes.as_ptr(), dst, src_bytes.len());
        }
    }
}

/// Encodes a `char` as the single UTF-16 code unit stored for 2-byte characters.
pub(crate) fn char_to_unit(value: char) -> Option<u16> {
    let mut units = [0u16; 2];
    match value.encode_utf16(&mut units) {
        [unit] => Some(*unit),
        _ => None,
    }
}

/// Decodes a stored UTF-16 code unit; unpaired surrogates have no `char` value.
pub(crate) fn unit_to_char(unit: u16) -> Option<char> {
    char::from_u32(unit as u32)
}
