//! Platform constants and the one-time capability probe.
//!
//! Element layouts are known at compile time, so the per-type stride and array base
//! offset used by bulk transfers are plain constants rather than runtime introspection.

use std::sync::OnceLock;

use memview_common::{Result, error::Error};
use memview_page_alloc::{PageAllocation, mmap};

use crate::order::ByteOrder;

/// Byte order of the host.
pub const NATIVE_ORDER: ByteOrder = ByteOrder::native();

/// Memory layout of an array of one primitive element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    /// Element size (and array stride) in bytes.
    pub size: usize,
    /// `log2(size)`; element sizes are powers of two.
    pub shift: u32,
    /// Byte offset of element 0 from the start of the array.
    pub array_base_offset: usize,
}

impl ElementLayout {
    pub const fn of<T>() -> ElementLayout {
        let size = std::mem::size_of::<T>();
        assert!(size.is_power_of_two());
        ElementLayout {
            size,
            shift: size.trailing_zeros(),
            array_base_offset: 0,
        }
    }

    /// Byte offset of element `index` from the start of the array.
    #[inline]
    pub const fn byte_offset(&self, index: usize) -> usize {
        self.array_base_offset + (index << self.shift)
    }

    /// Number of bytes occupied by `count` elements.
    #[inline]
    pub const fn byte_len(&self, count: usize) -> usize {
        count << self.shift
    }
}

/// Layout of a 2-byte character, stored as one UTF-16 code unit.
pub const CHAR_LAYOUT: ElementLayout = ElementLayout::of::<u16>();

/// Returns `true` if the host provides everything this crate relies on.
pub fn is_supported() -> bool {
    check_supported().is_ok()
}

/// Verifies, once per process, that the host provides everything this crate relies on.
///
/// The probe result is cached; later calls only clone the cached outcome.
///
/// # Errors
///
/// Returns [`ErrorKind::UnsupportedPlatform`](memview_common::error::ErrorKind) if the
/// pointer width is below 32 bits, the page size is not a power of two, or direct
/// page allocation does not work.
pub fn check_supported() -> Result<()> {
    static PROBE: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    match PROBE.get_or_init(probe) {
        Ok(()) => Ok(()),
        Err(reason) => Err(Error::unsupported_platform(reason.clone())),
    }
}

fn probe() -> std::result::Result<(), String> {
    if usize::BITS < 32 {
        return Err(format!("pointer width of {} bits is too small", usize::BITS));
    }
    let page_size = mmap::get_page_size();
    if !page_size.is_power_of_two() {
        return Err(format!("page size {page_size} is not a power of two"));
    }
    PageAllocation::allocate(1)
        .and_then(PageAllocation::free)
        .map_err(|e| format!("direct page allocation is unavailable: {e}"))?;
    log::debug!("platform probe passed (page size {page_size}, native order {NATIVE_ORDER})");
    Ok(())
}

/// Whether memory-mapped files are available on this platform.
pub fn supports_file_mapping() -> bool {
    mmap::SUPPORTS_FILE_MAPPING
}
