//! Power-of-two alignment arithmetic for page and allocation-granularity boundaries.

/// Aligns `n` up to the next multiple of `alignment`.
///
/// Returns `None` if the aligned value does not fit into `usize`.
///
/// ```
/// use memview_page_alloc::align::align_up;
///
/// assert_eq!(align_up(0, 4096), Some(0));
/// assert_eq!(align_up(1, 4096), Some(4096));
/// assert_eq!(align_up(4096, 4096), Some(4096));
/// assert_eq!(align_up(usize::MAX, 4096), None);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a power of two.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    n.checked_add(alignment - 1).map(|v| v & !(alignment - 1))
}

/// Aligns `n` down to the previous multiple of `alignment`.
///
/// ```
/// use memview_page_alloc::align::align_down_u64;
///
/// assert_eq!(align_down_u64(0, 4096), 0);
/// assert_eq!(align_down_u64(4095, 4096), 0);
/// assert_eq!(align_down_u64(8193, 4096), 8192);
/// ```
#[inline]
pub fn align_down_u64(n: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Checks whether `n` lies exactly on an `alignment` boundary.
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}
