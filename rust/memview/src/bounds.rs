//! Bounds validation and absolute address computation.
//!
//! Every scalar and bulk access resolves its address through [`checked_address`];
//! there is no unchecked path.

use memview_common::{Result, error::Error};

use crate::state::ResourceState;

/// Fails unless `[offset, offset + length)` lies within `[0, capacity)`.
#[inline]
pub(crate) fn check_bounds(offset: u64, length: u64, capacity: u64) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::out_of_bounds(offset, length, capacity)),
    }
}

/// Fails unless `count` elements starting at `index` fit into an array of `array_len`.
#[inline]
pub(crate) fn check_array_bounds(index: usize, count: usize, array_len: usize) -> Result<()> {
    check_bounds(index as u64, count as u64, array_len as u64)
}

/// Computes the address of byte `offset` of a view window starting at `base` within
/// `state`, after checking validity and that `length` bytes fit into the window.
#[inline]
pub(crate) fn checked_address(
    state: &ResourceState,
    base: u64,
    capacity: u64,
    offset: u64,
    length: u64,
) -> Result<*mut u8> {
    state.check_valid()?;
    check_bounds(offset, length, capacity)?;
    // base + offset + length <= state capacity, which fits the address space.
    Ok(unsafe { state.base_address().add((base + offset) as usize) })
}

/// Returns `true` if the byte ranges `[a, a + len)` and `[b, b + len)` intersect.
#[inline]
pub(crate) fn ranges_overlap(a: usize, b: usize, len: usize) -> bool {
    len != 0 && a < b.saturating_add(len) && b < a.saturating_add(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        check_bounds(0, 8, 8).unwrap();
        check_bounds(8, 0, 8).unwrap();
        check_bounds(0, 0, 0).unwrap();
        assert!(check_bounds(1, 8, 8).unwrap_err().is_out_of_bounds());
        assert!(check_bounds(9, 0, 8).is_err());
        assert!(check_bounds(u64::MAX, 2, 8).is_err());
    }

    #[test]
    fn test_check_array_bounds() {
        check_array_bounds(2, 3, 5).unwrap();
        assert!(check_array_bounds(3, 3, 5).is_err());
    }

    #[test]
    fn test_ranges_overlap() {
        assert!(ranges_overlap(0, 0, 1));
        assert!(ranges_overlap(0, 63, 64));
        assert!(ranges_overlap(63, 0, 64));
        assert!(!ranges_overlap(0, 64, 64));
        assert!(!ranges_overlap(64, 0, 64));
        assert!(!ranges_overlap(5, 5, 0));
    }
}
