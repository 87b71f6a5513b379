/// The byte order in which multi-byte primitives are stored in a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the host platform.
    #[inline]
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self == ByteOrder::native()
    }

    #[inline]
    pub fn opposite(self) -> ByteOrder {
        match self {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::LittleEndian => f.write_str("little-endian"),
            ByteOrder::BigEndian => f.write_str("big-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ByteOrder;

    #[test]
    fn test_native_order() {
        let probe = 1u16.to_ne_bytes();
        let expected = if probe[0] == 1 {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        };
        assert_eq!(ByteOrder::native(), expected);
        assert!(ByteOrder::native().is_native());
        assert!(!ByteOrder::native().opposite().is_native());
        assert_eq!(ByteOrder::default(), ByteOrder::native());
    }
}
