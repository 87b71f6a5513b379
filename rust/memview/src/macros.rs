//! Generators for the per-primitive accessor surface of views and buffers.
//!
//! Each macro expands to associated functions inside an `impl` block and forwards to
//! the generic accessor of that block (`get`, `put`, `get_next`, ...).

macro_rules! offset_getters {
    ($($name:ident: $T:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Reads the `", stringify!($T), "` at `offset`.")]
                #[inline]
                pub fn [<get_ $name>](&self, offset: u64) -> $crate::Result<$T> {
                    self.get::<$T>(offset)
                }

                #[doc = concat!(
                    "Reads `count` `", stringify!($T),
                    "` values starting at `offset` into `dst[dst_index..dst_index + count]`."
                )]
                pub fn [<get_ $name _array>](
                    &self,
                    offset: u64,
                    dst: &mut [$T],
                    dst_index: usize,
                    count: usize,
                ) -> $crate::Result<()> {
                    self.get_array(offset, dst, dst_index, count)
                }
            )*
        }
    };
}

macro_rules! offset_putters {
    ($($name:ident: $T:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Writes a `", stringify!($T), "` at `offset`.")]
                #[inline]
                pub fn [<put_ $name>](&self, offset: u64, value: $T) -> $crate::Result<()> {
                    self.put::<$T>(offset, value)
                }

                #[doc = concat!(
                    "Writes `src[src_index..src_index + count]` as `", stringify!($T),
                    "` values starting at `offset`."
                )]
                pub fn [<put_ $name _array>](
                    &self,
                    offset: u64,
                    src: &[$T],
                    src_index: usize,
                    count: usize,
                ) -> $crate::Result<()> {
                    self.put_array(offset, src, src_index, count)
                }
            )*
        }
    };
}

macro_rules! sequential_getters {
    ($($name:ident: $T:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!(
                    "Reads the `", stringify!($T), "` at the current position and advances it."
                )]
                #[inline]
                pub fn [<get_ $name>](&mut self) -> $crate::Result<$T> {
                    self.get_next::<$T>()
                }

                #[doc = concat!(
                    "Reads the `", stringify!($T),
                    "` at `offset` from the buffer base, leaving the position unchanged."
                )]
                #[inline]
                pub fn [<get_ $name _at>](&self, offset: u64) -> $crate::Result<$T> {
                    self.get_at::<$T>(offset)
                }

                #[doc = concat!(
                    "Reads `count` `", stringify!($T),
                    "` values at the current position into `dst[dst_index..]` and advances it."
                )]
                pub fn [<get_ $name _array>](
                    &mut self,
                    dst: &mut [$T],
                    dst_index: usize,
                    count: usize,
                ) -> $crate::Result<()> {
                    self.get_next_array(dst, dst_index, count)
                }
            )*
        }
    };
}

macro_rules! sequential_putters {
    ($($name:ident: $T:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!(
                    "Writes a `", stringify!($T), "` at the current position and advances it."
                )]
                #[inline]
                pub fn [<put_ $name>](&mut self, value: $T) -> $crate::Result<()> {
                    self.put_next::<$T>(value)
                }

                #[doc = concat!(
                    "Writes a `", stringify!($T),
                    "` at `offset` from the buffer base, leaving the position unchanged."
                )]
                #[inline]
                pub fn [<put_ $name _at>](&self, offset: u64, value: $T) -> $crate::Result<()> {
                    self.put_at::<$T>(offset, value)
                }

                #[doc = concat!(
                    "Writes `src[src_index..src_index + count]` as `", stringify!($T),
                    "` values at the current position and advances it."
                )]
                pub fn [<put_ $name _array>](
                    &mut self,
                    src: &[$T],
                    src_index: usize,
                    count: usize,
                ) -> $crate::Result<()> {
                    self.put_next_array(src, src_index, count)
                }
            )*
        }
    };
}
