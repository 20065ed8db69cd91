/// A trait for working with integers as big-endian byte slices of arbitrary
/// width. Automatically implemented for all built-in unsigned integers.
pub trait BeBytes: Sized {
    /// Write `self` into `buf` in big-endian (network) byte order, filling the
    /// entire slice.
    ///
    /// Returns `None` if `self` does not fit in `buf.len()` bytes.
    fn to_be_bytes(self, buf: &mut [u8]) -> Option<usize>;

    /// Parse `self` from a byte slice in big-endian (network) byte order.
    ///
    /// Short slices are zero-extended. Returns `None` upon overflow.
    fn from_be_bytes(buf: &[u8]) -> Option<Self>;
}

macro_rules! impl_be_bytes {
    ($($num:ty)*) => {
        $(
            impl BeBytes for $num {
                fn to_be_bytes(self, buf: &mut [u8]) -> Option<usize> {
                    let bytes = <$num>::to_be_bytes(self);
                    let len = bytes.len().min(buf.len());
                    let (extra, bytes) = bytes.split_at(bytes.len() - len);
                    if extra.iter().any(|&b| b != 0) {
                        return None;
                    }
                    let pad = buf.len() - len;
                    buf[..pad].iter_mut().for_each(|b| *b = 0);
                    buf[pad..].copy_from_slice(bytes);
                    Some(buf.len())
                }

                fn from_be_bytes(buf: &[u8]) -> Option<Self> {
                    let len = core::mem::size_of::<$num>();

                    let buf = if buf.len() > len {
                        let (extra, buf) = buf.split_at(buf.len() - len);
                        if extra.iter().any(|&b| b != 0) {
                            return None
                        }
                        buf
                    } else {
                        buf
                    };

                    let mut res: Self = 0;
                    for b in buf.iter().copied() {
                        // `res <<= 8` causes the compiler to complain in the `u8` case
                        res <<= 4;
                        res <<= 4;
                        res |= b as Self;
                    }

                    Some(res)
                }
            }
        )*
    };
}

impl_be_bytes!(u8 u16 u32 u64 u128 usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wide_buffer() {
        let mut buf = [0xff; 16];
        assert_eq!(BeBytes::to_be_bytes(0x1234u64, &mut buf), Some(16));
        assert!(buf[..14].iter().all(|&b| b == 0));
        assert_eq!(&buf[14..], &[0x12, 0x34]);
        assert_eq!(<u64 as BeBytes>::from_be_bytes(&buf), Some(0x1234));
    }

    #[test]
    fn rejects_values_too_wide_for_register() {
        let mut buf = [0; 2];
        assert_eq!(BeBytes::to_be_bytes(0x10000u32, &mut buf), None);
    }
}
