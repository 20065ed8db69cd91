/// A trait for working with integers as little-endian byte slices of
/// arbitrary width. Automatically implemented for all built-in unsigned
/// integers.
pub trait LeBytes: Sized {
    /// Write `self` into `buf` in little-endian byte order, filling the
    /// entire slice.
    ///
    /// Returns `None` if `self` does not fit in `buf.len()` bytes.
    fn to_le_bytes(self, buf: &mut [u8]) -> Option<usize>;

    /// Parse `self` from a byte slice in little-endian byte order.
    ///
    /// Short slices are zero-extended. Returns `None` upon overflow.
    fn from_le_bytes(buf: &[u8]) -> Option<Self>;
}

macro_rules! impl_le_bytes {
    ($($num:ty)*) => {
        $(
            impl LeBytes for $num {
                fn to_le_bytes(self, buf: &mut [u8]) -> Option<usize> {
                    let bytes = <$num>::to_le_bytes(self);
                    let len = bytes.len().min(buf.len());
                    if bytes[len..].iter().any(|&b| b != 0) {
                        return None;
                    }
                    buf[..len].copy_from_slice(&bytes[..len]);
                    buf[len..].iter_mut().for_each(|b| *b = 0);
                    Some(buf.len())
                }

                fn from_le_bytes(buf: &[u8]) -> Option<Self> {
                    let len = core::mem::size_of::<$num>();

                    let buf = if buf.len() > len {
                        let (buf, extra) = buf.split_at(len);
                        if extra.iter().any(|&b| b != 0) {
                            return None
                        }
                        buf
                    } else {
                        buf
                    };

                    let mut res: Self = 0;
                    for b in buf.iter().rev().copied() {
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

impl_le_bytes!(u8 u16 u32 u64 u128 usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extends_short_registers() {
        assert_eq!(<u64 as LeBytes>::from_le_bytes(&[0x34, 0x12]), Some(0x1234));
    }

    #[test]
    fn rejects_overflowing_input() {
        assert_eq!(<u16 as LeBytes>::from_le_bytes(&[0x34, 0x12, 0x01]), None);
        assert_eq!(<u16 as LeBytes>::from_le_bytes(&[0x34, 0x12, 0x00]), Some(0x1234));
    }

    #[test]
    fn writes_into_narrow_registers() {
        let mut buf = [0xff; 3];
        assert_eq!(LeBytes::to_le_bytes(0x0102_0304u64 & 0xff_ffff, &mut buf), Some(3));
        assert_eq!(buf, [0x04, 0x03, 0x02]);

        assert_eq!(LeBytes::to_le_bytes(0x0102_0304u64, &mut buf), None);
    }
}
