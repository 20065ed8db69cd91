use num_traits::{CheckedAdd, CheckedMul, FromPrimitive, Zero};

#[derive(Debug, PartialEq, Eq)]
pub enum DecodeHexError {
    NotAscii,
    Empty,
    Overflow,
    InvalidOutput,
}

/// Decode a GDB hex string into the specified integer.
///
/// Unlike register payloads, numbers never contain "xx" placeholders.
pub fn decode_hex<I>(buf: &[u8]) -> Result<I, DecodeHexError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
{
    use DecodeHexError::*;

    let radix = I::from_u8(16).ok_or(InvalidOutput)?;

    if buf.is_empty() {
        return Err(Empty);
    }

    let mut result = I::zero();

    for &digit in buf {
        let x = I::from_u8(ascii2byte(digit).ok_or(NotAscii)?).ok_or(InvalidOutput)?;
        result = result.checked_mul(&radix).ok_or(Overflow)?;
        result = result.checked_add(&x).ok_or(Overflow)?
    }

    Ok(result)
}

/// Convert a single ASCII hex digit (either case) into its value.
#[inline]
pub fn ascii2byte(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Check if the byte `c` is a GDB "unavailable" placeholder (`x` or `X`).
#[inline]
pub fn is_unavailable_marker(c: u8) -> bool {
    matches!(c, b'x' | b'X')
}

/// Decode pairs of hex digits from `src` into `dst`.
///
/// `src` must be exactly twice as long as `dst`. On failure, returns the
/// offset into `src` of the first offending character. `dst` may have been
/// partially written.
pub fn decode_hex_buf(src: &[u8], dst: &mut [u8]) -> Result<(), usize> {
    debug_assert_eq!(src.len(), dst.len() * 2);

    for (i, (pair, out)) in src.chunks_exact(2).zip(dst.iter_mut()).enumerate() {
        let hi = ascii2byte(pair[0]).ok_or(i * 2)?;
        let lo = ascii2byte(pair[1]).ok_or(i * 2 + 1)?;
        *out = hi << 4 | lo;
    }

    Ok(())
}

/// Convert a nybble into its lowercase ASCII hex digit.
#[inline]
pub fn nybble2ascii(nybble: u8) -> u8 {
    match nybble {
        0..=9 => b'0' + nybble,
        10..=15 => b'a' + nybble - 10,
        // callers only ever pass the low 4 bits
        _ => nybble,
    }
}
