//! Register payload codec.
//!
//! Every register is encoded as two lowercase hex digits per byte, in buffer
//! (i.e: target) byte order, with registers concatenated in ordinal order and
//! no separators. Registers without a known value are sent as a run of `x`
//! characters of the same width.
//!
//! Decoding is driven by the target description's register sizes, never by
//! the payload alone, and is all-or-nothing: a payload is fully validated
//! before a single byte of the cache is touched.

use alloc::string::String;
use core::fmt::Write;

use crate::arch::{Endianness, RegDesc};
use crate::protocol::common::{ascii2byte, decode_hex, decode_hex_buf, is_unavailable_marker};
use crate::protocol::ResponseWriter;
use crate::{RegCache, RegCacheError, RegStatus, StatusTracking};

/// Encode every register in `cache` into `out` (gdbserver's
/// `registers_to_string`, i.e: the body of a `g` reply).
///
/// Exactly `2 * register_cache_size()` characters are written.
pub fn registers_to_string<S, W>(cache: &RegCache<'_, S>, out: &mut W) -> Result<(), RegCacheError>
where
    S: StatusTracking,
    W: Write,
{
    let mut res = ResponseWriter::new(out);
    for n in 0..cache.description().num_regs() {
        write_register(&mut res, cache, n)?;
    }
    res.finish("registers");
    Ok(())
}

/// Convenience wrapper around [`registers_to_string`] which allocates the
/// output.
pub fn encode_registers<S: StatusTracking>(cache: &RegCache<'_, S>) -> String {
    let mut out = String::with_capacity(cache.description().register_cache_size() * 2);
    // writing into a `String` never fails
    let _ = registers_to_string(cache, &mut out);
    out
}

/// Encode a single register into `out`, `x`-filled if unavailable.
///
/// Exactly `2 * register_size(n)` characters are written.
///
/// # Panics
///
/// Panics if `n` is out of range.
pub fn collect_register_as_string<S, W>(
    cache: &RegCache<'_, S>,
    n: usize,
    out: &mut W,
) -> Result<(), RegCacheError>
where
    S: StatusTracking,
    W: Write,
{
    let mut res = ResponseWriter::new(out);
    write_register(&mut res, cache, n)?;
    res.finish("register");
    Ok(())
}

fn write_register<S: StatusTracking, W: Write>(
    res: &mut ResponseWriter<'_, W>,
    cache: &RegCache<'_, S>,
    n: usize,
) -> Result<(), RegCacheError> {
    match cache.status(n) {
        RegStatus::Valid => res.write_hex_buf(cache.register(n))?,
        RegStatus::Unavailable => res.write_unavailable(cache.description().register_size(n))?,
    }
    Ok(())
}

/// Write the expedited registers of a `T` stop reply, as a sequence of
/// `NN:value;` pairs (register number in hex, value as per
/// [`collect_register_as_string`]).
pub fn write_expedited<S, W>(cache: &RegCache<'_, S>, out: &mut W) -> Result<(), RegCacheError>
where
    S: StatusTracking,
    W: Write,
{
    let mut res = ResponseWriter::new(out);
    for n in cache.description().expedite_regs() {
        res.write_num(n)?;
        res.write_str(":")?;
        write_register(&mut res, cache, n)?;
        res.write_str(";")?;
    }
    res.finish("expedited");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    Value,
    Unavailable,
}

/// Validate the hex chunk for register `regno`, which starts at `base` in the
/// payload.
fn classify(regno: usize, chunk: &[u8], base: usize) -> Result<Chunk, RegCacheError> {
    if chunk.iter().copied().all(is_unavailable_marker) {
        return Ok(Chunk::Unavailable);
    }

    match chunk.iter().position(|&c| ascii2byte(c).is_none()) {
        None => Ok(Chunk::Value),
        Some(i) if is_unavailable_marker(chunk[i]) => {
            Err(RegCacheError::PartialUnavailable { regno })
        }
        Some(i) => Err(RegCacheError::InvalidHex { offset: base + i }),
    }
}

/// Decode an already validated chunk straight into the register's bytes.
fn apply<S: StatusTracking>(cache: &mut RegCache<'_, S>, regno: usize, chunk: &[u8], kind: Chunk) {
    match kind {
        Chunk::Unavailable => cache.set_status(regno, RegStatus::Unavailable),
        Chunk::Value => {
            let desc = *cache.description().find_register_by_number(regno);
            let endianness = cache.description().endianness();

            let dst = cache.register_mut(regno);
            // already validated by `classify`
            let _ = decode_hex_buf(chunk, dst);
            mask_unused_bits(&desc, endianness, dst);

            cache.set_status(regno, RegStatus::Valid);
        }
    }
}

/// Clear the bits beyond `bit_size` in the register's most significant byte.
fn mask_unused_bits(desc: &RegDesc, endianness: Endianness, bytes: &mut [u8]) {
    let mask = desc.top_byte_mask();
    let top = match endianness {
        Endianness::Little => bytes.last_mut(),
        Endianness::Big => bytes.first_mut(),
    };
    if let Some(top) = top {
        *top &= mask;
    }
}

/// Decode a full register payload into `cache` (gdbserver's
/// `registers_from_string`, i.e: the body of a `G` packet).
///
/// Registers sent as all-`x` are marked unavailable, and their bytes are left
/// untouched. Every other register is marked valid.
///
/// The payload must be exactly `2 * register_cache_size()` characters long.
/// On error, the cache is left completely unmodified.
pub fn registers_from_string<S: StatusTracking>(
    cache: &mut RegCache<'_, S>,
    buf: &[u8],
) -> Result<(), RegCacheError> {
    let desc = cache.description();

    let expected = desc.register_cache_size() * 2;
    if buf.len() != expected {
        warn!(
            "Wrong sized register packet (expected {} hex chars, got {})",
            expected,
            buf.len()
        );
        return Err(RegCacheError::PacketLength {
            expected,
            actual: buf.len(),
        });
    }

    for (n, reg) in desc.iter().enumerate() {
        let range = reg.offset * 2..(reg.offset + reg.size()) * 2;
        if let Err(e) = classify(n, &buf[range.clone()], range.start) {
            warn!("rejecting register packet: {}", e);
            return Err(e);
        }
    }

    for (n, reg) in desc.iter().enumerate() {
        let range = reg.offset * 2..(reg.offset + reg.size()) * 2;
        let chunk = &buf[range.clone()];
        let kind = classify(n, chunk, range.start)?;
        apply(cache, n, chunk, kind);
    }

    trace_regs!("<-- registers: {}", core::str::from_utf8(buf).unwrap_or("<non-utf8>"));
    Ok(())
}

/// Decode a single register's payload into `cache` (i.e: the value of a `P`
/// packet).
///
/// The payload must be exactly `2 * register_size(n)` characters long. An
/// unknown `n` is reported as [`RegCacheError::UnknownRegno`], since it
/// typically arrives straight off the wire.
pub fn supply_register_from_hex<S: StatusTracking>(
    cache: &mut RegCache<'_, S>,
    n: usize,
    buf: &[u8],
) -> Result<(), RegCacheError> {
    let size = match cache.description().get(n) {
        Some(reg) => reg.size(),
        None => {
            warn!("reg id {} does not map onto any known register", n);
            return Err(RegCacheError::UnknownRegno(n));
        }
    };

    if buf.len() != size * 2 {
        return Err(RegCacheError::PacketLength {
            expected: size * 2,
            actual: buf.len(),
        });
    }

    let kind = classify(n, buf, 0)?;
    apply(cache, n, buf, kind);

    trace_regs!("<-- register {:#x}: {}", n, core::str::from_utf8(buf).unwrap_or("<non-utf8>"));
    Ok(())
}

/// Parse the hex register number of a `p` / `P` packet.
pub fn parse_regno(buf: &[u8]) -> Result<usize, RegCacheError> {
    decode_hex(buf).map_err(|_| RegCacheError::MalformedRegno)
}
