use core::fmt::{self, Write};

#[cfg(feature = "trace-regs")]
use alloc::string::String;

use num_traits::PrimInt;

use crate::internal::BeBytes;
use crate::protocol::common::nybble2ascii;

/// A wrapper around a [`fmt::Write`] sink which emits the hex encodings used
/// in register payloads.
///
/// Framing (the leading `$`, the checksum, and run-length encoding) is left
/// to whoever owns the connection; the writer only produces packet bodies.
pub struct ResponseWriter<'a, W: Write> {
    inner: &'a mut W,

    // buffer to log outgoing payloads. only allocates if logging is enabled.
    #[cfg(feature = "trace-regs")]
    msg: String,
}

impl<'a, W: Write + 'a> ResponseWriter<'a, W> {
    /// Creates a new ResponseWriter
    pub fn new(inner: &'a mut W) -> Self {
        Self {
            inner,

            #[cfg(feature = "trace-regs")]
            msg: String::new(),
        }
    }

    /// Consumes self, logging the payload written so far under `what`.
    pub fn finish(self, what: &str) {
        #[cfg(feature = "trace-regs")]
        trace_regs!("--> {}: {}", what, self.msg);

        #[cfg(not(feature = "trace-regs"))]
        let _ = what;
    }

    fn write(&mut self, byte: u8) -> fmt::Result {
        #[cfg(feature = "trace-regs")]
        if log_enabled!(log::Level::Trace) {
            self.msg.push(byte as char)
        }

        self.inner.write_char(byte as char)
    }

    /// Write an entire string.
    pub fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.as_bytes().iter() {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Write a single byte as a hex string (two lowercase ascii chars)
    pub fn write_hex(&mut self, byte: u8) -> fmt::Result {
        self.write(nybble2ascii(byte >> 4))?;
        self.write(nybble2ascii(byte & 0x0f))
    }

    /// Write a byte-buffer as a hex string (i.e: two ascii chars / byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) -> fmt::Result {
        for b in data.iter() {
            self.write_hex(*b)?;
        }
        Ok(())
    }

    /// Write `len` bytes worth of "unavailable" placeholders (two `x` chars
    /// per byte).
    pub fn write_unavailable(&mut self, len: usize) -> fmt::Result {
        for _ in 0..len * 2 {
            self.write(b'x')?;
        }
        Ok(())
    }

    /// Write a number as a big-endian hex string using the most compact
    /// representation possible (i.e: trimming leading zero bytes).
    pub fn write_num<D: BeBytes + PrimInt>(&mut self, digit: D) -> fmt::Result {
        if digit.is_zero() {
            return self.write_hex(0);
        }

        let mut buf = [0; 16];
        // infallible (unless digit is a >128 bit number)
        let len = digit.to_be_bytes(&mut buf).ok_or(fmt::Error)?;
        let buf = &buf[..len];
        for b in buf.iter().copied().skip_while(|&b| b == 0) {
            self.write_hex(b)?
        }
        Ok(())
    }
}
