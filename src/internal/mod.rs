//! Byte-order helpers for moving integers in and out of register-sized byte
//! slices.
//!
//! Unlike the inherent `{to,from}_{le,be}_bytes` methods on the integer types,
//! these operate on slices of _any_ length: a register narrower than the
//! integer is zero-extended on the way in, and a value is only accepted on
//! the way out if the truncated high bytes are all zero.

mod be_bytes;
mod le_bytes;

pub use be_bytes::*;
pub use le_bytes::*;
