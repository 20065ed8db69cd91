//! Community-created register descriptor tables for various architectures.
//!
//! Each architecture is an uninhabited type implementing
//! [`regcache::arch::Arch`]. Layouts follow the order GDB expects in `g`/`G`
//! packets for the corresponding `target.xml` architecture string.
//!
//! _Note:_ If an architecture is missing from this crate, that does _not_ mean
//! that it can't be used with `regcache`! So-long as the register layout is
//! known, building a [`TargetDescription`](regcache::arch::TargetDescription)
//! by hand is only a handful of lines.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod arm;
pub mod msp430;
pub mod riscv;
pub mod x86;
