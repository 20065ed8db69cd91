//! A register cache for GDB Remote Serial Protocol stubs, along with the hex
//! codec used to move register payloads (`g`, `G`, `p`, `P`, and the
//! expedited registers of a `T` stop reply) over the wire.
//!
//! The crate is split into a few loosely coupled pieces:
//!
//! - [`arch::TargetDescription`]: an immutable register descriptor table
//!   (names, bit sizes, byte offsets, and a [`PcMapping`](arch::PcMapping)).
//!   Ready-made tables for common targets live in the companion
//!   `regcache_arch` crate.
//! - [`RegCache`]: a per-thread register snapshot, backed by either an owned
//!   or a borrowed byte buffer, with per-register [`RegStatus`] tracking.
//! - [`directory::ThreadRegCaches`]: a thread-id keyed collection of caches
//!   which lazily fetches registers from a
//!   [`FetchRegisters`](directory::FetchRegisters) backend.
//! - [`protocol`]: the wire codec.
//!
//! ## Minimal builds
//!
//! Status tracking is selected at the type level. `RegCache<'_, Tracked>`
//! (the default) records a [`RegStatus`] for every register, while
//! `RegCache<'_, Untracked>` carries no status array at all and reports
//! every register as valid. Combined with a borrowed buffer, the register
//! bytes themselves never live on the heap.
//!
//! ## Features
//!
//! - `std`: implements `std::error::Error` on all error types.
//! - `trace-regs`: logs every encoded / decoded register payload via
//!   `trace!`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate log;

cfg_if::cfg_if! {
    if #[cfg(feature = "trace-regs")] {
        macro_rules! trace_regs {
            ($($tt:tt)*) => { trace!($($tt)*) };
        }
    } else {
        macro_rules! trace_regs {
            ($($tt:tt)*) => {};
        }
    }
}

pub mod arch;
pub mod directory;
pub mod internal;
pub mod protocol;

mod error;
mod regcache;

pub use error::{DescriptionError, RegCacheError};
pub use regcache::{RegCache, RegStatus, StatusTracking, Tracked, Untracked};

/// Target address type used by program counter accessors (gdbserver's
/// `CORE_ADDR`).
pub type CoreAddr = u64;
