use core::fmt::{self, Display};

/// A recoverable error caused by untrusted register data, typically an
/// incoming protocol payload.
///
/// The cache is never partially updated when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegCacheError {
    /// The register name does not exist in the target description.
    UnknownRegister,
    /// The register number does not exist in the target description.
    UnknownRegno(usize),
    /// A register number is not a valid hex number.
    MalformedRegno,
    /// Hex payload has the wrong number of characters.
    PacketLength {
        /// Number of hex characters required by the target description.
        expected: usize,
        /// Number of hex characters received.
        actual: usize,
    },
    /// Non-hex character at the given offset into the payload.
    InvalidHex {
        /// Offset of the offending character.
        offset: usize,
    },
    /// Register chunk mixes `x` placeholders with hex digits.
    PartialUnavailable {
        /// Ordinal of the offending register.
        regno: usize,
    },
    /// The output sink refused a write.
    Format,
}

impl From<fmt::Error> for RegCacheError {
    fn from(_: fmt::Error) -> Self {
        RegCacheError::Format
    }
}

impl Display for RegCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::RegCacheError::*;
        match self {
            UnknownRegister => write!(f, "No such register in the target description."),
            UnknownRegno(n) => write!(f, "Register number {} is not part of the target description.", n),
            MalformedRegno => write!(f, "Malformed register number."),
            PacketLength { expected, actual } => write!(f, "Wrong sized register packet (expected {} hex chars, got {}).", expected, actual),
            InvalidHex { offset } => write!(f, "Invalid hex digit at offset {} of register packet.", offset),
            PartialUnavailable { regno } => write!(f, "Register {} is only partially marked unavailable.", regno),
            Format => write!(f, "Could not write to the output buffer."),
        }
    }
}

/// An error raised while building a
/// [`TargetDescription`](crate::arch::TargetDescription).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DescriptionError {
    /// The description has no registers.
    Empty,
    /// A register was declared with a bit size of zero.
    ZeroSized(&'static str),
    /// Two registers share a name.
    DuplicateName(&'static str),
    /// The program counter (or an expedited register) names a register
    /// which was never declared.
    UnknownRegister(&'static str),
    /// The program counter mapping refers to a register number which is out
    /// of range.
    PcOutOfRange(usize),
    /// A program counter was never configured.
    MissingPc,
}

impl Display for DescriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::DescriptionError::*;
        match self {
            Empty => write!(f, "Target description has no registers."),
            ZeroSized(name) => write!(f, "Register `{}` has a bit size of zero.", name),
            DuplicateName(name) => write!(f, "Register `{}` is declared more than once.", name),
            UnknownRegister(name) => write!(f, "Register `{}` is not part of the target description.", name),
            PcOutOfRange(n) => write!(f, "Program counter maps onto register number {}, which is out of range.", n),
            MissingPc => write!(f, "Target description does not name a program counter."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegCacheError {}

#[cfg(feature = "std")]
impl std::error::Error for DescriptionError {}
