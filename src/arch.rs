//! Target register descriptions.
//!
//! A [`TargetDescription`] is the register descriptor table for a single
//! target: the ordered list of registers (name, bit size, byte offset into
//! the register buffer), the target's byte order, which register(s) make up
//! the program counter, and (optionally) the target's `target.xml`.
//!
//! Descriptions are immutable once built, and are passed by reference to
//! every [`RegCache`](crate::RegCache) constructed for the target. Nothing in
//! this crate keeps a global "current" description, so caches for several
//! different targets may happily coexist in a single process.
//!
//! # Community created descriptions
//!
//! Before writing a description by hand, check out `regcache_arch`, which
//! aggregates ready-made descriptions for most common architectures.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Range;

use crate::internal::{BeBytes, LeBytes};
use crate::{CoreAddr, DescriptionError};

bitflags::bitflags! {
    /// Semantic roles a register may play.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct RegFlags: u8 {
        /// Register is (part of) the program counter.
        const PC = 1 << 0;
        /// Register is the stack pointer.
        const SP = 1 << 1;
        /// Register is reported in stop replies ("expedited").
        const EXPEDITE = 1 << 2;
    }
}

/// Byte order of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Little
    }
}

/// Static metadata describing a single register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegDesc {
    /// Register name, as used in `target.xml` and by name-based lookups.
    pub name: &'static str,
    /// Width of the register in bits.
    pub bit_size: usize,
    /// Byte offset of the register within the register buffer.
    pub offset: usize,
    /// Semantic roles of the register.
    pub flags: RegFlags,
}

impl RegDesc {
    /// Number of bytes the register occupies in the register buffer.
    ///
    /// Registers whose width is not a multiple of 8 are rounded up.
    #[inline]
    pub fn size(&self) -> usize {
        (self.bit_size + 7) / 8
    }

    /// Byte range of the register within the register buffer.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size()
    }

    /// Mask for the most significant storage byte, clearing bits beyond
    /// `bit_size`. `0xff` for byte-aligned registers.
    #[inline]
    pub fn top_byte_mask(&self) -> u8 {
        match self.bit_size % 8 {
            0 => 0xff,
            bits => (1u8 << bits) - 1,
        }
    }
}

/// An architecture with a fixed register layout.
///
/// Implemented on uninhabited types (e.g: `pub enum Armv4t {}`), as the
/// architecture itself carries no state.
pub trait Arch {
    /// Build the architecture's register descriptor table.
    fn description() -> Result<TargetDescription, DescriptionError>;
}

/// Maps the program counter onto one or more registers.
///
/// Most targets keep the PC in a single register, which is handled by
/// [`SingleRegPc`]. Targets which spread the PC over several registers (e.g:
/// x86 real mode's `cs:ip`) provide their own implementation, and are
/// responsible for any composition / decomposition of the value. The cache
/// only moves the raw register bytes.
pub trait PcMapping: Debug + Send + Sync {
    /// Ordinals of the registers making up the program counter.
    fn regnos(&self) -> &[usize];

    /// Assemble the program counter from the raw bytes of each register in
    /// [`regnos`](Self::regnos), in the same order.
    fn compose(&self, endianness: Endianness, parts: &[&[u8]]) -> CoreAddr;

    /// Split `pc` into raw register bytes. `parts` has one correctly sized
    /// slice per register in [`regnos`](Self::regnos), in the same order.
    fn decompose(&self, endianness: Endianness, pc: CoreAddr, parts: &mut [&mut [u8]]);
}

/// A program counter held in a single register.
#[derive(Debug, Clone, Copy)]
pub struct SingleRegPc {
    regno: [usize; 1],
}

impl SingleRegPc {
    /// Create a new mapping onto the register with ordinal `regno`.
    pub fn new(regno: usize) -> SingleRegPc {
        SingleRegPc { regno: [regno] }
    }
}

impl PcMapping for SingleRegPc {
    fn regnos(&self) -> &[usize] {
        &self.regno
    }

    fn compose(&self, endianness: Endianness, parts: &[&[u8]]) -> CoreAddr {
        addr_from_bytes(endianness, parts[0])
    }

    fn decompose(&self, endianness: Endianness, pc: CoreAddr, parts: &mut [&mut [u8]]) {
        addr_to_bytes(endianness, pc, parts[0])
    }
}

/// Read an address out of a register, ignoring any bytes beyond the width of
/// [`CoreAddr`].
pub fn addr_from_bytes(endianness: Endianness, bytes: &[u8]) -> CoreAddr {
    const WIDTH: usize = core::mem::size_of::<CoreAddr>();
    let addr: Option<CoreAddr> = match endianness {
        Endianness::Little => LeBytes::from_le_bytes(&bytes[..bytes.len().min(WIDTH)]),
        Endianness::Big => BeBytes::from_be_bytes(&bytes[bytes.len().saturating_sub(WIDTH)..]),
    };
    // both arms are handed at most `WIDTH` bytes, and can't overflow
    addr.unwrap_or(0)
}

/// Write an address into a register, truncating it to the register's width.
pub fn addr_to_bytes(endianness: Endianness, addr: CoreAddr, buf: &mut [u8]) {
    let addr = match buf.len() {
        n if n >= core::mem::size_of::<CoreAddr>() => addr,
        n => addr & ((1 << (n * 8)) - 1),
    };
    let written = match endianness {
        Endianness::Little => LeBytes::to_le_bytes(addr, buf),
        Endianness::Big => BeBytes::to_be_bytes(addr, buf),
    };
    debug_assert_eq!(written, Some(buf.len()));
}

/// An immutable register descriptor table.
///
/// Built via [`TargetDescription::builder`].
#[derive(Debug)]
pub struct TargetDescription {
    regs: Vec<RegDesc>,
    size: usize,
    endianness: Endianness,
    pc: Box<dyn PcMapping>,
    xml: Option<&'static str>,
}

impl TargetDescription {
    /// Start building a new description.
    pub fn builder() -> TargetDescriptionBuilder {
        TargetDescriptionBuilder::new()
    }

    /// Number of registers.
    #[inline]
    pub fn num_regs(&self) -> usize {
        self.regs.len()
    }

    /// Size of the whole register buffer, in bytes (gdbserver's
    /// `register_cache_size`).
    #[inline]
    pub fn register_cache_size(&self) -> usize {
        self.size
    }

    /// Size of register `n`, in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    #[inline]
    pub fn register_size(&self, n: usize) -> usize {
        self.find_register_by_number(n).size()
    }

    /// Return the descriptor of register `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn find_register_by_number(&self, n: usize) -> &RegDesc {
        match self.regs.get(n) {
            Some(reg) => reg,
            None => panic!(
                "register number {} out of range (target has {} registers)",
                n,
                self.regs.len()
            ),
        }
    }

    /// Return the descriptor of register `n`, or `None` if it doesn't exist.
    #[inline]
    pub fn get(&self, n: usize) -> Option<&RegDesc> {
        self.regs.get(n)
    }

    /// Look up a register's ordinal by name.
    pub fn find_regno(&self, name: &str) -> Option<usize> {
        self.regs.iter().position(|reg| reg.name == name)
    }

    /// Iterate over every register descriptor, in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &RegDesc> + '_ {
        self.regs.iter()
    }

    /// Ordinals of every register reported in stop replies.
    pub fn expedite_regs(&self) -> impl Iterator<Item = usize> + '_ {
        self.regs
            .iter()
            .enumerate()
            .filter(|(_, reg)| reg.flags.contains(RegFlags::EXPEDITE))
            .map(|(n, _)| n)
    }

    /// Target byte order.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The target's program counter mapping.
    #[inline]
    pub fn pc_mapping(&self) -> &dyn PcMapping {
        self.pc.as_ref()
    }

    /// The target's `target.xml`, if one was provided.
    ///
    /// See the [GDB docs](https://sourceware.org/gdb/current/onlinedocs/gdb/Target-Description-Format.html)
    /// for details on the target description XML format.
    #[inline]
    pub fn xml(&self) -> Option<&'static str> {
        self.xml
    }
}

enum PcSpec {
    Name(&'static str),
    Mapping(Box<dyn PcMapping>),
}

/// Builder for [`TargetDescription`].
///
/// Registers are declared in ordinal order; byte offsets are assigned
/// back-to-back.
///
/// ```
/// use regcache::arch::TargetDescription;
///
/// let desc = TargetDescription::builder()
///     .reg("r0", 32)
///     .reg("sp", 32)
///     .reg("pc", 32)
///     .pc("pc")
///     .expedite(&["sp", "pc"])
///     .build()
///     .unwrap();
///
/// assert_eq!(desc.register_cache_size(), 12);
/// assert_eq!(desc.find_regno("sp"), Some(1));
/// ```
pub struct TargetDescriptionBuilder {
    regs: Vec<RegDesc>,
    size: usize,
    endianness: Endianness,
    pc: Option<PcSpec>,
    expedite: Vec<&'static str>,
    xml: Option<&'static str>,
}

impl TargetDescriptionBuilder {
    fn new() -> TargetDescriptionBuilder {
        TargetDescriptionBuilder {
            regs: Vec::new(),
            size: 0,
            endianness: Endianness::Little,
            pc: None,
            expedite: Vec::new(),
            xml: None,
        }
    }

    /// Append a register.
    pub fn reg(self, name: &'static str, bit_size: usize) -> Self {
        self.reg_with_flags(name, bit_size, RegFlags::empty())
    }

    /// Append a register with the given semantic roles.
    pub fn reg_with_flags(mut self, name: &'static str, bit_size: usize, flags: RegFlags) -> Self {
        let reg = RegDesc {
            name,
            bit_size,
            offset: self.size,
            flags,
        };
        self.size += reg.size();
        self.regs.push(reg);
        self
    }

    /// Append several registers of the same width.
    pub fn regs(mut self, names: &[&'static str], bit_size: usize) -> Self {
        for name in names {
            self = self.reg(*name, bit_size);
        }
        self
    }

    /// Set the target byte order (defaults to little endian).
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Use the named register as the program counter.
    pub fn pc(mut self, name: &'static str) -> Self {
        self.pc = Some(PcSpec::Name(name));
        self
    }

    /// Use a custom program counter mapping.
    pub fn pc_mapping(mut self, mapping: impl PcMapping + 'static) -> Self {
        self.pc = Some(PcSpec::Mapping(Box::new(mapping)));
        self
    }

    /// Mark the named registers as expedited in stop replies.
    pub fn expedite(mut self, names: &[&'static str]) -> Self {
        self.expedite.extend_from_slice(names);
        self
    }

    /// Attach a `target.xml` description.
    pub fn xml(mut self, xml: &'static str) -> Self {
        self.xml = Some(xml);
        self
    }

    /// Validate and build the description.
    pub fn build(mut self) -> Result<TargetDescription, DescriptionError> {
        if self.regs.is_empty() {
            return Err(DescriptionError::Empty);
        }

        for (i, reg) in self.regs.iter().enumerate() {
            if reg.bit_size == 0 {
                return Err(DescriptionError::ZeroSized(reg.name));
            }
            if self.regs[..i].iter().any(|r| r.name == reg.name) {
                return Err(DescriptionError::DuplicateName(reg.name));
            }
        }

        let pc: Box<dyn PcMapping> = match self.pc.take() {
            None => return Err(DescriptionError::MissingPc),
            Some(PcSpec::Name(name)) => Box::new(SingleRegPc::new(self.lookup(name)?)),
            Some(PcSpec::Mapping(mapping)) => mapping,
        };
        if pc.regnos().is_empty() {
            return Err(DescriptionError::MissingPc);
        }
        for &n in pc.regnos() {
            match self.regs.get_mut(n) {
                Some(reg) => reg.flags |= RegFlags::PC,
                None => return Err(DescriptionError::PcOutOfRange(n)),
            }
        }

        for name in core::mem::take(&mut self.expedite) {
            let n = self.lookup(name)?;
            self.regs[n].flags |= RegFlags::EXPEDITE;
        }

        Ok(TargetDescription {
            regs: self.regs,
            size: self.size,
            endianness: self.endianness,
            pc,
            xml: self.xml,
        })
    }

    fn lookup(&self, name: &'static str) -> Result<usize, DescriptionError> {
        self.regs
            .iter()
            .position(|reg| reg.name == name)
            .ok_or(DescriptionError::UnknownRegister(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd_sizes() -> TargetDescription {
        TargetDescription::builder()
            .reg("r0", 32)
            .reg("r1", 16)
            .reg("flags", 20)
            .reg("pc", 64)
            .pc("pc")
            .expedite(&["pc"])
            .build()
            .unwrap()
    }

    #[test]
    fn offsets_are_contiguous() {
        let desc = odd_sizes();
        let offsets = desc.iter().map(|r| r.offset).collect::<Vec<_>>();
        assert_eq!(offsets, [0, 4, 6, 9]);
        assert_eq!(desc.register_cache_size(), 17);
        assert_eq!(desc.register_size(2), 3);
    }

    #[test]
    fn partial_byte_mask() {
        let desc = odd_sizes();
        assert_eq!(desc.find_register_by_number(2).top_byte_mask(), 0x0f);
        assert_eq!(desc.find_register_by_number(0).top_byte_mask(), 0xff);
    }

    #[test]
    fn lookups() {
        let desc = odd_sizes();
        assert_eq!(desc.find_regno("flags"), Some(2));
        assert_eq!(desc.find_regno("r7"), None);
        assert_eq!(desc.pc_mapping().regnos(), &[3]);
        assert!(desc.find_register_by_number(3).flags.contains(RegFlags::PC));
        assert_eq!(desc.expedite_regs().collect::<Vec<_>>(), [3]);
    }

    #[test]
    #[should_panic]
    fn out_of_range_regno_panics() {
        odd_sizes().register_size(4);
    }

    #[test]
    fn builder_errors() {
        let err = TargetDescription::builder().pc("pc").build().unwrap_err();
        assert_eq!(err, DescriptionError::Empty);

        let err = TargetDescription::builder()
            .reg("a", 8)
            .reg("a", 8)
            .pc("a")
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptionError::DuplicateName("a"));

        let err = TargetDescription::builder().reg("a", 0).pc("a").build().unwrap_err();
        assert_eq!(err, DescriptionError::ZeroSized("a"));

        let err = TargetDescription::builder().reg("a", 8).build().unwrap_err();
        assert_eq!(err, DescriptionError::MissingPc);

        let err = TargetDescription::builder().reg("a", 8).pc("pc").build().unwrap_err();
        assert_eq!(err, DescriptionError::UnknownRegister("pc"));

        let err = TargetDescription::builder()
            .reg("a", 8)
            .pc_mapping(SingleRegPc::new(3))
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptionError::PcOutOfRange(3));
    }

    #[test]
    fn single_reg_pc_byte_order() {
        let pc = SingleRegPc::new(0);

        let mut reg = [0u8; 4];
        pc.decompose(Endianness::Little, 0x1234_5678, &mut [&mut reg[..]]);
        assert_eq!(reg, [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(pc.compose(Endianness::Little, &[&reg[..]]), 0x1234_5678);

        pc.decompose(Endianness::Big, 0x1234_5678, &mut [&mut reg[..]]);
        assert_eq!(reg, [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(pc.compose(Endianness::Big, &[&reg[..]]), 0x1234_5678);
    }

    #[test]
    fn narrow_pc_truncates() {
        let mut reg = [0u8; 2];
        addr_to_bytes(Endianness::Little, 0xdead_beef, &mut reg);
        assert_eq!(reg, [0xef, 0xbe]);
    }
}
