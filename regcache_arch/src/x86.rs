//! Implementations for various x86 architectures.

use regcache::arch::{
    addr_from_bytes, addr_to_bytes, Arch, Endianness, PcMapping, RegFlags, TargetDescription,
    TargetDescriptionBuilder,
};
use regcache::{CoreAddr, DescriptionError};

const EIP: usize = 8;
const CS: usize = 10;

/// 32-bit x86 core registers (+ SSE extensions).
///
/// Source: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/i386/32bit-core.xml>
/// Additionally: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/i386/32bit-sse.xml>
fn core32_regs() -> TargetDescriptionBuilder {
    TargetDescription::builder()
        .regs(&["eax", "ecx", "edx", "ebx"], 32)
        .reg_with_flags("esp", 32, RegFlags::SP)
        .regs(&["ebp", "esi", "edi", "eip", "eflags"], 32)
        .regs(&["cs", "ss", "ds", "es", "fs", "gs"], 32)
        .regs(&["st0", "st1", "st2", "st3", "st4", "st5", "st6", "st7"], 80)
        .regs(
            &["fctrl", "fstat", "ftag", "fiseg", "fioff", "foseg", "fooff", "fop"],
            32,
        )
        .regs(
            &["xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7"],
            128,
        )
        .reg("mxcsr", 32)
        .expedite(&["ebp", "esp", "eip"])
}

/// Implements `Arch` for 32-bit x86 + SSE Extensions.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
pub enum X86_SSE {}

impl Arch for X86_SSE {
    fn description() -> Result<TargetDescription, DescriptionError> {
        core32_regs()
            .pc("eip")
            .xml(r#"<target version="1.0"><architecture>i386:intel</architecture><feature name="org.gnu.gdb.i386.sse"></feature></target>"#)
            .build()
    }
}

/// Implements `Arch` for the 8086, running in real mode.
///
/// Uses the 32-bit register layout, with the program counter formed from
/// `cs:eip` (see [`SegmentedPc`]).
pub enum I8086 {}

impl Arch for I8086 {
    fn description() -> Result<TargetDescription, DescriptionError> {
        core32_regs()
            .pc_mapping(SegmentedPc::new(CS, EIP))
            .xml(r#"<target version="1.0"><architecture>i8086</architecture></target>"#)
            .build()
    }
}

/// A real-mode program counter, split across a segment register and a 16-bit
/// offset register.
///
/// The linear address is `(segment << 4) + offset`. When writing, the address
/// is split into a 64K aligned segment and the remaining offset.
#[derive(Debug, Clone, Copy)]
pub struct SegmentedPc {
    regnos: [usize; 2],
}

impl SegmentedPc {
    /// Create a new mapping from the `segment` and `offset` register ordinals.
    pub fn new(segment: usize, offset: usize) -> SegmentedPc {
        SegmentedPc {
            regnos: [segment, offset],
        }
    }
}

impl PcMapping for SegmentedPc {
    fn regnos(&self) -> &[usize] {
        &self.regnos
    }

    fn compose(&self, endianness: Endianness, parts: &[&[u8]]) -> CoreAddr {
        let segment = addr_from_bytes(endianness, parts[0]) & 0xffff;
        let offset = addr_from_bytes(endianness, parts[1]) & 0xffff;
        (segment << 4) + offset
    }

    fn decompose(&self, endianness: Endianness, pc: CoreAddr, parts: &mut [&mut [u8]]) {
        let (segment, offset) = parts.split_at_mut(1);
        addr_to_bytes(endianness, (pc >> 4) & 0xf000, segment[0]);
        addr_to_bytes(endianness, pc & 0xffff, offset[0]);
    }
}
