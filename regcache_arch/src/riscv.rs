//! Implementations for the [RISC-V](https://riscv.org/) architecture.
//!
//! *Note*: currently only supports integer versions of the ISA.
//!
//! Useful links:
//! * [GNU binutils-gdb XML descriptions](https://github.com/bminor/binutils-gdb/blob/master/gdb/features/riscv)
//! * [riscv-tdep.h](https://github.com/bminor/binutils-gdb/blob/master/gdb/riscv-tdep.h)

use regcache::arch::{Arch, RegFlags, TargetDescription};
use regcache::DescriptionError;

fn riscv_regs(xlen: usize, xml: &'static str) -> Result<TargetDescription, DescriptionError> {
    TargetDescription::builder()
        .regs(&["zero", "ra"], xlen)
        .reg_with_flags("sp", xlen, RegFlags::SP)
        .regs(
            &[
                "gp", "tp", "t0", "t1", "t2", "fp", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
                "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3",
                "t4", "t5", "t6",
            ],
            xlen,
        )
        .reg("pc", xlen)
        .pc("pc")
        .expedite(&["ra", "sp", "fp", "pc"])
        .xml(xml)
        .build()
}

/// Implements `Arch` for 32-bit RISC-V.
pub enum Riscv32 {}

/// Implements `Arch` for 64-bit RISC-V.
pub enum Riscv64 {}

impl Arch for Riscv32 {
    fn description() -> Result<TargetDescription, DescriptionError> {
        riscv_regs(
            32,
            r#"<target version="1.0"><architecture>riscv:rv32</architecture></target>"#,
        )
    }
}

impl Arch for Riscv64 {
    fn description() -> Result<TargetDescription, DescriptionError> {
        riscv_regs(
            64,
            r#"<target version="1.0"><architecture>riscv:rv64</architecture></target>"#,
        )
    }
}
