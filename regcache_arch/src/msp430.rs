//! Implementations for the TI-MSP430 family of MCUs.

use regcache::arch::{Arch, RegFlags, TargetDescription, TargetDescriptionBuilder};
use regcache::DescriptionError;

const GPRS: [&str; 12] = [
    "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
];

fn msp430_regs(width: usize) -> TargetDescriptionBuilder {
    TargetDescription::builder()
        .reg("pc", width)
        .reg_with_flags("sp", width, RegFlags::SP)
        .reg("sr", width)
        .reg("cg", width)
        .regs(&GPRS, width)
        .pc("pc")
        .expedite(&["sp", "pc"])
}

/// Implements `Arch` for standard 16-bit TI-MSP430 MCUs.
pub enum Msp430 {}

impl Arch for Msp430 {
    fn description() -> Result<TargetDescription, DescriptionError> {
        msp430_regs(16)
            .xml(r#"<target version="1.0"><architecture>msp430</architecture></target>"#)
            .build()
    }
}

/// Implements `Arch` for 20-bit TI-MSP430 MCUs (CPUX).
///
/// GDB transfers the 20-bit registers in 32-bit slots.
pub enum Msp430X {}

impl Arch for Msp430X {
    fn description() -> Result<TargetDescription, DescriptionError> {
        msp430_regs(32)
            .xml(r#"<target version="1.0"><architecture>msp430x</architecture></target>"#)
            .build()
    }
}
