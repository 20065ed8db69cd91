//! Implementations for various ARM architectures.

use regcache::arch::{Arch, RegFlags, TargetDescription};
use regcache::DescriptionError;

/// Implements `Arch` for ARMv4T
///
/// Layout matches GDB's legacy `arm` register set: the 16 core registers,
/// the (unused) FPA registers `f0`-`f7` and `fps`, and finally `cpsr`.
///
/// Source: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/arm/arm-core.xml>
/// Additionally: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/arm/arm-fpa.xml>
pub enum Armv4t {}

impl Arch for Armv4t {
    fn description() -> Result<TargetDescription, DescriptionError> {
        TargetDescription::builder()
            .regs(
                &[
                    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11",
                    "r12",
                ],
                32,
            )
            .reg_with_flags("sp", 32, RegFlags::SP)
            .reg("lr", 32)
            .reg("pc", 32)
            // FPA registers are 96 bits wide
            .regs(&["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7"], 96)
            .reg("fps", 32)
            .reg("cpsr", 32)
            .pc("pc")
            .expedite(&["r11", "sp", "pc"])
            .xml(r#"<target version="1.0"><architecture>armv4t</architecture></target>"#)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use regcache::protocol::encode_registers;
    use regcache::RegCache;

    #[test]
    fn layout() {
        let desc = Armv4t::description().unwrap();
        assert_eq!(desc.num_regs(), 26);
        // 16 core regs + 8 * 12 byte FPA regs + fps + cpsr
        assert_eq!(desc.register_cache_size(), 168);
        assert_eq!(desc.find_regno("cpsr"), Some(25));
        assert_eq!(desc.find_register_by_number(16).offset, 64);
        assert_eq!(desc.expedite_regs().collect::<Vec<_>>(), [11, 13, 15]);
    }

    #[test]
    fn pc() {
        let desc = Armv4t::description().unwrap();
        let mut cache = RegCache::new(&desc);
        cache.write_pc(0x0800_0130);
        assert_eq!(cache.read_pc(), 0x0800_0130);
        assert_eq!(cache.register(15), &[0x30, 0x01, 0x00, 0x08]);

        let hex = encode_registers(&cache);
        assert_eq!(hex.len(), 336);
        assert_eq!(&hex[120..136], "30010008xxxxxxxx");
    }
}
