//! The per-thread register cache.

use alloc::vec;
use alloc::vec::Vec;

use managed::ManagedSlice;

use crate::arch::TargetDescription;
use crate::{CoreAddr, RegCacheError};

mod status;

pub use status::{RegStatus, StatusTracking, Tracked, Untracked};

/// A snapshot of a thread's registers.
///
/// The register buffer is laid out according to the cache's
/// [`TargetDescription`], and is either owned by the cache or borrowed from
/// somewhere else (e.g: a register block embedded in a trace frame). Either
/// way, the cache is the buffer's only writer for as long as it lives.
///
/// Which registers actually hold a value is tracked separately from the bytes
/// themselves, via the `S` status strategy: bytes belonging to an
/// [`Unavailable`](RegStatus::Unavailable) register are stale, and are never
/// zeroed on invalidation.
///
/// Out-of-range register numbers and mis-sized buffers are caller bugs, and
/// cause a panic. Anything which may originate from untrusted protocol input
/// (register names, hex payloads) is reported via [`RegCacheError`].
#[derive(Debug)]
pub struct RegCache<'a, S: StatusTracking = Tracked> {
    desc: &'a TargetDescription,
    registers: ManagedSlice<'a, u8>,
    status: S,
    populated: bool,
}

impl<'a> RegCache<'a, Tracked> {
    /// Create an empty cache with a freshly allocated, zeroed register buffer.
    pub fn new(desc: &'a TargetDescription) -> RegCache<'a, Tracked> {
        RegCache::new_in(desc, vec![0; desc.register_cache_size()])
    }

    /// Create an empty cache on top of an externally owned register buffer.
    ///
    /// The buffer's contents are left as-is, but are considered unavailable
    /// until supplied (or until [`mark_all_valid`](Self::mark_all_valid) is
    /// called).
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly `desc.register_cache_size()` bytes.
    pub fn with_buffer(desc: &'a TargetDescription, buf: &'a mut [u8]) -> RegCache<'a, Tracked> {
        RegCache::new_in(desc, buf)
    }
}

impl<'a, S: StatusTracking> RegCache<'a, S> {
    /// Create an empty cache on top of either an owned (`Vec<u8>`) or borrowed
    /// (`&mut [u8]`) register buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not exactly `desc.register_cache_size()` bytes.
    pub fn new_in(
        desc: &'a TargetDescription,
        registers: impl Into<ManagedSlice<'a, u8>>,
    ) -> RegCache<'a, S> {
        let registers = registers.into();
        assert_eq!(
            registers.len(),
            desc.register_cache_size(),
            "register buffer does not match the target description"
        );

        RegCache {
            desc,
            registers,
            status: S::new(desc.num_regs()),
            populated: false,
        }
    }

    /// The target description this cache is laid out by.
    #[inline]
    pub fn description(&self) -> &'a TargetDescription {
        self.desc
    }

    /// Returns `true` if the register buffer is owned by the cache.
    pub fn is_owned(&self) -> bool {
        match self.registers {
            ManagedSlice::Borrowed(_) => false,
            ManagedSlice::Owned(_) => true,
        }
    }

    /// The raw register buffer. Bytes of unavailable registers are stale.
    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Whether the cache has been filled from the target since it was last
    /// invalidated.
    #[inline]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Record that the cache has been filled from the target.
    #[inline]
    pub fn set_populated(&mut self) {
        self.populated = true;
    }

    /// Status of register `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn status(&self, n: usize) -> RegStatus {
        self.desc.find_register_by_number(n);
        self.status.get(n)
    }

    /// Copy the entire contents of `src` (bytes, statuses, and populated
    /// flag) into `self` (gdbserver's `regcache_cpy`).
    ///
    /// The two caches stay independent afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the two caches have differently sized register buffers.
    pub fn copy_from(&mut self, src: &RegCache<'_, S>) {
        assert_eq!(
            self.desc.register_cache_size(),
            src.desc.register_cache_size(),
            "cannot copy between register caches of different targets"
        );
        self.registers.copy_from_slice(&src.registers);
        self.status.copy_from(&src.status);
        self.populated = src.populated;
    }

    /// Create an owned copy of this cache, detached from any borrowed buffer.
    pub fn snapshot(&self) -> RegCache<'a, S> {
        let mut copy = RegCache::new_in(self.desc, self.registers.to_vec());
        copy.copy_from(self);
        copy
    }

    /// Forget every cached value (gdbserver's `regcache_invalidate_one`).
    ///
    /// Called whenever the thread may have run. The buffer contents are left
    /// in place, but every register is marked unavailable.
    pub fn invalidate(&mut self) {
        self.populated = false;
        self.status.fill(RegStatus::Unavailable);
    }

    /// Mark every register valid without touching the buffer. Useful when a
    /// borrowed buffer already holds a complete register block.
    pub fn mark_all_valid(&mut self) {
        self.status.fill(RegStatus::Valid);
    }

    /// Store the value of register `n`, and mark it valid.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range, or `src` is not exactly
    /// `register_size(n)` bytes.
    pub fn supply_register(&mut self, n: usize, src: &[u8]) {
        self.register_mut(n).copy_from_slice(src);
        self.status.set(n, RegStatus::Valid);
    }

    /// Store an all-zero value for register `n`, and mark it valid.
    ///
    /// Zero here is a real value, used when a register has no meaningful
    /// value in a frame but a fixed-width field must still be reported.
    pub fn supply_register_zeroed(&mut self, n: usize) {
        self.register_mut(n).iter_mut().for_each(|b| *b = 0);
        self.status.set(n, RegStatus::Valid);
    }

    /// Store the value of the register called `name`, and mark it valid.
    pub fn supply_register_by_name(&mut self, name: &str, src: &[u8]) -> Result<(), RegCacheError> {
        let n = self.regno(name)?;
        self.supply_register(n, src);
        Ok(())
    }

    /// Store an entire register block, laid out as per the target
    /// description, and mark every register valid.
    ///
    /// Passing `None` instead marks every register unavailable, and zeroes
    /// the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the block isn't exactly `register_cache_size()` bytes.
    pub fn supply_regblock(&mut self, block: Option<&[u8]>) {
        match block {
            Some(block) => {
                self.registers.copy_from_slice(block);
                self.status.fill(RegStatus::Valid);
            }
            None => {
                self.registers.iter_mut().for_each(|b| *b = 0);
                self.status.fill(RegStatus::Unavailable);
            }
        }
    }

    /// Read the cached bytes of register `n` into `dst`.
    ///
    /// The register's status is _not_ checked. If it's unavailable, the
    /// copied bytes are stale.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range, or `dst` is not exactly
    /// `register_size(n)` bytes.
    pub fn collect_register(&self, n: usize, dst: &mut [u8]) {
        dst.copy_from_slice(self.register(n))
    }

    /// Read the cached bytes of the register called `name` into `dst`.
    pub fn collect_register_by_name(&self, name: &str, dst: &mut [u8]) -> Result<(), RegCacheError> {
        let n = self.regno(name)?;
        self.collect_register(n, dst);
        Ok(())
    }

    /// Borrow the cached bytes of register `n`. Stale if unavailable.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    #[inline]
    pub fn register(&self, n: usize) -> &[u8] {
        &self.registers[self.desc.find_register_by_number(n).range()]
    }

    /// Read the program counter (gdbserver's `regcache_read_pc`).
    pub fn read_pc(&self) -> CoreAddr {
        let mapping = self.desc.pc_mapping();
        let parts = mapping
            .regnos()
            .iter()
            .map(|&n| self.register(n))
            .collect::<Vec<_>>();
        mapping.compose(self.desc.endianness(), &parts)
    }

    /// Write the program counter (gdbserver's `regcache_write_pc`). Every
    /// register making up the PC is marked valid.
    pub fn write_pc(&mut self, pc: CoreAddr) {
        let desc = self.desc;
        let mapping = desc.pc_mapping();

        let mut parts = mapping
            .regnos()
            .iter()
            .map(|&n| vec![0; desc.register_size(n)])
            .collect::<Vec<_>>();
        {
            let mut views = parts.iter_mut().map(|p| p.as_mut_slice()).collect::<Vec<_>>();
            mapping.decompose(desc.endianness(), pc, &mut views);
        }

        for (&n, part) in mapping.regnos().iter().zip(parts.iter()) {
            self.supply_register(n, part);
        }
    }

    #[inline]
    pub(crate) fn register_mut(&mut self, n: usize) -> &mut [u8] {
        let range = self.desc.find_register_by_number(n).range();
        &mut self.registers[range]
    }

    #[inline]
    pub(crate) fn set_status(&mut self, n: usize, status: RegStatus) {
        self.status.set(n, status)
    }

    fn regno(&self, name: &str) -> Result<usize, RegCacheError> {
        match self.desc.find_regno(name) {
            Some(n) => Ok(n),
            None => {
                warn!("no register named `{}` in the target description", name);
                Err(RegCacheError::UnknownRegister)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_regs() -> TargetDescription {
        TargetDescription::builder()
            .reg("r0", 32)
            .reg("r1", 16)
            .reg("pc", 32)
            .pc("pc")
            .build()
            .unwrap()
    }

    #[test]
    fn new_cache_is_empty() {
        let desc = two_regs();
        let cache = RegCache::new(&desc);

        assert!(!cache.is_populated());
        assert!(cache.is_owned());
        assert_eq!(cache.registers(), &[0; 10]);
        for n in 0..desc.num_regs() {
            assert_eq!(cache.status(n), RegStatus::Unavailable);
        }
    }

    #[test]
    fn supply_then_collect() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_register(1, &[0xcd, 0xab]);
        assert_eq!(cache.status(1), RegStatus::Valid);
        assert_eq!(cache.status(0), RegStatus::Unavailable);

        let mut out = [0; 2];
        cache.collect_register(1, &mut out);
        assert_eq!(out, [0xcd, 0xab]);
        assert_eq!(cache.registers(), &[0, 0, 0, 0, 0xcd, 0xab, 0, 0, 0, 0]);
    }

    #[test]
    fn supply_zeroed_is_valid() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_register(0, &[1, 2, 3, 4]);
        cache.invalidate();
        cache.supply_register_zeroed(0);

        assert_eq!(cache.status(0), RegStatus::Valid);
        assert_eq!(cache.register(0), &[0; 4]);
    }

    #[test]
    fn by_name() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_register_by_name("r1", &[1, 2]).unwrap();
        let mut out = [0; 2];
        cache.collect_register_by_name("r1", &mut out).unwrap();
        assert_eq!(out, [1, 2]);

        assert_eq!(
            cache.supply_register_by_name("r9", &[1, 2]),
            Err(RegCacheError::UnknownRegister)
        );
        assert_eq!(
            cache.collect_register_by_name("", &mut out),
            Err(RegCacheError::UnknownRegister)
        );
    }

    #[test]
    fn invalidate_resets_status_but_not_bytes() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_regblock(Some(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
        cache.set_populated();
        cache.invalidate();

        assert!(!cache.is_populated());
        for n in 0..desc.num_regs() {
            assert_eq!(cache.status(n), RegStatus::Unavailable);
        }
        assert_eq!(cache.registers(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn regblock_none_clears_everything() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_regblock(Some(&[0xff; 10]));
        cache.supply_regblock(None);

        assert_eq!(cache.registers(), &[0; 10]);
        assert_eq!(cache.status(2), RegStatus::Unavailable);
    }

    #[test]
    fn copy_is_by_value() {
        let desc = two_regs();
        let mut src = RegCache::new(&desc);
        let mut dst = RegCache::new(&desc);

        src.supply_register(0, &[1, 1, 1, 1]);
        src.set_populated();
        dst.copy_from(&src);

        assert!(dst.is_populated());
        assert_eq!(dst.status(0), RegStatus::Valid);
        assert_eq!(dst.status(1), RegStatus::Unavailable);

        src.supply_register(0, &[2, 2, 2, 2]);
        assert_eq!(dst.register(0), &[1, 1, 1, 1]);

        dst.supply_register(1, &[3, 3]);
        assert_eq!(src.status(1), RegStatus::Unavailable);
    }

    #[test]
    #[should_panic]
    fn copy_between_targets_panics() {
        let a = two_regs();
        let b = TargetDescription::builder().reg("pc", 16).pc("pc").build().unwrap();

        let mut dst = RegCache::new(&a);
        dst.copy_from(&RegCache::new(&b));
    }

    #[test]
    fn borrowed_buffer() {
        let desc = two_regs();
        let mut block = [7u8; 10];
        {
            let mut cache = RegCache::with_buffer(&desc, &mut block);
            assert!(!cache.is_owned());
            assert_eq!(cache.status(0), RegStatus::Unavailable);
            assert_eq!(cache.register(0), &[7; 4]);

            cache.mark_all_valid();
            assert_eq!(cache.status(2), RegStatus::Valid);

            let snapshot = cache.snapshot();
            assert!(snapshot.is_owned());
            assert_eq!(snapshot.status(2), RegStatus::Valid);

            cache.supply_register(1, &[0, 0]);
            assert_eq!(snapshot.register(1), &[7, 7]);
        }
        assert_eq!(block, [7, 7, 7, 7, 0, 0, 7, 7, 7, 7]);
    }

    #[test]
    #[should_panic]
    fn borrowed_buffer_must_match_description() {
        let desc = two_regs();
        let mut block = [0u8; 9];
        RegCache::with_buffer(&desc, &mut block);
    }

    #[test]
    #[should_panic]
    fn supply_out_of_range_panics() {
        let desc = two_regs();
        RegCache::new(&desc).supply_register(3, &[0; 4]);
    }

    #[test]
    fn pc_round_trip() {
        let desc = two_regs();
        let mut cache = RegCache::new(&desc);

        cache.supply_register_by_name("pc", &[0x00, 0x80, 0x00, 0x08]).unwrap();
        assert_eq!(cache.read_pc(), 0x0800_8000);

        cache.write_pc(0x1000);
        assert_eq!(cache.register(2), &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(cache.status(2), RegStatus::Valid);
    }

    #[test]
    fn untracked_reports_everything_valid() {
        let desc = two_regs();
        let mut block = [0u8; 10];
        let mut cache = RegCache::<Untracked>::new_in(&desc, &mut block[..]);

        assert_eq!(cache.status(1), RegStatus::Valid);
        cache.supply_register(0, &[9, 9, 9, 9]);
        cache.set_populated();
        cache.invalidate();
        assert!(!cache.is_populated());
        assert_eq!(cache.status(0), RegStatus::Valid);
        assert_eq!(cache.register(0), &[9; 4]);
    }
}
