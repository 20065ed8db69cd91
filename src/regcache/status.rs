use alloc::vec;
use alloc::vec::Vec;

/// Availability of a single register's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegStatus {
    /// The register exists, but its value is unknown (e.g: not yet fetched,
    /// or not collected in a trace frame). The cached bytes are stale and
    /// must not be trusted.
    Unavailable,
    /// The cached bytes hold the register's value.
    Valid,
}

impl RegStatus {
    /// Returns `true` if the status is [`RegStatus::Valid`].
    #[inline(always)]
    pub fn is_valid(self) -> bool {
        self == RegStatus::Valid
    }
}

/// Strategy used by a [`RegCache`](crate::RegCache) to record per-register
/// [`RegStatus`].
///
/// The choice is made at the type level, so the untracked variant carries no
/// status storage and no branches on the hot path.
pub trait StatusTracking: Sized {
    /// Create status storage for `num_regs` registers, all unavailable.
    fn new(num_regs: usize) -> Self;

    /// Status of register `n`.
    fn get(&self, n: usize) -> RegStatus;

    /// Set the status of register `n`.
    fn set(&mut self, n: usize, status: RegStatus);

    /// Set the status of every register.
    fn fill(&mut self, status: RegStatus);

    /// Overwrite `self` with the statuses in `src`.
    fn copy_from(&mut self, src: &Self);
}

/// Records a [`RegStatus`] for every register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked(Vec<RegStatus>);

impl StatusTracking for Tracked {
    fn new(num_regs: usize) -> Self {
        Tracked(vec![RegStatus::Unavailable; num_regs])
    }

    #[inline]
    fn get(&self, n: usize) -> RegStatus {
        self.0[n]
    }

    #[inline]
    fn set(&mut self, n: usize, status: RegStatus) {
        self.0[n] = status
    }

    fn fill(&mut self, status: RegStatus) {
        self.0.iter_mut().for_each(|s| *s = status)
    }

    fn copy_from(&mut self, src: &Self) {
        self.0.copy_from_slice(&src.0)
    }
}

/// Records nothing: every register always reports [`RegStatus::Valid`].
///
/// Intended for resource constrained builds which only ever hold complete
/// register blocks (e.g: an in-process agent collecting trace frames).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Untracked;

impl StatusTracking for Untracked {
    #[inline(always)]
    fn new(_num_regs: usize) -> Self {
        Untracked
    }

    #[inline(always)]
    fn get(&self, _n: usize) -> RegStatus {
        RegStatus::Valid
    }

    #[inline(always)]
    fn set(&mut self, _n: usize, _status: RegStatus) {}

    #[inline(always)]
    fn fill(&mut self, _status: RegStatus) {}

    #[inline(always)]
    fn copy_from(&mut self, _src: &Self) {}
}
