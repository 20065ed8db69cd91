//! Per-thread register caches.
//!
//! [`ThreadRegCaches`] maps thread ids onto their [`RegCache`], fetching
//! registers from a [`FetchRegisters`] backend the first time a thread's
//! registers are requested after it was (re)invalidated.
//!
//! References handed out by the directory borrow it mutably, so a cache can't
//! be held across a point where its thread is removed or invalidated.

use alloc::collections::BTreeMap;
use alloc::vec;
use core::fmt::{self, Debug, Display};

use crate::arch::TargetDescription;
use crate::{RegCache, StatusTracking, Tracked};

/// The live target: reads (and optionally writes back) the registers of a
/// stopped thread.
pub trait FetchRegisters<Tid> {
    /// A target-specific error.
    type Error;

    /// Fill `regs` with the current registers of thread `tid`, typically via
    /// [`RegCache::supply_regblock`] or [`RegCache::supply_register`].
    ///
    /// Registers the target cannot provide should be left unavailable.
    fn fetch_registers<S: StatusTracking>(
        &mut self,
        tid: Tid,
        regs: &mut RegCache<'_, S>,
    ) -> Result<(), Self::Error>;

    /// Write the (possibly modified) cached registers of `tid` back to the
    /// target before they are discarded.
    ///
    /// The default implementation does nothing, which is appropriate for
    /// targets whose register writes go straight to the target.
    fn store_registers<S: StatusTracking>(
        &mut self,
        tid: Tid,
        regs: &RegCache<'_, S>,
    ) -> Result<(), Self::Error> {
        let _ = (tid, regs);
        Ok(())
    }
}

/// An error which may occur while accessing a thread's register cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirectoryError<E> {
    /// The thread id was never registered via
    /// [`ThreadRegCaches::add_thread`].
    UnknownThread,
    /// The backend failed to fetch or store registers.
    Backend(E),
}

impl<E: Debug> Display for DirectoryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::DirectoryError::*;
        match self {
            UnknownThread => write!(f, "No register cache for the requested thread."),
            Backend(e) => write!(f, "Target failed to transfer registers: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: Debug> std::error::Error for DirectoryError<E> {}

/// A collection of register caches, keyed by thread id.
///
/// All caches share a single [`TargetDescription`], and own their register
/// buffers.
#[derive(Debug)]
pub struct ThreadRegCaches<'a, Tid, S: StatusTracking = Tracked> {
    desc: &'a TargetDescription,
    caches: BTreeMap<Tid, RegCache<'a, S>>,
}

impl<'a, Tid, S> ThreadRegCaches<'a, Tid, S>
where
    Tid: Ord + Copy + Debug,
    S: StatusTracking,
{
    /// Create an empty directory for threads described by `desc`.
    pub fn new(desc: &'a TargetDescription) -> Self {
        ThreadRegCaches {
            desc,
            caches: BTreeMap::new(),
        }
    }

    /// Start tracking thread `tid`, with an empty cache. Does nothing if the
    /// thread is already tracked.
    pub fn add_thread(&mut self, tid: Tid) -> &mut RegCache<'a, S> {
        let desc = self.desc;
        self.caches
            .entry(tid)
            .or_insert_with(|| RegCache::new_in(desc, vec![0; desc.register_cache_size()]))
    }

    /// Stop tracking thread `tid`, freeing its cache. Returns `false` if the
    /// thread wasn't tracked.
    pub fn remove_thread(&mut self, tid: Tid) -> bool {
        self.caches.remove(&tid).is_some()
    }

    /// Number of tracked threads.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Returns `true` if no threads are tracked.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Iterate over every tracked thread id, in ascending order.
    pub fn threads(&self) -> impl Iterator<Item = Tid> + '_ {
        self.caches.keys().copied()
    }

    /// The cache of thread `tid`, without fetching anything.
    pub fn get(&self, tid: Tid) -> Option<&RegCache<'a, S>> {
        self.caches.get(&tid)
    }

    /// The cache of thread `tid`, without fetching anything.
    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut RegCache<'a, S>> {
        self.caches.get_mut(&tid)
    }

    /// The cache of thread `tid`, fetching its registers from `backend` if
    /// the cache is not populated (gdbserver's `get_thread_regcache` with
    /// `fetch` set).
    pub fn get_or_fetch<B>(
        &mut self,
        tid: Tid,
        backend: &mut B,
    ) -> Result<&mut RegCache<'a, S>, DirectoryError<B::Error>>
    where
        B: FetchRegisters<Tid>,
    {
        let cache = self
            .caches
            .get_mut(&tid)
            .ok_or(DirectoryError::UnknownThread)?;

        if !cache.is_populated() {
            debug!("fetching registers for thread {:?}", tid);
            backend
                .fetch_registers(tid, cache)
                .map_err(DirectoryError::Backend)?;
            cache.set_populated();
        }

        Ok(cache)
    }

    /// Invalidate the cache of thread `tid`. Returns `false` if the thread
    /// wasn't tracked.
    pub fn invalidate_one(&mut self, tid: Tid) -> bool {
        match self.caches.get_mut(&tid) {
            Some(cache) => {
                trace!("invalidating registers for thread {:?}", tid);
                cache.invalidate();
                true
            }
            None => false,
        }
    }

    /// Invalidate every tracked cache.
    ///
    /// Used whenever the target resumed in a way that could have changed any
    /// thread's registers.
    pub fn invalidate_all(&mut self) {
        debug!("invalidating registers for all {} threads", self.caches.len());
        self.caches.values_mut().for_each(|cache| cache.invalidate());
    }

    /// Write the cache of thread `tid` back through `backend` (if it's
    /// populated), then invalidate it.
    ///
    /// If the backend fails, the cache is left as-is.
    pub fn flush_one<B>(&mut self, tid: Tid, backend: &mut B) -> Result<(), DirectoryError<B::Error>>
    where
        B: FetchRegisters<Tid>,
    {
        let cache = self
            .caches
            .get_mut(&tid)
            .ok_or(DirectoryError::UnknownThread)?;
        flush(tid, cache, backend)
    }

    /// [`flush_one`](Self::flush_one) every tracked thread, stopping at the
    /// first backend failure.
    pub fn flush_all<B>(&mut self, backend: &mut B) -> Result<(), DirectoryError<B::Error>>
    where
        B: FetchRegisters<Tid>,
    {
        for (&tid, cache) in self.caches.iter_mut() {
            flush(tid, cache, backend)?;
        }
        Ok(())
    }
}

fn flush<Tid, S, B>(tid: Tid, cache: &mut RegCache<'_, S>, backend: &mut B) -> Result<(), DirectoryError<B::Error>>
where
    Tid: Copy + Debug,
    S: StatusTracking,
    B: FetchRegisters<Tid>,
{
    if cache.is_populated() {
        debug!("storing registers for thread {:?}", tid);
        backend
            .store_registers(tid, cache)
            .map_err(DirectoryError::Backend)?;
    }
    cache.invalidate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec::Vec;

    use crate::RegStatus;

    fn desc() -> TargetDescription {
        TargetDescription::builder()
            .reg("r0", 32)
            .reg("pc", 32)
            .pc("pc")
            .build()
            .unwrap()
    }

    /// A backend whose threads all hold their own tid in every register.
    #[derive(Default)]
    struct FakeTarget {
        fetches: Vec<u32>,
        stores: Vec<(u32, Vec<u8>)>,
        fail: bool,
    }

    impl FetchRegisters<u32> for FakeTarget {
        type Error = &'static str;

        fn fetch_registers<S: StatusTracking>(
            &mut self,
            tid: u32,
            regs: &mut RegCache<'_, S>,
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err("thread is running");
            }
            self.fetches.push(tid);
            let mut block = tid.to_le_bytes().to_vec();
            block.extend_from_slice(&tid.to_le_bytes());
            regs.supply_regblock(Some(&block));
            Ok(())
        }

        fn store_registers<S: StatusTracking>(
            &mut self,
            tid: u32,
            regs: &RegCache<'_, S>,
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err("thread is running");
            }
            self.stores.push((tid, regs.registers().to_vec()));
            Ok(())
        }
    }

    #[test]
    fn fetches_lazily_and_once() {
        let _ = pretty_env_logger::try_init();

        let desc = desc();
        let mut target = FakeTarget::default();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);
        caches.add_thread(2);

        assert!(!caches.get(1).unwrap().is_populated());
        assert_eq!(caches.get_or_fetch(1, &mut target).unwrap().read_pc(), 1);
        assert_eq!(caches.get_or_fetch(1, &mut target).unwrap().read_pc(), 1);
        assert_eq!(target.fetches, [1]);

        assert_eq!(caches.get_or_fetch(2, &mut target).unwrap().read_pc(), 2);
        assert_eq!(target.fetches, [1, 2]);
    }

    #[test]
    fn unknown_thread() {
        let desc = desc();
        let mut target = FakeTarget::default();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);

        assert_eq!(
            caches.get_or_fetch(7, &mut target).unwrap_err(),
            DirectoryError::UnknownThread
        );
        assert!(!caches.invalidate_one(7));
    }

    #[test]
    fn backend_errors_leave_cache_unpopulated() {
        let desc = desc();
        let mut target = FakeTarget {
            fail: true,
            ..Default::default()
        };
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);

        assert_eq!(
            caches.get_or_fetch(1, &mut target).unwrap_err(),
            DirectoryError::Backend("thread is running")
        );
        assert!(!caches.get(1).unwrap().is_populated());
    }

    #[test]
    fn invalidate_all_forces_refetch() {
        let desc = desc();
        let mut target = FakeTarget::default();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);
        caches.add_thread(2);

        caches.get_or_fetch(1, &mut target).unwrap();
        caches.get_or_fetch(2, &mut target).unwrap();
        caches.invalidate_all();

        for tid in caches.threads().collect::<Vec<_>>() {
            let cache = caches.get(tid).unwrap();
            assert!(!cache.is_populated());
            assert_eq!(cache.status(0), RegStatus::Unavailable);
            assert_eq!(cache.status(1), RegStatus::Unavailable);
        }

        caches.get_or_fetch(2, &mut target).unwrap();
        assert_eq!(target.fetches, [1, 2, 2]);
    }

    #[test]
    fn invalidate_one_is_per_thread() {
        let desc = desc();
        let mut target = FakeTarget::default();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);
        caches.add_thread(2);
        caches.get_or_fetch(1, &mut target).unwrap();
        caches.get_or_fetch(2, &mut target).unwrap();

        assert!(caches.invalidate_one(1));
        assert!(!caches.get(1).unwrap().is_populated());
        assert!(caches.get(2).unwrap().is_populated());
    }

    #[test]
    fn flush_writes_back_populated_caches_only() {
        let desc = desc();
        let mut target = FakeTarget::default();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);
        caches.add_thread(2);

        caches.get_or_fetch(1, &mut target).unwrap().write_pc(0x40);
        caches.flush_all(&mut target).unwrap();

        assert_eq!(target.stores, [(1, vec![1, 0, 0, 0, 0x40, 0, 0, 0])]);
        assert!(!caches.get(1).unwrap().is_populated());
        assert_eq!(
            caches.flush_one(3, &mut target),
            Err(DirectoryError::UnknownThread)
        );
    }

    #[test]
    fn remove_thread_frees_cache() {
        let desc = desc();
        let mut caches = ThreadRegCaches::<u32>::new(&desc);
        caches.add_thread(1);
        assert_eq!(caches.len(), 1);

        assert!(caches.remove_thread(1));
        assert!(!caches.remove_thread(1));
        assert!(caches.is_empty());
        assert!(caches.get(1).is_none());
    }
}
