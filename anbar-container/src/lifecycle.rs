//! Singleton lifecycle cache.
//!
//! Every singleton gets one [`CacheEntry`], created at finalize. The
//! first resolve builds the instance under the entry's lock; later resolves
//! read it without locking. Concurrent first resolves of one singleton
//! build it exactly once.
//!
//! ```text
//! Unbuilt ──first resolve──> Building ──ok──> Built
//!    ^                          │
//!    └──────────error───────────┘
//! ```
//!
//! A failed build is not remembered: the next resolve tries again. A build
//! that panics leaves the entry `Unbuilt` as well.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::introspect::Instance;
use crate::key::ComponentId;

/// Lifecycle state of one singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonState {
    Unbuilt,
    Building,
    Built,
}

impl fmt::Display for SingletonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonState::Unbuilt => write!(f, "Unbuilt"),
            SingletonState::Building => write!(f, "Building"),
            SingletonState::Built => write!(f, "Built"),
        }
    }
}

/// The cached instance of one singleton.
pub(crate) struct CacheEntry {
    state: Mutex<SingletonState>,
    value: OnceCell<Instance>,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            state: Mutex::new(SingletonState::Unbuilt),
            value: OnceCell::new(),
        }
    }

    pub fn state(&self) -> SingletonState {
        if self.value.get().is_some() {
            return SingletonState::Built;
        }
        // The lock is only held for the duration of a build.
        match self.state.try_lock() {
            Some(state) => *state,
            None => SingletonState::Building,
        }
    }

    /// Returns the instance, building it with `build` if this is the first
    /// successful call.
    ///
    /// The lock is held while `build` runs. `build` must not come back to
    /// this entry; finalize rejects every graph where it could.
    pub fn get_or_build<E>(
        &self,
        build: impl FnOnce() -> Result<Instance, E>,
    ) -> Result<Instance, E> {
        if let Some(instance) = self.value.get() {
            return Ok(instance.clone());
        }

        let state = self.state.lock();
        if let Some(instance) = self.value.get() {
            return Ok(instance.clone());
        }

        let mut building = BuildGuard::start(state);
        let instance = build()?;
        let instance = self.value.get_or_init(|| instance).clone();
        building.finish();
        Ok(instance)
    }
}

/// Holds the entry's lock for one build. Unless finished, dropping it puts
/// the entry back to `Unbuilt`, on error and on unwind alike.
struct BuildGuard<'a> {
    state: MutexGuard<'a, SingletonState>,
}

impl<'a> BuildGuard<'a> {
    fn start(mut state: MutexGuard<'a, SingletonState>) -> Self {
        *state = SingletonState::Building;
        Self { state }
    }

    fn finish(&mut self) {
        *self.state = SingletonState::Built;
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if *self.state == SingletonState::Building {
            *self.state = SingletonState::Unbuilt;
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("state", &self.state())
            .finish()
    }
}

/// Cache entries for every singleton of a finalized container.
#[derive(Debug, Default)]
pub(crate) struct LifecycleCache {
    entries: HashMap<ComponentId, CacheEntry>,
}

impl LifecycleCache {
    /// Creates one unbuilt entry per singleton id.
    pub fn new(singletons: impl IntoIterator<Item = ComponentId>) -> Self {
        let entries: HashMap<_, _> = singletons
            .into_iter()
            .map(|id| (id, CacheEntry::new()))
            .collect();
        trace!(singletons = entries.len(), "Prepared singleton cache");
        Self { entries }
    }

    pub fn entry(&self, id: &ComponentId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub fn state(&self, id: &ComponentId) -> Option<SingletonState> {
        self.entries.get(id).map(CacheEntry::state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct Pool;

    fn id() -> ComponentId {
        ComponentId::of::<Pool>()
    }

    #[test]
    fn entries_start_unbuilt() {
        let cache = LifecycleCache::new([id()]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.state(&id()), Some(SingletonState::Unbuilt));
        assert_eq!(cache.state(&ComponentId::of::<String>()), None);
    }

    #[test]
    fn builds_once_and_reuses() {
        let cache = LifecycleCache::new([id()]);
        let entry = cache.entry(&id()).unwrap();
        let builds = AtomicUsize::new(0);

        let build = || -> Result<Instance, ()> {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Pool))
        };
        let first = entry.get_or_build(build).unwrap();
        let second = entry.get_or_build(build).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(entry.state(), SingletonState::Built);
    }

    #[test]
    fn failed_build_is_retried() {
        let cache = LifecycleCache::new([id()]);
        let entry = cache.entry(&id()).unwrap();

        let failed = entry.get_or_build(|| Err::<Instance, _>("not yet"));
        assert_eq!(failed.err(), Some("not yet"));
        assert_eq!(entry.state(), SingletonState::Unbuilt);

        let built = entry.get_or_build(|| Ok::<Instance, &str>(Arc::new(Pool)));
        assert!(built.is_ok());
        assert_eq!(entry.state(), SingletonState::Built);
    }

    #[test]
    fn panicking_build_leaves_entry_unbuilt() {
        let cache = LifecycleCache::new([id()]);
        let entry = cache.entry(&id()).unwrap();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            entry.get_or_build(|| -> Result<Instance, ()> { panic!("constructor blew up") })
        }));
        assert!(outcome.is_err());
        assert_eq!(entry.state(), SingletonState::Unbuilt);

        assert!(entry.get_or_build(|| Ok::<Instance, ()>(Arc::new(Pool))).is_ok());
        assert_eq!(entry.state(), SingletonState::Built);
    }

    #[test]
    fn state_is_building_during_build() {
        let cache = LifecycleCache::new([id()]);
        let entry = cache.entry(&id()).unwrap();
        let observed = entry
            .get_or_build(|| {
                assert_eq!(entry.state(), SingletonState::Building);
                Ok::<Instance, ()>(Arc::new(Pool))
            })
            .map(|_| entry.state());
        assert_eq!(observed, Ok(SingletonState::Built));
    }

    #[test]
    fn concurrent_first_resolves_build_once() {
        const THREADS: usize = 16;

        let cache = LifecycleCache::new([id()]);
        let entry = cache.entry(&id()).unwrap();
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let instances: Vec<Instance> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        entry
                            .get_or_build(|| {
                                builds.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(std::time::Duration::from_millis(5));
                                Ok::<Instance, ()>(Arc::new(Pool))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    }
}
