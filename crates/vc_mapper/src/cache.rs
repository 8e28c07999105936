//! Lock-free caches shared by every mapping call.
//!
//! Readers load the current snapshot and never block. Writers clone the
//! snapshot, add their entry and publish it with a compare-and-swap, retrying
//! when another writer published first. An entry is never replaced once
//! published: when two threads compile the same plan concurrently, the first
//! published plan wins and the other one is dropped.

use core::borrow::Borrow;
use core::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{trace, warn};
use vc_schema::hash::HashMap;
use vc_schema::info::TypeId;

use crate::plan::{MapperKey, MappingPlan};

// -----------------------------------------------------------------------------
// SnapshotMap

pub(crate) struct SnapshotMap<K, V> {
    snap: ArcSwap<HashMap<K, V>>,
}

impl<K, V> Default for SnapshotMap<K, V> {
    fn default() -> Self {
        Self {
            snap: ArcSwap::from_pointee(HashMap::default()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> SnapshotMap<K, V> {
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.snap.load().get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.snap.load().len()
    }

    /// Publishes the value returned by `update` under `key`.
    ///
    /// `update` receives the current entry and returns `None` to keep it.
    /// It may run several times when writers race. Returns the entry present
    /// after the call.
    pub(crate) fn update(&self, key: K, update: impl Fn(Option<&V>) -> Option<V>) -> Option<V> {
        loop {
            let cur = self.snap.load_full();
            let Some(value) = update(cur.get(&key)) else {
                return cur.get(&key).cloned();
            };

            let mut next = (*cur).clone();
            next.insert(key.clone(), value.clone());

            let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return Some(value);
            }
        }
    }

    /// Publishes `value` unless `key` is already present, returns the published entry.
    pub(crate) fn get_or_insert(&self, key: K, value: V) -> V {
        match self.update(key, |existing| existing.is_none().then(|| value.clone())) {
            Some(published) => published,
            None => value,
        }
    }
}

// -----------------------------------------------------------------------------
// PlanCache

#[derive(Clone)]
struct PlanEntry {
    // runtime source type the plan was compiled for, `None` matches every source
    discriminator: Option<TypeId>,
    plan: Arc<MappingPlan>,
}

/// Compiled plans by key.
///
/// A key whose declared source type does not decide the plan (an `Any`
/// source) holds one entry per runtime source type. A lookup re-tests each
/// entry's discriminator against the live source, a key hit alone is never
/// enough.
#[derive(Default)]
pub(crate) struct PlanCache {
    plans: SnapshotMap<MapperKey, Arc<[PlanEntry]>>,
}

impl PlanCache {
    pub(crate) fn get(&self, key: &MapperKey, runtime: Option<TypeId>) -> Option<Arc<MappingPlan>> {
        let entries = self.plans.get(key)?;
        entries
            .iter()
            .find(|entry| entry.discriminator.is_none_or(|ty| Some(ty) == runtime))
            .map(|entry| entry.plan.clone())
    }

    pub(crate) fn contains(&self, key: &MapperKey) -> bool {
        self.plans.get(key).is_some()
    }

    /// Number of cached keys.
    pub(crate) fn len(&self) -> usize {
        self.plans.len()
    }

    /// Publishes a plan, returns the plan held by the cache afterwards.
    pub(crate) fn publish(
        &self,
        key: MapperKey,
        discriminator: Option<TypeId>,
        plan: Arc<MappingPlan>,
    ) -> Arc<MappingPlan> {
        let find = |entries: &[PlanEntry]| {
            entries
                .iter()
                .find(|entry| entry.discriminator == discriminator)
                .map(|entry| entry.plan.clone())
        };

        let published = self.plans.update(key.clone(), |existing| {
            let existing = existing.map_or(&[][..], |entries| &entries[..]);
            if find(existing).is_some() {
                return None;
            }
            let mut next = existing.to_vec();
            next.push(PlanEntry {
                discriminator,
                plan: plan.clone(),
            });
            Some(next.into())
        });

        match published.as_deref().and_then(find) {
            Some(winner) if Arc::ptr_eq(&winner, &plan) => {
                trace!("published plan {key}");
                winner
            }
            Some(winner) => {
                warn!("plan {key} was compiled concurrently, keeping the first published plan");
                winner
            }
            None => plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::SnapshotMap;

    #[test]
    fn first_insert_wins() {
        let map: SnapshotMap<u32, Arc<str>> = SnapshotMap::default();

        assert_eq!(&*map.get_or_insert(1, "first".into()), "first");
        assert_eq!(&*map.get_or_insert(1, "second".into()), "first");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&2), None);
    }

    #[test]
    fn concurrent_writers() {
        let map: Arc<SnapshotMap<u32, u32>> = Arc::default();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let map = map.clone();
                thread::spawn(move || {
                    for key in 0..64 {
                        map.get_or_insert(key, t);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), 64);
        // every key holds exactly one winner, whichever thread it was
        for key in 0..64 {
            assert!(map.get(&key).is_some_and(|t| t < 8));
        }
    }
}
