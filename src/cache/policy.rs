//! Eviction Policy Module
//!
//! Pluggable victim selection for when an insert would exceed capacity.

use std::fmt;

use crate::cache::{EntryId, RecencyList};

// == Eviction Policy ==
/// Chooses which live entry to evict.
///
/// `select_victim` is only called while the cache is full, so the list holds
/// at least one entry. Implementations must return the id of a live entry.
/// A policy that returns `None` or a dead id is treated as broken: the cache
/// logs a warning and evicts the least recently used entry instead.
pub trait EvictionPolicy<K, V>: Send + Sync {
    fn select_victim(&self, entries: &RecencyList<K, V>) -> Option<EntryId>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

impl<K, V> fmt::Debug for dyn EvictionPolicy<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == LRU ==
/// Evicts the least recently used entry. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruPolicy;

impl<K, V> EvictionPolicy<K, V> for LruPolicy {
    fn select_victim(&self, entries: &RecencyList<K, V>) -> Option<EntryId> {
        entries.victim_candidate()
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

// == LFU ==
/// Evicts the entry with the fewest accesses; ties go to the least recently
/// used. Scans every entry, so selection is linear in the cache size.
#[derive(Debug, Clone, Copy, Default)]
pub struct LfuPolicy;

impl<K, V> EvictionPolicy<K, V> for LfuPolicy {
    fn select_victim(&self, entries: &RecencyList<K, V>) -> Option<EntryId> {
        // Walking from the LRU end keeps the first minimum, which is the
        // least recent among equals.
        entries
            .iter()
            .rev()
            .fold(None, |best: Option<(EntryId, u64)>, (id, entry)| match best {
                Some((_, count)) if count <= entry.access_count() => best,
                _ => Some((id, entry.access_count())),
            })
            .map(|(id, _)| id)
    }

    fn name(&self) -> &'static str {
        "lfu"
    }
}
