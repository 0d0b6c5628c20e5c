//! Cache Store Module
//!
//! Main cache engine combining a key index, the recency list, TTL bookkeeping
//! and the eviction policy behind a reader/writer gate.
//!
//! # Locking protocol
//!
//! `put`, `remove` and `purge_expired` run entirely inside one write section.
//!
//! `get` starts in a read section. A missing key is answered there. A present
//! key, live or expired, needs the write section (to promote or to remove),
//! and the gate has no atomic upgrade: the read guard is dropped and the
//! write guard acquired separately. By the time the write section starts, the
//! entry may have been evicted, removed, refreshed by a `put`, or expired.
//! The write section therefore looks the key up again and decides from what
//! it finds, never from what the read section saw.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::cache::stats::{hit_ratio, LookupCounters};
use crate::cache::{
    CacheBuilder, CacheEntry, CacheStats, EntryId, EntrySnapshot, EvictionPolicy, RecencyList,
};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::sync::{LockFairness, RwGate};

// == Cache State ==
/// Everything guarded by the gate.
struct CacheState<K, V> {
    index: HashMap<K, EntryId>,
    list: RecencyList<K, V>,
    evictions: u64,
    expirations: u64,
}

/// What a read section saw for a present key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Live,
    Expired,
}

/// Outcome of settling a lookup inside the write section.
#[derive(Debug, PartialEq, Eq)]
enum Resolution<V> {
    Hit(V),
    Expired,
    Absent,
}

impl<K: Hash + Eq, V> CacheState<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            list: RecencyList::with_capacity(capacity),
            evictions: 0,
            expirations: 0,
        }
    }

    /// Read-only inspection. None if the key is absent.
    fn observe(&self, key: &K, now: Instant) -> Option<Observed> {
        let id = *self.index.get(key)?;
        let expired = self
            .list
            .get(id)
            .map_or(true, |entry| entry.is_expired(now));
        Some(if expired {
            Observed::Expired
        } else {
            Observed::Live
        })
    }

    /// Re-validates `key` from scratch: promotes a live entry, removes an
    /// expired one.
    fn resolve(&mut self, key: &K, now: Instant) -> Resolution<V>
    where
        V: Clone,
    {
        let Some(&id) = self.index.get(key) else {
            return Resolution::Absent;
        };
        let live = self
            .list
            .get(id)
            .is_some_and(|entry| !entry.is_expired(now));
        if !live {
            self.remove_key(key);
            self.expirations += 1;
            return Resolution::Expired;
        }

        self.list.promote(id);
        match self.list.get_mut(id) {
            Some(entry) => {
                entry.record_access();
                Resolution::Hit(entry.value().clone())
            }
            None => Resolution::Absent,
        }
    }

    fn remove_key(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        let id = self.index.remove(key)?;
        self.list.remove(id)
    }

    fn is_consistent(&self, capacity: usize) -> bool {
        self.list.is_consistent()
            && self.index.len() == self.list.len()
            && self.index.len() <= capacity
            && self
                .index
                .iter()
                .all(|(key, &id)| self.list.get(id).is_some_and(|entry| entry.key() == key))
    }
}

// == LRU Cache ==
/// Thread-safe, fixed-capacity cache with TTL expiry and pluggable eviction.
///
/// All methods take `&self`; share it across threads with an `Arc`.
pub struct LruCache<K, V, C = SystemClock> {
    state: RwGate<CacheState<K, V>>,
    counters: LookupCounters,
    policy: Box<dyn EvictionPolicy<K, V>>,
    capacity: usize,
    ttl: Option<Duration>,
    clock: C,
}

impl<K, V> LruCache<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an LRU-evicting cache on the system clock.
    ///
    /// # Errors
    /// `InvalidCapacity` if `capacity` is zero, `InvalidTtl` if `ttl` is zero.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Result<Self> {
        CacheBuilder::new(capacity).ttl(ttl).build()
    }

    /// Starts a builder for a cache holding at most `capacity` entries.
    pub fn builder(capacity: usize) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }

    /// Creates a cache from a loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        CacheBuilder::new(config.capacity)
            .ttl(config.ttl())
            .fairness(config.fairness)
            .build()
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Hash + Eq,
    C: Clock,
{
    pub(crate) fn from_parts(
        capacity: usize,
        ttl: Option<Duration>,
        policy: Box<dyn EvictionPolicy<K, V>>,
        fairness: LockFairness,
        clock: C,
    ) -> Self {
        info!(
            "Cache created: capacity={}, ttl={:?}, policy={}, lock={}",
            capacity,
            ttl,
            policy.name(),
            fairness
        );
        Self {
            state: RwGate::new(CacheState::new(capacity), fairness),
            counters: LookupCounters::default(),
            policy,
            capacity,
            ttl,
            clock,
        }
    }

    // == Accessors ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Default TTL applied by `put`.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn fairness(&self) -> LockFairness {
        self.state.fairness()
    }

    /// Number of entries currently stored, expired ones included until they
    /// are noticed.
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Snapshot of the hit/miss counters and entry totals.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        let hits = self.counters.hits();
        let misses = self.counters.misses();
        CacheStats {
            hits,
            misses,
            hit_ratio: hit_ratio(hits, misses),
            evictions: state.evictions,
            expirations: state.expirations,
            total_entries: state.index.len(),
            capacity: self.capacity,
        }
    }

    // == Purge Expired ==
    /// Removes every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.write();
        let now = self.clock.now();
        let expired: Vec<EntryId> = state
            .list
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| id)
            .collect();

        for &id in &expired {
            if let Some(entry) = state.list.remove(id) {
                state.index.remove(entry.key());
            }
        }
        state.expirations += expired.len() as u64;
        expired.len()
    }

    /// Checks the structural invariants: both list walks agree with the
    /// index, every index slot holds its own key, and capacity holds.
    pub fn is_consistent(&self) -> bool {
        self.state.read().is_consistent(self.capacity)
    }

    /// Runs `f` while holding a read section, to stall writers in tests.
    #[cfg(test)]
    pub(crate) fn with_read_section<R>(&self, f: impl FnOnce() -> R) -> R {
        let _state = self.state.read();
        f()
    }

    // == Eviction ==
    fn evict_one(&self, state: &mut CacheState<K, V>) {
        let victim = match self.policy.select_victim(&state.list) {
            Some(id) if state.list.contains(id) => Some(id),
            chosen => {
                warn!(
                    "Eviction policy '{}' returned {:?}, not a live entry; evicting LRU entry",
                    self.policy.name(),
                    chosen
                );
                state.list.victim_candidate()
            }
        };

        if let Some(entry) = victim.and_then(|id| state.list.remove(id)) {
            state.index.remove(entry.key());
            state.evictions += 1;
            debug!(
                "Evicted entry via {} policy ({} evictions total)",
                self.policy.name(),
                state.evictions
            );
        }
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
{
    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// An expired entry is removed and reported as a miss. `None` always
    /// means not found; it cannot be confused with a stored value.
    pub fn get(&self, key: &K) -> Option<V> {
        let observed = {
            let state = self.state.read();
            match state.observe(key, self.clock.now()) {
                Some(observed) => observed,
                None => {
                    self.counters.record_miss();
                    return None;
                }
            }
        };

        // Read section released. Whatever it saw may be stale now.
        // The guard is held until the outcome is counted.
        let mut state = self.state.write();

        match state.resolve(key, self.clock.now()) {
            Resolution::Hit(value) => {
                if observed == Observed::Expired {
                    trace!("Expired entry was refreshed before the write section");
                }
                self.counters.record_hit();
                Some(value)
            }
            Resolution::Expired => {
                trace!("Removed expired entry on lookup");
                self.counters.record_miss();
                None
            }
            Resolution::Absent => {
                trace!("Entry disappeared before the write section");
                self.counters.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key` with the default TTL and marks it most
    /// recently used. Evicts one entry if the key is new and the cache is full.
    pub fn put(&self, key: K, value: V) {
        self.insert(key, value, self.ttl);
    }

    /// Like [`put`](Self::put) but with a TTL for this entry only.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.insert(key, value, Some(ttl));
    }

    fn insert(&self, key: K, value: V, ttl: Option<Duration>) {
        let mut state = self.state.write();
        let now = self.clock.now();

        if let Some(&id) = state.index.get(&key) {
            if let Some(entry) = state.list.get_mut(id) {
                entry.overwrite(value, now, ttl);
            }
            state.list.promote(id);
            return;
        }

        if state.index.len() >= self.capacity {
            self.evict_one(&mut state);
        }

        let id = state
            .list
            .push_front(CacheEntry::new(key.clone(), value, now, ttl));
        state.index.insert(key, id);
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present and unexpired.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.write();
        let entry = state.remove_key(key)?;
        if entry.is_expired(self.clock.now()) {
            state.expirations += 1;
            return None;
        }
        Some(entry.into_parts().1)
    }

    // == Diagnostic Dump ==
    /// Entries currently stored, in recency order, most recent first.
    /// Expired entries nobody has touched yet are listed with zero TTL left.
    pub fn entries(&self) -> Vec<EntrySnapshot<K, V>> {
        let state = self.state.read();
        let now = self.clock.now();
        state
            .list
            .iter()
            .map(|(_, entry)| EntrySnapshot::capture(entry, now))
            .collect()
    }

    /// One line per entry: key, value and remaining TTL. For inspection only.
    pub fn dump(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        self.entries()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K, V, C> fmt::Debug for LruCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("policy", &self.policy.name())
            .field("lock", &self.state)
            .finish_non_exhaustive()
    }
}
