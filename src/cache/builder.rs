//! Cache Builder Module
//!
//! Collects construction parameters and validates them before a cache exists.

use std::hash::Hash;
use std::time::Duration;

use crate::cache::{EvictionPolicy, LruCache, LruPolicy};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::sync::LockFairness;

// == Cache Builder ==
/// Builder for [`LruCache`].
///
/// ```
/// use std::time::Duration;
/// use mini_lru::cache::{LfuPolicy, LruCache};
///
/// let cache = LruCache::builder(128)
///     .ttl(Duration::from_secs(30))
///     .policy(LfuPolicy)
///     .build()
///     .unwrap();
/// cache.put("answer", 42);
/// assert_eq!(cache.get(&"answer"), Some(42));
/// ```
pub struct CacheBuilder<K, V, C = SystemClock> {
    capacity: usize,
    ttl: Option<Duration>,
    policy: Box<dyn EvictionPolicy<K, V>>,
    fairness: LockFairness,
    clock: C,
}

impl<K, V> CacheBuilder<K, V, SystemClock> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ttl: None,
            policy: Box::new(LruPolicy),
            fairness: LockFairness::default(),
            clock: SystemClock,
        }
    }
}

impl<K, V, C> CacheBuilder<K, V, C> {
    /// Default TTL applied by `put`. `None` keeps entries until evicted.
    pub fn ttl(mut self, ttl: impl Into<Option<Duration>>) -> Self {
        self.ttl = ttl.into();
        self
    }

    pub fn policy(mut self, policy: impl EvictionPolicy<K, V> + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn fairness(mut self, fairness: LockFairness) -> Self {
        self.fairness = fairness;
        self
    }

    /// Swaps the time source, typically for a `MockClock` in tests.
    pub fn clock<C2: Clock>(self, clock: C2) -> CacheBuilder<K, V, C2> {
        CacheBuilder {
            capacity: self.capacity,
            ttl: self.ttl,
            policy: self.policy,
            fairness: self.fairness,
            clock,
        }
    }

    // == Build ==
    /// Validates the parameters and creates the cache.
    ///
    /// Fails with `InvalidCapacity` for a zero capacity and `InvalidTtl` for
    /// a zero TTL.
    pub fn build(self) -> Result<LruCache<K, V, C>>
    where
        K: Hash + Eq,
        C: Clock,
    {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(CacheError::InvalidTtl(
                "TTL must be non-zero; use None to disable expiry".to_string(),
            ));
        }
        Ok(LruCache::from_parts(
            self.capacity,
            self.ttl,
            self.policy,
            self.fairness,
            self.clock,
        ))
    }
}
