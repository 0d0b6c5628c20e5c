//! Cache Entry Module
//!
//! Defines individual cache entries with absolute expiry support, and the
//! read-only snapshot used by the diagnostic dump.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Entry ==
/// A single cached key/value pair with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    /// Absolute expiry instant, None = never expires
    expires_at: Option<Instant>,
    /// Successful reads plus overwrites since the entry was created
    access_count: u64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`, or never. A TTL too
    /// large to represent as an instant also means never.
    pub fn new(key: K, value: V, now: Instant, ttl: Option<Duration>) -> Self {
        Self {
            key,
            value,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            access_count: 0,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired only once `now` is strictly
    /// past its expiry instant; at the instant itself it is still live.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`; `Some(ZERO)` once expired, None if the
    /// entry never expires.
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|expires| expires.saturating_duration_since(now))
    }

    // == Mutation ==
    /// Replaces the value and restarts the TTL from `now`.
    pub(crate) fn overwrite(&mut self, value: V, now: Instant, ttl: Option<Duration>) {
        self.value = value;
        self.expires_at = ttl.and_then(|ttl| now.checked_add(ttl));
        self.access_count += 1;
    }

    pub(crate) fn record_access(&mut self) {
        self.access_count += 1;
    }

    pub(crate) fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

// == Entry Snapshot ==
/// Point-in-time view of a live entry, as listed by the diagnostic dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot<K, V> {
    pub key: K,
    pub value: V,
    /// Remaining TTL in whole seconds, None = no expiry
    pub ttl_remaining_secs: Option<u64>,
    /// Wall-clock expiry estimate, None = no expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl<K: Clone, V: Clone> EntrySnapshot<K, V> {
    pub(crate) fn capture(entry: &CacheEntry<K, V>, now: Instant) -> Self {
        let remaining = entry.ttl_remaining(now);
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            ttl_remaining_secs: remaining.map(|ttl| ttl.as_secs()),
            expires_at: remaining.and_then(|ttl| {
                chrono::Duration::from_std(ttl)
                    .ok()
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            }),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for EntrySnapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {:?}, ttl=", self.key, self.value)?;
        match self.ttl_remaining_secs {
            Some(secs) => write!(f, "{}s", secs),
            None => f.write_str("no expiry"),
        }
    }
}
