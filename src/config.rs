//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{CacheError, Result};
use crate::sync::LockFairness;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Default TTL in seconds applied by `put`, None = entries never expire
    pub ttl_secs: Option<u64>,
    /// Reader/writer scheduling for the cache lock
    pub fairness: LockFairness,
    /// Background sweep interval in seconds, 0 = no sweeper
    pub cleanup_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL` - Default TTL in seconds, `0` or `none` disables expiry (default: 300)
    /// - `CACHE_LOCK_FAIRNESS` - `reader` or `fair` (default: reader)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds, `0` disables it (default: 1)
    ///
    /// Unparsable values are logged and replaced by their default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_var(&lookup, "CACHE_CAPACITY").unwrap_or(defaults.capacity),
            ttl_secs: lookup("CACHE_TTL")
                .map(|raw| parse_ttl(&raw))
                .unwrap_or(defaults.ttl_secs),
            fairness: parse_var(&lookup, "CACHE_LOCK_FAIRNESS").unwrap_or(defaults.fairness),
            cleanup_interval: parse_var(&lookup, "CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    // == Validate ==
    /// Rejects values no cache can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.ttl_secs == Some(0) {
            return Err(CacheError::InvalidTtl(
                "TTL must be at least one second; use None to disable expiry".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval > 0).then(|| Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_secs: Some(300),
            fairness: LockFairness::ReaderPreferred,
            cleanup_interval: 1,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring {}={:?}: {}", name, raw, err);
            None
        }
    }
}

fn parse_ttl(raw: &str) -> Option<u64> {
    match raw.trim() {
        "" | "0" | "none" => None,
        secs => match secs.parse() {
            Ok(secs) => Some(secs),
            Err(err) => {
                warn!("Ignoring CACHE_TTL={:?}: {}", raw, err);
                CacheConfig::default().ttl_secs
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CacheConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CacheConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.ttl_secs, Some(300));
        assert_eq!(config.fairness, LockFairness::ReaderPreferred);
        assert_eq!(config.cleanup_interval, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_empty_env_uses_defaults() {
        assert_eq!(config_from(&[]), CacheConfig::default());
    }

    #[test]
    fn test_config_from_vars() {
        let config = config_from(&[
            ("CACHE_CAPACITY", "2"),
            ("CACHE_TTL", "3"),
            ("CACHE_LOCK_FAIRNESS", "fair"),
            ("CLEANUP_INTERVAL", "0"),
        ]);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.ttl(), Some(Duration::from_secs(3)));
        assert_eq!(config.fairness, LockFairness::WriterFair);
        assert_eq!(config.cleanup_interval(), None);
    }

    #[test]
    fn test_config_ttl_disabled() {
        assert_eq!(config_from(&[("CACHE_TTL", "none")]).ttl_secs, None);
        assert_eq!(config_from(&[("CACHE_TTL", "0")]).ttl_secs, None);
    }

    #[test]
    fn test_config_bad_values_fall_back() {
        let config = config_from(&[
            ("CACHE_CAPACITY", "lots"),
            ("CACHE_TTL", "soon"),
            ("CACHE_LOCK_FAIRNESS", "fifo"),
        ]);
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_validate() {
        let zero_capacity = CacheConfig {
            capacity: 0,
            ..CacheConfig::default()
        };
        assert_eq!(zero_capacity.validate(), Err(CacheError::InvalidCapacity(0)));

        let zero_ttl = CacheConfig {
            ttl_secs: Some(0),
            ..CacheConfig::default()
        };
        assert!(matches!(zero_ttl.validate(), Err(CacheError::InvalidTtl(_))));
    }
}
