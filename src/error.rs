//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Only construction can fail. A lookup miss is not an error: `get` returns
//! `None`, which can never collide with a stored value.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be at least one entry
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// TTL must be a non-zero duration
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Any other rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
