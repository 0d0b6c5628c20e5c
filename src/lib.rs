//! Mini LRU - A thread-safe in-process cache
//!
//! Fixed-capacity cache with absolute TTL expiry, pluggable eviction and
//! hit/miss accounting, guarded by a reader/writer gate.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod sync;
pub mod tasks;

pub use cache::{CacheStats, LruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
