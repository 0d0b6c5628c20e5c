//! Cache Module
//!
//! Provides in-process caching with TTL expiration and pluggable eviction.

mod builder;
mod entry;
mod list;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use builder::CacheBuilder;
pub use entry::{CacheEntry, EntrySnapshot};
pub use list::{EntryId, Iter, RecencyList};
pub use policy::{EvictionPolicy, LfuPolicy, LruPolicy};
pub use stats::{hit_ratio, CacheStats};
pub use store::LruCache;
