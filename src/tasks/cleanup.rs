//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! Expiry is otherwise lazy: an expired entry stays in the cache, holding a
//! slot, until a `get` or `remove` touches it. The sweeper bounds how long
//! that can last.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::LruCache;
use crate::clock::Clock;

/// Spawns a background task that purges expired entries every `interval`.
///
/// Each run takes the cache's write section once, on the blocking pool: the
/// gate parks the calling thread while readers hold it, and that must not be
/// a runtime worker. The returned handle can be used to abort the task during
/// shutdown. A zero `interval` disables the sweeper; the task logs a warning
/// and exits.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(LruCache::<String, String>::new(1000, Some(ttl))?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V, C>(cache: Arc<LruCache<K, V, C>>, interval: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        if interval.is_zero() {
            warn!("TTL cleanup interval is zero; cleanup task not started");
            return;
        }
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let sweep = cache.clone();
            match tokio::task::spawn_blocking(move || sweep.purge_expired()).await {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => debug!("TTL cleanup: removed {} expired entries", removed),
                Err(e) => warn!("TTL cleanup run failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::time::Instant;

    fn shared_cache(ttl: Duration) -> (Arc<LruCache<String, String, MockClock>>, MockClock) {
        let clock = MockClock::new();
        let cache = LruCache::builder(100)
            .ttl(ttl)
            .clock(clock.clone())
            .build()
            .unwrap();
        (Arc::new(cache), clock)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let (cache, clock) = shared_cache(Duration::from_secs(1));
        cache.put("expire_soon".to_string(), "value".to_string());
        clock.advance(Duration::from_secs(2));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Checked through len so the lookup itself cannot do the removal
        assert_eq!(cache.len(), 0, "Expired entry should have been cleaned up");
        assert_eq!(cache.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let (cache, _clock) = shared_cache(Duration::from_secs(3600));
        cache.put("long_lived".to_string(), "value".to_string());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get(&"long_lived".to_string()), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_does_not_stall_runtime_behind_readers() {
        let (cache, _clock) = shared_cache(Duration::from_secs(1));
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();

        let reader = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                cache.with_read_section(|| {
                    entered_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(500));
                })
            })
        };
        entered_rx.recv().unwrap();

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(5));
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(
            started.elapsed() < Duration::from_millis(250),
            "Runtime stalled for {:?} behind the sweeper",
            started.elapsed()
        );

        handle.abort();
        reader.join().unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_task_with_zero_interval_exits() {
        let (cache, _clock) = shared_cache(Duration::from_secs(1));

        let handle = spawn_cleanup_task(cache, Duration::ZERO);

        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, _clock) = shared_cache(Duration::from_secs(1));

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
