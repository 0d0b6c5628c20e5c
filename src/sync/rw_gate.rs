//! Reader/Writer Gate
//!
//! Reader/writer lock built from a reader count and a binary room gate:
//!
//! - the first reader in closes the room on behalf of every reader,
//! - the last reader out opens it,
//! - a writer closes and opens the room directly.
//!
//! With [`LockFairness::ReaderPreferred`] a stream of overlapping readers
//! keeps the room closed forever and a writer waits for as long as it lasts.
//! [`LockFairness::WriterFair`] adds a turnstile: a writer holds it while it
//! waits for the room, and every reader must pass through it first, so
//! readers arriving after a waiting writer queue behind it.
//!
//! There is no upgrade. Going from a read guard to a write guard is a drop
//! followed by a fresh acquire, and anything may happen in between.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use parking_lot::Mutex;

use crate::error::CacheError;
use crate::sync::gate::Gate;

// == Lock Fairness ==
/// Scheduling policy between readers and writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockFairness {
    /// New readers never wait for a pending writer. Writers can starve.
    #[default]
    ReaderPreferred,
    /// A waiting writer blocks readers that arrive after it.
    WriterFair,
}

impl FromStr for LockFairness {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" | "reader-preferred" => Ok(Self::ReaderPreferred),
            "fair" | "writer-fair" => Ok(Self::WriterFair),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown lock fairness '{}' (expected 'reader' or 'fair')",
                other
            ))),
        }
    }
}

impl fmt::Display for LockFairness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReaderPreferred => f.write_str("reader-preferred"),
            Self::WriterFair => f.write_str("writer-fair"),
        }
    }
}

// == RwGate ==
/// Reader/writer lock owning the data it protects.
pub struct RwGate<T> {
    readers: Mutex<usize>,
    room: Gate,
    turnstile: Option<Gate>,
    data: UnsafeCell<T>,
}

// SAFETY: the gate only hands out `&T` to concurrent readers and `&mut T` to
// a single writer while the room is closed, same as `std::sync::RwLock`.
unsafe impl<T: Send> Send for RwGate<T> {}
unsafe impl<T: Send + Sync> Sync for RwGate<T> {}

impl<T> RwGate<T> {
    // == Constructor ==
    pub fn new(data: T, fairness: LockFairness) -> Self {
        let turnstile = match fairness {
            LockFairness::ReaderPreferred => None,
            LockFairness::WriterFair => Some(Gate::new()),
        };
        Self {
            readers: Mutex::new(0),
            room: Gate::new(),
            turnstile,
            data: UnsafeCell::new(data),
        }
    }

    pub fn fairness(&self) -> LockFairness {
        if self.turnstile.is_some() {
            LockFairness::WriterFair
        } else {
            LockFairness::ReaderPreferred
        }
    }

    // == Read ==
    /// Enters a shared read section. Released when the guard drops.
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.acquire_read();
        ReadGuard { gate: self }
    }

    // == Write ==
    /// Enters the exclusive write section. Released when the guard drops.
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.acquire_write();
        WriteGuard { gate: self }
    }

    fn acquire_read(&self) {
        if let Some(turnstile) = &self.turnstile {
            turnstile.close();
            turnstile.open();
        }
        let mut readers = self.readers.lock();
        *readers += 1;
        if *readers == 1 {
            self.room.close();
        }
    }

    fn release_read(&self) {
        let mut readers = self.readers.lock();
        *readers -= 1;
        if *readers == 0 {
            self.room.open();
        }
    }

    fn acquire_write(&self) {
        if let Some(turnstile) = &self.turnstile {
            turnstile.close();
        }
        self.room.close();
    }

    fn release_write(&self) {
        if let Some(turnstile) = &self.turnstile {
            turnstile.open();
        }
        self.room.open();
    }

    #[cfg(test)]
    fn reader_count(&self) -> usize {
        *self.readers.lock()
    }
}

impl<T> fmt::Debug for RwGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwGate")
            .field("fairness", &self.fairness())
            .finish_non_exhaustive()
    }
}

// == Guards ==
/// Shared access to the data behind an [`RwGate`].
pub struct ReadGuard<'a, T> {
    gate: &'a RwGate<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the room is closed for the lifetime of any read guard, so no
        // write guard can exist.
        unsafe { &*self.gate.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.gate.release_read();
    }
}

/// Exclusive access to the data behind an [`RwGate`].
pub struct WriteGuard<'a, T> {
    gate: &'a RwGate<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard is the only holder of the room.
        unsafe { &*self.gate.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard is the only holder of the room.
        unsafe { &mut *self.gate.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.gate.release_write();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_millis(100);

    #[test]
    fn test_fairness_from_str() {
        assert_eq!("reader".parse::<LockFairness>().unwrap(), LockFairness::ReaderPreferred);
        assert_eq!(" Fair ".parse::<LockFairness>().unwrap(), LockFairness::WriterFair);
        assert!(matches!(
            "fifo".parse::<LockFairness>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_read_and_write_access() {
        let gate = RwGate::new(vec![1, 2], LockFairness::ReaderPreferred);

        gate.write().push(3);

        assert_eq!(*gate.read(), vec![1, 2, 3]);
    }

    #[test]
    fn test_readers_share_the_room() {
        for fairness in [LockFairness::ReaderPreferred, LockFairness::WriterFair] {
            let gate = Arc::new(RwGate::new(0u32, fairness));
            let barrier = Arc::new(Barrier::new(3));

            let handles: Vec<_> = (0..3)
                .map(|_| {
                    let gate = Arc::clone(&gate);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        let guard = gate.read();
                        // All three readers must be inside at once to pass.
                        barrier.wait();
                        *guard
                    })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), 0);
            }
            assert_eq!(gate.reader_count(), 0);
        }
    }

    #[test]
    fn test_writer_waits_for_last_reader() {
        let gate = Arc::new(RwGate::new(0u32, LockFairness::ReaderPreferred));
        let wrote = Arc::new(AtomicBool::new(false));

        let first = gate.read();
        let second = gate.read();
        assert_eq!(gate.reader_count(), 2);

        let writer = {
            let gate = Arc::clone(&gate);
            let wrote = Arc::clone(&wrote);
            thread::spawn(move || {
                *gate.write() = 7;
                wrote.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(SETTLE);
        drop(first);
        thread::sleep(SETTLE);
        assert!(!wrote.load(Ordering::SeqCst), "writer entered with a reader inside");

        drop(second);
        writer.join().unwrap();
        assert!(wrote.load(Ordering::SeqCst));
        assert_eq!(*gate.read(), 7);
    }

    #[test]
    fn test_writers_are_exclusive() {
        let gate = Arc::new(RwGate::new(0u64, LockFairness::WriterFair));
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let mut guard = gate.write();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        *guard += 1;
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*gate.read(), 4_000);
    }

    #[test]
    fn test_reader_preferred_lets_new_readers_pass_waiting_writer() {
        let gate = Arc::new(RwGate::new((), LockFairness::ReaderPreferred));
        let log = Arc::new(Mutex::new(Vec::new()));

        let holder = gate.read();

        let writer = {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let _guard = gate.write();
                log.lock().push("writer");
            })
        };
        thread::sleep(SETTLE);

        let reader = {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let _guard = gate.read();
                log.lock().push("reader");
            })
        };
        reader.join().unwrap();
        assert_eq!(*log.lock(), vec!["reader"]);

        drop(holder);
        writer.join().unwrap();
        assert_eq!(*log.lock(), vec!["reader", "writer"]);
    }

    #[test]
    fn test_writer_fair_blocks_readers_behind_waiting_writer() {
        let gate = Arc::new(RwGate::new((), LockFairness::WriterFair));
        let log = Arc::new(Mutex::new(Vec::new()));

        let holder = gate.read();

        let writer = {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let _guard = gate.write();
                log.lock().push("writer");
            })
        };
        thread::sleep(SETTLE);

        let reader = {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let _guard = gate.read();
                log.lock().push("reader");
            })
        };
        thread::sleep(SETTLE);
        assert!(log.lock().is_empty(), "reader overtook a waiting writer");

        drop(holder);
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(*log.lock(), vec!["writer", "reader"]);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let gate = Arc::new(RwGate::new(0u32, LockFairness::ReaderPreferred));

        let poisoner = Arc::clone(&gate);
        let result = thread::spawn(move || {
            let _guard = poisoner.write();
            panic!("boom");
        })
        .join();
        assert!(result.is_err());

        *gate.write() = 1;
        assert_eq!(*gate.read(), 1);
    }
}
