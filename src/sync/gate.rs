//! Binary Gate
//!
//! A lock that is not tied to the thread that closed it. The reader/writer
//! gate needs this: the first reader in closes the room and the last reader
//! out, usually a different thread, opens it again.

use parking_lot::{Condvar, Mutex};

// == Gate ==
/// Binary semaphore built from a mutex-protected flag and a condvar.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    closed: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // == Close ==
    /// Blocks until the gate is open, then closes it.
    pub(crate) fn close(&self) {
        let mut closed = self.closed.lock();
        while *closed {
            self.opened.wait(&mut closed);
        }
        *closed = true;
    }

    // == Open ==
    /// Opens the gate and wakes one waiter. Any thread may open.
    pub(crate) fn open(&self) {
        let mut closed = self.closed.lock();
        debug_assert!(*closed, "opening a gate that is not closed");
        *closed = false;
        drop(closed);
        self.opened.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}
