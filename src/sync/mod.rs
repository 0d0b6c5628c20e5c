//! Synchronization Module
//!
//! Reader/writer exclusion guarding all cache state.

mod gate;
mod rw_gate;

pub use rw_gate::{LockFairness, ReadGuard, RwGate, WriteGuard};
