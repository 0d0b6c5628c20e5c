//! Background Tasks Module
//!
//! Contains background tasks that run alongside a shared cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
