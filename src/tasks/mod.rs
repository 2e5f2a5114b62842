//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Expiry Sweeper: Removes expired cache entries at a fixed cadence

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
