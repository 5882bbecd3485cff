//! Background Tasks Module
//!
//! # Tasks
//! - TTL Sweeper: Removes expired object cache entries every half TTL

mod sweeper;

pub use sweeper::spawn_sweeper_task;
