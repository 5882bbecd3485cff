//! Offline Action Queue
//!
//! Durable FIFO of writes deferred while offline, replayed on reconnect.

mod offline;

pub use offline::{
    OfflineQueue, ReplayOutcome, ReplayPolicy, ReplayReport, QUEUE_KEY, QUEUE_STORE,
};
