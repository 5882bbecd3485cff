//! Durable queue of deferred writes.
//!
//! The whole log is one JSON array stored under a fixed key. Replay walks it
//! in enqueue order, sending each action once; what is removed afterwards is
//! decided by [`ReplayPolicy`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PendingAction, Request};
use crate::persistence::{PersistenceAdapter, StoreHandle};
use crate::transport::Transport;

/// Store the queue opens on its adapter.
pub const QUEUE_STORE: &str = "offline-actions";
/// Key holding the log inside [`QUEUE_STORE`].
pub const QUEUE_KEY: &str = "pending-actions";

/// What a completed replay pass removes from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Every action the pass attempted, delivered or not (at most once per pass)
    #[default]
    ClearAll,
    /// Only actions the server accepted; failures stay for the next pass
    RemoveDelivered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Actions left in the log after the pass
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Completed(ReplayReport),
    /// A pass was already in flight; this signal was coalesced into it
    AlreadyRunning,
}

/// Clears the in-flight flag however the pass ends.
struct ReplayGuard<'a>(&'a AtomicBool);

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct OfflineQueue {
    adapter: Arc<dyn PersistenceAdapter>,
    handle: StoreHandle,
    transport: Arc<dyn Transport>,
    policy: ReplayPolicy,
    replaying: AtomicBool,
    /// Held across every read-modify-write of the log, never across a fetch
    log_lock: Mutex<()>,
}

impl OfflineQueue {
    /// Opens (creating on first use) the durable log.
    pub fn open(
        adapter: Arc<dyn PersistenceAdapter>,
        transport: Arc<dyn Transport>,
        policy: ReplayPolicy,
    ) -> Result<Self> {
        let handle = adapter.open(QUEUE_STORE)?;
        Ok(Self {
            adapter,
            handle,
            transport,
            policy,
            replaying: AtomicBool::new(false),
            log_lock: Mutex::new(()),
        })
    }

    // == Enqueue ==
    /// Appends a write to the log. Identical requests are kept as separate actions.
    pub fn enqueue(&self, request: Request) -> Result<PendingAction> {
        let action = PendingAction::new(request);
        {
            let _guard = self.lock_log();
            let mut log = self.pending()?;
            log.push(action.clone());
            self.write(&log)?;
        }
        debug!("Queued {} {} as {}", action.request.method, action.request.url, action.id);
        Ok(action)
    }

    /// Queued actions in enqueue order. An unreadable log counts as empty.
    pub fn pending(&self) -> Result<Vec<PendingAction>> {
        let Some(raw) = self.adapter.get(&self.handle, QUEUE_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(log) => Ok(log),
            Err(err) => {
                warn!("Discarding unreadable offline queue: {}", err);
                Ok(Vec::new())
            }
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::SeqCst)
    }

    // == Replay ==
    /// Sends every queued action once, strictly in order.
    ///
    /// Failures are logged and do not stop the pass. Actions enqueued while
    /// the pass is running are not part of it and are never removed by it.
    pub async fn replay(&self) -> Result<ReplayOutcome> {
        if self.replaying.swap(true, Ordering::SeqCst) {
            debug!("Replay already in progress, coalescing signal");
            return Ok(ReplayOutcome::AlreadyRunning);
        }
        let _guard = ReplayGuard(&self.replaying);

        let actions = self.pending()?;
        let mut report = ReplayReport {
            attempted: actions.len(),
            ..ReplayReport::default()
        };
        let mut delivered: HashSet<Uuid> = HashSet::new();

        for action in &actions {
            match self.transport.fetch(&action.request).await {
                Ok(response) if response.ok() => {
                    delivered.insert(action.id);
                    report.delivered += 1;
                }
                Ok(response) => {
                    warn!(
                        "Replay of {} {} rejected with status {}",
                        action.request.method, action.request.url, response.status
                    );
                    report.failed += 1;
                }
                Err(err) => {
                    warn!(
                        "Replay of {} {} failed: {}",
                        action.request.method, action.request.url, err
                    );
                    report.failed += 1;
                }
            }
        }

        let processed: HashSet<Uuid> = match self.policy {
            ReplayPolicy::ClearAll => actions.iter().map(|a| a.id).collect(),
            ReplayPolicy::RemoveDelivered => delivered,
        };
        report.remaining = {
            let _guard = self.lock_log();
            let mut log = self.pending()?;
            log.retain(|action| !processed.contains(&action.id));
            self.write(&log)?;
            log.len()
        };

        info!(
            "Offline replay finished: {} delivered, {} failed, {} remaining",
            report.delivered, report.failed, report.remaining
        );
        Ok(ReplayOutcome::Completed(report))
    }

    fn lock_log(&self) -> MutexGuard<'_, ()> {
        self.log_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, log: &[PendingAction]) -> Result<()> {
        if log.is_empty() {
            return self.adapter.delete(&self.handle, QUEUE_KEY);
        }
        let raw = serde_json::to_string(log)?;
        self.adapter.put(&self.handle, QUEUE_KEY, &raw)
    }
}
