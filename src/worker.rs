//! Runtime event routing.
//!
//! The host runtime delivers lifecycle, message, sync and fetch events; the
//! worker hands each to the resource cache or the offline queue.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ResourceCacheConfig;
use crate::error::Result;
use crate::models::{PendingAction, Request, Response};
use crate::persistence::PersistenceAdapter;
use crate::queue::{OfflineQueue, ReplayOutcome};
use crate::resource::{ActivationReport, ResourceCache, ResponseStore};
use crate::transport::Transport;

/// Message payload that forces activation.
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    /// Message posted by a page
    Message(String),
    /// Reconnect / background-sync signal
    Sync { tag: String },
    Fetch(Request),
}

#[derive(Debug)]
pub enum EventOutcome {
    /// Carries the activation report when a pending skip-waiting fired
    Installed(Option<ActivationReport>),
    Activated(ActivationReport),
    SkippedWaiting(Option<ActivationReport>),
    Replayed(ReplayOutcome),
    /// `None` when the request was not intercepted
    Fetched(Option<Response>),
    Ignored,
}

/// Result of [`CacheWorker::submit`].
#[derive(Debug)]
pub enum Submission {
    Sent(Response),
    /// Network unavailable; the write waits in the offline queue
    Queued(PendingAction),
}

pub struct CacheWorker {
    resources: ResourceCache,
    queue: OfflineQueue,
    transport: Arc<dyn Transport>,
    sync_tag: String,
}

impl CacheWorker {
    pub fn new(
        config: ResourceCacheConfig,
        store: Arc<dyn ResponseStore>,
        adapter: Arc<dyn PersistenceAdapter>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let queue = OfflineQueue::open(adapter, transport.clone(), config.replay_policy)?;
        let sync_tag = config.sync_tag.clone();
        let resources = ResourceCache::new(config, store, transport.clone());
        Ok(Self {
            resources,
            queue,
            transport,
            sync_tag,
        })
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => Ok(EventOutcome::Installed(self.resources.install().await?)),
            WorkerEvent::Activate => Ok(EventOutcome::Activated(self.resources.activate().await?)),
            WorkerEvent::Message(message) if message == SKIP_WAITING_MESSAGE => {
                info!("Skip-waiting requested");
                Ok(EventOutcome::SkippedWaiting(
                    self.resources.skip_waiting().await?,
                ))
            }
            WorkerEvent::Message(message) => {
                debug!("Ignoring message {}", message);
                Ok(EventOutcome::Ignored)
            }
            WorkerEvent::Sync { tag } if tag == self.sync_tag => {
                Ok(EventOutcome::Replayed(self.queue.replay().await?))
            }
            WorkerEvent::Sync { tag } => {
                debug!("Ignoring sync tag {}", tag);
                Ok(EventOutcome::Ignored)
            }
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetched(
                self.resources.handle_fetch(&request).await?,
            )),
        }
    }

    /// Sends a write now, or queues it for replay if the network is unreachable.
    /// A response of any status counts as sent.
    pub async fn submit(&self, request: Request) -> Result<Submission> {
        match self.transport.fetch(&request).await {
            Ok(response) => Ok(Submission::Sent(response)),
            Err(err) if err.is_network() => {
                debug!("Deferring {} {}: {}", request.method, request.url, err);
                Ok(Submission::Queued(self.queue.enqueue(request)?))
            }
            Err(err) => Err(err),
        }
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }
}
