//! Deferred write held by the offline queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Request;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: Uuid,
    pub request: Request,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(request: Request) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            enqueued_at: Utc::now(),
        }
    }
}
