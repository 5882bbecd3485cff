//! In-process transport with scripted responses.
//!
//! Used by hosts that want a deterministic network (previews, demos) and by
//! the crate's own tests. Fetches can be held open until released to observe
//! what callers do while a request is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::Transport;
use crate::error::{CacheError, Result};
use crate::models::{Request, Response};

#[derive(Debug, Clone)]
enum Reply {
    Respond(Response),
    Fail,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Request>>,
    offline: AtomicBool,
    held: AtomicBool,
    released: Notify,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every fetch of `url` with `status` and `body` until re-scripted.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.script(url, Reply::Respond(Response::new(url, status, body)));
    }

    /// Makes every fetch of `url` fail as a network error.
    pub fn fail(&self, url: &str) {
        self.script(url, Reply::Fail);
    }

    /// Makes every fetch fail regardless of scripts.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Parks subsequent fetches until [`ScriptedTransport::release`].
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Lets parked and future fetches proceed.
    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.released.notify_waiters();
    }

    /// Number of fetches issued for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.lock_calls()
            .iter()
            .filter(|req| req.url.as_str() == url)
            .count()
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.lock_calls().clone()
    }

    fn script(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), reply);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Request>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.lock_calls().push(request.clone());

        loop {
            // Registered before the check so a concurrent release is not missed
            let released = self.released.notified();
            if !self.held.load(Ordering::SeqCst) {
                break;
            }
            released.await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Network(format!("offline: {}", request.url)));
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request.url.as_str())
            .cloned();

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) => Err(CacheError::Network(format!(
                "connection refused: {}",
                request.url
            ))),
            None => Ok(Response::new(request.url.as_str(), 404, "")),
        }
    }
}
