//! Caching strategies.
//!
//! Every route class maps to exactly one [`Strategy`]. A strategy only
//! touches the store and transport it is handed through a
//! [`StrategyContext`], and always produces an [`Outcome`]: network and
//! store failures are recovered inside the strategy.
//!
//! Only responses whose status is 2xx are ever written to a store.

pub mod cache_first;
pub mod network_first;
pub mod placeholder_fallback;
pub mod stale_while_revalidate;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use offgrid_core::{CacheKey, CacheStore, Snapshot};
use tokio::task::JoinSet;

use crate::classify::RouteClass;
use crate::fetch::Transport;

/// Result of routing one request.
#[derive(Debug)]
pub enum Outcome {
    /// Answer the request with this response.
    Response(Snapshot),
    /// Answer the request with a transport-level failure.
    NetworkError(String),
    /// Do not intercept; the host's own transport handles the request.
    PassThrough,
}

impl Outcome {
    pub fn into_response(self) -> Option<Snapshot> {
        match self {
            Outcome::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Response(_) => "response",
            Outcome::NetworkError(_) => "network_error",
            Outcome::PassThrough => "pass_through",
        }
    }
}

/// Caching strategy applied to a route class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PlaceholderFallback,
    StaleWhileRevalidate,
    NetworkFirst,
    CacheFirst,
    PassThrough,
}

impl Strategy {
    pub fn for_class(class: RouteClass) -> Self {
        match class {
            RouteClass::IconAsset => Strategy::PlaceholderFallback,
            RouteClass::CdnAsset | RouteClass::Default => Strategy::StaleWhileRevalidate,
            RouteClass::Navigation => Strategy::NetworkFirst,
            RouteClass::ShellAsset => Strategy::CacheFirst,
            RouteClass::Ignored => Strategy::PassThrough,
        }
    }
}

/// The store and network a strategy runs against.
pub struct StrategyContext<'a> {
    pub store: &'a CacheStore,
    pub transport: &'a Arc<dyn Transport>,
    pub refresher: &'a Refresher,
}

/// Detached background refreshes.
///
/// Tasks spawned here are never awaited on the request path; their only
/// observable effect is a store write. [`Refresher::settle`] exists for
/// shutdown and tests.
#[derive(Default)]
pub struct Refresher {
    tasks: Mutex<JoinSet<()>>,
}

impl Refresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a refresh task onto the current runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of refreshes not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Wait for every refresh spawned so far, including ones spawned while waiting.
    pub async fn settle(&self) {
        loop {
            let mut drained = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if drained.is_empty() {
                return;
            }
            while let Some(result) = drained.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background refresh task failed");
                }
            }
        }
    }
}

/// Store lookup that treats a store failure as a miss.
pub(crate) async fn lookup(store: &CacheStore, key: &CacheKey) -> Option<Snapshot> {
    match store.get(key).await {
        Ok(hit) => {
            tracing::debug!(store = store.name(), url = key.url(), hit = hit.is_some(), "cache lookup");
            hit
        }
        Err(e) => {
            tracing::warn!(store = store.name(), url = key.url(), error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

/// Write a response if it is 2xx; store failures are logged and dropped.
pub(crate) async fn remember(store: &CacheStore, key: &CacheKey, response: &Snapshot) {
    if !response.is_ok() {
        tracing::debug!(url = key.url(), status = response.status, "not caching non-ok response");
        return;
    }
    if let Err(e) = store.put(key, response).await {
        tracing::warn!(store = store.name(), url = key.url(), error = %e, "cache write failed");
    }
}
