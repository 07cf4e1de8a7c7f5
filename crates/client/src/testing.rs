//! Scripted transport for strategy, lifecycle, and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use offgrid_core::{CacheDb, CacheKey, CacheStore, Error, Snapshot};

use crate::fetch::Transport;
use crate::request::InterceptedRequest;
use crate::strategy::{Refresher, StrategyContext};

#[derive(Clone)]
enum Reply {
    Respond { status: u16, content_type: String, body: Bytes },
    Hang,
}

/// Answers only the URLs it has been told about; everything else is offline.
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        let reply = Reply::Respond {
            status,
            content_type: content_type.to_string(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        };
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    /// Accept the request but never answer.
    pub(crate) fn hang(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Hang);
    }

    pub(crate) fn go_offline(&self) {
        self.replies.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Snapshot, Error> {
        let url = request.url.as_str().to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond { status, content_type, body }) => {
                Ok(Snapshot::new(status, vec![("content-type".into(), content_type)], body))
            }
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(Error::Network(format!("{url}: offline"))),
        }
    }
}

/// A store, a stub network, and a refresher wired together.
pub(crate) struct Harness {
    pub(crate) store: CacheStore,
    pub(crate) stub: Arc<StubTransport>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) refresher: Refresher,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("offgrid-cache-v1").await.unwrap();
        let stub = Arc::new(StubTransport::new());
        let transport: Arc<dyn Transport> = stub.clone();
        Self { store, stub, transport, refresher: Refresher::new() }
    }

    pub(crate) fn ctx(&self) -> StrategyContext<'_> {
        StrategyContext { store: &self.store, transport: &self.transport, refresher: &self.refresher }
    }

    pub(crate) async fn seed(&self, url: &str, body: &str) {
        let response = Snapshot::new(200, vec![("content-type".into(), "text/plain".into())], body.to_string());
        self.store.put(&CacheKey::get(url), &response).await.unwrap();
    }

    pub(crate) async fn stored_body(&self, url: &str) -> Option<Bytes> {
        self.store.get(&CacheKey::get(url)).await.unwrap().map(|s| s.body)
    }
}
