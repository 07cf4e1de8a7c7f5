//! Offline-by-default transport and router fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use offgrid_client::{InterceptedRequest, Router, Transport};
use offgrid_core::{AppConfig, CacheDb, Error, Snapshot};

/// Answers the URLs it was given; every other URL is unreachable.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, (u16, String, String)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, content_type.to_string(), body.to_string()));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Snapshot, Error> {
        let reply = self.replies.lock().unwrap().get(request.url.as_str()).cloned();
        match reply {
            Some((status, content_type, body)) => {
                Ok(Snapshot::new(status, vec![("content-type".into(), content_type)], body))
            }
            None => Err(Error::Network(format!("{}: unreachable", request.url))),
        }
    }
}

/// A router over an in-memory database, installed and activated while offline.
pub(crate) async fn active_router() -> (Router, Arc<ScriptedTransport>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedTransport::new());
    let router = Router::new(&AppConfig::default(), db, net.clone()).unwrap();
    router.install().await.unwrap();
    router.activate().await.unwrap();
    (router, net)
}
