//! The router: one object wiring classifier, strategies, and lifecycle.
//!
//! Built once at startup from configuration. The host calls
//! [`Router::install`] and [`Router::activate`] on lifecycle events and
//! [`Router::handle`] for every intercepted request.

use std::sync::Arc;

use offgrid_core::{AppConfig, CacheDb, CacheKey, CacheStore, ConfigError, Error};
use reqwest::Method;
use url::Url;

use crate::classify::{Classifier, RouteClass};
use crate::fetch::{Transport, resolve};
use crate::lifecycle::{ActivateReport, InstallReport, Lifecycle, LifecycleState};
use crate::request::InterceptedRequest;
use crate::strategy::{
    Outcome, Refresher, Strategy, StrategyContext, cache_first, network_first, placeholder_fallback,
    stale_while_revalidate,
};

/// Offline-caching request router.
pub struct Router {
    origin: Url,
    classifier: Classifier,
    lifecycle: Lifecycle,
    transport: Arc<dyn Transport>,
    refresher: Refresher,
    shell_key: CacheKey,
    offline_html: String,
}

impl Router {
    /// Build a router from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin, icon pattern, shell
    /// root, or a shell manifest entry cannot be resolved.
    pub fn new(config: &AppConfig, db: CacheDb, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let origin = config.origin_url()?;
        let classifier = Classifier::from_config(config)?;

        let shell = config
            .app_shell
            .iter()
            .map(|entry| {
                resolve(&origin, entry)
                    .map_err(|e| ConfigError::Invalid { field: "app_shell".into(), reason: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shell_root = resolve(&origin, &config.shell_root)
            .map_err(|e| ConfigError::Invalid { field: "shell_root".into(), reason: e.to_string() })?;

        Ok(Self {
            origin,
            classifier,
            lifecycle: Lifecycle::new(db, config.store_name(), shell),
            transport,
            refresher: Refresher::new(),
            shell_key: CacheKey::get(shell_root.as_str()),
            offline_html: config.offline_html.clone(),
        })
    }

    /// Handle the install lifecycle event.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install(self.transport.as_ref()).await
    }

    /// Handle the activate lifecycle event.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.activate().await
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn store_name(&self) -> &str {
        self.lifecycle.store_name()
    }

    pub fn db(&self) -> &CacheDb {
        self.lifecycle.db()
    }

    /// The current version's store, once installed.
    pub fn current_store(&self) -> Option<&CacheStore> {
        self.lifecycle.current_store()
    }

    /// Serving origin that relative URLs resolve against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn classify(&self, request: &InterceptedRequest) -> RouteClass {
        self.classifier.classify(request)
    }

    /// Route one intercepted request.
    ///
    /// Never fails: the worst outcomes are a synthesized response or
    /// [`Outcome::NetworkError`]. Until activation completes every request
    /// passes through. Only GET requests touch the store; any other method
    /// goes straight to the network.
    pub async fn handle(&self, request: &InterceptedRequest) -> Outcome {
        let Some(store) = self.lifecycle.current_store().filter(|_| self.lifecycle.controls_clients()) else {
            tracing::trace!(url = %request.url, "not controlling clients yet");
            return Outcome::PassThrough;
        };

        let class = self.classify(request);
        let strategy = Strategy::for_class(class);
        tracing::debug!(url = %request.url, class = %class, ?strategy, "routing request");

        if strategy != Strategy::PassThrough && request.method != Method::GET {
            return self.forward(request).await;
        }

        let ctx = StrategyContext { store, transport: &self.transport, refresher: &self.refresher };
        match strategy {
            Strategy::PlaceholderFallback => placeholder_fallback::run(&ctx, request).await,
            Strategy::StaleWhileRevalidate => stale_while_revalidate::run(&ctx, request).await,
            Strategy::NetworkFirst => network_first::run(&ctx, request, &self.shell_key, &self.offline_html).await,
            Strategy::CacheFirst => cache_first::run(&ctx, request).await,
            Strategy::PassThrough => {
                tracing::trace!(url = %request.url, "passing through");
                Outcome::PassThrough
            }
        }
    }

    async fn forward(&self, request: &InterceptedRequest) -> Outcome {
        tracing::debug!(url = %request.url, method = %request.method, "uncacheable method, forwarding");
        match self.transport.fetch(request).await {
            Ok(response) => Outcome::Response(response),
            Err(e) => Outcome::NetworkError(e.to_string()),
        }
    }

    /// Wait for outstanding background refreshes.
    pub async fn settle(&self) {
        self.refresher.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::TRANSPARENT_PNG;
    use crate::request::RequestMode;
    use crate::testing::StubTransport;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn router_with(config: AppConfig, db: CacheDb) -> (Router, Arc<StubTransport>) {
        let stub = Arc::new(StubTransport::new());
        let router = Router::new(&config, db, stub.clone()).unwrap();
        (router, stub)
    }

    async fn active_router() -> (Router, Arc<StubTransport>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (router, stub) = router_with(AppConfig::default(), db);
        router.install().await.unwrap();
        router.activate().await.unwrap();
        (router, stub)
    }

    #[tokio::test]
    async fn test_pass_through_before_activation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (router, _stub) = router_with(AppConfig::default(), db);

        let outcome = router.handle(&InterceptedRequest::get(url("http://localhost:8000/app.js"))).await;
        assert!(matches!(outcome, Outcome::PassThrough));

        router.install().await.unwrap();
        let outcome = router.handle(&InterceptedRequest::get(url("http://localhost:8000/app.js"))).await;
        assert!(matches!(outcome, Outcome::PassThrough));
    }

    #[tokio::test]
    async fn test_icon_offline_scenario() {
        let (router, _stub) = active_router().await;
        let request = InterceptedRequest::get(url("http://localhost:8000/icons/icon-192.png"));

        let response = router.handle(&request).await.into_response().unwrap();

        assert_eq!(response.content_type(), Some("image/png"));
        assert!(response.header("cache-control").unwrap().contains("immutable"));
        assert_eq!(response.body, TRANSPARENT_PNG);
        let store = router.current_store().unwrap();
        assert!(store.get(&request.cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_navigation_scenario() {
        let (router, stub) = active_router().await;
        stub.respond("http://localhost:8000/", 200, "text/html", "<html>aquarium</html>");
        let request = InterceptedRequest::navigate(url("http://localhost:8000/"));

        let online = router.handle(&request).await.into_response().unwrap();
        assert_eq!(online.body, "<html>aquarium</html>");

        let store = router.current_store().unwrap();
        let shell = store.get(&CacheKey::get("http://localhost:8000/index.html")).await.unwrap().unwrap();
        assert_eq!(shell, online);

        stub.go_offline();
        let offline = router.handle(&request).await.into_response().unwrap();
        assert_eq!(offline, online);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell() {
        let (router, _stub) = active_router().await;
        let request = InterceptedRequest::get(url("http://localhost:8000/tank")).with_accept("text/html");

        let response = router.handle(&request).await.into_response().unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<h1>Offline</h1>");
    }

    #[tokio::test]
    async fn test_cdn_scenario() {
        let (router, stub) = active_router().await;
        let cdn = "https://cdn.jsdelivr.net/pyodide/v0.26.2/full/pyodide.js";
        let request = InterceptedRequest::get(url(cdn)).with_mode(RequestMode::Cors);
        let store = router.current_store().unwrap();
        store
            .put(&request.cache_key(), &offgrid_core::Snapshot::new(200, vec![], "stale"))
            .await
            .unwrap();
        stub.respond(cdn, 200, "text/javascript", "fresh");

        let first = router.handle(&request).await.into_response().unwrap();
        assert_eq!(first.body, "stale");

        router.settle().await;

        let second = router.handle(&request).await.into_response().unwrap();
        assert_eq!(second.body, "fresh");
        router.settle().await;
    }

    #[tokio::test]
    async fn test_post_is_never_served_from_store() {
        let (router, stub) = active_router().await;
        let save = "http://localhost:8000/api/save";
        let request = InterceptedRequest::new(Method::POST, url(save));

        stub.respond(save, 200, "application/json", r#"{"saved":1}"#);
        let first = router.handle(&request).await.into_response().unwrap();
        router.settle().await;

        stub.respond(save, 200, "application/json", r#"{"saved":2}"#);
        let second = router.handle(&request).await.into_response().unwrap();
        router.settle().await;

        assert_eq!(first.body, r#"{"saved":1}"#);
        assert_eq!(second.body, r#"{"saved":2}"#);
        assert_eq!(stub.calls(save), 2);
        assert_eq!(router.current_store().unwrap().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_post_offline_is_network_error() {
        let (router, _stub) = active_router().await;
        let request = InterceptedRequest::new(Method::POST, url("http://localhost:8000/app.js"));

        let outcome = router.handle(&request).await;

        assert!(matches!(outcome, Outcome::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through() {
        let (router, stub) = active_router().await;
        let request = InterceptedRequest::get(url("https://fonts.example.com/font.woff2"));

        let outcome = router.handle(&request).await;

        assert!(matches!(outcome, Outcome::PassThrough));
        assert_eq!(stub.calls("https://fonts.example.com/font.woff2"), 0);
    }

    #[tokio::test]
    async fn test_shell_asset_served_from_install() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (router, stub) = router_with(AppConfig::default(), db);
        stub.respond("http://localhost:8000/styles.css", 200, "text/css", "body{}");
        router.install().await.unwrap();
        router.activate().await.unwrap();
        stub.go_offline();

        let request = InterceptedRequest::get(url("http://localhost:8000/styles.css"));
        let response = router.handle(&request).await.into_response().unwrap();

        assert_eq!(response.body, "body{}");
        assert_eq!(stub.calls("http://localhost:8000/styles.css"), 1);
    }

    #[tokio::test]
    async fn test_default_offline_is_network_error() {
        let (router, _stub) = active_router().await;
        let request = InterceptedRequest::get(url("http://localhost:8000/data/fish.json"));

        let outcome = router.handle(&request).await;

        assert!(matches!(outcome, Outcome::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_version_bump_sweeps_previous_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (v1, _stub) = router_with(AppConfig { version: "v1".into(), ..Default::default() }, db.clone());
        v1.install().await.unwrap();
        v1.activate().await.unwrap();

        let (v2, _stub) = router_with(AppConfig { version: "v2".into(), ..Default::default() }, db.clone());
        v2.install().await.unwrap();
        let report = v2.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["offgrid-cache-v1".to_string()]);
        let names: Vec<String> = db.list_store_names().await.unwrap().into_iter().collect();
        assert_eq!(names, vec!["offgrid-cache-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_shell_root_rejected() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig { shell_root: "http://[::1".into(), ..Default::default() };
        let stub: Arc<dyn Transport> = Arc::new(StubTransport::new());

        let result = Router::new(&config, db, stub);

        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "shell_root"));
    }
}
