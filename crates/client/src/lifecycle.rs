//! Install and activation of the current store version.
//!
//! States move `Uninstalled → Installing → Waiting → Active`. Install
//! opens the version's store and pre-populates it with the app shell on a
//! best-effort basis; activation deletes every other store and takes
//! control of clients. The host serializes these calls.

use std::sync::{OnceLock, PoisonError, RwLock};

use offgrid_core::{CacheDb, CacheKey, CacheStore, Error};
use url::Url;

use crate::fetch::Transport;
use crate::request::InterceptedRequest;
use crate::strategy::remember;

/// Lifecycle state of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    /// Installed and ready to supersede any previous instance.
    Waiting,
    /// Controlling clients.
    Active,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Active => "active",
        }
    }
}

/// What an install pass achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub store: String,
    pub cached: usize,
    pub failed: usize,
}

/// What an activation sweep removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub current: String,
    pub deleted: Vec<String>,
}

/// Owns the current store name and its state machine.
pub struct Lifecycle {
    db: CacheDb,
    store_name: String,
    shell: Vec<Url>,
    store: OnceLock<CacheStore>,
    state: RwLock<LifecycleState>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("store_name", &self.store_name)
            .field("shell", &self.shell.len())
            .field("state", &self.state())
            .finish()
    }
}

impl Lifecycle {
    /// `shell` holds absolute URLs of the app shell, in manifest order.
    pub fn new(db: CacheDb, store_name: impl Into<String>, shell: Vec<Url>) -> Self {
        Self {
            db,
            store_name: store_name.into(),
            shell,
            store: OnceLock::new(),
            state: RwLock::new(LifecycleState::Uninstalled),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(from = state.as_str(), to = next.as_str(), store = %self.store_name, "lifecycle transition");
        *state = next;
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// The current store, once install has opened it.
    pub fn current_store(&self) -> Option<&CacheStore> {
        self.store.get()
    }

    /// Whether intercepted requests are served by this instance.
    pub fn controls_clients(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Open the current store and pre-populate it with the app shell.
    ///
    /// Individual shell assets that fail to download, or answer with a
    /// non-ok status, are counted and skipped; they never fail the install.
    /// Re-running install with the same version reuses the same store.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be opened.
    pub async fn install(&self, transport: &dyn Transport) -> Result<InstallReport, Error> {
        let was_active = self.controls_clients();
        if !was_active {
            self.set_state(LifecycleState::Installing);
        }

        let store = match self.db.open_store(&self.store_name).await {
            Ok(store) => store,
            Err(e) => {
                if !was_active {
                    self.set_state(LifecycleState::Uninstalled);
                }
                return Err(e);
            }
        };

        let mut cached = 0;
        let mut failed = 0;
        for url in &self.shell {
            let request = InterceptedRequest::get(url.clone());
            match transport.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    remember(&store, &CacheKey::get(url.as_str()), &response).await;
                    cached += 1;
                }
                Ok(response) => {
                    tracing::warn!(url = %url, status = response.status, "shell asset not cached");
                    failed += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "shell asset not cached");
                    failed += 1;
                }
            }
        }

        if let Err(reopened) = self.store.set(store) {
            tracing::debug!(store = reopened.name(), "store already open, keeping existing handle");
        }
        if !was_active {
            self.set_state(LifecycleState::Waiting);
        }

        tracing::info!(store = %self.store_name, cached, failed, "install complete");
        Ok(InstallReport { store: self.store_name.clone(), cached, failed })
    }

    /// Delete every store except the current one, then take control of clients.
    ///
    /// Failures while listing or deleting stores are logged; they never
    /// prevent taking control.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if called before install completed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        match self.state() {
            LifecycleState::Waiting | LifecycleState::Active => {}
            other => {
                return Err(Error::InvalidInput(format!("cannot activate while {}", other.as_str())));
            }
        }

        let names = match self.db.list_store_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list stores, skipping sweep");
                Default::default()
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|name| name != &self.store_name) {
            match self.db.delete_store(&name).await {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(e) => tracing::warn!(store = %name, error = %e, "could not delete stale store"),
            }
        }

        self.set_state(LifecycleState::Active);
        tracing::info!(current = %self.store_name, deleted = deleted.len(), "activated and claimed clients");

        Ok(ActivateReport { current: self.store_name.clone(), deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;

    fn shell() -> Vec<Url> {
        ["http://localhost:8000/", "http://localhost:8000/index.html", "http://localhost:8000/app.js"]
            .into_iter()
            .map(|u| Url::parse(u).unwrap())
            .collect()
    }

    fn online_stub() -> StubTransport {
        let stub = StubTransport::new();
        stub.respond("http://localhost:8000/", 200, "text/html", "root");
        stub.respond("http://localhost:8000/index.html", 200, "text/html", "index");
        stub.respond("http://localhost:8000/app.js", 200, "text/javascript", "js");
        stub
    }

    #[tokio::test]
    async fn test_install_populates_shell() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db, "offgrid-cache-v1", shell());

        let report = lifecycle.install(&online_stub()).await.unwrap();

        assert_eq!(report, InstallReport { store: "offgrid-cache-v1".into(), cached: 3, failed: 0 });
        assert_eq!(lifecycle.state(), LifecycleState::Waiting);
        let store = lifecycle.current_store().unwrap();
        assert_eq!(store.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_is_best_effort() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db, "offgrid-cache-v1", shell());
        let stub = StubTransport::new();
        stub.respond("http://localhost:8000/index.html", 200, "text/html", "index");
        stub.respond("http://localhost:8000/app.js", 500, "text/plain", "oops");

        let report = lifecycle.install(&stub).await.unwrap();

        assert_eq!(report.cached, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(lifecycle.state(), LifecycleState::Waiting);
    }

    #[tokio::test]
    async fn test_install_fully_offline_still_installs() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db.clone(), "offgrid-cache-v1", shell());

        let report = lifecycle.install(&StubTransport::new()).await.unwrap();

        assert_eq!(report.cached, 0);
        assert!(db.has_store("offgrid-cache-v1").await.unwrap());
        assert!(lifecycle.activate().await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_install_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db.clone(), "offgrid-cache-v1", shell());
        let stub = online_stub();

        lifecycle.install(&stub).await.unwrap();
        lifecycle.install(&stub).await.unwrap();

        assert_eq!(db.list_store_names().await.unwrap().len(), 1);
        assert_eq!(lifecycle.current_store().unwrap().len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_activate_sweeps_other_versions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("offgrid-cache-v1").await.unwrap();
        let lifecycle = Lifecycle::new(db.clone(), "offgrid-cache-v2", shell());
        lifecycle.install(&online_stub()).await.unwrap();

        let report = lifecycle.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["offgrid-cache-v1".to_string()]);
        let remaining: Vec<String> = db.list_store_names().await.unwrap().into_iter().collect();
        assert_eq!(remaining, vec!["offgrid-cache-v2".to_string()]);
        assert!(lifecycle.controls_clients());
    }

    #[tokio::test]
    async fn test_activate_sweeps_foreign_store_names() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("scratch").await.unwrap();
        let lifecycle = Lifecycle::new(db.clone(), "offgrid-cache-v1", Vec::new());
        lifecycle.install(&StubTransport::new()).await.unwrap();

        lifecycle.activate().await.unwrap();

        assert!(!db.has_store("scratch").await.unwrap());
        assert!(db.has_store("offgrid-cache-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db, "offgrid-cache-v1", shell());

        let result = lifecycle.activate().await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(lifecycle.state(), LifecycleState::Uninstalled);
    }

    #[tokio::test]
    async fn test_reinstall_while_active_stays_active() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db, "offgrid-cache-v1", shell());
        let stub = online_stub();
        lifecycle.install(&stub).await.unwrap();
        lifecycle.activate().await.unwrap();

        lifecycle.install(&stub).await.unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_reinstall_keeps_store_handle() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let lifecycle = Lifecycle::new(db.clone(), "offgrid-cache-v1", shell());
        let stub = online_stub();
        lifecycle.install(&stub).await.unwrap();
        let first: *const CacheStore = lifecycle.current_store().unwrap();

        let report = lifecycle.install(&stub).await.unwrap();

        let second: *const CacheStore = lifecycle.current_store().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(report.store, "offgrid-cache-v1");
        assert_eq!(db.list_store_names().await.unwrap().len(), 1);
    }
}
