//! cache_stores tool implementation.
//!
//! Lists every store in the database and marks the current one.

use offgrid_client::Router;
use offgrid_core::{CacheDb, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_stores tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresParams {}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Name of the store for the running version.
    pub current: String,
    /// All store names, sorted.
    pub stores: Vec<StoreSummary>,
    /// Lifecycle state of the router.
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    /// Stored request URLs, sorted.
    pub urls: Vec<String>,
}

/// Read-only summary of one store; a store deleted meanwhile reads as empty.
async fn summarize(db: &CacheDb, name: String) -> Result<StoreSummary, Error> {
    let store = db.store(&name);
    let entries = store.len().await?;
    let urls = store.keys().await?;
    Ok(StoreSummary { name, entries, urls })
}

pub async fn stores(router: &Router) -> Result<CacheStoresOutput, Error> {
    let names = router.db().list_store_names().await?;
    let mut stores = Vec::with_capacity(names.len());
    for name in names {
        stores.push(summarize(router.db(), name).await?);
    }

    Ok(CacheStoresOutput { current: router.store_name().to_string(), stores, state: router.state().as_str().into() })
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(router: &Router, _params: CacheStoresParams) -> Result<CallToolResult, McpError> {
    let output = stores(router).await?;
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize stores: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
