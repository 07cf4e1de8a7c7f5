//! cache_get tool implementation.
//!
//! Retrieves a stored entry from the current store by request.

use offgrid_client::Router;
use offgrid_client::fetch::canonicalize;
use offgrid_core::{CacheKey, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{BodyOutput, HeaderField, header_fields};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Request URL, absolute or relative to the serving origin.
    pub url: String,

    /// Request method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<HeaderField>,
    #[serde(flatten)]
    pub body: BodyOutput,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

pub async fn get(router: &Router, params: CacheGetParams) -> Result<CacheGetOutput, Error> {
    let url = canonicalize(&params.url, router.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = CacheKey::new(params.method.as_deref().unwrap_or("GET"), url.as_str());

    let store = router
        .current_store()
        .ok_or_else(|| Error::CacheMiss(format!("{} is not installed", router.store_name())))?;
    let entry = store
        .entry(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", key.method(), key.url())))?;

    let content_type = entry
        .headers
        .iter()
        .find(|(name, _)| name == "content-type")
        .map(|(_, value)| value.as_str());

    Ok(CacheGetOutput {
        store: store.name().to_string(),
        body: BodyOutput::encode(content_type, &entry.body),
        headers: header_fields(&entry.headers),
        method: entry.method,
        url: entry.url,
        status: entry.status,
        stored_at: entry.stored_at,
    })
}

/// Implementation of the cache_get tool.
pub async fn get_impl(router: &Router, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let output = get(router, params).await?;
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
