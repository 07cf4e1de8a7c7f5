//! Network-first navigation with a cached shell document as fallback.

use offgrid_core::CacheKey;

use super::{Outcome, StrategyContext, lookup, remember};
use crate::placeholder::offline_document;
use crate::request::InterceptedRequest;

/// Serve a navigation.
///
/// Every successful navigation response is stored under `shell_key`, so
/// all navigations share one cached document. When the network fails the
/// cached shell is served, or `offline_html` if nothing was cached.
/// A non-ok response from a reachable server is returned as is and not stored.
pub async fn run(
    ctx: &StrategyContext<'_>, request: &InterceptedRequest, shell_key: &CacheKey, offline_html: &str,
) -> Outcome {
    match ctx.transport.fetch(request).await {
        Ok(response) => {
            remember(ctx.store, shell_key, &response).await;
            Outcome::Response(response)
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "navigation offline, falling back to shell");
            match lookup(ctx.store, shell_key).await {
                Some(shell) => Outcome::Response(shell),
                None => Outcome::Response(offline_document(offline_html)),
            }
        }
    }
}
