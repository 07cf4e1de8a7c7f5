//! Placeholder-fallback: cache, then network, then a synthesized image.

use offgrid_core::Snapshot;

use super::{Outcome, StrategyContext, lookup, remember};
use crate::placeholder::synthesize_placeholder;
use crate::request::InterceptedRequest;

/// Serve an icon, never failing.
///
/// A network failure or non-ok status is swallowed; the placeholder is
/// stored under the request's key so later requests hit the cache.
pub async fn run(ctx: &StrategyContext<'_>, request: &InterceptedRequest) -> Outcome {
    let key = request.cache_key();

    if let Some(cached) = lookup(ctx.store, &key).await {
        return Outcome::Response(cached);
    }

    match ctx.transport.fetch(request).await {
        Ok(response) if response.is_ok() => {
            remember(ctx.store, &key, &response).await;
            return Outcome::Response(response);
        }
        Ok(response) => {
            tracing::debug!(url = %request.url, status = response.status, "icon unavailable, using placeholder");
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "icon fetch failed, using placeholder");
        }
    }

    let placeholder: Snapshot = synthesize_placeholder();
    remember(ctx.store, &key, &placeholder).await;
    Outcome::Response(placeholder)
}
