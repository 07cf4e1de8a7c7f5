//! Stale-while-revalidate: answer from cache now, refresh for next time.

use std::sync::Arc;

use super::{Outcome, StrategyContext, lookup, remember};
use crate::request::InterceptedRequest;

/// Serve the cached response if there is one, refreshing it in the background.
///
/// On a miss the network response is awaited, stored if ok, and returned.
/// If the network fails on a miss the caller gets the network failure.
pub async fn run(ctx: &StrategyContext<'_>, request: &InterceptedRequest) -> Outcome {
    let key = request.cache_key();

    if let Some(cached) = lookup(ctx.store, &key).await {
        let store = ctx.store.clone();
        let transport = Arc::clone(ctx.transport);
        let request = request.clone();
        ctx.refresher.spawn(async move {
            match transport.fetch(&request).await {
                Ok(fresh) => remember(&store, &key, &fresh).await,
                Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
            }
        });
        return Outcome::Response(cached);
    }

    match ctx.transport.fetch(request).await {
        Ok(response) => {
            remember(ctx.store, &key, &response).await;
            Outcome::Response(response)
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "no cached copy and network failed");
            Outcome::NetworkError(e.to_string())
        }
    }
}
