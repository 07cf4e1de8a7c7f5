//! Cache-first for app shell assets.

use super::{Outcome, StrategyContext, lookup, remember};
use crate::request::InterceptedRequest;

/// Serve from the store; fetch and store only on a miss.
///
/// If the network fails, the store is consulted once more in case a
/// concurrent request filled it; otherwise the result is a network error.
pub async fn run(ctx: &StrategyContext<'_>, request: &InterceptedRequest) -> Outcome {
    let key = request.cache_key();

    if let Some(cached) = lookup(ctx.store, &key).await {
        return Outcome::Response(cached);
    }

    match ctx.transport.fetch(request).await {
        Ok(response) => {
            remember(ctx.store, &key, &response).await;
            Outcome::Response(response)
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "shell asset unavailable");
            match lookup(ctx.store, &key).await {
                Some(late) => Outcome::Response(late),
                None => Outcome::NetworkError(e.to_string()),
            }
        }
    }
}
