//! The stock provider capability.

use async_trait::async_trait;
use tracing::warn;

use matres_models::{MaterialCandidate, Provider, VideoAspect};

use crate::error::StockResult;

/// A remote stock footage source.
///
/// `search` returns at most one candidate per qualifying result, in the
/// provider's own ordering. `Ok(vec![])` means the search worked but nothing
/// qualified; `Err` means the search itself failed.
#[async_trait]
pub trait StockProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn search(
        &self,
        term: &str,
        min_duration: f64,
        aspect: VideoAspect,
    ) -> StockResult<Vec<MaterialCandidate>>;
}

/// Search, collapsing non-fatal failures into an empty result.
///
/// Only configuration errors are returned.
pub async fn search_or_empty(
    provider: &dyn StockProvider,
    term: &str,
    min_duration: f64,
    aspect: VideoAspect,
) -> StockResult<Vec<MaterialCandidate>> {
    match provider.search(term, min_duration, aspect).await {
        Ok(candidates) => Ok(candidates),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(
                provider = %provider.provider(),
                term = %term,
                error = %e,
                retryable = e.is_retryable(),
                "Search failed, treating as no results"
            );
            Ok(Vec::new())
        }
    }
}
