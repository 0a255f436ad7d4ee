//! Pixabay video search.
//!
//! Pixabay returns a set of named renditions per hit (large, medium, small,
//! tiny). They are tried in the order the response lists them and the first
//! one at least as wide as the target wins.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, error, info};

use matres_models::{MaterialCandidate, Provider, VideoAspect};

use crate::client::read_body;
use crate::config::StockConfig;
use crate::credentials::{ApiKeys, RotationCounter};
use crate::error::{StockError, StockResult};
use crate::metrics::{record_candidates, record_search};
use crate::provider::StockProvider;

#[derive(Debug, Deserialize)]
struct PixabaySearchResponse {
    hits: Option<Vec<PixabayHit>>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    duration: f64,
    videos: PixabayRenditions,
}

/// Renditions in response order. Null entries are dropped.
#[derive(Debug, Default)]
struct PixabayRenditions(Vec<PixabayRendition>);

impl<'de> Deserialize<'de> for PixabayRenditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RenditionsVisitor;

        impl<'de> Visitor<'de> for RenditionsVisitor {
            type Value = PixabayRenditions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of named video renditions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut renditions = Vec::new();
                while let Some((_, rendition)) =
                    map.next_entry::<IgnoredAny, Option<PixabayRendition>>()?
                {
                    renditions.extend(rendition);
                }
                Ok(PixabayRenditions(renditions))
            }
        }

        deserializer.deserialize_map(RenditionsVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct PixabayRendition {
    url: String,
    width: u32,
}

/// Pixabay API client.
#[derive(Debug, Clone)]
pub struct PixabayClient {
    http: Client,
    base_url: String,
    per_page: u32,
    keys: ApiKeys,
    counter: RotationCounter,
}

impl PixabayClient {
    pub fn new(http: Client, config: &StockConfig, counter: RotationCounter) -> Self {
        Self {
            http,
            base_url: config.pixabay_base_url.trim_end_matches('/').to_string(),
            per_page: config.pixabay_per_page,
            keys: config.pixabay_keys.clone(),
            counter,
        }
    }

    async fn fetch(&self, term: &str, api_key: &str) -> StockResult<String> {
        let url = format!("{}/api/videos/", self.base_url);
        let per_page = self.per_page.to_string();

        // The key travels in the query string; keep it out of the logs.
        info!(url = %url, term = %term, "Searching Pixabay videos");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", term),
                ("video_type", "all"),
                ("per_page", per_page.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        read_body(response).await
    }
}

/// Select candidates from a Pixabay response body.
fn select_candidates(
    body: &str,
    min_duration: f64,
    aspect: VideoAspect,
) -> StockResult<Vec<MaterialCandidate>> {
    let response: PixabaySearchResponse = serde_json::from_str(body)?;
    let hits = response
        .hits
        .ok_or_else(|| StockError::invalid_response(format!("no 'hits' in response: {}", body)))?;

    let (width, _) = aspect.resolution();
    let candidates = hits
        .iter()
        .filter(|h| h.duration >= min_duration)
        .filter_map(|h| {
            h.videos
                .0
                .iter()
                .find(|r| r.width >= width && !r.url.is_empty())
                .map(|r| MaterialCandidate::new(Provider::Pixabay, r.url.clone(), h.duration))
        })
        .collect();

    Ok(candidates)
}

#[async_trait]
impl StockProvider for PixabayClient {
    fn provider(&self) -> Provider {
        Provider::Pixabay
    }

    async fn search(
        &self,
        term: &str,
        min_duration: f64,
        aspect: VideoAspect,
    ) -> StockResult<Vec<MaterialCandidate>> {
        let api_key = self.keys.select(&self.counter)?;
        let start = Instant::now();

        let result = self
            .fetch(term, api_key)
            .await
            .and_then(|body| select_candidates(&body, min_duration, aspect));
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(candidates) => {
                debug!(term = %term, count = candidates.len(), "Pixabay search complete");
                record_search(Provider::Pixabay, "ok", latency_ms);
                record_candidates(Provider::Pixabay, candidates.len());
            }
            Err(e) => {
                error!(term = %term, error = %e, "Pixabay search failed");
                record_search(Provider::Pixabay, "error", latency_ms);
            }
        }
        result
    }
}
