//! Pexels video search.
//!
//! Picks the first rendition whose resolution exactly matches the target.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
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
struct PexelsSearchResponse {
    videos: Option<Vec<PexelsVideo>>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    width: Option<u32>,
    height: Option<u32>,
    link: String,
}

/// Pexels API client.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    http: Client,
    base_url: String,
    per_page: u32,
    keys: ApiKeys,
    counter: RotationCounter,
}

impl PexelsClient {
    pub fn new(http: Client, config: &StockConfig, counter: RotationCounter) -> Self {
        Self {
            http,
            base_url: config.pexels_base_url.trim_end_matches('/').to_string(),
            per_page: config.pexels_per_page,
            keys: config.pexels_keys.clone(),
            counter,
        }
    }

    async fn fetch(&self, term: &str, aspect: VideoAspect, api_key: &str) -> StockResult<String> {
        let url = format!("{}/videos/search", self.base_url);
        let per_page = self.per_page.to_string();

        info!(
            url = %url,
            term = %term,
            orientation = aspect.orientation(),
            "Searching Pexels videos"
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", api_key)
            .query(&[
                ("query", term),
                ("per_page", per_page.as_str()),
                ("orientation", aspect.orientation()),
            ])
            .send()
            .await?;

        read_body(response).await
    }
}

/// Select candidates from a Pexels response body.
fn select_candidates(
    body: &str,
    min_duration: f64,
    aspect: VideoAspect,
) -> StockResult<Vec<MaterialCandidate>> {
    let response: PexelsSearchResponse = serde_json::from_str(body)?;
    let videos = response
        .videos
        .ok_or_else(|| StockError::invalid_response(format!("no 'videos' in response: {}", body)))?;

    let (width, height) = aspect.resolution();
    let candidates = videos
        .iter()
        .filter(|v| v.duration >= min_duration)
        .filter_map(|v| {
            v.video_files
                .iter()
                .find(|f| f.width == Some(width) && f.height == Some(height))
                .map(|f| MaterialCandidate::new(Provider::Pexels, f.link.clone(), v.duration))
        })
        .collect();

    Ok(candidates)
}

#[async_trait]
impl StockProvider for PexelsClient {
    fn provider(&self) -> Provider {
        Provider::Pexels
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
            .fetch(term, aspect, api_key)
            .await
            .and_then(|body| select_candidates(&body, min_duration, aspect));
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(candidates) => {
                debug!(term = %term, count = candidates.len(), "Pexels search complete");
                record_search(Provider::Pexels, "ok", latency_ms);
                record_candidates(Provider::Pexels, candidates.len());
            }
            Err(e) => {
                error!(term = %term, error = %e, "Pexels search failed");
                record_search(Provider::Pexels, "error", latency_ms);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_exact_resolution_only() {
        let body = r#"{
            "videos": [
                {"duration": 12, "video_files": [
                    {"width": 720, "height": 1280, "link": "https://v/1-sd.mp4"},
                    {"width": 1080, "height": 1920, "link": "https://v/1-hd.mp4"},
                    {"width": 1080, "height": 1920, "link": "https://v/1-hd-alt.mp4"}
                ]},
                {"duration": 3, "video_files": [
                    {"width": 1080, "height": 1920, "link": "https://v/2-hd.mp4"}
                ]},
                {"duration": 9, "video_files": [
                    {"width": 2160, "height": 3840, "link": "https://v/3-uhd.mp4"}
                ]}
            ]
        }"#;

        let candidates = select_candidates(body, 5.0, VideoAspect::Portrait).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://v/1-hd.mp4");
        assert_eq!(candidates[0].duration, 12.0);
        assert_eq!(candidates[0].provider, Provider::Pexels);
    }

    #[test]
    fn test_missing_dimensions_are_skipped() {
        let body = r#"{"videos": [{"duration": 10, "video_files": [
            {"width": null, "height": null, "link": "https://v/hls.m3u8"},
            {"width": 1920, "height": 1080, "link": "https://v/hd.mp4"}
        ]}]}"#;

        let candidates = select_candidates(body, 5.0, VideoAspect::Landscape).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://v/hd.mp4");
    }

    #[test]
    fn test_missing_envelope_is_invalid_response() {
        let err = select_candidates(r#"{"error": "bad key"}"#, 5.0, VideoAspect::Portrait)
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidResponse(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_result_is_ok() {
        let candidates = select_candidates(r#"{"videos": []}"#, 5.0, VideoAspect::Portrait).unwrap();
        assert!(candidates.is_empty());
    }
}
