//! Download cache for remote stock clips.
//!
//! Clips are stored as `vid-<sha256>.mp4`, keyed by the URL with its query
//! string removed, so signed variants of the same file share one entry. A
//! non-empty cached file is trusted as is; fresh downloads are probed and
//! discarded when they are not playable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use matres_models::{strip_query, BROWSER_USER_AGENT};

use crate::error::{MediaError, MediaResult};
use crate::probe::VideoProber;

/// Metric name constants.
pub mod names {
    /// Cache lookups by outcome (hit, miss, invalid).
    pub const CACHE_LOOKUPS_TOTAL: &str = "material_cache_lookups_total";
}

/// Download settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout (including body)
    pub timeout: Duration,
    /// Optional proxy URL applied to all schemes
    pub proxy: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            timeout: Duration::from_secs(240),
            proxy: None,
        }
    }
}

/// URL-keyed cache of downloaded clips.
pub struct DownloadCache {
    http: Client,
    prober: Arc<dyn VideoProber>,
}

impl DownloadCache {
    /// Create a cache that validates downloads with `prober`.
    pub fn new(config: DownloadConfig, prober: Arc<dyn VideoProber>) -> MediaResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(BROWSER_USER_AGENT);

        if let Some(proxy) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| MediaError::HttpClient(format!("Invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| MediaError::HttpClient(e.to_string()))?;

        Ok(Self { http, prober })
    }

    /// Cache key for a URL: SHA-256 of the URL without its query string.
    pub fn cache_key(url: &str) -> String {
        let digest = Sha256::digest(strip_query(url).as_bytes());
        format!("{:x}", digest)
    }

    /// Path a URL is cached at inside `dir`.
    pub fn cache_path(dir: &Path, url: &str) -> PathBuf {
        dir.join(format!("vid-{}.mp4", Self::cache_key(url)))
    }

    /// Return a local path for `url`, downloading it into `dir` if needed.
    ///
    /// - `Ok(Some(path))`: cached or freshly downloaded and playable
    /// - `Ok(None)`: downloaded but failed validation (file removed)
    /// - `Err(_)`: the fetch itself failed
    ///
    /// Single attempt; retries are up to the caller.
    pub async fn fetch(&self, url: &str, dir: &Path) -> MediaResult<Option<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let video_path = Self::cache_path(dir, url);

        if let Ok(metadata) = tokio::fs::metadata(&video_path).await {
            if metadata.len() > 0 {
                info!(path = %video_path.display(), "Video already cached");
                counter!(names::CACHE_LOOKUPS_TOTAL, "outcome" => "hit").increment(1);
                return Ok(Some(video_path));
            }
        }
        counter!(names::CACHE_LOOKUPS_TOTAL, "outcome" => "miss").increment(1);

        debug!(url = %url, path = %video_path.display(), "Downloading video");
        if let Err(e) = self.download_to(url, &video_path).await {
            let _ = tokio::fs::remove_file(&video_path).await;
            return Err(e);
        }

        match self.prober.probe(&video_path).await {
            Ok(info) if info.is_playable() => Ok(Some(video_path)),
            Ok(info) => {
                warn!(
                    path = %video_path.display(),
                    duration = info.duration,
                    fps = info.fps,
                    "Invalid video file, discarding"
                );
                self.discard(&video_path).await;
                Ok(None)
            }
            Err(e) => {
                warn!(path = %video_path.display(), error = %e, "Invalid video file, discarding");
                self.discard(&video_path).await;
                Ok(None)
            }
        }
    }

    async fn download_to(&self, url: &str, path: &Path) -> MediaResult<()> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "{} returned {}",
                url, status
            )));
        }

        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::download_failed(format!("{}: {}", url, e)))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn discard(&self, path: &Path) {
        counter!(names::CACHE_LOOKUPS_TOTAL, "outcome" => "invalid").increment(1);
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "Failed to remove invalid video");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::VideoInfo;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedProber(VideoInfo);

    #[async_trait]
    impl VideoProber for FixedProber {
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            Ok(self.0.clone())
        }
    }

    struct FailingProber;

    #[async_trait]
    impl VideoProber for FailingProber {
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            Err(MediaError::invalid_video("moov atom not found"))
        }
    }

    fn playable() -> Arc<dyn VideoProber> {
        Arc::new(FixedProber(VideoInfo {
            duration: 6.0,
            fps: 25.0,
            ..Default::default()
        }))
    }

    fn cache(prober: Arc<dyn VideoProber>) -> DownloadCache {
        DownloadCache::new(DownloadConfig::default(), prober).unwrap()
    }

    #[test]
    fn test_cache_key_ignores_query() {
        let a = DownloadCache::cache_key("https://cdn.example.com/v/1.mp4?token=a");
        let b = DownloadCache::cache_key("https://cdn.example.com/v/1.mp4?token=b");
        let c = DownloadCache::cache_key("https://cdn.example.com/v/2.mp4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cache_path_layout() {
        let path = DownloadCache::cache_path(Path::new("/cache"), "https://x/y.mp4");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("vid-"));
        assert!(name.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_second_fetch_reuses_cached_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake video bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = cache(playable());

        let first = cache
            .fetch(&format!("{}/clip.mp4?sig=one", server.uri()), dir.path())
            .await
            .unwrap()
            .unwrap();
        let second = cache
            .fetch(&format!("{}/clip.mp4?sig=two", server.uri()), dir.path())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"fake video bytes");
    }

    #[tokio::test]
    async fn test_invalid_download_is_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/broken.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a video".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/broken.mp4", server.uri());

        let result = cache(Arc::new(FailingProber)).fetch(&url, dir.path()).await.unwrap();

        assert!(result.is_none());
        assert!(!DownloadCache::cache_path(dir.path(), &url).exists());
    }

    #[tokio::test]
    async fn test_zero_fps_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"still image".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let prober = Arc::new(FixedProber(VideoInfo {
            duration: 5.0,
            fps: 0.0,
            ..Default::default()
        }));

        let result = cache(prober)
            .fetch(&format!("{}/still.mp4", server.uri()), dir.path())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/gone.mp4", server.uri());

        let err = cache(playable()).fetch(&url, dir.path()).await.unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!DownloadCache::cache_path(dir.path(), &url).exists());
    }

    #[tokio::test]
    async fn test_empty_cached_file_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"real bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/clip.mp4", server.uri());
        std::fs::write(DownloadCache::cache_path(dir.path(), &url), b"").unwrap();

        let path = cache(playable()).fetch(&url, dir.path()).await.unwrap().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"real bytes");
    }

    #[tokio::test]
    async fn test_creates_destination_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("tasks").join("t-1");

        let path = cache(playable())
            .fetch(&format!("{}/a.mp4", server.uri()), &nested)
            .await
            .unwrap()
            .unwrap();
        assert!(path.starts_with(&nested));
    }
}
