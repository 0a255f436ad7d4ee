//! Stock provider configuration.

use std::time::Duration;

use crate::credentials::ApiKeys;

pub const PEXELS_BASE_URL: &str = "https://api.pexels.com";
pub const PIXABAY_BASE_URL: &str = "https://pixabay.com";

/// Stock provider configuration.
#[derive(Debug, Clone)]
pub struct StockConfig {
    /// Pexels API keys (rotated when several are set)
    pub pexels_keys: ApiKeys,
    /// Pixabay API keys (rotated when several are set)
    pub pixabay_keys: ApiKeys,
    /// Pexels API base URL
    pub pexels_base_url: String,
    /// Pixabay API base URL
    pub pixabay_base_url: String,
    /// Results requested per Pexels search
    pub pexels_per_page: u32,
    /// Results requested per Pixabay search
    pub pixabay_per_page: u32,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub timeout: Duration,
    /// Optional proxy URL applied to all schemes
    pub proxy: Option<String>,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            pexels_keys: ApiKeys::new("PEXELS_API_KEYS", Vec::new()),
            pixabay_keys: ApiKeys::new("PIXABAY_API_KEYS", Vec::new()),
            pexels_base_url: PEXELS_BASE_URL.to_string(),
            pixabay_base_url: PIXABAY_BASE_URL.to_string(),
            pexels_per_page: 20,
            pixabay_per_page: 50,
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
            proxy: None,
        }
    }
}

impl StockConfig {
    /// Create config from environment variables.
    ///
    /// Missing keys are not an error here; the first search against a
    /// provider without keys fails with a configuration error instead.
    pub fn from_env() -> Self {
        Self {
            pexels_keys: ApiKeys::from_env("PEXELS_API_KEYS"),
            pixabay_keys: ApiKeys::from_env("PIXABAY_API_KEYS"),
            pexels_base_url: std::env::var("PEXELS_BASE_URL")
                .unwrap_or_else(|_| PEXELS_BASE_URL.to_string()),
            pixabay_base_url: std::env::var("PIXABAY_BASE_URL")
                .unwrap_or_else(|_| PIXABAY_BASE_URL.to_string()),
            pexels_per_page: std::env::var("PEXELS_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            pixabay_per_page: std::env::var("PIXABAY_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            connect_timeout: Duration::from_secs(
                std::env::var("STOCK_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            timeout: Duration::from_secs(
                std::env::var("STOCK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            proxy: std::env::var("HTTP_PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Point both providers at one base URL (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.pexels_base_url = base_url.clone();
        self.pixabay_base_url = base_url;
        self
    }

    pub fn with_pexels_keys(mut self, keys: &str) -> Self {
        self.pexels_keys = ApiKeys::parse("PEXELS_API_KEYS", keys);
        self
    }

    pub fn with_pixabay_keys(mut self, keys: &str) -> Self {
        self.pixabay_keys = ApiKeys::parse("PIXABAY_API_KEYS", keys);
        self
    }
}
