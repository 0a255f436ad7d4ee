//! Gemini AI client used as the matching capability.
//!
//! Calls the `generateContent` REST endpoint, trying each configured model in
//! order until one returns text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::matcher::MatchCapability;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order when `GEMINI_MODELS` is not set.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Gemini endpoint and HTTP settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    /// Models tried in order
    pub models: Vec<String>,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Request timeout, covering the whole generation call
    pub timeout: Duration,
    /// Optional proxy URL applied to all schemes
    pub proxy: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
            proxy: None,
        }
    }
}

impl GeminiConfig {
    /// Create config from `GEMINI_BASE_URL`, `GEMINI_MODELS`
    /// (comma-separated), `GEMINI_CONNECT_TIMEOUT_SECS`, `GEMINI_TIMEOUT_SECS`
    /// and `HTTP_PROXY_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let models: Vec<String> = std::env::var("GEMINI_MODELS")
            .unwrap_or_default()
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            models: if models.is_empty() {
                defaults.models
            } else {
                models
            },
            connect_timeout: std::env::var("GEMINI_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            proxy: std::env::var("HTTP_PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Build the HTTP client used for Gemini calls.
pub fn build_http_client(config: &GeminiConfig) -> WorkerResult<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout);

    if let Some(proxy) = config.proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| WorkerError::config_error(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| WorkerError::config_error(format!("failed to build Gemini client: {}", e)))
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiCapability {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

impl std::fmt::Debug for GeminiCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiCapability")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiCapability {
    pub fn new(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            client,
        }
    }

    /// Create with a client built from `config`.
    pub fn with_config(api_key: impl Into<String>, config: &GeminiConfig) -> WorkerResult<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(api_key, client)
            .with_base_url(config.base_url.clone())
            .with_models(&config.models))
    }

    /// Create from `GEMINI_API_KEY` and [`GeminiConfig::from_env`].
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| WorkerError::config_error("GEMINI_API_KEY not set"))?;

        Self::with_config(api_key, &GeminiConfig::from_env())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the model list. Blank entries are dropped; an empty result
    /// keeps the current list.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Call Gemini API.
    async fn call_gemini_api(&self, model: &str, prompt: &str) -> WorkerResult<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::ai_failed(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkerError::ai_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            WorkerError::ai_failed(format!("Failed to parse Gemini response: {}", e))
        })?;

        gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| WorkerError::ai_failed("No content in Gemini response"))
    }
}

#[async_trait]
impl MatchCapability for GeminiCapability {
    async fn complete(&self, prompt: &str) -> WorkerResult<String> {
        let mut last_error = None;

        for model in &self.models {
            info!(model = %model, "Attempting Gemini API");
            match self.call_gemini_api(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| WorkerError::ai_failed("All Gemini models failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        }))
    }

    fn capability(server: &MockServer) -> GeminiCapability {
        GeminiCapability::new("gemini-key", Client::new())
            .with_base_url(server.uri())
            .with_models(["primary", "fallback"])
    }

    #[tokio::test]
    async fn test_complete_sends_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/primary:generateContent"))
            .and(query_param("key", "gemini-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "pick one"}]}]
            })))
            .respond_with(text_response(" 2\n"))
            .expect(1)
            .mount(&server)
            .await;

        let answer = capability(&server).complete("pick one").await.unwrap();
        assert_eq!(answer, "2");
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/primary:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/fallback:generateContent"))
            .respond_with(text_response("NONE"))
            .expect(1)
            .mount(&server)
            .await;

        let answer = capability(&server).complete("pick one").await.unwrap();
        assert_eq!(answer, "NONE");
    }

    #[tokio::test]
    async fn test_all_models_failing_returns_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .expect(2)
            .mount(&server)
            .await;

        let err = capability(&server).complete("pick one").await.unwrap_err();
        assert!(matches!(err, WorkerError::AiFailed(_)));
        assert!(err.to_string().contains("No content"));
    }

    #[test]
    fn test_with_models_ignores_blank_list() {
        let capability = GeminiCapability::new("k", Client::new()).with_models([" ", ""]);
        assert_eq!(capability.models().len(), DEFAULT_MODELS.len());

        let capability = capability.with_models(["a", " b "]);
        assert_eq!(capability.models(), ["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_stalled_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response("1").set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let config = GeminiConfig {
            base_url: server.uri(),
            models: vec!["primary".to_string(), "fallback".to_string()],
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let capability = GeminiCapability::with_config("gemini-key", &config).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), capability.complete("pick one"))
            .await
            .expect("client should give up before the outer deadline");
        let err = result.unwrap_err();
        assert!(matches!(err, WorkerError::AiFailed(_)));
        assert!(err.to_string().contains("request failed"));
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let config = GeminiConfig {
            proxy: Some("not a proxy url".to_string()),
            ..Default::default()
        };
        let err = GeminiCapability::with_config("k", &config).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        for var in [
            "GEMINI_BASE_URL",
            "GEMINI_MODELS",
            "GEMINI_CONNECT_TIMEOUT_SECS",
            "GEMINI_TIMEOUT_SECS",
            "HTTP_PROXY_URL",
        ] {
            std::env::remove_var(var);
        }

        let config = GeminiConfig::from_env();
        assert_eq!(config.base_url, GEMINI_BASE_URL);
        assert_eq!(config.models.len(), DEFAULT_MODELS.len());
        assert_eq!(config.timeout, Duration::from_secs(60));

        std::env::set_var("GEMINI_TIMEOUT_SECS", "15");
        std::env::set_var("GEMINI_CONNECT_TIMEOUT_SECS", "oops");
        std::env::set_var("GEMINI_MODELS", " , ");
        let config = GeminiConfig::from_env();
        std::env::remove_var("GEMINI_TIMEOUT_SECS");
        std::env::remove_var("GEMINI_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("GEMINI_MODELS");

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.models.len(), DEFAULT_MODELS.len());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_key() {
        std::env::remove_var("GEMINI_API_KEY");
        let err = GeminiCapability::from_env().unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));

        std::env::set_var("GEMINI_API_KEY", "k");
        std::env::set_var("GEMINI_MODELS", "m1,m2");
        let capability = GeminiCapability::from_env().unwrap();
        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("GEMINI_MODELS");

        assert_eq!(capability.models(), ["m1".to_string(), "m2".to_string()]);
    }
}
