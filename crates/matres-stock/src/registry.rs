//! Provider construction.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::build_http_client;
use crate::config::StockConfig;
use crate::credentials::RotationCounter;
use crate::error::StockResult;
use crate::pexels::PexelsClient;
use crate::pixabay::PixabayClient;
use crate::provider::StockProvider;

/// All configured stock providers, sharing one HTTP client and one key
/// rotation counter.
///
/// Which adapter serves a request is decided by the resolver; the registry
/// only builds them.
#[derive(Debug, Clone)]
pub struct StockRegistry {
    pexels: PexelsClient,
    pixabay: PixabayClient,
}

impl StockRegistry {
    pub fn new(config: &StockConfig) -> StockResult<Self> {
        let http = build_http_client(config)?;
        for (provider, keys) in [("pexels", &config.pexels_keys), ("pixabay", &config.pixabay_keys)] {
            if keys.is_empty() {
                warn!(provider, "No API keys configured, searches will fail");
            } else {
                debug!(provider, keys = keys.len(), "API keys configured");
            }
        }

        let counter = RotationCounter::new();

        Ok(Self {
            pexels: PexelsClient::new(http.clone(), config, counter.clone()),
            pixabay: PixabayClient::new(http, config, counter),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StockResult<Self> {
        Self::new(&StockConfig::from_env())
    }

    /// Adapters as shared trait objects.
    pub fn into_providers(self) -> Vec<Arc<dyn StockProvider>> {
        vec![Arc::new(self.pexels), Arc::new(self.pixabay)]
    }
}
