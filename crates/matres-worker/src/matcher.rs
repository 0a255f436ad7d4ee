//! Semantic matching of search terms against local assets.
//!
//! The matcher turns the unused local assets into a numbered list, asks a
//! text capability which entry fits the term, and parses the answer. The
//! capability is expected to reply with a bare 1-based index or `NONE`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use matres_models::LocalAsset;

use crate::error::WorkerResult;

/// Sentinel answer meaning "no asset matches".
pub const NO_MATCH: &str = "NONE";

/// A text-completion capability used for matching.
#[async_trait]
pub trait MatchCapability: Send + Sync {
    async fn complete(&self, prompt: &str) -> WorkerResult<String>;
}

/// Picks the local asset that best fits a search term.
#[derive(Clone)]
pub struct SemanticMatcher {
    capability: Arc<dyn MatchCapability>,
}

impl std::fmt::Debug for SemanticMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticMatcher").finish_non_exhaustive()
    }
}

impl SemanticMatcher {
    pub fn new(capability: Arc<dyn MatchCapability>) -> Self {
        Self { capability }
    }

    /// Path of the matching asset, or `None`.
    ///
    /// Capability failures are logged and reported as no match.
    pub async fn match_asset(&self, term: &str, assets: &[LocalAsset]) -> Option<PathBuf> {
        if assets.is_empty() {
            return None;
        }

        let prompt = build_prompt(term, assets);
        let response = match self.capability.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!(term = %term, error = %e, "Local material matching failed");
                return None;
            }
        };

        let response = response.trim();
        if response.eq_ignore_ascii_case(NO_MATCH) {
            info!(term = %term, "No local material matches");
            return None;
        }

        match parse_choice(response, assets.len()) {
            Some(index) => {
                let asset = &assets[index];
                info!(term = %term, name = %asset.name, "Matched local material");
                Some(asset.path.clone())
            }
            None => {
                warn!(term = %term, response = %response, "Invalid matcher response");
                None
            }
        }
    }
}

/// Build the matching prompt for `term` over `assets`.
pub fn build_prompt(term: &str, assets: &[LocalAsset]) -> String {
    let materials = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| format!("{}. {}", i + 1, asset.describe()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a video material matching assistant.

Search term: {term}

Local materials:
{materials}

Decide which material best matches the search term. Matching rules:
1. The term matches when it relates to the material name or any of its tags.
2. Semantically close matches count (for example "sky" matches "clouds").
3. Terms and tags may be in different languages.

If a material matches, answer with its number only (for example "1" or "3").
If nothing matches, answer with "{NO_MATCH}" only.

Answer with the number or {NO_MATCH} and nothing else."#
    )
}

/// Parse a 1-based index answer into a 0-based index within `count`.
pub fn parse_choice(response: &str, count: usize) -> Option<usize> {
    let index: usize = response.trim().parse().ok()?;
    (1..=count).contains(&index).then(|| index - 1)
}
