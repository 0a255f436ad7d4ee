//! Material candidates and local library assets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::strip_query;

/// Where a clip comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Pexels stock footage
    #[default]
    Pexels,
    /// Pixabay stock footage
    Pixabay,
    /// Tagged files in the local material library
    LocalLibrary,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Pexels => "pexels",
            Provider::Pixabay => "pixabay",
            Provider::LocalLibrary => "local_library",
        }
    }

    /// Whether clips from this provider must be downloaded.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Provider::LocalLibrary)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pexels" => Ok(Provider::Pexels),
            "pixabay" => Ok(Provider::Pixabay),
            "local_library" | "local" => Ok(Provider::LocalLibrary),
            _ => Err(ProviderParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown material provider: {0}")]
pub struct ProviderParseError(String);

/// A resolved, not yet downloaded reference to a playable clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MaterialCandidate {
    pub provider: Provider,
    /// Direct media URL for remote providers, absolute file path for local assets
    pub url: String,
    /// Native clip duration in seconds
    pub duration: f64,
}

impl MaterialCandidate {
    pub fn new(provider: Provider, url: impl Into<String>, duration: f64) -> Self {
        Self {
            provider,
            url: url.into(),
            duration,
        }
    }

    /// Candidate for an asset from the local library.
    pub fn local(asset: &LocalAsset) -> Self {
        Self {
            provider: Provider::LocalLibrary,
            url: asset.path.to_string_lossy().into_owned(),
            duration: asset.duration,
        }
    }

    pub fn is_local(&self) -> bool {
        self.provider == Provider::LocalLibrary
    }

    /// Key identifying the underlying source.
    ///
    /// Remote URLs ignore their query string, so signed or tracked variants
    /// of the same file collapse to one key.
    pub fn source_key(&self) -> String {
        if self.is_local() {
            self.url.clone()
        } else {
            strip_query(&self.url)
        }
    }
}

/// A video file found in the local material library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocalAsset {
    pub path: PathBuf,
    /// Display name parsed from the file name
    pub name: String,
    /// Tags parsed from the parenthesized file name suffix
    pub tags: Vec<String>,
    /// Probed duration in seconds, 0 when probing failed
    pub duration: f64,
}

impl LocalAsset {
    /// One-line description used when presenting the asset to a matcher.
    pub fn describe(&self) -> String {
        let tags = if self.tags.is_empty() {
            "none".to_string()
        } else {
            self.tags.join(", ")
        };
        format!("{} - tags: {}", self.name, tags)
    }
}
