//! Output aspect and clip ordering definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target aspect of the rendered video.
///
/// Each variant maps to the concrete pixel resolution that remote
/// renditions are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoAspect {
    /// 16:9
    Landscape,
    /// 9:16 for TikTok/Reels/Shorts
    #[default]
    Portrait,
    /// 1:1
    Square,
}

impl VideoAspect {
    /// Pixel resolution as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            VideoAspect::Landscape => (1920, 1080),
            VideoAspect::Portrait => (1080, 1920),
            VideoAspect::Square => (1080, 1080),
        }
    }

    /// Ratio notation, e.g. `9:16`.
    pub fn ratio(&self) -> &'static str {
        match self {
            VideoAspect::Landscape => "16:9",
            VideoAspect::Portrait => "9:16",
            VideoAspect::Square => "1:1",
        }
    }

    /// Orientation name as understood by stock search APIs.
    pub fn orientation(&self) -> &'static str {
        match self {
            VideoAspect::Landscape => "landscape",
            VideoAspect::Portrait => "portrait",
            VideoAspect::Square => "square",
        }
    }
}

impl fmt::Display for VideoAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ratio())
    }
}

impl FromStr for VideoAspect {
    type Err = VideoAspectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "16:9" | "landscape" => Ok(VideoAspect::Landscape),
            "9:16" | "portrait" => Ok(VideoAspect::Portrait),
            "1:1" | "square" => Ok(VideoAspect::Square),
            _ => Err(VideoAspectParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown video aspect: {0}, expected 16:9, 9:16 or 1:1")]
pub struct VideoAspectParseError(String);

/// How clips are ordered within each source group before concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcatMode {
    /// Keep discovery order
    Sequential,
    /// Shuffle each group independently
    #[default]
    Random,
}

impl ConcatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcatMode::Sequential => "sequential",
            ConcatMode::Random => "random",
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, ConcatMode::Random)
    }
}

impl fmt::Display for ConcatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConcatMode {
    type Err = ConcatModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(ConcatMode::Sequential),
            "random" => Ok(ConcatMode::Random),
            _ => Err(ConcatModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown concat mode: {0}")]
pub struct ConcatModeParseError(String);
