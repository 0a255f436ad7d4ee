//! Resolved clip models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Provider;

/// A clip accepted by the selection pass, ready to be composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedClip {
    /// Local file path (library file or cached download)
    pub path: PathBuf,
    pub provider: Provider,
    /// Native duration of the clip (seconds)
    pub duration: f64,
}

/// Result of a resolution run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResolveOutcome {
    /// Accepted clips, in playback order
    pub clips: Vec<ResolvedClip>,
    /// Sum of capped clip durations counted toward the budget
    pub total_duration: f64,
    /// Audio duration the clips were meant to cover
    pub requested_duration: f64,
}

impl ResolveOutcome {
    /// Clip paths in playback order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|c| c.path.clone()).collect()
    }

    /// True if the accepted clips do not cover the requested duration.
    pub fn is_short(&self) -> bool {
        self.total_duration <= self.requested_duration
    }

    pub fn local_count(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| !c.provider.is_remote())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_short() {
        let outcome = ResolveOutcome {
            clips: vec![ResolvedClip {
                path: PathBuf::from("/cache/vid-1.mp4"),
                provider: Provider::Pexels,
                duration: 6.0,
            }],
            total_duration: 5.0,
            requested_duration: 12.0,
        };
        assert!(outcome.is_short());
        assert_eq!(outcome.paths(), vec![PathBuf::from("/cache/vid-1.mp4")]);
        assert_eq!(outcome.local_count(), 0);
    }
}
