//! Resolution request definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{ConcatMode, Provider, VideoAspect};

/// Unique identifier for a video generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Request to resolve search terms into downloadable clips.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveRequest {
    /// Owning task, used for task-scoped material directories
    #[serde(default)]
    pub task_id: TaskId,

    /// Search terms, resolved in order
    pub search_terms: Vec<String>,

    /// Remote provider used when the local library has no match
    #[serde(default)]
    pub source: Provider,

    #[serde(default)]
    pub aspect: VideoAspect,

    #[serde(default)]
    pub concat_mode: ConcatMode,

    /// Duration of the narration audio the clips must cover (seconds)
    pub audio_duration: f64,

    /// Per-clip contribution cap (seconds). Also the minimum duration a clip
    /// must have to be considered at all.
    #[serde(default = "default_max_clip_duration")]
    pub max_clip_duration: f64,
}

fn default_max_clip_duration() -> f64 {
    5.0
}

impl ResolveRequest {
    /// Create a request with default source, aspect and concat mode.
    pub fn new(search_terms: Vec<String>, audio_duration: f64) -> Self {
        Self {
            task_id: TaskId::new(),
            search_terms,
            source: Provider::default(),
            aspect: VideoAspect::default(),
            concat_mode: ConcatMode::default(),
            audio_duration,
            max_clip_duration: default_max_clip_duration(),
        }
    }

    pub fn with_source(mut self, source: Provider) -> Self {
        self.source = source;
        self
    }

    pub fn with_aspect(mut self, aspect: VideoAspect) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_concat_mode(mut self, concat_mode: ConcatMode) -> Self {
        self.concat_mode = concat_mode;
        self
    }

    pub fn with_max_clip_duration(mut self, seconds: f64) -> Self {
        self.max_clip_duration = seconds;
        self
    }

    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = task_id;
        self
    }

    /// Minimum native duration a clip needs to qualify.
    pub fn minimum_duration(&self) -> f64 {
        self.max_clip_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_generation() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(TaskId::from("task-1").as_str(), "task-1");
    }

    #[test]
    fn test_request_defaults_from_json() {
        let json = r#"{"search_terms": ["ocean"], "audio_duration": 30.0}"#;
        let request: ResolveRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.search_terms, vec!["ocean".to_string()]);
        assert_eq!(request.source, Provider::Pexels);
        assert_eq!(request.aspect, VideoAspect::Portrait);
        assert_eq!(request.concat_mode, ConcatMode::Random);
        assert_eq!(request.max_clip_duration, 5.0);
        assert_eq!(request.minimum_duration(), 5.0);
    }

    #[test]
    fn test_request_builder() {
        let request = ResolveRequest::new(vec!["sea".to_string()], 12.0)
            .with_source(Provider::Pixabay)
            .with_concat_mode(ConcatMode::Sequential)
            .with_max_clip_duration(3.0);

        assert_eq!(request.source, Provider::Pixabay);
        assert_eq!(request.concat_mode, ConcatMode::Sequential);
        assert_eq!(request.minimum_duration(), 3.0);
    }
}
