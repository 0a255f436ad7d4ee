//! Resolver configuration.

use std::path::{Path, PathBuf};

use matres_models::TaskId;

/// `material_directory` value selecting a per-task directory.
pub const TASK_MATERIAL_DIRECTORY: &str = "task";

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Check the local library before querying remote providers
    pub enable_hybrid_search: bool,
    /// Directory of tagged local clips (hybrid search only)
    pub local_library: Option<PathBuf>,
    /// Where downloaded clips go: empty, "task", or a directory path
    pub material_directory: String,
    /// Storage root for the default cache and per-task directories
    pub storage_dir: PathBuf,
    /// Optional proxy URL for downloads
    pub proxy: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enable_hybrid_search: false,
            local_library: None,
            material_directory: String::new(),
            storage_dir: PathBuf::from("./storage"),
            proxy: None,
        }
    }
}

impl ResolverConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            enable_hybrid_search: std::env::var("ENABLE_HYBRID_SEARCH")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            local_library: std::env::var("LOCAL_MATERIAL_LIBRARY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            material_directory: std::env::var("MATERIAL_DIRECTORY")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./storage")),
            proxy: std::env::var("HTTP_PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn with_hybrid_search(mut self, library: impl Into<PathBuf>) -> Self {
        self.enable_hybrid_search = true;
        self.local_library = Some(library.into());
        self
    }

    pub fn with_storage_dir(mut self, storage_dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = storage_dir.into();
        self
    }

    pub fn with_material_directory(mut self, material_directory: impl Into<String>) -> Self {
        self.material_directory = material_directory.into();
        self
    }

    /// The library to consult, if hybrid search is on and a directory is set.
    pub fn hybrid_library(&self) -> Option<&Path> {
        if self.enable_hybrid_search {
            self.local_library.as_deref()
        } else {
            None
        }
    }

    /// Directory that downloaded clips for `task_id` are cached in.
    pub fn material_dir(&self, task_id: &TaskId) -> PathBuf {
        let default_dir = self.storage_dir.join("cache_videos");
        let configured = self.material_directory.trim();

        if configured.is_empty() {
            return default_dir;
        }
        if configured == TASK_MATERIAL_DIRECTORY {
            return self.storage_dir.join("tasks").join(task_id.as_str());
        }

        let dir = PathBuf::from(configured);
        if dir.is_dir() {
            dir
        } else {
            tracing::warn!(
                material_directory = %configured,
                fallback = %default_dir.display(),
                "Material directory does not exist, using default"
            );
            default_dir
        }
    }
}
