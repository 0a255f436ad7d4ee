//! Local material library index.
//!
//! Scans a flat directory of tagged video files and probes each one for its
//! duration. Failures are isolated per file: a clip that can't be probed is
//! kept with a zero duration rather than dropped.

use std::path::Path;

use tracing::{debug, error, info};

use matres_models::LocalAsset;

use crate::probe::VideoProber;
use crate::tags::parse_material_tags;

/// Extensions (lower-case, without dot) eligible for the library.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "flv", "mkv", "webm"];

/// Whether a file name carries one of the supported video extensions.
pub fn is_supported_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan `library_dir` for tagged video files.
///
/// A missing or non-directory path yields an empty list. So does a directory
/// that can't be listed; the failure is logged.
pub async fn scan_local_library(library_dir: &Path, prober: &dyn VideoProber) -> Vec<LocalAsset> {
    if !library_dir.is_dir() {
        debug!(dir = %library_dir.display(), "Local library directory not found");
        return Vec::new();
    }

    let mut entries = match tokio::fs::read_dir(library_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(dir = %library_dir.display(), error = %e, "Failed to scan local library");
            return Vec::new();
        }
    };

    let mut assets = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                error!(dir = %library_dir.display(), error = %e, "Failed to scan local library");
                return Vec::new();
            }
        };

        let path = entry.path();
        if !is_supported_video(&path) {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => {
                debug!(path = %path.display(), "Skipping non-file library entry");
                continue;
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to stat library entry");
                continue;
            }
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let (name, tags) = parse_material_tags(&file_name);

        let duration = match prober.probe(&path).await {
            Ok(info) => info.duration,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Probe failed, assuming zero duration");
                0.0
            }
        };

        let path = std::path::absolute(&path).unwrap_or(path);
        assets.push(LocalAsset {
            path,
            name,
            tags,
            duration,
        });
    }

    assets.sort_by(|a, b| a.path.cmp(&b.path));
    info!(
        dir = %library_dir.display(),
        count = assets.len(),
        "Local library scan complete"
    );
    assets
}
