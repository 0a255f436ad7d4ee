//! Local asset usage tracking.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Local asset paths already selected in the current run.
///
/// Insert-only. A tracked path is never offered to the matcher again
/// within the same run.
#[derive(Debug, Default, Clone)]
pub struct UsageTracker {
    used: HashSet<PathBuf>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as used. Returns false if it was already tracked.
    pub fn mark_used(&mut self, path: impl Into<PathBuf>) -> bool {
        self.used.insert(path.into())
    }

    pub fn is_used(&self, path: &Path) -> bool {
        self.used.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_query() {
        let mut usage = UsageTracker::new();
        assert!(!usage.is_used(Path::new("/lib/a.mp4")));

        assert!(usage.mark_used("/lib/a.mp4"));
        assert!(!usage.mark_used("/lib/a.mp4"));

        assert!(usage.is_used(Path::new("/lib/a.mp4")));
        assert!(!usage.is_used(Path::new("/lib/b.mp4")));
    }
}
