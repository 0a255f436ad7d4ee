//! Resolution run logging.
//!
//! Each run logs under a `resolve` span carrying the request context (task,
//! provider, term count, audio target, concat mode). Milestones are events
//! with typed fields so a run can be followed in the JSON logs.

use tracing::{error, info, info_span, warn, Span};

use matres_models::{MaterialCandidate, ResolveOutcome, ResolveRequest};

use crate::error::WorkerError;

/// Logger for one `resolve` call.
#[derive(Debug, Clone)]
pub struct RunLogger {
    span: Span,
    requested: f64,
}

impl RunLogger {
    pub fn new(request: &ResolveRequest) -> Self {
        let span = info_span!(
            "resolve",
            task_id = %request.task_id,
            source = %request.source,
            terms = request.search_terms.len(),
            audio_duration = request.audio_duration,
            max_clip_duration = request.max_clip_duration,
            concat_mode = %request.concat_mode,
        );
        Self {
            span,
            requested: request.audio_duration,
        }
    }

    /// Span every event of the run is recorded under.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn started(&self) {
        info!("Resolution started");
    }

    /// Candidates found for one term. `origin` is the provider of the first
    /// candidate, or `none`.
    pub fn term_resolved(&self, term: &str, found: &[MaterialCandidate]) {
        let origin = found.first().map(|c| c.provider.as_str()).unwrap_or("none");
        info!(term = %term, count = found.len(), origin, "Term resolved");
    }

    /// Deduplicated candidates gathered over all terms.
    pub fn collected(&self, local: usize, remote: usize, found_duration: f64) {
        info!(
            local,
            remote,
            found_duration,
            required_duration = self.requested,
            "Candidates collected"
        );
    }

    /// Outcome of a run. A run whose clips do not cover the audio also emits
    /// a shortfall warning.
    pub fn finished(&self, outcome: &ResolveOutcome) {
        if outcome.is_short() {
            warn!(
                total_duration = outcome.total_duration,
                requested_duration = outcome.requested_duration,
                shortfall = outcome.requested_duration - outcome.total_duration,
                "Clips do not cover the audio"
            );
        }
        info!(
            clips = outcome.clips.len(),
            local = outcome.local_count(),
            total_duration = outcome.total_duration,
            "Resolution finished"
        );
    }

    pub fn failed(&self, err: &WorkerError) {
        error!(error = %err, fatal = err.is_fatal(), "Resolution failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use matres_models::{Provider, ResolvedClip, TaskId};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn request() -> ResolveRequest {
        ResolveRequest::new(vec!["sea".to_string(), "city".to_string()], 12.0)
            .with_task_id(TaskId::from("task-7"))
            .with_source(Provider::Pixabay)
    }

    fn outcome(total: f64) -> ResolveOutcome {
        ResolveOutcome {
            clips: vec![ResolvedClip {
                path: PathBuf::from("/lib/Beach(sea).mp4"),
                provider: Provider::LocalLibrary,
                duration: total,
            }],
            total_duration: total,
            requested_duration: 12.0,
        }
    }

    #[test]
    fn test_events_carry_run_context() {
        let logs = capture(|| {
            let logger = RunLogger::new(&request());
            let _entered = logger.span().entered();
            logger.term_resolved("sea", &[]);
        });

        assert!(logs.contains("resolve{"));
        assert!(logs.contains("task_id=task-7"));
        assert!(logs.contains("source=pixabay"));
        assert!(logs.contains("terms=2"));
        assert!(logs.contains("origin=\"none\""));
    }

    #[test]
    fn test_shortfall_is_warned() {
        let logs = capture(|| {
            let logger = RunLogger::new(&request());
            let _entered = logger.span().entered();
            logger.finished(&outcome(5.0));
        });

        assert!(logs.contains("WARN"));
        assert!(logs.contains("Clips do not cover the audio"));
        assert!(logs.contains("shortfall=7"));
        assert!(logs.contains("local=1"));
    }

    #[test]
    fn test_covered_run_has_no_shortfall() {
        let logs = capture(|| {
            let logger = RunLogger::new(&request());
            logger.finished(&outcome(15.0));
        });

        assert!(!logs.contains("shortfall"));
        assert!(logs.contains("Resolution finished"));
    }
}
