//! Material resolution.
//!
//! Turns search terms and a target duration into an ordered list of playable
//! clip files. Each term is first matched against the local library (hybrid
//! search); terms without a local match go to the configured stock provider.
//! Local clips always come before remote ones. Selection stops as soon as
//! the accepted clips cover the target.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn, Instrument};

use matres_media::{
    scan_local_library, DownloadCache, DownloadConfig, FfprobeProber, VideoProber,
};
use matres_models::{
    ConcatMode, LocalAsset, MaterialCandidate, Provider, ResolveOutcome, ResolveRequest,
    ResolvedClip,
};
use matres_stock::{search_or_empty, StockProvider, StockRegistry};

use crate::config::ResolverConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::gemini::GeminiCapability;
use crate::logging::RunLogger;
use crate::matcher::SemanticMatcher;
use crate::usage::UsageTracker;

/// Metric name constants.
pub mod names {
    /// Clips accepted by the selection pass, by provider.
    pub const CLIPS_ACCEPTED_TOTAL: &str = "material_clips_accepted_total";

    /// Candidates skipped during selection, by reason.
    pub const CLIPS_SKIPPED_TOTAL: &str = "material_clips_skipped_total";
}

/// Running total of usable seconds.
///
/// Each clip contributes at most `cap` seconds. The budget is exhausted once
/// the total is strictly greater than the target, so the last accepted clip
/// may overshoot it.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    cap: f64,
    target: f64,
    total: f64,
}

impl Budget {
    pub fn new(cap: f64, target: f64) -> Self {
        Self {
            cap,
            target,
            total: 0.0,
        }
    }

    /// Count a clip; returns the seconds it contributed.
    pub fn add(&mut self, duration: f64) -> f64 {
        let seconds = self.cap.min(duration);
        self.total += seconds;
        seconds
    }

    pub fn is_exhausted(&self) -> bool {
        self.total > self.target
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// State owned by a single `resolve` call.
#[derive(Debug, Default)]
struct ResolutionRun {
    usage: UsageTracker,
    seen: HashSet<String>,
    /// Library scan, done at most once per run
    library: Option<Vec<LocalAsset>>,
    local: Vec<MaterialCandidate>,
    remote: Vec<MaterialCandidate>,
    found_duration: f64,
}

impl ResolutionRun {
    /// Add candidates whose source has not been seen in this run.
    fn collect(&mut self, candidates: Vec<MaterialCandidate>) {
        for candidate in candidates {
            if !self.seen.insert(candidate.source_key()) {
                debug!(url = %candidate.url, "Skipping duplicate candidate");
                continue;
            }
            self.found_duration += candidate.duration;
            if candidate.is_local() {
                self.local.push(candidate);
            } else {
                self.remote.push(candidate);
            }
        }
    }
}

/// Order candidates for selection: local group first, then remote.
///
/// In random mode each group is shuffled on its own; groups never mix.
pub fn order_candidates<R: Rng + ?Sized>(
    mut local: Vec<MaterialCandidate>,
    mut remote: Vec<MaterialCandidate>,
    mode: ConcatMode,
    rng: &mut R,
) -> Vec<MaterialCandidate> {
    if mode.is_random() {
        local.shuffle(rng);
        remote.shuffle(rng);
    }
    local.extend(remote);
    local
}

/// Resolves search terms into playable clips.
pub struct MaterialResolver {
    config: ResolverConfig,
    providers: Vec<Arc<dyn StockProvider>>,
    prober: Arc<dyn VideoProber>,
    cache: DownloadCache,
    matcher: Option<SemanticMatcher>,
}

impl MaterialResolver {
    pub fn new(
        config: ResolverConfig,
        providers: Vec<Arc<dyn StockProvider>>,
        prober: Arc<dyn VideoProber>,
        cache: DownloadCache,
    ) -> Self {
        Self {
            config,
            providers,
            prober,
            cache,
            matcher: None,
        }
    }

    /// Build a resolver from environment variables, probing with ffprobe.
    ///
    /// A missing Gemini key only disables local matching.
    pub fn from_env() -> WorkerResult<Self> {
        let config = ResolverConfig::from_env();
        let providers = StockRegistry::from_env()?.into_providers();

        let prober: Arc<dyn VideoProber> = Arc::new(FfprobeProber);
        let download = DownloadConfig {
            proxy: config.proxy.clone(),
            ..Default::default()
        };
        let cache = DownloadCache::new(download, prober.clone())?;

        let hybrid = config.hybrid_library().is_some();
        let mut resolver = Self::new(config, providers, prober, cache);

        if hybrid {
            match GeminiCapability::from_env() {
                Ok(gemini) => {
                    resolver = resolver.with_matcher(SemanticMatcher::new(Arc::new(gemini)));
                }
                Err(e) => warn!(error = %e, "Local matching disabled"),
            }
        }
        Ok(resolver)
    }

    /// Enable local matching. Without a matcher every term goes remote.
    pub fn with_matcher(mut self, matcher: SemanticMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `request` into an ordered list of clip files.
    ///
    /// Only configuration problems are returned as errors. Failed searches,
    /// downloads and matches are logged and skipped, so the outcome may not
    /// cover the requested duration (see [`ResolveOutcome::is_short`]).
    pub async fn resolve(&self, request: &ResolveRequest) -> WorkerResult<ResolveOutcome> {
        let logger = RunLogger::new(request);

        async {
            logger.started();
            let result = match validate_request(request) {
                Ok(()) => self.run(request, &logger).await,
                Err(e) => Err(e),
            };
            match &result {
                Ok(outcome) => logger.finished(outcome),
                Err(e) => logger.failed(e),
            }
            result
        }
        .instrument(logger.span())
        .await
    }

    async fn run(&self, request: &ResolveRequest, logger: &RunLogger) -> WorkerResult<ResolveOutcome> {
        let provider = self.provider_for(request.source)?;
        let mut run = ResolutionRun::default();

        for term in &request.search_terms {
            let found = self.search_term(&mut run, term, request, provider).await?;
            logger.term_resolved(term, &found);
            run.collect(found);
        }

        let local = std::mem::take(&mut run.local);
        let remote = std::mem::take(&mut run.remote);
        logger.collected(local.len(), remote.len(), run.found_duration);

        let ordered = {
            let mut rng = rand::rng();
            order_candidates(local, remote, request.concat_mode, &mut rng)
        };

        let material_dir = self.config.material_dir(&request.task_id);
        Ok(self.select(ordered, request, &material_dir).await)
    }

    /// The adapter for `source`. Local library requests fall back to Pexels.
    ///
    /// This is the only place a request source is mapped to a provider.
    fn provider_for(&self, source: Provider) -> WorkerResult<&Arc<dyn StockProvider>> {
        let wanted = if source.is_remote() {
            source
        } else {
            Provider::Pexels
        };

        self.providers
            .iter()
            .find(|p| p.provider() == wanted)
            .ok_or_else(|| WorkerError::config_error(format!("no {} provider configured", wanted)))
    }

    async fn search_term(
        &self,
        run: &mut ResolutionRun,
        term: &str,
        request: &ResolveRequest,
        provider: &Arc<dyn StockProvider>,
    ) -> WorkerResult<Vec<MaterialCandidate>> {
        if let Some(candidate) = self.match_local(run, term, request.minimum_duration()).await {
            return Ok(vec![candidate]);
        }

        if self.config.hybrid_library().is_some() {
            info!(term = %term, provider = %provider.provider(), "No local match, searching provider");
        }

        let candidates = search_or_empty(
            provider.as_ref(),
            term,
            request.minimum_duration(),
            request.aspect,
        )
        .await?;
        Ok(candidates)
    }

    /// Try to satisfy `term` from the local library.
    async fn match_local(
        &self,
        run: &mut ResolutionRun,
        term: &str,
        min_duration: f64,
    ) -> Option<MaterialCandidate> {
        let library_dir = self.config.hybrid_library()?;
        let matcher = self.matcher.as_ref()?;

        if run.library.is_none() {
            run.library = Some(scan_local_library(library_dir, self.prober.as_ref()).await);
        }

        let available: Vec<LocalAsset> = run
            .library
            .iter()
            .flatten()
            .filter(|a| a.duration >= min_duration && !run.usage.is_used(&a.path))
            .cloned()
            .collect();
        if available.is_empty() {
            debug!(term = %term, "No unused local material is long enough");
            return None;
        }

        let path = matcher.match_asset(term, &available).await?;
        let Some(asset) = available.iter().find(|a| a.path == path) else {
            warn!(term = %term, path = %path.display(), "Matched path is not an available asset");
            return None;
        };

        run.usage.mark_used(path.clone());
        info!(term = %term, path = %path.display(), "Using local material");
        Some(MaterialCandidate::local(asset))
    }

    /// Accept candidates in order until the budget is exhausted.
    async fn select(
        &self,
        ordered: Vec<MaterialCandidate>,
        request: &ResolveRequest,
        material_dir: &Path,
    ) -> ResolveOutcome {
        let mut budget = Budget::new(request.max_clip_duration, request.audio_duration);
        let mut clips = Vec::new();

        for candidate in ordered {
            let Some(path) = self.materialize(&candidate, material_dir).await else {
                continue;
            };

            budget.add(candidate.duration);
            counter!(names::CLIPS_ACCEPTED_TOTAL, "provider" => candidate.provider.as_str())
                .increment(1);
            clips.push(ResolvedClip {
                path,
                provider: candidate.provider,
                duration: candidate.duration,
            });

            if budget.is_exhausted() {
                info!(
                    total_duration = budget.total(),
                    "Accepted clips cover the audio, skipping the rest"
                );
                break;
            }
        }

        ResolveOutcome {
            clips,
            total_duration: budget.total(),
            requested_duration: request.audio_duration,
        }
    }

    /// Local file for a candidate, downloading remote ones into `material_dir`.
    async fn materialize(&self, candidate: &MaterialCandidate, material_dir: &Path) -> Option<PathBuf> {
        if candidate.is_local() {
            let path = PathBuf::from(&candidate.url);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                info!(path = %path.display(), "Using local material file");
                return Some(path);
            }
            warn!(path = %path.display(), "Local material no longer exists");
            record_skip("missing_local");
            return None;
        }

        info!(url = %candidate.url, "Downloading video");
        match self.cache.fetch(&candidate.url, material_dir).await {
            Ok(Some(path)) => {
                info!(path = %path.display(), "Video saved");
                Some(path)
            }
            Ok(None) => {
                warn!(url = %candidate.url, "Downloaded video is not playable");
                record_skip("invalid");
                None
            }
            Err(e) => {
                error!(
                    url = %candidate.url,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to download video"
                );
                record_skip("download_failed");
                None
            }
        }
    }
}

fn record_skip(reason: &'static str) {
    counter!(names::CLIPS_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

fn validate_request(request: &ResolveRequest) -> WorkerResult<()> {
    if request.max_clip_duration.is_nan() || request.max_clip_duration <= 0.0 {
        return Err(WorkerError::invalid_request(format!(
            "max_clip_duration must be positive, got {}",
            request.max_clip_duration
        )));
    }
    if !request.audio_duration.is_finite() || request.audio_duration < 0.0 {
        return Err(WorkerError::invalid_request(format!(
            "audio_duration must be a non-negative number, got {}",
            request.audio_duration
        )));
    }
    Ok(())
}
