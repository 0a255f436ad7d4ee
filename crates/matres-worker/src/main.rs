//! Material resolution worker binary.
//!
//! Reads one request from `RESOLVE_*` environment variables, resolves it and
//! prints the clip paths, one per line.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use matres_models::{ResolveRequest, TaskId};
use matres_worker::{MaterialResolver, WorkerError, WorkerResult};

/// Parse `RESOLVE_<name>` if set, else keep `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> WorkerResult<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| WorkerError::invalid_request(format!("{}: {}", name, e))),
        _ => Ok(default),
    }
}

fn request_from_env() -> WorkerResult<ResolveRequest> {
    let terms: Vec<String> = std::env::var("RESOLVE_TERMS")
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(WorkerError::invalid_request("RESOLVE_TERMS is empty"));
    }

    let audio_duration = env_or("RESOLVE_AUDIO_DURATION", 0.0)?;
    let mut request = ResolveRequest::new(terms, audio_duration)
        .with_source(env_or("RESOLVE_SOURCE", Default::default())?)
        .with_aspect(env_or("RESOLVE_ASPECT", Default::default())?)
        .with_concat_mode(env_or("RESOLVE_CONCAT_MODE", Default::default())?)
        .with_max_clip_duration(env_or("RESOLVE_MAX_CLIP_DURATION", 5.0)?);

    if let Ok(task_id) = std::env::var("RESOLVE_TASK_ID") {
        if !task_id.trim().is_empty() {
            request = request.with_task_id(TaskId::from_string(task_id.trim()));
        }
    }
    Ok(request)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("matres=info".parse().unwrap());

    // Logs go to stderr; stdout carries the resolved paths.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting matres-worker");

    let request = match request_from_env() {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid request: {}", e);
            std::process::exit(2);
        }
    };

    let resolver = match MaterialResolver::from_env() {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create resolver: {}", e);
            std::process::exit(1);
        }
    };
    info!("Resolver config: {:?}", resolver.config());

    match resolver.resolve(&request).await {
        Ok(outcome) => {
            for path in outcome.paths() {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            error!("Resolution failed: {}", e);
            std::process::exit(1);
        }
    }
}
