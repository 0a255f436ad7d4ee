//! Material resolution worker.
//!
//! This crate provides:
//! - The resolution pipeline (hybrid local/remote search, ordering, budget)
//! - Semantic matching of search terms against the local library
//! - Gemini as the matching capability
//! - Run-scoped usage tracking and structured run logging

pub mod config;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod matcher;
pub mod resolver;
pub mod usage;

pub use config::ResolverConfig;
pub use error::{WorkerError, WorkerResult};
pub use gemini::{GeminiCapability, GeminiConfig};
pub use logging::RunLogger;
pub use matcher::{MatchCapability, SemanticMatcher};
pub use resolver::{order_candidates, Budget, MaterialResolver};
pub use usage::UsageTracker;
