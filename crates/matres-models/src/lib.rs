//! Shared data models for the material resolution pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Material providers and candidates
//! - Local library assets
//! - Output aspect and concatenation mode
//! - Resolution requests and outcomes

pub mod clip;
pub mod job;
pub mod material;
pub mod style;
pub mod utils;

// Re-export common types
pub use clip::{ResolveOutcome, ResolvedClip};
pub use job::{ResolveRequest, TaskId};
pub use material::{LocalAsset, MaterialCandidate, Provider};
pub use style::{ConcatMode, VideoAspect};
pub use utils::{strip_query, BROWSER_USER_AGENT};
