//! Media helpers for material resolution.
//!
//! This crate provides:
//! - FFprobe-backed video probing behind the [`VideoProber`] trait
//! - File-name tag parsing for the local material library
//! - Local library scanning
//! - A URL-keyed download cache for remote clips

pub mod cache;
pub mod error;
pub mod library;
pub mod probe;
pub mod tags;

pub use cache::{DownloadCache, DownloadConfig};
pub use error::{MediaError, MediaResult};
pub use library::{is_supported_video, scan_local_library, SUPPORTED_EXTENSIONS};
pub use probe::{probe_video, FfprobeProber, VideoInfo, VideoProber};
pub use tags::parse_material_tags;
