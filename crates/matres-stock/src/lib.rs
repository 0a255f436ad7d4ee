//! Stock footage search.
//!
//! This crate provides:
//! - Pexels and Pixabay search clients behind the `StockProvider` trait
//! - API key rotation shared by every provider of one registry
//! - Error classification separating configuration failures from transient ones

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod metrics;
pub mod pexels;
pub mod pixabay;
pub mod provider;
pub mod registry;


pub use client::build_http_client;
pub use config::StockConfig;
pub use credentials::{ApiKeys, RotationCounter};
pub use error::{StockError, StockResult};
pub use pexels::PexelsClient;
pub use pixabay::PixabayClient;
pub use provider::{search_or_empty, StockProvider};
pub use registry::StockRegistry;
