//! API key rotation.
//!
//! Providers may be configured with several API keys to spread rate limits.
//! Every lookup against a multi-key list advances one counter shared by all
//! providers of a resolver, and picks `keys[counter % len]`.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{StockError, StockResult};

/// Monotonic lookup counter shared by every provider of one resolver.
#[derive(Debug, Clone, Default)]
pub struct RotationCounter(Arc<AtomicUsize>);

impl RotationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn advance(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// API keys configured for one provider.
#[derive(Clone)]
pub struct ApiKeys {
    /// Environment variable the keys come from, used in error messages
    source: String,
    keys: Vec<String>,
}

impl ApiKeys {
    /// Create from a list of keys; blank entries are dropped.
    pub fn new(source: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            source: source.into(),
            keys: keys
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list.
    pub fn parse(source: impl Into<String>, raw: &str) -> Self {
        Self::new(source, raw.split(',').map(str::to_string).collect())
    }

    /// Read a comma-separated list from the environment variable `var`.
    pub fn from_env(var: &str) -> Self {
        let raw = std::env::var(var).unwrap_or_default();
        Self::parse(var, &raw)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Pick the key for the next request.
    ///
    /// A single key is returned without touching the counter.
    pub fn select(&self, counter: &RotationCounter) -> StockResult<&str> {
        match self.keys.len() {
            0 => Err(StockError::missing_credential(&self.source)),
            1 => Ok(&self.keys[0]),
            n => Ok(&self.keys[counter.advance() % n]),
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("source", &self.source)
            .field("count", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_does_not_advance() {
        let keys = ApiKeys::parse("PEXELS_API_KEYS", "only");
        let counter = RotationCounter::new();

        assert_eq!(keys.select(&counter).unwrap(), "only");
        assert_eq!(keys.select(&counter).unwrap(), "only");
        assert_eq!(counter.advance(), 1);
    }

    #[test]
    fn test_round_robin_starts_after_increment() {
        let keys = ApiKeys::parse("PEXELS_API_KEYS", "a, b, c");
        let counter = RotationCounter::new();

        let picked: Vec<&str> = (0..4).map(|_| keys.select(&counter).unwrap()).collect();
        assert_eq!(picked, vec!["b", "c", "a", "b"]);
    }

    #[test]
    fn test_counter_shared_across_providers() {
        let pexels = ApiKeys::parse("PEXELS_API_KEYS", "p1,p2");
        let pixabay = ApiKeys::parse("PIXABAY_API_KEYS", "x1,x2");
        let counter = RotationCounter::new();

        assert_eq!(pexels.select(&counter).unwrap(), "p2");
        assert_eq!(pixabay.select(&counter).unwrap(), "x1");
        assert_eq!(pexels.select(&counter).unwrap(), "p2");
        assert_eq!(counter.advance(), 4);
    }

    #[test]
    fn test_missing_keys_is_fatal() {
        let keys = ApiKeys::parse("PIXABAY_API_KEYS", " , ");
        assert!(keys.is_empty());

        let err = keys.select(&RotationCounter::new()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("PIXABAY_API_KEYS"));
    }

    #[test]
    fn test_debug_hides_keys() {
        let keys = ApiKeys::parse("PEXELS_API_KEYS", "secret-key");
        let debug = format!("{:?}", keys);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("count: 1"));
    }
}
