//! Utility functions for URL handling.

use url::Url;

/// Browser User-Agent sent with provider and media requests; some CDNs
/// reject default HTTP client agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Strip the query string (and fragment) from a URL.
///
/// Unparseable input is cut at the first `?`.
pub fn strip_query(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.split('?').next().unwrap_or(raw).to_string(),
    }
}
