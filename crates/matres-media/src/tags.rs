//! File-name tag convention for the local material library.
//!
//! Library files are named `<title>(<tag1>,<tag2>,...).<ext>`. Tags may be
//! separated by ASCII or full-width commas.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

static TAGGED_NAME: OnceLock<Regex> = OnceLock::new();

fn tagged_name_regex() -> &'static Regex {
    TAGGED_NAME.get_or_init(|| {
        Regex::new(r"^(.+?)\(([^)]+)\)$").expect("tagged name pattern is valid")
    })
}

/// Parse the display name and tags from a file name (without directory).
///
/// Names that don't follow the convention yield the stem and no tags.
pub fn parse_material_tags(file_name: &str) -> (String, Vec<String>) {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    match tagged_name_regex().captures(&stem) {
        Some(caps) => {
            let name = caps[1].trim().to_string();
            let tags = caps[2]
                .split([',', '，'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            (name, tags)
        }
        None => (stem, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_commas_and_whitespace() {
        let (name, tags) = parse_material_tags("Title(a, b，c).mp4");
        assert_eq!(name, "Title");
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_tags_dropped() {
        let (name, tags) = parse_material_tags("Sunset ( sky ,, ，orange ).mov");
        assert_eq!(name, "Sunset");
        assert_eq!(tags, vec!["sky", "orange"]);
    }

    #[test]
    fn test_no_suffix_returns_stem() {
        let (name, tags) = parse_material_tags("plain clip.mp4");
        assert_eq!(name, "plain clip");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parentheses_must_close_the_name() {
        let (name, tags) = parse_material_tags("Clip(a,b) extra.mp4");
        assert_eq!(name, "Clip(a,b) extra");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_empty_parentheses() {
        let (name, tags) = parse_material_tags("Clip().mp4");
        assert_eq!(name, "Clip()");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_title_needs_at_least_one_char() {
        let (name, tags) = parse_material_tags("(sea).mp4");
        assert_eq!(name, "(sea)");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_last_group_wins() {
        let (name, tags) = parse_material_tags("Clip(a)(b,c).webm");
        assert_eq!(name, "Clip(a)");
        assert_eq!(tags, vec!["b", "c"]);
    }

    #[test]
    fn test_unicode_tags() {
        let (name, tags) = parse_material_tags("海边(大海，沙滩).mp4");
        assert_eq!(name, "海边");
        assert_eq!(tags, vec!["大海", "沙滩"]);
    }
}
