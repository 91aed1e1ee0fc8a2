use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]+").expect("valid slug regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid separator regex"));

// derive a URL-safe identifier from a category name
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    SEPARATORS
        .replace_all(stripped.trim(), "-")
        .trim_matches('-')
        .to_string()
}

// escape LIKE wildcards so the search term is matched literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Trims the value and turns blank strings into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lets `Option<Option<T>>` tell an absent field (`None`) apart from an
/// explicit `null` (`Some(None)`). Use together with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slugify_collapses_symbols_and_whitespace() {
        assert_eq!(slugify("Tech & Tips"), "tech-tips");
    }

    #[test]
    fn test_slugify_keeps_word_characters_and_hyphens() {
        assert_eq!(slugify("Rust_Lang 2024"), "rust_lang-2024");
        assert_eq!(slugify("  Web -  Dev  "), "web-dev");
    }

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Café Culture!"), "caf-culture");
        assert_eq!(slugify("&&&"), "");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_sure\\"), "100\\%\\_sure\\\\");
        assert_eq!(escape_like("react"), "react");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hi ".into())), Some("hi".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        image: Option<Option<String>>,
    }

    #[test]
    fn test_deserialize_some_distinguishes_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"image": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"image": "a"}"#).unwrap();

        assert_eq!(missing.image, None);
        assert_eq!(null.image, Some(None));
        assert_eq!(set.image, Some(Some("a".into())));
    }
}
