//! String utility functions.
//!
//! Label derivation turns identifier-style field names into human labels, and
//! [`escape_html`] makes arbitrary text safe to place in markup.

use regex::Regex;
use std::sync::OnceLock;

/// The suffix marking a field that carries a list of values.
pub const MULTI_VALUE_MARKER: &str = "[]";

/// Derives a human-readable label from a field name.
///
/// Splits on underscores, hyphens, whitespace and lower-to-upper camel case
/// boundaries, then title-cases every word. A trailing multi-value marker is
/// dropped.
///
/// # Examples
///
/// ```
/// use formation_core::utils::text::label_from_field_name;
///
/// assert_eq!(label_from_field_name("first_name"), "First Name");
/// assert_eq!(label_from_field_name("projectStatusId"), "Project Status Id");
/// assert_eq!(label_from_field_name("tags[]"), "Tags");
/// ```
pub fn label_from_field_name(name: &str) -> String {
    static CAMEL: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[_\-\s]+").unwrap());

    let name = name.strip_suffix(MULTI_VALUE_MARKER).unwrap_or(name);
    let spaced = camel.replace_all(name, "$1 $2");
    let spaced = separators.replace_all(&spaced, " ");
    spaced
        .split_whitespace()
        .map(title_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first character of a word and lower-cases the rest.
fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.push_str(&chars.as_str().to_lowercase());
        result
    })
}

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Returns `true` if the name carries the multi-value marker.
pub fn is_multi_value_name(name: &str) -> bool {
    name.ends_with(MULTI_VALUE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── label_from_field_name ────────────────────────────────────────

    #[test]
    fn test_label_snake_case() {
        assert_eq!(label_from_field_name("first_name"), "First Name");
    }

    #[test]
    fn test_label_single_word() {
        assert_eq!(label_from_field_name("email"), "Email");
    }

    #[test]
    fn test_label_lowercases_rest() {
        assert_eq!(label_from_field_name("URL_path"), "Url Path");
    }

    #[test]
    fn test_label_camel_case() {
        assert_eq!(label_from_field_name("dateOfBirth"), "Date Of Birth");
    }

    #[test]
    fn test_label_kebab_and_repeats() {
        assert_eq!(label_from_field_name("home--phone__number"), "Home Phone Number");
    }

    #[test]
    fn test_label_strips_multi_value_marker() {
        assert_eq!(label_from_field_name("category_ids[]"), "Category Ids");
    }

    #[test]
    fn test_label_empty() {
        assert_eq!(label_from_field_name(""), "");
    }

    // ── escape_html ──────────────────────────────────────────────────

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_plain() {
        assert_eq!(escape_html("photo.png"), "photo.png");
    }

    // ── is_multi_value_name ──────────────────────────────────────────

    #[test]
    fn test_is_multi_value_name() {
        assert!(is_multi_value_name("tags[]"));
        assert!(!is_multi_value_name("tags"));
        assert!(!is_multi_value_name("tags[]x"));
    }
}
