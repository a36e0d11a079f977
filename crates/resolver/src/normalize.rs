//! Text normalization for matching plus label-noise stripping for values.
//!
//! Matching always compares *normalized* text (NFC-folded, lowercased,
//! whitespace-collapsed). Value extraction works on the original text and
//! only strips what is provably label residue: dictionary variants, trailing
//! checkbox marks, and edge punctuation.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters OCR engines produce for a ticked checkbox.
pub const GLYPH_CHARS: [char; 4] = ['x', 'X', '\u{2611}', '\u{2713}'];

/// Case-fold, NFC-normalize and collapse whitespace for comparison.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfc().collect::<String>().to_lowercase();
    collapse_ws(&folded)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the trimmed text is nothing but a checkbox mark.
///
/// A lone `v` is included -- a common OCR misread of a tick.
pub fn is_glyph_token(text: &str) -> bool {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => GLYPH_CHARS.contains(&c) || c == 'v',
        _ => false,
    }
}

/// Find the byte offset just past `needle` when `haystack` starts with it,
/// comparing case-insensitively per character.
///
/// Returns `None` when `needle` is not a prefix. Whitespace must match
/// one-to-one, so callers normalize both sides first when that matters.
pub fn case_insensitive_prefix_len(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.char_indices();
    for nc in needle.chars() {
        let (_, hc) = hay.next()?;
        if !hc.eq_ignore_ascii_case(&nc) && hc.to_lowercase().ne(nc.to_lowercase()) {
            return None;
        }
    }
    Some(hay.next().map(|(idx, _)| idx).unwrap_or(haystack.len()))
}

/// Remove every occurrence of `variant` (case-insensitive, plus any
/// trailing `:`/`.` and spaces) from `text`.
fn remove_variant(text: &str, variant: &str) -> String {
    if variant.is_empty() {
        return text.to_string();
    }
    let lower_text = text.to_lowercase();
    let lower_variant = variant.to_lowercase();
    if lower_text.len() != text.len() {
        // Case folding changed byte offsets (non-ASCII text); labels are
        // ASCII, so nothing here can be label residue.
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel) = lower_text[cursor..].find(&lower_variant) {
        let start = cursor + rel;
        out.push_str(&text[cursor..start]);

        // Skip the variant itself plus trailing separators.
        let mut end = start + lower_variant.len();
        while let Some(c) = text[end..].chars().next() {
            if c == ':' || c == '.' || c == ' ' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Strip trailing checkbox marks left over from merged label/checkbox text.
fn strip_glyph_marks(text: &str) -> String {
    // A mark wedged between a word and the next capitalized word.
    static RE_WEDGED: OnceLock<Regex> = OnceLock::new();
    let re_wedged =
        RE_WEDGED.get_or_init(|| Regex::new(r"([a-z)])[xX\u{2611}\u{2713}]([A-Z])").unwrap());
    let text = re_wedged.replace_all(text, "$1 $2");

    // A mark run dangling at the end, separated by whitespace.
    static RE_TRAILING: OnceLock<Regex> = OnceLock::new();
    let re_trailing =
        RE_TRAILING.get_or_init(|| Regex::new(r"\s+[xXv\u{2611}\u{2713}]+\s*$").unwrap());
    re_trailing.replace(&text, "").to_string()
}

/// Trim label/formatting punctuation from both ends of a value.
pub fn trim_value(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || ": .-()&/,;".contains(c))
}

/// Recover a value from text that may still carry label residue.
///
/// Removes every dictionary variant of the owning field, trailing checkbox
/// marks, and edge punctuation. Returns an empty string when nothing
/// value-like remains.
pub fn strip_label_noise(text: &str, variants: &[String]) -> String {
    let mut result = text.to_string();
    for variant in variants {
        result = remove_variant(&result, variant);
    }
    result = strip_glyph_marks(&result);
    collapse_ws(trim_value(&result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_case_and_whitespace() {
        assert_eq!(normalize("  Ground   Rent: "), "ground rent:");
        assert_eq!(normalize("POSTCODE"), "postcode");
    }

    #[test]
    fn test_glyph_token_detection() {
        assert!(is_glyph_token("X"));
        assert!(is_glyph_token(" x "));
        assert!(is_glyph_token("\u{2611}"));
        assert!(is_glyph_token("v"));
        assert!(!is_glyph_token("Xe"));
        assert!(!is_glyph_token("yes"));
        assert!(!is_glyph_token(""));
    }

    #[test]
    fn test_prefix_len_case_insensitive() {
        assert_eq!(case_insensitive_prefix_len("PostcodeLU7", "postcode"), Some(8));
        assert_eq!(case_insensitive_prefix_len("Postcode", "Postcode"), Some(8));
        assert_eq!(case_insensitive_prefix_len("Postcard", "Postcode"), None);
        assert_eq!(case_insensitive_prefix_len("Post", "Postcode"), None);
    }

    #[test]
    fn test_remove_variant_with_separators() {
        assert_eq!(remove_variant("Postcode: LU7 1GN", "Postcode"), "LU7 1GN");
        assert_eq!(remove_variant("Tenure Freehold", "Tenure"), "Freehold");
        assert_eq!(remove_variant("no label here", "Postcode"), "no label here");
    }

    #[test]
    fn test_strip_label_noise_removes_variant_and_punctuation() {
        let variants = vec!["Postcode".to_string()];
        assert_eq!(strip_label_noise("Postcode: LU7 1GN.", &variants), "LU7 1GN");
    }

    #[test]
    fn test_strip_label_noise_trailing_glyph() {
        let variants = vec!["Lift".to_string()];
        assert_eq!(strip_label_noise("Lift present X", &variants), "present");
    }

    #[test]
    fn test_strip_label_noise_wedged_glyph() {
        let variants: Vec<String> = Vec::new();
        assert_eq!(strip_label_noise("detachedXSemi", &variants), "detached Semi");
    }

    #[test]
    fn test_strip_label_noise_keeps_word_final_x() {
        // Words legitimately ending in x must survive value cleaning.
        let variants: Vec<String> = Vec::new();
        assert_eq!(strip_label_noise("Essex", &variants), "Essex");
    }

    #[test]
    fn test_trim_value() {
        assert_eq!(trim_value(": LU7 1GN.- "), "LU7 1GN");
        assert_eq!(trim_value("(none)"), "none");
    }
}
