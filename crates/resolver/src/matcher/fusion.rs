//! Splitting of tokens where a label and its value were OCR'd as one
//! string, either with no separator at all (`"PostcodeLU7 1GN"`) or with
//! label punctuation still attached (`"Postcode: LU7 1GN"`).

use crate::normalize::{case_insensitive_prefix_len, collapse_ws, normalize, trim_value};

/// Minimum remainder length for a split to count as a real value.
const MIN_VALUE_LEN: usize = 2;

/// Try to split `text` into a label part matching `variant` and a value
/// part.
///
/// The variant must be a strict prefix of the (whitespace-collapsed) token;
/// the remainder, after trimming leading punctuation, must be non-trivial
/// and contain at least one alphanumeric character. Returns `None`
/// otherwise -- a partial or label-only token is not a fusion.
pub fn split_fused(text: &str, variant: &str) -> Option<(String, String)> {
    let collapsed = collapse_ws(text);
    let variant_norm = normalize(variant);
    if variant_norm.is_empty() {
        return None;
    }

    let end = case_insensitive_prefix_len(&collapsed, &variant_norm)?;
    let label = collapsed[..end].to_string();
    let value = trim_value(&collapsed[end..]);

    if value.chars().count() < MIN_VALUE_LEN || !value.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some((label, value.to_string()))
}

/// First successful split of `text` against any of `variants`.
///
/// Longer variants are tried first so that `"Road Charges"` wins over
/// `"Road"` when both are listed.
pub fn split_fused_any(text: &str, variants: &[String]) -> Option<(String, String)> {
    let mut ordered: Vec<&String> = variants.iter().collect();
    ordered.sort_by_key(|v| std::cmp::Reverse(v.chars().count()));

    ordered
        .into_iter()
        .find_map(|variant| split_fused(text, variant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_no_separator() {
        let (label, value) = split_fused("PostcodeLU7 1GN", "Postcode").unwrap();
        assert_eq!(label, "Postcode");
        assert_eq!(value, "LU7 1GN");
    }

    #[test]
    fn test_split_with_separator() {
        let (label, value) = split_fused("Postcode: LU7 1GN", "Postcode").unwrap();
        assert_eq!(label, "Postcode");
        assert_eq!(value, "LU7 1GN");
    }

    #[test]
    fn test_value_has_no_leading_punctuation() {
        let (_, value) = split_fused("Tenure:- Freehold", "Tenure").unwrap();
        assert_eq!(value, "Freehold");
    }

    #[test]
    fn test_label_only_token_is_not_split() {
        assert!(split_fused("Postcode", "Postcode").is_none());
        assert!(split_fused("Postcode:", "Postcode").is_none());
    }

    #[test]
    fn test_partial_variant_is_not_split() {
        assert!(split_fused("PostLU7 1GN", "Postcode").is_none());
    }

    #[test]
    fn test_trivial_remainder_is_not_split() {
        assert!(split_fused("Postcode.", "Postcode").is_none());
        assert!(split_fused("PostcodeX", "Postcode").is_none());
    }

    #[test]
    fn test_case_insensitive_label() {
        let (label, value) = split_fused("POSTCODE LU7 1GN", "Postcode").unwrap();
        assert_eq!(label, "POSTCODE");
        assert_eq!(value, "LU7 1GN");
    }

    #[test]
    fn test_longest_variant_wins() {
        let variants = vec!["Road".to_string(), "Road Charges".to_string()];
        let (label, value) = split_fused_any("Road Charges £120", &variants).unwrap();
        assert_eq!(label, "Road Charges");
        assert_eq!(value, "£120");
    }
}
