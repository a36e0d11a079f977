//! Fuzzy anchor recognition.
//!
//! Every token on a page is compared against each dictionary variant of a
//! field using normalized Levenshtein similarity. A token whose text merely
//! *starts with* a variant at a clean boundary also matches -- that is the
//! fused label+value case handled downstream by the fusion resolver.

use strsim::normalized_levenshtein;

use crate::boilerplate::BoilerplateFilter;
use crate::config::{FieldSpec, Tolerances};
use crate::normalize::{case_insensitive_prefix_len, collapse_ws, normalize};
use crate::types::Token;

/// The token identified as realizing a field's label on one page.
///
/// At most one per (field, page); `index` addresses the page's token slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedAnchor {
    pub field: usize,
    pub page: usize,
    pub index: usize,
    pub score: f64,
}

/// Similarity of a single token against a single variant.
///
/// Exact (normalized) equality and clean-boundary prefix containment score
/// 1.0; anything else scores by normalized Levenshtein distance.
fn variant_score(token_text: &str, token_norm: &str, variant_norm: &str) -> f64 {
    if variant_norm.is_empty() {
        return 0.0;
    }
    if token_norm == variant_norm {
        return 1.0;
    }
    if has_label_prefix(token_text, variant_norm) {
        return 1.0;
    }
    normalized_levenshtein(token_norm, variant_norm)
}

/// True when `text` starts with `variant` and the remainder begins at a
/// clean boundary: punctuation, whitespace, a digit, or a capital letter.
///
/// The boundary check runs on the original casing so that `"PostcodeLU7"`
/// qualifies while `"Hallway"` (lowercase continuation of `"Hall"`) does
/// not.
pub fn has_label_prefix(text: &str, variant_norm: &str) -> bool {
    let collapsed = collapse_ws(text);
    let Some(end) = case_insensitive_prefix_len(&collapsed, variant_norm) else {
        return false;
    };
    match collapsed[end..].chars().next() {
        None => true,
        Some(c) => !c.is_lowercase(),
    }
}

/// Best-scoring variant for one token, with the trailing-colon form of a
/// label treated as the label itself.
fn token_score(token: &Token, spec: &FieldSpec) -> f64 {
    let norm = normalize(&token.text);
    let clean = norm.trim_end_matches(':').trim_end();

    spec.variants
        .iter()
        .map(|variant| {
            let variant_norm = normalize(variant);
            variant_score(&token.text, clean, &variant_norm)
        })
        .fold(0.0, f64::max)
}

/// Locate the anchor token for `spec` among `tokens`, if any clears the
/// acceptance threshold.
///
/// Tokens are scanned in reading order (top-to-bottom, then left-to-right);
/// a later token only displaces an earlier match when it beats it by more
/// than `tie_margin`, since repeated boilerplate occurrences of a label are
/// rarer earlier on a page.
pub fn best_anchor(
    tokens: &[Token],
    spec: &FieldSpec,
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Option<(usize, f64)> {
    let mut order: Vec<usize> = (0..tokens.len()).collect();
    order.sort_by(|&a, &b| {
        let (ta, tb) = (&tokens[a], &tokens[b]);
        ta.bbox
            .y0
            .partial_cmp(&tb.bbox.y0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                ta.bbox
                    .x0
                    .partial_cmp(&tb.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut best: Option<(usize, f64)> = None;
    for index in order {
        let token = &tokens[index];
        if filter.is_boilerplate(&token.text) {
            continue;
        }
        let score = token_score(token, spec);
        if score < tolerances.min_similarity {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score + tolerances.tie_margin => {}
            _ => best = Some((index, score)),
        }
        if best.is_some_and(|(_, s)| s >= 1.0) {
            break;
        }
    }
    best
}

/// Match every dictionary field against one page's tokens.
///
/// A field with no token above threshold simply yields no entry -- absence
/// is expected and handled downstream.
pub fn find_anchors_on_page(
    tokens: &[Token],
    page: usize,
    fields: &[FieldSpec],
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Vec<MatchedAnchor> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(field, spec)| {
            best_anchor(tokens, spec, filter, tolerances).map(|(index, score)| MatchedAnchor {
                field,
                page,
                index,
                score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoilerplateSet, ValueKind};
    use crate::types::BBox;

    fn tok(text: &str, x0: f32, y0: f32) -> Token {
        Token::new(text, 0, BBox::new(x0, y0, x0 + 40.0, y0 + 10.0))
    }

    fn no_filter() -> BoilerplateFilter {
        BoilerplateFilter::new(&BoilerplateSet::default(), &[])
    }

    fn spec(variants: &[&str]) -> FieldSpec {
        FieldSpec::new("field", ValueKind::Text, variants)
    }

    #[test]
    fn test_exact_variant_matches() {
        let tokens = vec![tok("Ground Rent", 0.0, 0.0)];
        let (index, score) =
            best_anchor(&tokens, &spec(&["Ground Rent"]), &no_filter(), &Tolerances::default())
                .unwrap();
        assert_eq!(index, 0);
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_misread_variant_matches() {
        // A known OCR misread listed as a variant matches at full score.
        let tokens = vec![tok("Renu'r", 0.0, 0.0)];
        let result = best_anchor(
            &tokens,
            &spec(&["Ground Rent", "Renu'r"]),
            &no_filter(),
            &Tolerances::default(),
        );
        assert!(result.is_some());
        assert!(result.unwrap().1 >= Tolerances::default().min_similarity);
    }

    #[test]
    fn test_corrupted_label_matches_fuzzily() {
        let tokens = vec![tok("Postcede", 0.0, 0.0)];
        let (_, score) =
            best_anchor(&tokens, &spec(&["Postcode"]), &no_filter(), &Tolerances::default())
                .unwrap();
        assert!(score >= 0.78 && score < 1.0);
    }

    #[test]
    fn test_unrelated_text_rejected() {
        let tokens = vec![tok("Gatehouse Bank plc", 0.0, 0.0)];
        assert!(
            best_anchor(&tokens, &spec(&["Postcode"]), &no_filter(), &Tolerances::default())
                .is_none()
        );
    }

    #[test]
    fn test_fused_token_matches_by_prefix() {
        let tokens = vec![tok("PostcodeLU7 1GN", 0.0, 0.0)];
        let (_, score) =
            best_anchor(&tokens, &spec(&["Postcode"]), &no_filter(), &Tolerances::default())
                .unwrap();
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lowercase_continuation_is_not_a_prefix_match() {
        // "Hallway" must not count as a containment match for "Hall".
        assert!(!has_label_prefix("Hallway", "hall"));
        let tokens = vec![tok("Hallway", 0.0, 0.0)];
        assert!(
            best_anchor(&tokens, &spec(&["Hall"]), &no_filter(), &Tolerances::default()).is_none()
        );
    }

    #[test]
    fn test_label_with_colon_matches() {
        let tokens = vec![tok("Postcode:", 0.0, 0.0)];
        let (_, score) =
            best_anchor(&tokens, &spec(&["Postcode"]), &no_filter(), &Tolerances::default())
                .unwrap();
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_prefers_reading_order() {
        // Same label twice; the topmost occurrence wins.
        let tokens = vec![tok("Postcode", 0.0, 500.0), tok("Postcode", 0.0, 20.0)];
        let (index, _) =
            best_anchor(&tokens, &spec(&["Postcode"]), &no_filter(), &Tolerances::default())
                .unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_boilerplate_cannot_anchor() {
        let filter = BoilerplateFilter::new(
            &BoilerplateSet {
                exact: vec!["Postcode".to_string()],
                prefixes: vec![],
            },
            &[],
        );
        let tokens = vec![tok("Postcode", 0.0, 0.0)];
        assert!(best_anchor(&tokens, &spec(&["Postcode"]), &filter, &Tolerances::default())
            .is_none());
    }

    #[test]
    fn test_one_anchor_per_field_per_page() {
        let fields = vec![spec(&["Postcode"]), spec(&["Tenure"])];
        let tokens = vec![
            tok("Postcode", 0.0, 0.0),
            tok("Postcode", 0.0, 100.0),
            tok("Tenure", 0.0, 200.0),
        ];
        let anchors =
            find_anchors_on_page(&tokens, 3, &fields, &no_filter(), &Tolerances::default());
        assert_eq!(anchors.len(), 2);
        assert!(anchors.iter().all(|a| a.page == 3));
        assert_eq!(anchors[0].field, 0);
        assert_eq!(anchors[0].index, 0);
    }

    #[test]
    fn test_missing_anchor_yields_nothing() {
        let fields = vec![spec(&["Postcode"])];
        let anchors = find_anchors_on_page(
            &[tok("unrelated", 0.0, 0.0)],
            0,
            &fields,
            &no_filter(),
            &Tolerances::default(),
        );
        assert!(anchors.is_empty());
    }
}
