//! Geometric value search around a matched anchor.
//!
//! Right-search collects same-band tokens to the right of the anchor and
//! joins contiguous fragments into one value. Bottom-search assembles the
//! column block below the anchor line by line for multiline values.

pub mod boolean;
pub mod fallback;

use crate::boilerplate::BoilerplateFilter;
use crate::config::Tolerances;
use crate::normalize::normalize;
use crate::types::Token;

/// A value recovered by proximity search, with the tokens that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub text: String,
    pub token_indices: Vec<usize>,
    pub confidence: f32,
}

impl Found {
    fn from_tokens(text: String, indices: Vec<usize>, tokens: &[Token]) -> Self {
        let confidence = indices
            .iter()
            .map(|&i| tokens[i].confidence)
            .fold(1.0_f32, f32::min);
        Found {
            text,
            token_indices: indices,
            confidence,
        }
    }
}

// ---------------------------------------------------------------------------
// Right-search
// ---------------------------------------------------------------------------

/// Collect the value to the right of the anchor on the same text band.
///
/// Candidates must have their vertical center within `right_band` of the
/// anchor's and start to the right of the anchor's end, allowing
/// `right_overlap` of negative overlap for merged or kerned text. The
/// nearest candidate starts the value; following fragments are appended
/// with single-space joins while the horizontal gap between them stays
/// under `join_gap`.
pub fn search_right(
    tokens: &[Token],
    anchor_idx: usize,
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Option<Found> {
    let anchor = &tokens[anchor_idx];

    let mut candidates: Vec<usize> = (0..tokens.len())
        .filter(|&i| i != anchor_idx)
        .filter(|&i| {
            let t = &tokens[i];
            (t.bbox.cy() - anchor.bbox.cy()).abs() < tolerances.right_band
                && t.bbox.x0 >= anchor.bbox.x1 - tolerances.right_overlap
                && t.bbox.x0 - anchor.bbox.x1 < tolerances.right_max_gap
                && !filter.rejects_value(&t.text)
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|&a, &b| {
        tokens[a]
            .bbox
            .x0
            .partial_cmp(&tokens[b].bbox.x0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Chain contiguous fragments from the nearest candidate outward.
    let mut indices = vec![candidates[0]];
    let mut right_edge = tokens[candidates[0]].bbox.x1;
    for &i in &candidates[1..] {
        if tokens[i].bbox.x0 - right_edge > tolerances.join_gap {
            break;
        }
        right_edge = right_edge.max(tokens[i].bbox.x1);
        indices.push(i);
    }

    let text = indices
        .iter()
        .map(|&i| tokens[i].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(Found::from_tokens(text, indices, tokens))
}

// ---------------------------------------------------------------------------
// Bottom-search
// ---------------------------------------------------------------------------

/// One assembled line of the column block below an anchor.
struct Line {
    indices: Vec<usize>,
    y0: f32,
    y1: f32,
}

impl Line {
    fn text(&self, tokens: &[Token]) -> String {
        let mut ordered = self.indices.clone();
        ordered.sort_by(|&a, &b| {
            tokens[a]
                .bbox
                .x0
                .partial_cmp(&tokens[b].bbox.x0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ordered
            .iter()
            .map(|&i| tokens[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Collect the multiline block below the anchor.
///
/// Tokens whose horizontal center stays within `below_column_slack` of the
/// anchor's column are grouped into lines top-to-bottom; the block ends at
/// a vertical gap larger than `line_gap`, at a configured stop marker, or
/// at another matched anchor's token (`other_anchors`). Lines join with
/// newlines; duplicate lines are kept once.
pub fn search_below(
    tokens: &[Token],
    anchor_idx: usize,
    other_anchors: &[usize],
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Option<Found> {
    let anchor = &tokens[anchor_idx];

    let mut candidates: Vec<usize> = (0..tokens.len())
        .filter(|&i| i != anchor_idx)
        .filter(|&i| {
            let t = &tokens[i];
            t.bbox.cy() > anchor.bbox.cy()
                && t.bbox.y0 > anchor.bbox.y0
                && (t.bbox.cx() - anchor.bbox.cx()).abs() < tolerances.below_column_slack
                && !filter.is_boilerplate(&t.text)
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|&a, &b| {
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

    // Group candidates into lines; a token starts a new line when its top
    // falls below the current line's span by more than half its height.
    let mut lines: Vec<Line> = Vec::new();
    for i in candidates {
        let t = &tokens[i];
        match lines.last_mut() {
            Some(line) if t.bbox.y0 - line.y0 <= t.bbox.height() * 0.5 => {
                line.y1 = line.y1.max(t.bbox.y1);
                line.indices.push(i);
            }
            _ => lines.push(Line {
                indices: vec![i],
                y0: t.bbox.y0,
                y1: t.bbox.y1,
            }),
        }
    }

    // The block must start within reach of the anchor's bottom edge.
    if lines[0].y0 - anchor.bbox.y1 >= tolerances.below_max_gap {
        return None;
    }

    let mut block: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();
    let mut prev_bottom = anchor.bbox.y1;

    for line in &lines {
        if block.len() >= tolerances.max_lines {
            break;
        }
        // End of block: vertical break, section heading, or another field's
        // anchor entering the column.
        if !block.is_empty() && line.y0 - prev_bottom > tolerances.line_gap {
            break;
        }
        let text = line.text(tokens);
        if filter.is_stop_marker(&text)
            || line.indices.iter().any(|i| other_anchors.contains(i))
        {
            break;
        }
        prev_bottom = line.y1;

        let norm = normalize(&text);
        if seen.contains(&norm) {
            continue;
        }
        seen.push(norm);
        block.push(text);
        indices.extend(&line.indices);
    }

    if block.is_empty() {
        return None;
    }
    Some(Found::from_tokens(block.join("\n"), indices, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoilerplateSet;

    fn tok(text: &str, bbox: [f32; 4]) -> Token {
        Token::new(text, 0, bbox.into())
    }

    fn no_filter() -> BoilerplateFilter {
        BoilerplateFilter::new(&BoilerplateSet::default(), &[])
    }

    #[test]
    fn test_right_search_tolerance_band() {
        // Anchor at (0,10,40,20), value at (45,9,80,21): sole candidate.
        let tokens = vec![
            tok("Rent", [0.0, 10.0, 40.0, 20.0]),
            tok("£950", [45.0, 9.0, 80.0, 21.0]),
        ];
        let found = search_right(&tokens, 0, &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "£950");
        assert_eq!(found.token_indices, vec![1]);
    }

    #[test]
    fn test_right_search_ignores_other_bands() {
        let tokens = vec![
            tok("Rent", [0.0, 10.0, 40.0, 20.0]),
            tok("far below", [45.0, 200.0, 80.0, 210.0]),
        ];
        assert!(search_right(&tokens, 0, &no_filter(), &Tolerances::default()).is_none());
    }

    #[test]
    fn test_right_search_ignores_tokens_to_the_left() {
        let tokens = vec![
            tok("Rent", [100.0, 10.0, 140.0, 20.0]),
            tok("left", [0.0, 10.0, 60.0, 20.0]),
        ];
        assert!(search_right(&tokens, 0, &no_filter(), &Tolerances::default()).is_none());
    }

    #[test]
    fn test_right_search_allows_negative_overlap() {
        // Merged/kerned text: the value starts slightly inside the anchor.
        let tokens = vec![
            tok("Rent", [0.0, 10.0, 40.0, 20.0]),
            tok("£950", [34.0, 10.0, 70.0, 20.0]),
        ];
        let found = search_right(&tokens, 0, &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "£950");
    }

    #[test]
    fn test_right_search_joins_contiguous_fragments() {
        let tokens = vec![
            tok("Address", [0.0, 10.0, 60.0, 20.0]),
            tok("12", [70.0, 10.0, 85.0, 20.0]),
            tok("High", [90.0, 10.0, 120.0, 20.0]),
            tok("Street", [125.0, 10.0, 170.0, 20.0]),
        ];
        let found = search_right(&tokens, 0, &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "12 High Street");
        assert_eq!(found.token_indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_right_search_breaks_chain_at_large_gap() {
        let tokens = vec![
            tok("Rent", [0.0, 10.0, 40.0, 20.0]),
            tok("£950", [50.0, 10.0, 80.0, 20.0]),
            tok("unrelated", [900.0, 10.0, 960.0, 20.0]),
        ];
        let found = search_right(&tokens, 0, &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "£950");
    }

    #[test]
    fn test_right_search_skips_boilerplate_candidate() {
        // The nearest candidate is boilerplate; the next one wins.
        let filter = BoilerplateFilter::new(
            &BoilerplateSet {
                exact: vec!["please provide details".to_string()],
                prefixes: vec![],
            },
            &[],
        );
        let tokens = vec![
            tok("Rent", [0.0, 10.0, 40.0, 20.0]),
            tok("please provide details", [50.0, 10.0, 200.0, 20.0]),
            tok("£950", [220.0, 10.0, 260.0, 20.0]),
        ];
        let found = search_right(&tokens, 0, &filter, &Tolerances::default()).unwrap();
        assert_eq!(found.text, "£950");
    }

    #[test]
    fn test_right_search_confidence_is_minimum() {
        let mut a = tok("Rent", [0.0, 10.0, 40.0, 20.0]);
        a.confidence = 0.99;
        let mut b = tok("£950", [50.0, 10.0, 80.0, 20.0]);
        b.confidence = 0.4;
        let mut c = tok("pcm", [85.0, 10.0, 110.0, 20.0]);
        c.confidence = 0.9;
        let found =
            search_right(&[a, b, c], 0, &no_filter(), &Tolerances::default()).unwrap();
        assert!((found.confidence - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_below_search_multiline_block() {
        let tokens = vec![
            tok("Property Address", [0.0, 0.0, 120.0, 20.0]),
            tok("Flat 3", [0.0, 30.0, 60.0, 50.0]),
            tok("12 High Street", [0.0, 60.0, 110.0, 80.0]),
            tok("Leighton Buzzard", [0.0, 90.0, 130.0, 110.0]),
        ];
        let found =
            search_below(&tokens, 0, &[], &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "Flat 3\n12 High Street\nLeighton Buzzard");
    }

    #[test]
    fn test_below_search_joins_same_line_left_to_right() {
        let tokens = vec![
            tok("Applicant", [0.0, 0.0, 80.0, 20.0]),
            tok("Smith", [60.0, 32.0, 100.0, 50.0]),
            tok("Mr", [0.0, 30.0, 30.0, 50.0]),
        ];
        let found =
            search_below(&tokens, 0, &[], &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "Mr Smith");
    }

    #[test]
    fn test_below_search_stops_at_line_gap() {
        let tokens = vec![
            tok("Remarks", [0.0, 0.0, 80.0, 20.0]),
            tok("first line", [0.0, 30.0, 80.0, 50.0]),
            tok("different section", [0.0, 400.0, 140.0, 420.0]),
        ];
        let found =
            search_below(&tokens, 0, &[], &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "first line");
    }

    #[test]
    fn test_below_search_stops_at_stop_marker() {
        let filter = BoilerplateFilter::new(
            &BoilerplateSet::default(),
            &["GENERAL REMARKS".to_string()],
        );
        let tokens = vec![
            tok("Property Address", [0.0, 0.0, 120.0, 20.0]),
            tok("12 High Street", [0.0, 30.0, 110.0, 50.0]),
            tok("GENERAL REMARKS", [0.0, 60.0, 140.0, 80.0]),
            tok("should not appear", [0.0, 90.0, 140.0, 110.0]),
        ];
        let found = search_below(&tokens, 0, &[], &filter, &Tolerances::default()).unwrap();
        assert_eq!(found.text, "12 High Street");
    }

    #[test]
    fn test_below_search_stops_at_other_anchor() {
        let tokens = vec![
            tok("Property Address", [0.0, 0.0, 120.0, 20.0]),
            tok("12 High Street", [0.0, 30.0, 110.0, 50.0]),
            tok("Postcode", [0.0, 60.0, 80.0, 80.0]),
            tok("LU7 1GN", [0.0, 90.0, 70.0, 110.0]),
        ];
        let found =
            search_below(&tokens, 0, &[2], &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "12 High Street");
    }

    #[test]
    fn test_below_search_deduplicates_lines() {
        let tokens = vec![
            tok("Remarks", [0.0, 0.0, 80.0, 20.0]),
            tok("repeated", [0.0, 30.0, 80.0, 50.0]),
            tok("repeated", [0.0, 60.0, 80.0, 80.0]),
        ];
        let found =
            search_below(&tokens, 0, &[], &no_filter(), &Tolerances::default()).unwrap();
        assert_eq!(found.text, "repeated");
    }

    #[test]
    fn test_below_search_caps_lines() {
        let mut tokens = vec![tok("Remarks", [0.0, 0.0, 80.0, 20.0])];
        for i in 0..10 {
            let y = 30.0 + i as f32 * 30.0;
            tokens.push(tok(&format!("line {i}"), [0.0, y, 80.0, y + 20.0]));
        }
        let tolerances = Tolerances {
            max_lines: 3,
            ..Default::default()
        };
        let found = search_below(&tokens, 0, &[], &no_filter(), &tolerances).unwrap();
        assert_eq!(found.text.lines().count(), 3);
    }

    #[test]
    fn test_below_search_requires_column_overlap() {
        let tokens = vec![
            tok("Remarks", [0.0, 0.0, 80.0, 20.0]),
            tok("far right column", [2000.0, 30.0, 2100.0, 50.0]),
        ];
        assert!(search_below(&tokens, 0, &[], &no_filter(), &Tolerances::default()).is_none());
    }
}
