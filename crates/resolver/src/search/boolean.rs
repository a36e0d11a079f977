//! Tri-state interpretation of checkbox rows.
//!
//! OCR frequently merges a ticked box with its neighbouring "Yes"/"No"
//! captions into one string. The disambiguator locates the marker
//! substrings, maps them to x-coordinates by linear interpolation across
//! their token's box, and lets an independent tick-glyph token pick the
//! nearer marker. Inline forms without a separate glyph token fall back to
//! marker polarity.

use serde::{Deserialize, Serialize};

use crate::config::Tolerances;
use crate::normalize::{is_glyph_token, GLYPH_CHARS};
use crate::types::Token;

/// Glyph distances closer than this are considered equidistant.
const GLYPH_TIE_EPSILON: f32 = 1.0;

/// A boolean-like value with an explicit unknown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    True,
    False,
    Unknown,
}

impl TriState {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

impl From<bool> for TriState {
    fn from(b: bool) -> Self {
        if b {
            TriState::True
        } else {
            TriState::False
        }
    }
}

/// A "yes" or "no" caption located inside a token, projected onto the page.
#[derive(Debug, Clone, Copy)]
struct Marker {
    polarity: bool,
    x: f32,
    cy: f32,
}

/// True for characters that terminate a marker word: anything
/// non-alphabetic, or a tick glyph fused directly onto the caption.
fn is_marker_boundary(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => !c.is_alphabetic() || GLYPH_CHARS.contains(&c) || c == 'v',
    }
}

/// Locate every boundary-delimited occurrence of `needle` in `token`'s
/// lowercased text and project its center onto the x-axis.
fn find_markers(token: &Token, needle: &str, polarity: bool, out: &mut Vec<Marker>) {
    let chars: Vec<char> = token.text.to_lowercase().chars().collect();
    let pattern: Vec<char> = needle.chars().collect();
    let total = chars.len();
    if total < pattern.len() {
        return;
    }

    for start in 0..=(total - pattern.len()) {
        if chars[start..start + pattern.len()] != pattern[..] {
            continue;
        }
        let before = start.checked_sub(1).map(|i| chars[i]);
        let after = chars.get(start + pattern.len()).copied();
        if !is_marker_boundary(before) || !is_marker_boundary(after) {
            continue;
        }

        let mid = start as f32 + pattern.len() as f32 / 2.0;
        let fraction = mid / total as f32;
        out.push(Marker {
            polarity,
            x: token.bbox.x0 + fraction * token.bbox.width(),
            cy: token.bbox.cy(),
        });
    }
}

/// Token indices participating in one checkbox row: the anchor plus
/// everything within the glyph search window around it.
pub fn checkbox_row(tokens: &[Token], anchor_idx: usize, tolerances: &Tolerances) -> Vec<usize> {
    let anchor = &tokens[anchor_idx];
    tokens
        .iter()
        .enumerate()
        .filter(|&(i, t)| {
            i == anchor_idx
                || ((t.bbox.cy() - anchor.bbox.cy()).abs() < tolerances.glyph_band
                    && (t.bbox.cx() - anchor.bbox.cx()).abs() < tolerances.glyph_reach)
        })
        .map(|(i, _)| i)
        .collect()
}

/// True when `text` ends in a dangling tick glyph (`"Lift X"`).
fn has_trailing_glyph(text: &str) -> bool {
    let trimmed = text.trim_end();
    let mut rev = trimmed.chars().rev();
    match (rev.next(), rev.next()) {
        (Some(last), Some(prev)) => {
            (GLYPH_CHARS.contains(&last) || last == 'v') && !prev.is_alphanumeric()
        }
        _ => false,
    }
}

/// Resolve the checkbox row anchored at `anchor_idx` to a tri-state.
///
/// An independent glyph token selects the nearest marker; equidistant
/// markers, or two markers with no glyph at all, stay unknown. A single
/// marker carries its own polarity.
pub fn resolve_boolean(
    tokens: &[Token],
    anchor_idx: usize,
    tolerances: &Tolerances,
) -> TriState {
    let members = checkbox_row(tokens, anchor_idx, tolerances);

    let mut markers: Vec<Marker> = Vec::new();
    let mut glyphs: Vec<&Token> = Vec::new();
    for &i in &members {
        let token = &tokens[i];
        if is_glyph_token(&token.text) {
            glyphs.push(token);
            continue;
        }
        find_markers(token, "yes", true, &mut markers);
        find_markers(token, "no", false, &mut markers);
    }

    if !glyphs.is_empty() {
        if markers.is_empty() {
            // A ticked box sitting next to the bare label.
            return TriState::True;
        }
        // Closest glyph-to-marker distance per polarity.
        let mut best_yes: Option<f32> = None;
        let mut best_no: Option<f32> = None;
        for glyph in &glyphs {
            for marker in &markers {
                if (glyph.bbox.cy() - marker.cy).abs() >= tolerances.glyph_band {
                    continue;
                }
                let distance = (glyph.bbox.cx() - marker.x).abs();
                let slot = if marker.polarity {
                    &mut best_yes
                } else {
                    &mut best_no
                };
                *slot = Some(slot.map_or(distance, |d| d.min(distance)));
            }
        }
        return match (best_yes, best_no) {
            (Some(yes), Some(no)) if (yes - no).abs() < GLYPH_TIE_EPSILON => TriState::Unknown,
            (Some(yes), Some(no)) => (yes < no).into(),
            (Some(_), None) => TriState::True,
            (None, Some(_)) => TriState::False,
            (None, None) => TriState::Unknown,
        };
    }

    let has_yes = markers.iter().any(|m| m.polarity);
    let has_no = markers.iter().any(|m| !m.polarity);
    match (has_yes, has_no) {
        (true, true) => TriState::Unknown,
        (true, false) => TriState::True,
        (false, true) => TriState::False,
        (false, false) => {
            if members.iter().any(|&i| has_trailing_glyph(&tokens[i].text)) {
                TriState::True
            } else {
                TriState::Unknown
            }
        }
    }
}
