use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ResolveError;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box in page coordinates.
///
/// Serialized as the four-element array `[x0, y0, x1, y1]` used by the token
/// artifact. Invariant: `x0 <= x1` and `y0 <= y1`, enforced when a
/// [`TokenStore`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    /// Horizontal center.
    pub fn cx(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical center.
    pub fn cy(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Corners are ordered and every coordinate is finite.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A coordinate-bound fragment of OCR-recognized text.
///
/// Tokens are produced by the external OCR collaborator and are immutable
/// once ingested. `confidence` defaults to `1.0` when the artifact omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub page: usize,
    pub bbox: BBox,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl Token {
    pub fn new(text: impl Into<String>, page: usize, bbox: BBox) -> Self {
        Token {
            text: text.into(),
            page,
            bbox,
            confidence: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Token artifact (input boundary)
// ---------------------------------------------------------------------------

/// The explicit, versioned input artifact handed over by the OCR
/// collaborator.
///
/// Accepts either the versioned envelope `{ "version": 1, "tokens": [...] }`
/// or a bare JSON array of tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TokenArtifact {
    pub version: u32,
    pub tokens: Vec<Token>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactRepr {
    Versioned {
        #[serde(default = "default_version")]
        version: u32,
        tokens: Vec<Token>,
    },
    Bare(Vec<Token>),
}

fn default_version() -> u32 {
    1
}

impl<'de> Deserialize<'de> for TokenArtifact {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match ArtifactRepr::deserialize(deserializer)? {
            ArtifactRepr::Versioned { version, tokens } => TokenArtifact { version, tokens },
            ArtifactRepr::Bare(tokens) => TokenArtifact { version: 1, tokens },
        })
    }
}

impl TokenArtifact {
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the artifact and build a [`TokenStore`] from it.
    pub fn into_store(self) -> Result<TokenStore, ResolveError> {
        TokenStore::new(self.tokens)
    }
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

/// All tokens of a document, grouped by page.
///
/// Pure data: construction validates structure, everything after that is
/// read-only. No token ordering is guaranteed beyond the page grouping.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    pages: BTreeMap<usize, Vec<Token>>,
    len: usize,
}

impl TokenStore {
    /// Build a store from raw tokens.
    ///
    /// Tokens whose text is empty after trimming are dropped (OCR noise).
    /// A malformed bounding box is a structural defect in the artifact and
    /// fails the whole ingestion.
    pub fn new(tokens: Vec<Token>) -> Result<Self, ResolveError> {
        let mut pages: BTreeMap<usize, Vec<Token>> = BTreeMap::new();
        let mut len = 0;

        for (index, mut token) in tokens.into_iter().enumerate() {
            if !token.bbox.is_valid() {
                return Err(ResolveError::MalformedToken {
                    index,
                    reason: format!(
                        "bounding box [{}, {}, {}, {}] is not ordered",
                        token.bbox.x0, token.bbox.y0, token.bbox.x1, token.bbox.y1
                    ),
                });
            }
            if !token.confidence.is_finite() || !(0.0..=1.0).contains(&token.confidence) {
                return Err(ResolveError::MalformedToken {
                    index,
                    reason: format!("confidence {} is outside [0, 1]", token.confidence),
                });
            }

            let trimmed = token.text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.len() != token.text.len() {
                token.text = trimmed.to_string();
            }

            pages.entry(token.page).or_default().push(token);
            len += 1;
        }

        Ok(TokenStore { pages, len })
    }

    /// Tokens on a single page (empty slice when the page has none).
    pub fn page(&self, page: usize) -> &[Token] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Page numbers present in the document, ascending.
    pub fn page_numbers(&self) -> Vec<usize> {
        self.pages.keys().copied().collect()
    }

    /// Iterate `(page, tokens)` in page order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &[Token])> {
        self.pages.iter().map(|(&p, t)| (p, t.as_slice()))
    }

    /// Iterate all tokens in page order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.pages.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Concatenation of every token text in page order, space-joined.
    pub fn full_text(&self) -> String {
        self.iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, page: usize, bbox: [f32; 4]) -> Token {
        Token::new(text, page, bbox.into())
    }

    #[test]
    fn test_bbox_centers() {
        let b = BBox::new(0.0, 10.0, 40.0, 20.0);
        assert!((b.cx() - 20.0).abs() < f32::EPSILON);
        assert!((b.cy() - 15.0).abs() < f32::EPSILON);
        assert!((b.width() - 40.0).abs() < f32::EPSILON);
        assert!((b.height() - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bbox_validity() {
        assert!(BBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(BBox::new(1.0, 0.0, 1.0, 0.0).is_valid()); // degenerate is fine
        assert!(!BBox::new(2.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!BBox::new(0.0, f32::NAN, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_token_confidence_defaults_to_one() {
        let json = r#"{"text": "Rent", "page": 0, "bbox": [0, 0, 10, 10]}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert!((token.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_artifact_bare_array() {
        let json = r#"[{"text": "Rent", "page": 0, "bbox": [0, 0, 10, 10], "confidence": 0.9}]"#;
        let artifact = TokenArtifact::from_json(json).unwrap();
        assert_eq!(artifact.version, 1);
        assert_eq!(artifact.tokens.len(), 1);
        assert_eq!(artifact.tokens[0].text, "Rent");
    }

    #[test]
    fn test_artifact_versioned_envelope() {
        let json = r#"{"version": 2, "tokens": [{"text": "Rent", "page": 1, "bbox": [0, 0, 10, 10]}]}"#;
        let artifact = TokenArtifact::from_json(json).unwrap();
        assert_eq!(artifact.version, 2);
        assert_eq!(artifact.tokens[0].page, 1);
    }

    #[test]
    fn test_artifact_missing_bbox_is_fatal() {
        let json = r#"[{"text": "Rent", "page": 0}]"#;
        assert!(TokenArtifact::from_json(json).is_err());
    }

    #[test]
    fn test_store_groups_by_page() {
        let store = TokenStore::new(vec![
            tok("a", 1, [0.0, 0.0, 5.0, 5.0]),
            tok("b", 0, [0.0, 0.0, 5.0, 5.0]),
            tok("c", 1, [10.0, 0.0, 15.0, 5.0]),
        ])
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.page_numbers(), vec![0, 1]);
        assert_eq!(store.page(0).len(), 1);
        assert_eq!(store.page(1).len(), 2);
        assert!(store.page(7).is_empty());
    }

    #[test]
    fn test_store_drops_empty_text() {
        let store = TokenStore::new(vec![
            tok("  ", 0, [0.0, 0.0, 5.0, 5.0]),
            tok(" x ", 0, [0.0, 0.0, 5.0, 5.0]),
        ])
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.page(0)[0].text, "x");
    }

    #[test]
    fn test_store_rejects_unordered_bbox() {
        let err = TokenStore::new(vec![tok("x", 0, [10.0, 0.0, 5.0, 5.0])]).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedToken { index: 0, .. }));
    }

    #[test]
    fn test_store_rejects_bad_confidence() {
        let mut token = tok("x", 0, [0.0, 0.0, 5.0, 5.0]);
        token.confidence = 1.5;
        assert!(TokenStore::new(vec![token]).is_err());
    }

    #[test]
    fn test_full_text_page_order() {
        let store = TokenStore::new(vec![
            tok("world", 1, [0.0, 0.0, 5.0, 5.0]),
            tok("hello", 0, [0.0, 0.0, 5.0, 5.0]),
        ])
        .unwrap();
        assert_eq!(store.full_text(), "hello world");
    }
}
