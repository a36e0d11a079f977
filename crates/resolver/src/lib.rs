//! Spatial-proximity field resolution over OCR token streams.
//!
//! Turns a noisy, unordered bag of coordinate-bound text fragments into a
//! strongly-typed nested record: recognize field labels (anchors) despite
//! OCR corruption, search geometrically for their values, split fused
//! label+value strings, disambiguate checkbox rows, and align everything
//! to an externally-fixed schema. Side effects (OCR, rasterization, file
//! I/O) live with the caller; the engine is a pure transformation.

use thiserror::Error;

pub mod align;
pub mod boilerplate;
pub mod config;
pub mod matcher;
pub mod normalize;
pub mod resolve;
pub mod search;
pub mod types;

pub use align::{FieldDiagnostic, FieldValue, Method, Provenance, ResolvedField, Severity};
pub use config::{
    BoilerplateSet, Direction, FieldSpec, Mirror, NumberFormat, ResolverConfig, Tolerances,
    ValueKind,
};
pub use matcher::MatchedAnchor;
pub use resolve::{resolve_document, ResolvedDocument};
pub use search::boolean::TriState;
pub use types::{BBox, Token, TokenArtifact, TokenStore};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed token {index}: {reason}")]
    MalformedToken { index: usize, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A configured resolution engine.
///
/// Construction validates the configuration once; [`Resolver::resolve`] can
/// then run against any number of token stores.
pub struct Resolver {
    config: ResolverConfig,
}

/// One matched anchor, flattened for inspection/debug output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnchorReport {
    pub path: String,
    pub page: usize,
    pub score: f64,
    pub text: String,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        config.validate()?;
        Ok(Resolver { config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a document to its output record.
    pub fn resolve(&self, store: &TokenStore) -> Result<ResolvedDocument, ResolveError> {
        resolve::resolve_document(store, &self.config)
    }

    /// Report every anchor match across the document without resolving
    /// values. Diagnostic surface for tuning dictionaries and thresholds.
    pub fn survey_anchors(&self, store: &TokenStore) -> Vec<AnchorReport> {
        let filter =
            boilerplate::BoilerplateFilter::new(&self.config.boilerplate, &self.config.stop_markers);
        let mut reports = Vec::new();
        for (page, tokens) in store.pages() {
            for anchor in matcher::find_anchors_on_page(
                tokens,
                page,
                &self.config.fields,
                &filter,
                &self.config.tolerances,
            ) {
                reports.push(AnchorReport {
                    path: self.config.fields[anchor.field].path.clone(),
                    page,
                    score: anchor.score,
                    text: tokens[anchor.index].text.clone(),
                });
            }
        }
        reports
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions (stateless)
// ---------------------------------------------------------------------------

/// Parse a token artifact and resolve it in one call.
pub fn resolve_tokens(
    artifact_json: &str,
    config: &ResolverConfig,
) -> Result<ResolvedDocument, ResolveError> {
    let store = TokenArtifact::from_json(artifact_json)?.into_store()?;
    resolve_document(&store, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> ResolverConfig {
        ResolverConfig {
            fields: vec![FieldSpec::new("postCode", ValueKind::Text, &["Postcode"])],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolver_rejects_invalid_config() {
        let config = ResolverConfig::default();
        assert!(matches!(Resolver::new(config), Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_resolve_tokens_end_to_end() {
        let artifact = r#"[
            {"text": "Postcode", "page": 0, "bbox": [0, 10, 80, 22]},
            {"text": "LU7 1GN", "page": 0, "bbox": [95, 10, 160, 22], "confidence": 0.93}
        ]"#;
        let doc = resolve_tokens(artifact, &minimal_config()).unwrap();
        assert_eq!(doc.record["postCode"], "LU7 1GN");
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_resolve_tokens_rejects_malformed_artifact() {
        let artifact = r#"[{"text": "Postcode", "page": 0}]"#;
        assert!(resolve_tokens(artifact, &minimal_config()).is_err());
    }

    #[test]
    fn test_survey_anchors_lists_matches_per_page() {
        let artifact = r#"[
            {"text": "Postcode", "page": 0, "bbox": [0, 10, 80, 22]},
            {"text": "Postcode", "page": 3, "bbox": [0, 10, 80, 22]}
        ]"#;
        let store = TokenArtifact::from_json(artifact)
            .unwrap()
            .into_store()
            .unwrap();
        let resolver = Resolver::new(minimal_config()).unwrap();
        let reports = resolver.survey_anchors(&store);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].page, 0);
        assert_eq!(reports[1].page, 3);
        assert_eq!(reports[0].path, "postCode");
    }
}
