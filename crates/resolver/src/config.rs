use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ResolveError;

// ---------------------------------------------------------------------------
// Field dictionary
// ---------------------------------------------------------------------------

/// Declared type of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    Text,
    Number,
    Boolean,
    TriState,
    #[serde(rename = "multiline-text", alias = "multiline")]
    Multiline,
}

/// Post-parse constraint applied to numeric and digit-bearing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberFormat {
    #[default]
    Plain,
    /// Calendar year; values outside 1800..=2100 are rejected.
    Year,
    /// Percentage; values above 100 are truncated to their first two digits.
    Percent,
    /// Monetary amount; currency symbols and thousands separators stripped.
    Currency,
    /// Keep only the ASCII digits of the raw value.
    Digits,
}

/// Where to look for a field's value relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Right,
    Below,
    Both,
}

/// One entry of the anchor dictionary.
///
/// `path` is the dot-separated location of the field in the output record
/// (e.g. `"propertyType.groundRent"`); its final segment is the field name.
/// `variants` are the textual forms the label may take on the page,
/// including known OCR misreads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub path: String,
    pub variants: Vec<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub format: NumberFormat,
    #[serde(default)]
    pub critical: bool,
    /// Explicit default recorded when the field stays unresolved. When
    /// absent the kind's natural default applies (`""`, `null`, `false`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, kind: ValueKind, variants: &[&str]) -> Self {
        FieldSpec {
            path: path.into(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            direction: Direction::Right,
            kind,
            format: NumberFormat::Plain,
            critical: false,
            default: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Tuning thresholds
// ---------------------------------------------------------------------------

/// Geometry and similarity thresholds for the resolution pass.
///
/// Defaults are calibrated for 300-DPI page-pixel coordinates; documents
/// rasterized at a different scale should override them via configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Normalized-Levenshtein acceptance threshold for anchor matching.
    pub min_similarity: f64,
    /// Score margin within which reading order breaks anchor ties.
    pub tie_margin: f64,
    /// Vertical center tolerance for right-search.
    pub right_band: f32,
    /// Maximum horizontal gap between anchor end and candidate start.
    pub right_max_gap: f32,
    /// Negative-overlap allowance tolerating merged or kerned text.
    pub right_overlap: f32,
    /// Maximum horizontal gap between fragments joined into one value.
    pub join_gap: f32,
    /// Maximum vertical gap between anchor bottom and the first line below.
    pub below_max_gap: f32,
    /// Maximum horizontal center offset for bottom-search candidates.
    pub below_column_slack: f32,
    /// Vertical gap between consecutive lines that ends a multiline block.
    pub line_gap: f32,
    /// Line cap for multiline blocks.
    pub max_lines: usize,
    /// Vertical tolerance when searching for a checkbox glyph token.
    pub glyph_band: f32,
    /// Horizontal reach when searching for a checkbox glyph token.
    pub glyph_reach: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            min_similarity: 0.78,
            tie_margin: 0.03,
            right_band: 75.0,
            right_max_gap: 1200.0,
            right_overlap: 10.0,
            join_gap: 60.0,
            below_max_gap: 180.0,
            below_column_slack: 650.0,
            line_gap: 80.0,
            max_lines: 6,
            glyph_band: 100.0,
            glyph_reach: 450.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Boilerplate patterns
// ---------------------------------------------------------------------------

/// Static set of legal/disclaimer strings that must never become values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerplateSet {
    /// Texts excluded on exact (normalized) equality.
    pub exact: Vec<String>,
    /// Texts excluded when they are a (normalized) prefix of a candidate.
    pub prefixes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolver configuration
// ---------------------------------------------------------------------------

/// Post-alignment subtree copy (`to` becomes a clone of `from`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    pub from: String,
    pub to: String,
}

/// Complete configuration for one document family: the anchor dictionary,
/// exclusion patterns, and tuning thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub boilerplate: BoilerplateSet,
    /// Section headings that terminate multiline blocks and are never
    /// accepted as values.
    #[serde(default)]
    pub stop_markers: Vec<String>,
    #[serde(default)]
    pub tolerances: Tolerances,
    #[serde(default)]
    pub mirrors: Vec<Mirror>,
    /// Append the concatenation of all token texts under `extractedText`.
    #[serde(default)]
    pub include_full_text: bool,
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        let config: ResolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that would otherwise surface as confusing
    /// mid-resolution behavior.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.fields.is_empty() {
            return Err(ResolveError::Config("no fields declared".to_string()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for field in &self.fields {
            if field.path.is_empty() || field.path.split('.').any(str::is_empty) {
                return Err(ResolveError::Config(format!(
                    "invalid field path: {:?}",
                    field.path
                )));
            }
            if !seen.insert(field.path.as_str()) {
                return Err(ResolveError::Config(format!(
                    "duplicate field path: {}",
                    field.path
                )));
            }
            if field.variants.iter().all(|v| v.trim().is_empty()) {
                return Err(ResolveError::Config(format!(
                    "field {} has no usable variants",
                    field.path
                )));
            }
        }

        let t = &self.tolerances;
        if !(0.0..=1.0).contains(&t.min_similarity) {
            return Err(ResolveError::Config(format!(
                "min_similarity {} is outside [0, 1]",
                t.min_similarity
            )));
        }
        if t.max_lines == 0 {
            return Err(ResolveError::Config("max_lines must be at least 1".to_string()));
        }

        for mirror in &self.mirrors {
            if !self
                .fields
                .iter()
                .any(|f| f.path == mirror.from || f.path.starts_with(&format!("{}.", mirror.from)))
            {
                return Err(ResolveError::Config(format!(
                    "mirror source {} does not exist in the schema",
                    mirror.from
                )));
            }
        }

        Ok(())
    }
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
    fn test_minimal_config_validates() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let config = ResolverConfig::default();
        assert!(matches!(config.validate(), Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let mut config = minimal_config();
        config
            .fields
            .push(FieldSpec::new("postCode", ValueKind::Text, &["Post Code"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_path_segment_rejected() {
        let mut config = minimal_config();
        config.fields[0].path = "propertyType..tenure".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_variantless_field_rejected() {
        let mut config = minimal_config();
        config.fields[0].variants = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mirror_must_reference_schema() {
        let mut config = minimal_config();
        config.mirrors.push(Mirror {
            from: "valuation".to_string(),
            to: "valuationHpp".to_string(),
        });
        assert!(config.validate().is_err());

        config.mirrors[0].from = "postCode".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_field_name_is_last_segment() {
        let field = FieldSpec::new("propertyType.groundRent", ValueKind::Number, &["Ground Rent"]);
        assert_eq!(field.name(), "groundRent");
    }

    #[test]
    fn test_tolerance_overrides_merge_with_defaults() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{
                "fields": [{"path": "rent", "variants": ["Rent"]}],
                "tolerances": {"right_band": 30.0}
            }"#,
        )
        .unwrap();

        assert!((config.tolerances.right_band - 30.0).abs() < f32::EPSILON);
        assert_eq!(config.tolerances.max_lines, Tolerances::default().max_lines);
        assert_eq!(config.fields[0].kind, ValueKind::Text);
        assert_eq!(config.fields[0].direction, Direction::Right);
    }

    #[test]
    fn test_kind_round_trips_kebab_case() {
        let json = serde_json::to_string(&ValueKind::TriState).unwrap();
        assert_eq!(json, "\"tri-state\"");
        let kind: ValueKind = serde_json::from_str("\"multiline-text\"").unwrap();
        assert_eq!(kind, ValueKind::Multiline);
    }
}
