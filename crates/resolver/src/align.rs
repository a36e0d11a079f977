//! Assembly of resolved fields into the externally-fixed output record.
//!
//! The aligner walks the dictionary in declaration order so the record's
//! key order (and therefore its serialized form) is stable. Every field
//! contributes exactly one key -- resolved, or the declared default.
//! Coercion failures become field-level diagnostics, never fatal errors.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{FieldSpec, NumberFormat, ResolverConfig, ValueKind};
use crate::search::boolean::TriState;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// How a field's value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    DirectRight,
    DirectBelow,
    FusedSplit,
    GlobalFallback,
    DefaultEmpty,
}

/// Where a resolved value came from and how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub method: Method,
    pub page: Option<usize>,
    /// Raw texts of the token(s) that produced the value.
    pub source: Vec<String>,
    pub confidence: f32,
}

impl Provenance {
    fn default_empty() -> Self {
        Provenance {
            method: Method::DefaultEmpty,
            page: None,
            source: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// A typed, coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    TriState(Option<bool>),
    Null,
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::json!(n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::TriState(Some(b)) => Value::Bool(*b),
            FieldValue::TriState(None) | FieldValue::Null => Value::Null,
        }
    }
}

/// One fully-resolved schema field with its provenance trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub path: String,
    pub value: FieldValue,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A per-field problem attached to the output, not raised as a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiagnostic {
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Intermediate resolution (engine -> aligner)
// ---------------------------------------------------------------------------

/// Pre-coercion value produced by the search stage.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Tri(TriState),
}

/// A successful local or fallback resolution, before type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: RawValue,
    pub method: Method,
    pub page: usize,
    pub source: Vec<String>,
    pub confidence: f32,
}

// ---------------------------------------------------------------------------
// Number parsing
// ---------------------------------------------------------------------------

/// Pull the first numeric run out of `text` and parse it, handling currency
/// symbols and mixed thousands/decimal separators.
///
/// When both `,` and `.` appear, the one occurring last is taken as the
/// decimal separator. A lone comma followed by one or two trailing digits
/// is treated as a decimal comma; otherwise commas are thousands
/// separators.
pub fn extract_number(text: &str) -> Result<f64, String> {
    static RE_NUM: OnceLock<Regex> = OnceLock::new();
    let re = RE_NUM.get_or_init(|| Regex::new(r"\d[\d,.]*").unwrap());

    let stripped: String = text
        .chars()
        .filter(|c| !"£$€".contains(*c))
        .collect();
    let run = re
        .find(&stripped)
        .ok_or_else(|| format!("no numeric content in {text:?}"))?
        .as_str();

    let has_comma = run.contains(',');
    let has_dot = run.contains('.');
    let cleaned = if has_comma && has_dot {
        let decimal = if run.rfind(',') > run.rfind('.') { ',' } else { '.' };
        let thousands = if decimal == ',' { '.' } else { ',' };
        run.replace(thousands, "").replace(decimal, ".")
    } else if has_comma {
        let after = &run[run.rfind(',').unwrap() + 1..];
        if run.matches(',').count() == 1 && (1..=2).contains(&after.len()) {
            run.replace(',', ".")
        } else {
            run.replace(',', "")
        }
    } else {
        run.to_string()
    };

    cleaned
        .trim_end_matches('.')
        .parse::<f64>()
        .map_err(|e| format!("cannot parse {run:?} as a number: {e}"))
}

/// Apply a [`NumberFormat`] constraint to a parsed value.
fn constrain_number(value: f64, format: NumberFormat) -> Result<f64, String> {
    match format {
        NumberFormat::Plain | NumberFormat::Currency | NumberFormat::Digits => Ok(value),
        NumberFormat::Year => {
            let year = value.round();
            if (1800.0..=2100.0).contains(&year) {
                Ok(year)
            } else {
                Err(format!("{value} is outside the plausible year range"))
            }
        }
        NumberFormat::Percent => {
            if value > 100.0 {
                // Two checkbox digits OCR'd together with a stray digit.
                let digits: String = format!("{}", value.trunc() as i64)
                    .chars()
                    .take(2)
                    .collect();
                digits
                    .parse::<f64>()
                    .map_err(|e| format!("cannot truncate {value} to a percentage: {e}"))
            } else {
                Ok(value)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// The value recorded when a field stays unresolved.
fn default_value(spec: &FieldSpec) -> FieldValue {
    if let Some(default) = &spec.default {
        return match default {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => {
                if spec.kind == ValueKind::TriState {
                    FieldValue::TriState(Some(*b))
                } else {
                    FieldValue::Bool(*b)
                }
            }
            _ => match spec.kind {
                ValueKind::TriState => FieldValue::TriState(None),
                _ => FieldValue::Null,
            },
        };
    }
    match spec.kind {
        ValueKind::Text | ValueKind::Multiline => FieldValue::Text(String::new()),
        ValueKind::Number => FieldValue::Null,
        ValueKind::Boolean => FieldValue::Bool(false),
        ValueKind::TriState => FieldValue::TriState(None),
    }
}

/// Coerce one resolution into its declared type, reporting failures as
/// diagnostics and falling back to the field default.
fn coerce(
    spec: &FieldSpec,
    resolution: Option<Resolution>,
    diagnostics: &mut Vec<FieldDiagnostic>,
) -> (FieldValue, Provenance) {
    let Some(resolution) = resolution else {
        return (default_value(spec), Provenance::default_empty());
    };

    let provenance = Provenance {
        method: resolution.method,
        page: Some(resolution.page),
        source: resolution.source,
        confidence: resolution.confidence,
    };

    let fail = |message: String, diagnostics: &mut Vec<FieldDiagnostic>| {
        diagnostics.push(FieldDiagnostic {
            path: spec.path.clone(),
            severity: Severity::Error,
            message,
        });
        (default_value(spec), Provenance::default_empty())
    };

    match (spec.kind, resolution.value) {
        (ValueKind::Text | ValueKind::Multiline, RawValue::Text(text)) => {
            if spec.format == NumberFormat::Digits {
                let digits: String = text.chars().filter(char::is_ascii_digit).collect();
                if digits.is_empty() {
                    return fail(format!("no digits in {text:?}"), diagnostics);
                }
                return (FieldValue::Text(digits), provenance);
            }
            (FieldValue::Text(text), provenance)
        }
        (ValueKind::Number, RawValue::Text(text)) => {
            match extract_number(&text).and_then(|v| constrain_number(v, spec.format)) {
                Ok(value) => (FieldValue::Number(value), provenance),
                Err(message) => fail(message, diagnostics),
            }
        }
        (ValueKind::Boolean, RawValue::Tri(tri)) => {
            let fallback = matches!(default_value(spec), FieldValue::Bool(true));
            (
                FieldValue::Bool(tri.as_bool().unwrap_or(fallback)),
                provenance,
            )
        }
        (ValueKind::TriState, RawValue::Tri(tri)) => {
            (FieldValue::TriState(tri.as_bool()), provenance)
        }
        (kind, value) => fail(
            format!("cannot coerce {value:?} into a {kind:?} field"),
            diagnostics,
        ),
    }
}

// ---------------------------------------------------------------------------
// Nested record assembly
// ---------------------------------------------------------------------------

/// Insert `value` at the dot-separated `path`, creating intermediate
/// objects on first touch (which fixes their order in the record).
fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            root.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(map) = entry {
                insert_path(map, rest, value);
            }
        }
    }
}

/// Read the subtree at a dot-separated path.
fn get_path<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Build the output record from per-field resolutions.
///
/// Returns the nested record, the provenance-carrying field list, and the
/// collected diagnostics. `full_text` is appended under `extractedText`
/// when the configuration asks for it.
pub fn align(
    config: &ResolverConfig,
    resolutions: Vec<Option<Resolution>>,
    full_text: Option<String>,
) -> (Value, Vec<ResolvedField>, Vec<FieldDiagnostic>) {
    debug_assert_eq!(config.fields.len(), resolutions.len());

    let mut record = Map::new();
    let mut fields = Vec::with_capacity(config.fields.len());
    let mut diagnostics = Vec::new();

    for (spec, resolution) in config.fields.iter().zip(resolutions) {
        let (value, provenance) = coerce(spec, resolution, &mut diagnostics);

        if spec.critical && provenance.method == Method::DefaultEmpty {
            diagnostics.push(FieldDiagnostic {
                path: spec.path.clone(),
                severity: Severity::Warning,
                message: "critical field unresolved after global fallback".to_string(),
            });
        }

        insert_path(&mut record, &spec.path, value.to_json());
        fields.push(ResolvedField {
            path: spec.path.clone(),
            value,
            provenance,
        });
    }

    for mirror in &config.mirrors {
        if let Some(subtree) = get_path(&record, &mirror.from).cloned() {
            insert_path(&mut record, &mirror.to, subtree);
        }
    }

    if let Some(text) = full_text {
        record.insert("extractedText".to_string(), Value::String(text));
    }

    (Value::Object(record), fields, diagnostics)
}
