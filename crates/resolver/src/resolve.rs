//! The document-level resolution pass.
//!
//! Pages are independent and processed in parallel: anchor matching and
//! local value search never look across a page boundary and share no
//! mutable state. The global fallback is the single cross-page step and
//! runs after the per-page pass joins.

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::align::{align, FieldDiagnostic, Method, RawValue, Resolution, ResolvedField};
use crate::boilerplate::BoilerplateFilter;
use crate::config::{Direction, FieldSpec, ResolverConfig, Tolerances, ValueKind};
use crate::matcher::{find_anchors_on_page, split_fused_any, MatchedAnchor};
use crate::normalize::strip_label_noise;
use crate::search::boolean::{checkbox_row, resolve_boolean, TriState};
use crate::search::fallback::fallback_search;
use crate::search::{search_below, search_right, Found};
use crate::types::{Token, TokenStore};
use crate::ResolveError;

/// The complete result of resolving one document.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDocument {
    /// The nested output record, shaped exactly like the external schema.
    pub record: serde_json::Value,
    /// Per-field values with provenance, in dictionary order.
    pub fields: Vec<ResolvedField>,
    /// Field-level problems collected along the way.
    pub diagnostics: Vec<FieldDiagnostic>,
}

fn combined_confidence(anchor_score: f64, anchor: &Token, value_confidence: f32) -> f32 {
    anchor_score as f32 * anchor.confidence.min(value_confidence)
}

fn found_to_resolution(
    found: Found,
    method: Method,
    page: usize,
    text: String,
    anchor_score: f64,
    anchor: &Token,
    tokens: &[Token],
) -> Resolution {
    Resolution {
        value: RawValue::Text(text),
        method,
        page,
        source: found
            .token_indices
            .iter()
            .map(|&i| tokens[i].text.clone())
            .collect(),
        confidence: combined_confidence(anchor_score, anchor, found.confidence),
    }
}

/// Resolve one field against the page holding its anchor.
///
/// Boolean-like fields go through the checkbox disambiguator; text-like
/// fields try a fused split of the anchor token first, then directional
/// proximity search. `other_anchors` are token indices of other fields'
/// anchors on this page, which bound multiline blocks.
#[allow(clippy::too_many_arguments)]
pub(crate) fn resolve_with_anchor(
    spec: &FieldSpec,
    tokens: &[Token],
    page: usize,
    anchor_idx: usize,
    anchor_score: f64,
    other_anchors: &[usize],
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Option<Resolution> {
    let anchor = &tokens[anchor_idx];

    if matches!(spec.kind, ValueKind::Boolean | ValueKind::TriState) {
        let tri = resolve_boolean(tokens, anchor_idx, tolerances);
        if tri == TriState::Unknown {
            return None;
        }
        let source = checkbox_row(tokens, anchor_idx, tolerances)
            .into_iter()
            .map(|i| tokens[i].text.clone())
            .collect();
        return Some(Resolution {
            value: RawValue::Tri(tri),
            method: Method::DirectRight,
            page,
            source,
            confidence: combined_confidence(anchor_score, anchor, anchor.confidence),
        });
    }

    // The label and value may have been OCR'd as one string.
    if let Some((_, value)) = split_fused_any(&anchor.text, &spec.variants) {
        let cleaned = strip_label_noise(&value, &spec.variants);
        if !cleaned.is_empty() && !filter.rejects_value(&cleaned) {
            return Some(Resolution {
                value: RawValue::Text(cleaned),
                method: Method::FusedSplit,
                page,
                source: vec![anchor.text.clone()],
                confidence: combined_confidence(anchor_score, anchor, anchor.confidence),
            });
        }
    }

    if matches!(spec.direction, Direction::Right | Direction::Both) {
        if let Some(found) = search_right(tokens, anchor_idx, filter, tolerances) {
            let cleaned = strip_label_noise(&found.text, &spec.variants);
            if !cleaned.is_empty() && !filter.rejects_value(&cleaned) {
                return Some(found_to_resolution(
                    found,
                    Method::DirectRight,
                    page,
                    cleaned,
                    anchor_score,
                    anchor,
                    tokens,
                ));
            }
        }
    }

    if matches!(spec.direction, Direction::Below | Direction::Both) {
        if let Some(found) = search_below(tokens, anchor_idx, other_anchors, filter, tolerances) {
            let cleaned: Vec<String> = found
                .text
                .lines()
                .map(|line| strip_label_noise(line, &spec.variants))
                .filter(|line| !line.is_empty() && !filter.rejects_value(line))
                .collect();
            if !cleaned.is_empty() {
                let text = cleaned.join("\n");
                return Some(found_to_resolution(
                    found,
                    Method::DirectBelow,
                    page,
                    text,
                    anchor_score,
                    anchor,
                    tokens,
                ));
            }
        }
    }

    None
}

/// Resolve every dictionary field against a token store.
///
/// Each field resolves locally on the earliest page where its anchor
/// matched; critical fields that stay unresolved get one widened scan over
/// the whole document. The output record always contains every declared
/// field.
pub fn resolve_document(
    store: &TokenStore,
    config: &ResolverConfig,
) -> Result<ResolvedDocument, ResolveError> {
    config.validate()?;
    let filter = BoilerplateFilter::new(&config.boilerplate, &config.stop_markers);
    let tolerances = &config.tolerances;

    let pages: Vec<(usize, &[Token])> = store.pages().collect();

    // Per-page pass: anchors plus local resolutions, pages in parallel.
    type PageOutcome = (Vec<MatchedAnchor>, Vec<Option<Resolution>>);
    let per_page: Vec<PageOutcome> = pages
        .par_iter()
        .map(|&(page, tokens)| {
            let anchors =
                find_anchors_on_page(tokens, page, &config.fields, &filter, tolerances);
            let resolutions = anchors
                .iter()
                .map(|anchor| {
                    let others: Vec<usize> = anchors
                        .iter()
                        .filter(|other| other.field != anchor.field)
                        .map(|other| other.index)
                        .collect();
                    resolve_with_anchor(
                        &config.fields[anchor.field],
                        tokens,
                        page,
                        anchor.index,
                        anchor.score,
                        &others,
                        &filter,
                        tolerances,
                    )
                })
                .collect();
            (anchors, resolutions)
        })
        .collect();

    // Join: a field's local page is the earliest page its anchor matched.
    let mut resolutions: Vec<Option<Resolution>> = vec![None; config.fields.len()];
    let mut anchored: Vec<bool> = vec![false; config.fields.len()];
    for ((page, _), (anchors, page_resolutions)) in pages.iter().zip(&per_page) {
        debug!("page {page}: {} anchors matched", anchors.len());
        for (anchor, resolution) in anchors.iter().zip(page_resolutions) {
            if !anchored[anchor.field] {
                anchored[anchor.field] = true;
                resolutions[anchor.field] = resolution.clone();
            }
        }
    }

    // Barrier reached: widen the search for unresolved critical fields.
    for (index, spec) in config.fields.iter().enumerate() {
        if !spec.critical || resolutions[index].is_some() {
            continue;
        }
        resolutions[index] =
            fallback_search(spec, &config.fields, store, &filter, tolerances);
        match &resolutions[index] {
            Some(resolution) => {
                debug!(
                    "critical field {} rescued from page {}",
                    spec.path, resolution.page
                )
            }
            None => warn!("critical field {} unresolved after fallback", spec.path),
        }
    }

    let full_text = config.include_full_text.then(|| store.full_text());
    let (record, fields, diagnostics) = align(config, resolutions, full_text);

    Ok(ResolvedDocument {
        record,
        fields,
        diagnostics,
    })
}
