//! Cross-page rescue for critical fields.
//!
//! Runs only after every per-page local resolution has completed, and at
//! most once per unresolved critical field per document.

use crate::align::{Method, Resolution};
use crate::boilerplate::BoilerplateFilter;
use crate::config::{FieldSpec, Tolerances};
use crate::matcher::{best_anchor, find_anchors_on_page};
use crate::resolve::resolve_with_anchor;
use crate::types::TokenStore;

/// Re-run anchor matching and proximity search across every page in
/// document order; the first successful resolution wins.
pub fn fallback_search(
    spec: &FieldSpec,
    fields: &[FieldSpec],
    store: &TokenStore,
    filter: &BoilerplateFilter,
    tolerances: &Tolerances,
) -> Option<Resolution> {
    for (page, tokens) in store.pages() {
        let Some((index, score)) = best_anchor(tokens, spec, filter, tolerances) else {
            continue;
        };

        // Other fields' anchors on this page still bound multiline blocks.
        let others: Vec<usize> = find_anchors_on_page(tokens, page, fields, filter, tolerances)
            .into_iter()
            .filter(|a| a.index != index)
            .map(|a| a.index)
            .collect();

        if let Some(mut resolution) =
            resolve_with_anchor(spec, tokens, page, index, score, &others, filter, tolerances)
        {
            resolution.method = Method::GlobalFallback;
            return Some(resolution);
        }
    }
    None
}
