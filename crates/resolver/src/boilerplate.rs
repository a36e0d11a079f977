//! Exclusion of fixed legal/disclaimer text and section headings.
//!
//! Applied twice: before anchor matching (boilerplate masquerading as a
//! label) and on every value candidate (boilerplate masquerading as data).

use crate::config::BoilerplateSet;
use crate::normalize::normalize;

/// Compiled, normalized view of the configured exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct BoilerplateFilter {
    exact: Vec<String>,
    prefixes: Vec<String>,
    stop_markers: Vec<String>,
}

impl BoilerplateFilter {
    pub fn new(set: &BoilerplateSet, stop_markers: &[String]) -> Self {
        BoilerplateFilter {
            exact: set.exact.iter().map(|s| normalize(s)).collect(),
            prefixes: set.prefixes.iter().map(|s| normalize(s)).collect(),
            stop_markers: stop_markers.iter().map(|s| normalize(s)).collect(),
        }
    }

    /// True when `text` matches a configured pattern exactly or by prefix.
    pub fn is_boilerplate(&self, text: &str) -> bool {
        let norm = normalize(text);
        if norm.is_empty() {
            return false;
        }
        self.exact.iter().any(|p| *p == norm)
            || self.prefixes.iter().any(|p| norm.starts_with(p.as_str()))
    }

    /// True when `text` is one of the configured section headings.
    pub fn is_stop_marker(&self, text: &str) -> bool {
        let norm = normalize(text);
        self.stop_markers.iter().any(|m| *m == norm)
    }

    /// Candidate values are rejected on either ground.
    pub fn rejects_value(&self, text: &str) -> bool {
        self.is_boilerplate(text) || self.is_stop_marker(text)
    }
}
