//! PlaceholderScanner - finds `{{ ... }}` spans in a template

use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Non-greedy so `{{ A }}{{ B }}` yields two placeholders, not one
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([^}]+?)\s*\}\}";

/// Extracts distinct placeholder expressions from template text
///
/// The regex is compiled once per scanner; the processor keeps one around for
/// its whole lifetime.
#[derive(Debug, Clone)]
pub struct PlaceholderScanner {
    regex: Regex,
}

impl PlaceholderScanner {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"),
        }
    }

    /// Distinct trimmed placeholders, in order of first appearance.
    /// A whitespace-only span such as `{{   }}` yields the empty placeholder;
    /// `{{}}` does not match at all.
    pub fn scan(&self, template: &str) -> Vec<String> {
        debug!(len = template.len(), "PlaceholderScanner::scan: called");
        let mut seen = HashSet::new();
        let placeholders: Vec<String> = self
            .regex
            .captures_iter(template)
            .map(|caps| caps[1].trim().to_string())
            .filter(|p| seen.insert(p.clone()))
            .collect();
        debug!(count = placeholders.len(), "PlaceholderScanner::scan: returning");
        placeholders
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl Default for PlaceholderScanner {
    fn default() -> Self {
        Self::new()
    }
}
