use tracing::{debug, info};

use super::matcher::TermMatcher;
use crate::results::MatchSpan;
use crate::terms::TermSet;

/// Builds a matcher for the current term set
pub fn compile(terms: &TermSet) -> TermMatcher {
    debug!("Compiling matcher for {} terms", terms.len());
    TermMatcher::new(terms)
}

/// Scans text left to right, returning non-overlapping matches in order
pub fn scan(matcher: &TermMatcher, text: &str) -> Vec<MatchSpan> {
    if !matcher.has_terms() {
        debug!("No terms to scan for, returning empty result");
        return Vec::new();
    }

    info!(
        "Scanning {} bytes for {} terms",
        text.len(),
        matcher.terms().len()
    );
    let spans = matcher.find_matches(text);
    matcher.metrics().record_scan(text.len(), spans.len());

    info!("Scan complete. Found {} matches", spans.len());
    spans
}
