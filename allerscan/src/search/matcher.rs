use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::metrics::ScanMetrics;
use crate::results::MatchSpan;
use crate::terms::{fold_char, Term, TermSet};

const REGEX_SIZE_LIMIT: usize = 32 * 1024 * 1024;
const MAX_CACHED_MATCHERS: usize = 128;

static MATCHER_CACHE: Lazy<DashMap<Vec<String>, Arc<Regex>>> = Lazy::new(DashMap::new);

/// Strategy for matching a term set
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Nothing to match
    NoTerms,
    /// One case-insensitive alternation, one capture group per term
    Alternation(Arc<Regex>),
    /// Try every term at every character position
    Sequential,
}

/// Case-insensitive literal matcher over a set of terms.
///
/// Terms are kept longest first. Both strategies try them in that order at each
/// position and take the first that matches, so the longest term wins when
/// several start at the same offset.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    terms: Vec<Term>,
    strategy: MatchStrategy,
    metrics: ScanMetrics,
}

impl TermMatcher {
    /// Compiles a matcher for the given terms
    pub fn new(terms: &TermSet) -> Self {
        Self::with_metrics(terms, ScanMetrics::new())
    }

    /// Compiles a matcher, recording cache activity in `metrics`
    pub fn with_metrics(terms: &TermSet, metrics: ScanMetrics) -> Self {
        let terms = Self::ordered_terms(terms);
        if terms.is_empty() {
            debug!("No terms to compile");
            return Self {
                terms,
                strategy: MatchStrategy::NoTerms,
                metrics,
            };
        }

        let key: Vec<String> = terms.iter().map(|t| t.as_str().to_string()).collect();
        let strategy = if let Some(entry) = MATCHER_CACHE.get(&key) {
            metrics.record_cache_operation(true);
            MatchStrategy::Alternation(entry.clone())
        } else {
            match Self::build_alternation(&terms) {
                Ok(regex) => {
                    let regex = Arc::new(regex);
                    metrics.record_cache_operation(false);
                    insert_bounded(&MATCHER_CACHE, key, regex.clone(), MAX_CACHED_MATCHERS);
                    MatchStrategy::Alternation(regex)
                }
                Err(e) => {
                    warn!(
                        "Falling back to sequential matching for {} terms: {}",
                        terms.len(),
                        e
                    );
                    metrics.record_fallback();
                    MatchStrategy::Sequential
                }
            }
        };

        Self {
            terms,
            strategy,
            metrics,
        }
    }

    /// Builds the alternation without going through the shared cache
    #[cfg(test)]
    pub(crate) fn uncached(terms: &TermSet) -> Self {
        let terms = Self::ordered_terms(terms);
        let strategy = match Self::build_alternation(&terms) {
            Ok(regex) if !terms.is_empty() => MatchStrategy::Alternation(Arc::new(regex)),
            Ok(_) => MatchStrategy::NoTerms,
            Err(_) => MatchStrategy::Sequential,
        };
        Self {
            terms,
            strategy,
            metrics: ScanMetrics::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn sequential(terms: &TermSet) -> Self {
        Self {
            terms: Self::ordered_terms(terms),
            strategy: MatchStrategy::Sequential,
            metrics: ScanMetrics::new(),
        }
    }

    /// Drops case-insensitive duplicates and sorts by descending length
    fn ordered_terms(terms: &TermSet) -> Vec<Term> {
        let mut seen = HashSet::new();
        let mut ordered: Vec<Term> = terms
            .iter()
            .filter(|t| seen.insert(t.folded().to_string()))
            .cloned()
            .collect();
        // Stable sort keeps display order among equal lengths.
        ordered.sort_by(|a, b| b.char_len().cmp(&a.char_len()));
        ordered
    }

    fn build_alternation(terms: &[Term]) -> Result<Regex, regex::Error> {
        let pattern = terms
            .iter()
            .map(|t| format!("({})", regex::escape(t.as_str())))
            .collect::<Vec<_>>()
            .join("|");
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
    }

    /// Gets the metrics this matcher reports to
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    /// Terms in the order they are tried
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Finds all matches in the given text, in order and without overlap
    pub fn find_matches(&self, text: &str) -> Vec<MatchSpan> {
        match &self.strategy {
            MatchStrategy::NoTerms => Vec::new(),
            MatchStrategy::Alternation(regex) => regex
                .captures_iter(text)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let index = (1..caps.len()).find(|&i| caps.get(i).is_some())? - 1;
                    Some(MatchSpan {
                        start: whole.start(),
                        end: whole.end(),
                        term: self.terms[index].clone(),
                    })
                })
                .collect(),
            MatchStrategy::Sequential => self.find_sequential(text),
        }
    }

    fn find_sequential(&self, text: &str) -> Vec<MatchSpan> {
        let mut matches = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let hit = self
                .terms
                .iter()
                .find_map(|term| folded_prefix_len(rest, term.folded()).map(|len| (len, term)));
            match hit {
                Some((len, term)) => {
                    matches.push(MatchSpan {
                        start: pos,
                        end: pos + len,
                        term: term.clone(),
                    });
                    pos += len;
                }
                None => {
                    pos += rest.chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        matches
    }
}

/// Inserts a compiled matcher, emptying the cache first once it holds `capacity`
/// entries. Edited term sets are rarely compiled again, so old entries go stale.
fn insert_bounded(
    cache: &DashMap<Vec<String>, Arc<Regex>>,
    key: Vec<String>,
    regex: Arc<Regex>,
    capacity: usize,
) {
    if cache.len() >= capacity && !cache.contains_key(&key) {
        debug!("Matcher cache full ({} entries), clearing", cache.len());
        cache.clear();
    }
    cache.insert(key, regex);
}

/// Byte length of the prefix of `haystack` that case-folds to `folded`
fn folded_prefix_len(haystack: &str, folded: &str) -> Option<usize> {
    let mut needle = folded.chars().peekable();
    for (idx, c) in haystack.char_indices() {
        if needle.next() != Some(fold_char(c)) {
            return None;
        }
        if needle.peek().is_none() {
            return Some(idx + c.len_utf8());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(raw: &[&str]) -> TermSet {
        raw.iter().collect()
    }

    fn matched<'t>(text: &'t str, spans: &[MatchSpan]) -> Vec<&'t str> {
        spans.iter().map(|m| &text[m.range()]).collect()
    }

    #[test]
    fn test_longest_term_wins() {
        let matcher = TermMatcher::new(&terms(&["barley", "barley flour"]));
        let text = "Contains barley flour.";
        let spans = matcher.find_matches(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(matched(text, &spans), vec!["barley flour"]);
        assert_eq!(spans[0].term.as_str(), "barley flour");
    }

    #[test]
    fn test_case_insensitive_matching() {
        let matcher = TermMatcher::new(&terms(&["Beer"]));
        let text = "contains beer and BEER.";
        let spans = matcher.find_matches(text);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (9, 13));
        assert_eq!((spans[1].start, spans[1].end), (18, 22));
        assert!(spans.iter().all(|m| m.term.as_str() == "Beer"));
    }

    #[test]
    fn test_terms_are_literal() {
        let matcher = TermMatcher::new(&terms(&["e.g. (milk)", "a+b"]));
        let text = "egg milk; e.g. (MILK) and a+b, not aab";
        assert_eq!(
            matched(text, &matcher.find_matches(text)),
            vec!["e.g. (MILK)", "a+b"]
        );
    }

    #[test]
    fn test_no_terms() {
        let matcher = TermMatcher::new(&TermSet::new());
        assert!(matches!(matcher.strategy(), MatchStrategy::NoTerms));
        assert!(!matcher.has_terms());
        assert!(matcher.find_matches("anything at all").is_empty());
    }

    #[test]
    fn test_case_duplicates_collapse() {
        let matcher = TermMatcher::new(&terms(&["Soy", "soy", "SOY"]));
        assert_eq!(matcher.terms().len(), 1);
        assert_eq!(matcher.terms()[0].as_str(), "SOY");
    }

    #[test]
    fn test_terms_ordered_longest_first() {
        let matcher = TermMatcher::new(&terms(&["malt", "barley malt", "egg"]));
        let order: Vec<&str> = matcher.terms().iter().map(Term::as_str).collect();
        assert_eq!(order, vec!["barley malt", "malt", "egg"]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let matcher = TermMatcher::new(&terms(&["nut", "nutmeg", "meg"]));
        let text = "nutmeg, peanut, megnut";
        let spans = matcher.find_matches(text);
        assert_eq!(matched(text, &spans), vec!["nutmeg", "nut", "meg", "nut"]);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_sequential_agrees_with_alternation() {
        let set = terms(&["barley", "barley flour", "malt", "Beer", "wheat"]);
        let alternation = TermMatcher::new(&set);
        let sequential = TermMatcher::sequential(&set);
        let text = "Line1: MALT\nLine2: barley flour, barley malt beer\nWheat-free? no.";
        assert_eq!(alternation.find_matches(text), sequential.find_matches(text));
    }

    #[test]
    fn test_sequential_agrees_on_case_fold_variants() {
        let cases = [
            (&["ας"][..], "ΑΣ ας"),
            (&["os"][..], "oſ OS"),
            (&["ΟΔΟΣ"][..], "οδος, Οδός, ΟΔΟΣ"),
            (&["crème", "noix"][..], "Crème brûlée\nNOIX de cajou, CRÈME"),
            (&["kelp"][..], "\u{212A}elp KELP"),
            (&["straße"][..], "STRAẞE strasse"),
        ];
        for (raw, text) in cases {
            let set = terms(raw);
            let alternation = TermMatcher::new(&set);
            let sequential = TermMatcher::sequential(&set);
            assert_eq!(
                alternation.find_matches(text),
                sequential.find_matches(text),
                "strategies disagree for {:?} in {:?}",
                raw,
                text
            );
        }
        let greek = TermMatcher::sequential(&terms(&["ας"]));
        assert_eq!(greek.find_matches("ΑΣ ας").len(), 2);
        let long_s = TermMatcher::sequential(&terms(&["os"]));
        assert_eq!(long_s.find_matches("oſ").len(), 1);
    }

    #[test]
    fn test_sequential_handles_multibyte_text() {
        let matcher = TermMatcher::sequential(&terms(&["crème"]));
        let text = "Crème fraîche, CRÈME";
        let spans = matcher.find_matches(text);
        assert_eq!(matched(text, &spans), vec!["Crème", "CRÈME"]);
    }

    #[test]
    fn test_matcher_caching() {
        // Unique term so other tests cannot warm the cache first
        let unique = format!(
            "term_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        let metrics = ScanMetrics::new();

        let _first = TermMatcher::with_metrics(&terms(&[unique.as_str()]), metrics.clone());
        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.cache_misses(), 1);

        let _second = TermMatcher::with_metrics(&terms(&[unique.as_str()]), metrics.clone());
        assert_eq!(metrics.cache_hits(), 1);
        assert_eq!(metrics.cache_misses(), 1);

        let different = format!("{}_different", unique);
        let _third = TermMatcher::with_metrics(&terms(&[different.as_str()]), metrics.clone());
        assert_eq!(metrics.cache_hits(), 1);
        assert_eq!(metrics.cache_misses(), 2);
    }

    proptest::proptest! {
        #[test]
        fn prop_sequential_agrees_with_alternation(
            raw in proptest::collection::vec("[aAsSſσςΣkK\u{212A}ßẞè]{1,4}", 1..5),
            text in "[aAsSſσςΣkK\u{212A}ßẞèÈ \n]{0,40}",
        ) {
            let set: TermSet = raw.iter().collect();
            let alternation = TermMatcher::uncached(&set);
            proptest::prop_assert!(matches!(alternation.strategy(), MatchStrategy::Alternation(_)));
            let sequential = TermMatcher::sequential(&set);
            proptest::prop_assert_eq!(
                alternation.find_matches(&text),
                sequential.find_matches(&text)
            );
        }
    }

    #[test]
    fn test_cache_is_bounded() {
        let cache = DashMap::new();
        let regex = Arc::new(Regex::new("milk").unwrap());
        for i in 0..3 {
            insert_bounded(&cache, vec![format!("term{}", i)], regex.clone(), 3);
        }
        assert_eq!(cache.len(), 3);

        // Re-inserting a cached key never evicts
        insert_bounded(&cache, vec!["term0".to_string()], regex.clone(), 3);
        assert_eq!(cache.len(), 3);

        insert_bounded(&cache, vec!["term3".to_string()], regex.clone(), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&vec!["term3".to_string()]));
    }

    #[test]
    fn test_folded_prefix_len() {
        assert_eq!(folded_prefix_len("MALT extract", "malt"), Some(4));
        assert_eq!(folded_prefix_len("MAL", "malt"), None);
        assert_eq!(folded_prefix_len("Éclair", "é"), Some(2));
        assert_eq!(folded_prefix_len("salt", "malt"), None);
    }
}
