use std::ops::Range;

use crate::terms::Term;

/// One located occurrence of a term in a document.
///
/// `start..end` is a half-open byte range on character boundaries, so
/// `&text[span.range()]` is the matched text as it appears in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    /// Start offset of the match
    pub start: usize,
    /// End offset of the match (exclusive)
    pub end: usize,
    /// The term that produced this match
    pub term: Term,
}

impl MatchSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Everything derived from one (term set, document) pair
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Matches in document order
    pub spans: Vec<MatchSpan>,
    /// Line index for each entry of `spans`
    pub match_lines: Vec<usize>,
    /// Number of lines in the document
    pub line_count: usize,
}

impl Analysis {
    pub fn match_count(&self) -> usize {
        self.spans.len()
    }

    /// Number of distinct lines holding at least one match
    pub fn lines_with_matches(&self) -> usize {
        let mut lines = self.match_lines.clone();
        lines.dedup();
        lines.len()
    }
}
