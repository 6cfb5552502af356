use std::ops::Range;

use crate::results::MatchSpan;

/// Line decomposition of a document with offset-to-line lookup.
///
/// Lines are split strictly on `\n`. An empty text has one empty line and a
/// trailing break adds one empty trailing line, so joining `lines()` with `\n`
/// gives back the original text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, starts }
    }

    /// Number of lines, always at least one
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Offset of the first character of `line`
    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    /// Offset just past the last character of `line`, i.e. its line break
    pub fn line_end(&self, line: usize) -> usize {
        match self.starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        }
    }

    pub fn line(&self, line: usize) -> &'a str {
        &self.text[self.line_start(line)..self.line_end(line)]
    }

    pub fn lines(&self) -> impl Iterator<Item = &'a str> + '_ {
        (0..self.len()).map(move |i| self.line(i))
    }

    /// Line containing `offset`.
    ///
    /// The offset of a line break belongs to the line it ends. Offsets past the
    /// end of the text resolve to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset) - 1
    }

    /// Line of each span's start, in span order
    pub fn match_lines(&self, spans: &[MatchSpan]) -> Vec<usize> {
        spans.iter().map(|m| self.line_of(m.start)).collect()
    }

    /// Spans touching `line`, re-based to line-relative offsets.
    ///
    /// A span that crosses a line break is clipped to this line's bounds, so
    /// each line it touches highlights only its own part.
    pub fn spans_on_line(&self, line: usize, spans: &[MatchSpan]) -> Vec<Range<usize>> {
        let start = self.line_start(line);
        let end = self.line_end(line);
        let first = spans.partition_point(|m| m.end <= start);
        spans[first..]
            .iter()
            .take_while(|m| m.start < end)
            .map(|m| m.start.max(start) - start..m.end.min(end) - start)
            .filter(|r| !r.is_empty())
            .collect()
    }
}
