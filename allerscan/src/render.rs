use colored::Colorize;
use std::ops::Range;

use crate::lines::LineIndex;
use crate::results::MatchSpan;

/// A piece of a line, either plain or highlighted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub highlighted: bool,
}

impl StyledRun {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }

    fn highlighted(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: true,
        }
    }
}

/// Splits a line into plain and highlighted runs.
///
/// `matches` are line-relative, sorted and non-overlapping, as produced by
/// [`LineIndex::spans_on_line`]. Concatenating the run texts gives back `line`;
/// no run is empty, so an empty line renders as no runs at all. Ranges are
/// clamped to the line and widened to the nearest character boundaries.
pub fn render_line(line: &str, matches: &[Range<usize>]) -> Vec<StyledRun> {
    let mut runs = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;
    for m in matches {
        let start = floor_char_boundary(line, m.start).max(cursor);
        let end = ceil_char_boundary(line, m.end).max(start);
        if start > cursor {
            runs.push(StyledRun::plain(&line[cursor..start]));
        }
        if end > start {
            runs.push(StyledRun::highlighted(&line[start..end]));
        }
        cursor = end;
    }
    if cursor < line.len() {
        runs.push(StyledRun::plain(&line[cursor..]));
    }
    runs
}

fn floor_char_boundary(line: &str, index: usize) -> usize {
    let mut index = index.min(line.len());
    while !line.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(line: &str, index: usize) -> usize {
    let mut index = index.min(line.len());
    while !line.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Renders every line of `text` against document-wide spans
pub fn render_document(text: &str, spans: &[MatchSpan]) -> Vec<Vec<StyledRun>> {
    let index = LineIndex::new(text);
    (0..index.len())
        .map(|line| render_line(index.line(line), &index.spans_on_line(line, spans)))
        .collect()
}

/// Turns runs into a terminal string, highlighted runs bright green and bold
pub fn paint(runs: &[StyledRun], use_color: bool) -> String {
    runs.iter()
        .map(|run| {
            if run.highlighted && use_color {
                run.text.bright_green().bold().to_string()
            } else {
                run.text.clone()
            }
        })
        .collect()
}
