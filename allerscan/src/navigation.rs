/// Cyclic cursor over the matches of one (term set, document) pair.
///
/// Every movement returns the line to scroll to, or `None` when there is
/// nothing to navigate. Build a new `Navigator` whenever the document or the
/// term set changes; a cursor is only meaningful for the match list it was
/// built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    cursor: Option<usize>,
    match_lines: Vec<usize>,
}

impl Navigator {
    /// Creates a navigator over per-match line indices, cursor on the first match
    pub fn new(match_lines: Vec<usize>) -> Self {
        let mut navigator = Self {
            cursor: None,
            match_lines,
        };
        navigator.reset();
        navigator
    }

    /// Puts the cursor back on the first match, or deactivates it if there are none
    pub fn reset(&mut self) {
        self.cursor = if self.match_lines.is_empty() {
            None
        } else {
            Some(0)
        };
    }

    pub fn first(&mut self) -> Option<usize> {
        self.move_to(|_, _| 0)
    }

    /// Moves to the next match, wrapping from the last to the first
    pub fn next(&mut self) -> Option<usize> {
        self.move_to(|cursor, count| (cursor + 1) % count)
    }

    /// Moves to the previous match, wrapping from the first to the last
    pub fn previous(&mut self) -> Option<usize> {
        self.move_to(|cursor, count| (cursor + count - 1) % count)
    }

    fn move_to(&mut self, step: impl Fn(usize, usize) -> usize) -> Option<usize> {
        let count = self.match_lines.len();
        if count == 0 {
            return None;
        }
        let cursor = step(self.cursor.unwrap_or(0), count);
        self.cursor = Some(cursor);
        Some(self.match_lines[cursor])
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Line of the match under the cursor
    pub fn current_line(&self) -> Option<usize> {
        self.cursor.map(|c| self.match_lines[c])
    }

    pub fn match_lines(&self) -> &[usize] {
        &self.match_lines
    }

    pub fn len(&self) -> usize {
        self.match_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.match_lines.is_empty()
    }
}
