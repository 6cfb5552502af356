//! Property-based tests for scanning, line mapping, rendering and navigation.
//!
//! Term and text alphabets are kept small so that overlapping terms, adjacent
//! matches and empty lines come up often.

use allerscan::terms::fold_case;
use allerscan::{compile, render_document, scan, LineIndex, Navigator, TermSet};

use proptest::prelude::*;

/// Number of proptest cases. Override with PROPTEST_CASES env var.
fn num_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(512)
}

fn term_set_strategy() -> impl Strategy<Value = TermSet> {
    prop::collection::vec("[abAB σΣςè]{1,4}", 0..6)
        .prop_map(|raw| raw.into_iter().collect::<TermSet>())
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[abAB σΣςè\n]{0,80}"
}

/// Cursor positions to navigate from, paired with the line of every match
fn navigator_strategy() -> impl Strategy<Value = (Vec<usize>, usize)> {
    prop::collection::vec(0usize..50, 1..20).prop_flat_map(|lines| {
        let len = lines.len();
        (Just(lines), 0..len)
    })
}

fn navigator_at(lines: &[usize], start: usize) -> Navigator {
    let mut nav = Navigator::new(lines.to_vec());
    for _ in 0..start {
        nav.next();
    }
    nav
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(num_cases()))]

    /// Spans come back sorted, disjoint, on character boundaries, and each
    /// covers text that folds to its term.
    #[test]
    fn prop_spans_sorted_and_disjoint(terms in term_set_strategy(), text in text_strategy()) {
        let spans = scan(&compile(&terms), &text);
        for pair in spans.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for span in &spans {
            prop_assert!(span.start < span.end);
            prop_assert!(text.is_char_boundary(span.start));
            prop_assert!(text.is_char_boundary(span.end));
            prop_assert_eq!(fold_case(&text[span.range()]), span.term.folded());
        }
        if terms.is_empty() {
            prop_assert!(spans.is_empty());
        }
    }

    /// Rendered runs reproduce every line and none of them is empty.
    #[test]
    fn prop_render_reproduces_lines(terms in term_set_strategy(), text in text_strategy()) {
        let spans = scan(&compile(&terms), &text);
        let rendered = render_document(&text, &spans);
        let index = LineIndex::new(&text);
        prop_assert_eq!(rendered.len(), index.len());
        for (line, runs) in index.lines().zip(&rendered) {
            let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
            prop_assert_eq!(joined.as_str(), line);
            prop_assert!(runs.iter().all(|r| !r.text.is_empty()));
        }
        let highlighted = rendered.iter().flatten().filter(|r| r.highlighted).count();
        prop_assert!(highlighted >= spans.len());
    }

    /// Joining the lines with `\n` gives back the text, and every line start
    /// maps back to its own line.
    #[test]
    fn prop_lines_reconstruct_text(text in text_strategy()) {
        let index = LineIndex::new(&text);
        let joined = index.lines().collect::<Vec<_>>().join("\n");
        prop_assert_eq!(joined, text.clone());
        prop_assert_eq!(index.len(), text.matches('\n').count() + 1);
        for line in 0..index.len() {
            prop_assert_eq!(index.line_of(index.line_start(line)), line);
            prop_assert_eq!(index.line_of(index.line_end(line)), line);
        }
    }

    /// `next()` once per match comes back to where it started.
    #[test]
    fn prop_next_cycles_to_start((lines, start) in navigator_strategy()) {
        let mut nav = navigator_at(&lines, start);
        prop_assert_eq!(nav.cursor(), Some(start));
        for _ in 0..lines.len() {
            nav.next();
        }
        prop_assert_eq!(nav.cursor(), Some(start));
        prop_assert_eq!(nav.current_line(), Some(lines[start]));
    }

    /// `previous()` undoes `next()` from any cursor.
    #[test]
    fn prop_previous_inverts_next((lines, start) in navigator_strategy()) {
        let mut nav = navigator_at(&lines, start);
        nav.next();
        let line = nav.previous();
        prop_assert_eq!(nav.cursor(), Some(start));
        prop_assert_eq!(line, Some(lines[start]));

        nav.previous();
        let line = nav.next();
        prop_assert_eq!(nav.cursor(), Some(start));
        prop_assert_eq!(line, Some(lines[start]));
    }
}
