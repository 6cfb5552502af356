use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};

use crate::errors::{ScanError, ScanResult};
use crate::render::{paint, StyledRun};
use crate::session::ScanSession;

/// Actions available while stepping through matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Next,
    Previous,
    First,
    Quit,
    Unknown,
}

/// Statistics for one viewing session
#[derive(Debug, Default)]
pub struct ViewerStats {
    pub matches_visited: usize,
    pub total_matches: usize,
}

/// Options for the viewer
#[derive(Debug, Clone, Copy)]
pub struct ViewerOptions {
    pub context_lines: usize,
    pub use_color: bool,
}

/// Runs the full-screen match viewer over the session's current document
pub fn run_viewer(session: &mut ScanSession, options: ViewerOptions) -> ScanResult<ViewerStats> {
    let rendered = session.render();
    let mut stats = ViewerStats {
        total_matches: session.analysis().match_count(),
        ..ViewerStats::default()
    };

    if stats.total_matches == 0 {
        println!("No matches found.");
        return Ok(stats);
    }

    println!(
        "Found {} matches on {} lines.",
        stats.total_matches,
        session.analysis().lines_with_matches()
    );
    let mut visited = vec![false; stats.total_matches];

    // Test mode: walk every match once without a terminal
    if std::env::var("INTERACTIVE_TEST").is_ok() {
        session.first();
        for _ in 0..stats.total_matches {
            show_match(session, &rendered, &mut stats, &mut visited, options);
            session.next();
        }
        session.first();
        return Ok(stats);
    }

    flush_pending_input()?;
    enable_raw_mode().map_err(|e| ScanError::terminal_error(e.to_string()))?;
    session.first();

    let outcome = (|| -> ScanResult<()> {
        loop {
            show_match(session, &rendered, &mut stats, &mut visited, options);
            match read_key_input()? {
                PromptAction::Next => {
                    session.next();
                }
                PromptAction::Previous => {
                    session.previous();
                }
                PromptAction::First => {
                    session.first();
                }
                PromptAction::Quit => return Ok(()),
                PromptAction::Unknown => {}
            }
        }
    })();

    disable_raw_mode().map_err(|e| ScanError::terminal_error(e.to_string()))?;
    outcome?;
    print_summary(&stats);
    Ok(stats)
}

/// Show the match under the cursor and mark it visited
fn show_match(
    session: &ScanSession,
    rendered: &[Vec<StyledRun>],
    stats: &mut ViewerStats,
    visited: &mut [bool],
    options: ViewerOptions,
) {
    let navigator = session.navigator();
    let (Some(index), Some(line)) = (navigator.cursor(), navigator.current_line()) else {
        return;
    };

    if !visited[index] {
        visited[index] = true;
        stats.matches_visited += 1;
    }

    print!("{}", Clear(ClearType::All));
    print!("\x1B[H");

    let term = &session.analysis().spans[index].term;
    let header = format!(
        "allerscan :: Match {} of {} ({} on line {})",
        index + 1,
        navigator.len(),
        term,
        line + 1
    );
    println!(
        "{}",
        if options.use_color {
            header.bright_blue().bold()
        } else {
            header.normal()
        }
    );
    println!("{}", "-".repeat(40));

    let start = line.saturating_sub(options.context_lines);
    let end = (line + options.context_lines + 1).min(rendered.len());
    for (offset, runs) in rendered[start..end].iter().enumerate() {
        let number = start + offset;
        let marker = if number == line { "->" } else { "  " };
        print!("{} {:>3} | {}\r\n", marker, number + 1, paint(runs, options.use_color));
    }

    print!("\r\n");
    let nav_help = "[n]ext [p]rev [g] first [q]uit  (wrap-around enabled)";
    print!(
        "{}\r\n",
        if options.use_color {
            nav_help.bright_black()
        } else {
            nav_help.normal()
        }
    );
    io::stdout().flush().ok();
}

/// Flush pending keyboard events so a stray keypress does not skip a match
fn flush_pending_input() -> ScanResult<()> {
    while event::poll(Duration::from_millis(10)).unwrap_or(false) {
        let _ = event::read();
    }
    Ok(())
}

/// Read exactly one key event and discard any queued extras
fn read_key_input() -> ScanResult<PromptAction> {
    let evt = event::read()
        .map_err(|e| ScanError::terminal_error(format!("Failed to read event: {}", e)))?;

    let action = match evt {
        Event::Key(key) => convert_key_event(&key),
        _ => PromptAction::Unknown,
    };

    discard_extra_events()?;
    Ok(action)
}

fn discard_extra_events() -> ScanResult<()> {
    let t0 = std::time::Instant::now();
    let max_duration = Duration::from_millis(30);

    while t0.elapsed() < max_duration {
        if event::poll(Duration::from_millis(1))
            .map_err(|e| ScanError::terminal_error(format!("Failed to poll events: {}", e)))?
        {
            let _ = event::read();
        } else {
            break;
        }
    }
    Ok(())
}

/// Convert a key event to a PromptAction
fn convert_key_event(event: &KeyEvent) -> PromptAction {
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => PromptAction::Quit,
        KeyCode::Enter | KeyCode::Down | KeyCode::Right => PromptAction::Next,
        KeyCode::Up | KeyCode::Left => PromptAction::Previous,
        KeyCode::Home => PromptAction::First,
        KeyCode::Char('n') | KeyCode::Char('N') => PromptAction::Next,
        KeyCode::Char('p') | KeyCode::Char('P') => PromptAction::Previous,
        KeyCode::Char('g') | KeyCode::Char('G') => PromptAction::First,
        KeyCode::Char('q') | KeyCode::Char('Q') => PromptAction::Quit,
        KeyCode::Esc => PromptAction::Quit,
        _ => PromptAction::Unknown,
    }
}

fn print_summary(stats: &ViewerStats) {
    println!("\nSummary:");
    println!("  Total matches: {}", stats.total_matches);
    println!("  Matches visited: {}", stats.matches_visited);
}
