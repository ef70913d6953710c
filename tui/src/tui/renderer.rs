// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Line-diff renderer: turns a grid (and optionally the previous grid) into
//! a minimal ANSI byte stream.
//!
//! Two live strategies:
//! - **Full redraw** — hide cursor, clear screen, home, repaint every row,
//!   show cursor. Enters the alternate screen on the first paint when
//!   configured.
//! - **Delta** — for each changed row: position the cursor at column 1 of
//!   that row, erase the line, repaint the row with minimal SGR transitions.
//!
//! `ScrollOptimized` is declared but falls back to delta; detecting vertical
//! shifts and emitting scroll-region commands is not required here.
//!
//! SGR stream invariant: the final byte of a frame leaves the live state at
//! default — a single `[0]` closes the frame when the last painted cell was
//! styled, and never more than one consecutively.

use std::fmt::Write as _;
use std::time::Duration;

use strum_macros::Display;

use crate::{
    GridCell, RowIndex, Size, TerminalGrid, TextAttributes, minimal_sgr_transition,
};

pub const CSI: &str = "\u{1b}[";
pub const HIDE_CURSOR: &str = "\u{1b}[?25l";
pub const SHOW_CURSOR: &str = "\u{1b}[?25h";
pub const CLEAR_SCREEN: &str = "\u{1b}[2J";
pub const CURSOR_HOME: &str = "\u{1b}[H";
pub const ERASE_LINE: &str = "\u{1b}[2K";
pub const SGR_RESET_SEQ: &str = "\u{1b}[0m";
pub const ENTER_ALT_SCREEN: &str = "\u{1b}[?1049h";
pub const LEAVE_ALT_SCREEN: &str = "\u{1b}[?1049l";
pub const ENABLE_BRACKETED_PASTE: &str = "\u{1b}[?2004h";
pub const DISABLE_BRACKETED_PASTE: &str = "\u{1b}[?2004l";

/// `ESC [ row ; col H`, converting from 0-based grid coordinates to the
/// 1-based wire format.
#[must_use]
pub fn cursor_to(arg_row: RowIndex, arg_col_1_based: u16) -> String {
    format!("{CSI}{};{}H", arg_row.as_u16() + 1, arg_col_1_based)
}

/// How a frame is transformed into bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum RenderStrategy {
    FullRedraw,
    Delta,
    /// Reserved; currently renders as [`RenderStrategy::Delta`].
    ScrollOptimized,
}

/// Per-frame rendering statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStats {
    pub bytes_written: usize,
    pub changed_lines: usize,
    pub total_lines: usize,
    pub strategy: RenderStrategy,
    pub duration: Duration,
}

/// Estimated cost of a full repaint, in bytes. A contract, not an exact
/// count: `width × height × 2 + 50`.
#[must_use]
pub fn estimate_full_bytes(size: Size) -> usize {
    size.col_count.as_usize() * size.row_count.as_usize() * 2 + 50
}

/// Estimated cost of a delta repaint: `Σ changed (width × 2 + 12)`.
#[must_use]
pub fn estimate_delta_bytes(changed_lines: usize, size: Size) -> usize {
    changed_lines * (size.col_count.as_usize() * 2 + 12)
}

/// Stateful byte producer. Owns the alternate-screen flag so teardown knows
/// whether to leave it.
#[derive(Debug)]
pub struct Renderer {
    use_alternate_screen: bool,
    alt_screen_active: bool,
}

impl Renderer {
    #[must_use]
    pub fn new(use_alternate_screen: bool) -> Self {
        Self {
            use_alternate_screen,
            alt_screen_active: false,
        }
    }

    /// Render `next` with the given strategy. Returns the ANSI bytes and the
    /// number of rows that were (re)painted.
    #[must_use]
    pub fn render(
        &mut self,
        next: &TerminalGrid,
        prev: Option<&TerminalGrid>,
        strategy: RenderStrategy,
    ) -> (String, usize) {
        match strategy {
            RenderStrategy::FullRedraw => self.render_full(next, prev.is_none()),
            RenderStrategy::Delta | RenderStrategy::ScrollOptimized => match prev {
                Some(prev) => Self::render_delta(prev, next),
                None => self.render_full(next, true),
            },
        }
    }

    fn render_full(&mut self, grid: &TerminalGrid, first_paint: bool) -> (String, usize) {
        let mut acc = String::new();
        if self.use_alternate_screen && first_paint && !self.alt_screen_active {
            acc.push_str(ENTER_ALT_SCREEN);
            self.alt_screen_active = true;
        }
        acc.push_str(HIDE_CURSOR);
        acc.push_str(CLEAR_SCREEN);
        acc.push_str(CURSOR_HOME);

        let mut state = TextAttributes::default();
        let row_count = grid.size().row_count.as_u16();
        for row_index in 0..row_count {
            if row_index > 0 {
                acc.push_str("\r\n");
            }
            emit_row(&mut acc, grid, RowIndex(row_index), &mut state);
        }
        if !state.is_default() {
            acc.push_str(SGR_RESET_SEQ);
        }
        acc.push_str(SHOW_CURSOR);
        (acc, grid.size().row_count.as_usize())
    }

    fn render_delta(prev: &TerminalGrid, next: &TerminalGrid) -> (String, usize) {
        let changed = next.changed_lines(prev);
        let mut acc = String::new();
        if changed.is_empty() {
            return (acc, 0);
        }

        acc.push_str(HIDE_CURSOR);
        let mut state = TextAttributes::default();
        for row_index in &changed {
            acc.push_str(&cursor_to(*row_index, 1));
            acc.push_str(ERASE_LINE);
            if !state.is_default() {
                acc.push_str(SGR_RESET_SEQ);
                state = TextAttributes::default();
            }
            emit_row(&mut acc, next, *row_index, &mut state);
        }
        if !state.is_default() {
            acc.push_str(SGR_RESET_SEQ);
        }
        acc.push_str(SHOW_CURSOR);
        (acc, changed.len())
    }

    /// Sequences restoring the terminal: leave the alternate screen if it
    /// was entered, and always re-show the cursor.
    #[must_use]
    pub fn teardown(&mut self) -> String {
        let mut acc = String::new();
        if self.alt_screen_active {
            acc.push_str(LEAVE_ALT_SCREEN);
            self.alt_screen_active = false;
        }
        acc.push_str(SHOW_CURSOR);
        acc
    }
}

/// Paint one row's cells, threading the live SGR state through minimal
/// transitions. Trailing default-attribute blanks are skipped; the row was
/// either cleared (delta) or the screen was (full), so they are already
/// blank on screen.
fn emit_row(
    acc: &mut String,
    grid: &TerminalGrid,
    arg_row: RowIndex,
    state: &mut TextAttributes,
) {
    let cells = grid.row_cells(arg_row);

    let last_meaningful = cells
        .iter()
        .rposition(|cell| match cell {
            GridCell::Grapheme {
                cluster,
                attributes,
                ..
            } => cluster.as_str() != " " || !attributes.is_default(),
            GridCell::Continuation => false,
        })
        .map_or(0, |index| index + 1);

    for cell in &cells[..last_meaningful] {
        if let GridCell::Grapheme {
            cluster,
            attributes,
            ..
        } = cell
        {
            let transition = minimal_sgr_transition(state, attributes);
            if !transition.is_empty() {
                let _unused = write!(acc, "{}", crate::AnsiToken::Sgr(transition));
                *state = *attributes;
            }
            acc.push_str(cluster.as_str());
        }
    }
}
