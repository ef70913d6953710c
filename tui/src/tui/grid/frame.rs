// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! A frame: pre-rendered lines with embedded SGR, convertible to a grid.
//!
//! Conversion runs the tokenizer and SGR machine incrementally per row,
//! emitting cells that carry the live attributes at each position. Width-2
//! clusters claim two columns (anchor + continuation). A width-2 cluster
//! whose anchor would land on the last column is refused and replaced with a
//! blank — the wrap/slice layer guarantees this does not occur under normal
//! use, so hitting it means upstream layout was already wrong.

use crate::{
    AnsiToken, GridCell, InlineString, Size, TerminalGrid, TextAttributes,
    apply_sgr_params, cluster_display_width, clusters, tokenize,
};

/// Pre-rendered frame content. `lines` may contain embedded SGR sequences;
/// cursor/erase/OSC sequences inside a line are ignored during grid
/// conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<String>,
    pub size: Size,
}

impl Frame {
    #[must_use]
    pub fn new(lines: Vec<String>, size: Size) -> Self { Self { lines, size } }

    /// Build a frame from styled lines by serializing each with minimal SGR.
    #[must_use]
    pub fn from_styled_lines(lines: &[crate::StyledText], size: Size) -> Self {
        Self {
            lines: lines.iter().map(crate::StyledText::to_ansi).collect(),
            size,
        }
    }

    /// Parse every line into grid cells. Rows missing from `lines` (or
    /// shorter than the width) pad with default blanks; content beyond the
    /// width is clipped.
    #[must_use]
    pub fn to_grid(&self) -> TerminalGrid {
        let width = self.size.col_count.as_usize();
        let rows: Vec<Vec<GridCell>> = self
            .lines
            .iter()
            .map(|line| parse_row(line, width))
            .collect();
        TerminalGrid::from_rows(self.size, rows)
    }
}

fn parse_row(line: &str, width: usize) -> Vec<GridCell> {
    let mut cells: Vec<GridCell> = Vec::with_capacity(width);
    let mut state = TextAttributes::default();

    'tokens: for token in tokenize(line) {
        match token {
            AnsiToken::Sgr(params) => apply_sgr_params(&mut state, &params),
            AnsiToken::Text(text) => {
                for cluster in clusters(&text) {
                    let cluster_width = cluster_display_width(cluster).as_u16();
                    match cluster_width {
                        0 => {
                            // A zero-width cluster (stray ZWJ or variation
                            // selector) owns no cell.
                        }
                        1 => {
                            if cells.len() >= width {
                                break 'tokens;
                            }
                            cells.push(GridCell::Grapheme {
                                cluster: InlineString::from(cluster),
                                attributes: state,
                                width: 1,
                            });
                        }
                        _ => {
                            if cells.len() >= width {
                                break 'tokens;
                            }
                            if cells.len() + 2 > width {
                                // Refuse a wide cluster anchored on the last
                                // column.
                                cells.push(GridCell::blank());
                                break 'tokens;
                            }
                            cells.push(GridCell::Grapheme {
                                cluster: InlineString::from(cluster),
                                attributes: state,
                                width: 2,
                            });
                            cells.push(GridCell::Continuation);
                        }
                    }
                }
            }
            AnsiToken::Cursor { .. }
            | AnsiToken::Erase { .. }
            | AnsiToken::Osc { .. }
            | AnsiToken::Control(_) => {}
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, row, size};
    use pretty_assertions::assert_eq;

    fn grapheme(cell: &GridCell) -> (&str, TextAttributes, u8) {
        match cell {
            GridCell::Grapheme {
                cluster,
                attributes,
                width,
            } => (cluster.as_str(), *attributes, *width),
            GridCell::Continuation => panic!("unexpected continuation"),
        }
    }

    #[test]
    fn test_row_padding_and_clipping() {
        let frame = Frame::new(vec!["ab".into()], size(4_u16, 2_u16));
        let grid = frame.to_grid();
        let top = grid.row_cells(row(0_u16));
        assert_eq!(grapheme(&top[0]).0, "a");
        assert_eq!(grapheme(&top[1]).0, "b");
        assert_eq!(grapheme(&top[2]).0, " ");
        assert_eq!(grapheme(&top[3]).0, " ");
        // Missing second line pads blank.
        assert!(grid.row_cells(row(1_u16)).iter().all(|c| c == &GridCell::blank()));

        let clipped = Frame::new(vec!["abcdef".into()], size(3_u16, 1_u16)).to_grid();
        assert_eq!(grapheme(&clipped.row_cells(row(0_u16))[2]).0, "c");
    }

    #[test]
    fn test_sgr_state_carried_across_cells() {
        let frame = Frame::new(
            vec!["\u{1b}[31mab\u{1b}[0mc".into()],
            size(3_u16, 1_u16),
        );
        let grid = frame.to_grid();
        let cells = grid.row_cells(row(0_u16));
        let red = TextAttributes::default().with_fg(Color::Basic16(1));
        assert_eq!(grapheme(&cells[0]).1, red);
        assert_eq!(grapheme(&cells[1]).1, red);
        assert_eq!(grapheme(&cells[2]).1, TextAttributes::default());
    }

    #[test]
    fn test_wide_cluster_occupies_two_columns() {
        let frame = Frame::new(vec!["世x".into()], size(4_u16, 1_u16));
        let grid = frame.to_grid();
        let cells = grid.row_cells(row(0_u16));
        assert_eq!(grapheme(&cells[0]), ("世", TextAttributes::default(), 2));
        assert_eq!(cells[1], GridCell::Continuation);
        assert_eq!(grapheme(&cells[2]).0, "x");
    }

    #[test]
    fn test_wide_cluster_refused_at_last_column() {
        let frame = Frame::new(vec!["ab世".into()], size(3_u16, 1_u16));
        let grid = frame.to_grid();
        let cells = grid.row_cells(row(0_u16));
        assert_eq!(grapheme(&cells[2]).0, " ");
    }
}
