// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The terminal cell grid.
//!
//! A grid is a `width × height` array of cells, each carrying one grapheme
//! cluster, the attributes live at that position, and the cluster's display
//! width. Row invariant: cell widths sum to the row width; a width-2 cell
//! occupies two consecutive columns and the second column holds a
//! [`GridCell::Continuation`] marker that is never independently writable.
//!
//! Grids are immutable once published: the reconciler hands out
//! `Arc<TerminalGrid>` and diffs row-by-row via [`TerminalGrid::changed_lines`].

use crate::{InlineString, RowIndex, Size, TextAttributes, row};

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    /// A grapheme cluster anchored at this column. `width` is 1 or 2.
    Grapheme {
        cluster: InlineString,
        attributes: TextAttributes,
        width: u8,
    },
    /// Second column of a width-2 cluster to the left.
    Continuation,
}

impl GridCell {
    /// A default-attribute blank.
    #[must_use]
    pub fn blank() -> Self {
        GridCell::Grapheme {
            cluster: InlineString::from(" "),
            attributes: TextAttributes::default(),
            width: 1,
        }
    }
}

/// Immutable cell grid. See the module docs for the row invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalGrid {
    size: Size,
    /// Row-major, `size.col_count × size.row_count` cells.
    cells: Vec<GridCell>,
}

impl TerminalGrid {
    /// An all-blank grid.
    #[must_use]
    pub fn new_blank(size: Size) -> Self {
        let cell_count = size.col_count.as_usize() * size.row_count.as_usize();
        Self {
            size,
            cells: vec![GridCell::blank(); cell_count],
        }
    }

    /// Build from pre-laid-out rows. Rows shorter than the grid width are
    /// padded with blanks; longer rows are clipped. Used by frame parsing.
    #[must_use]
    pub(crate) fn from_rows(size: Size, rows: Vec<Vec<GridCell>>) -> Self {
        let width = size.col_count.as_usize();
        let mut cells =
            Vec::with_capacity(width * size.row_count.as_usize());
        for row_index in 0..size.row_count.as_usize() {
            match rows.get(row_index) {
                Some(cols) => {
                    for col_index in 0..width {
                        match cols.get(col_index) {
                            Some(cell) => cells.push(cell.clone()),
                            None => cells.push(GridCell::blank()),
                        }
                    }
                }
                None => cells.extend(std::iter::repeat_with(GridCell::blank).take(width)),
            }
        }
        Self { size, cells }
    }

    #[must_use]
    pub fn size(&self) -> Size { self.size }

    /// Cells of one row.
    #[must_use]
    pub fn row_cells(&self, arg_row: RowIndex) -> &[GridCell] {
        let width = self.size.col_count.as_usize();
        let start = arg_row.as_usize() * width;
        &self.cells[start..start + width]
    }

    /// Row indices where any cell differs by cluster or attributes. A
    /// dimension mismatch returns every row of `self`.
    #[must_use]
    pub fn changed_lines(&self, other: &TerminalGrid) -> Vec<RowIndex> {
        if self.size != other.size {
            return (0..self.size.row_count.as_u16()).map(row).collect();
        }
        (0..self.size.row_count.as_u16())
            .map(row)
            .filter(|index| self.row_cells(*index) != other.row_cells(*index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frame, size};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_grid_row_invariant() {
        let grid = TerminalGrid::new_blank(size(4_u16, 2_u16));
        for row_index in 0..2_u16 {
            let total: u8 = grid
                .row_cells(row(row_index))
                .iter()
                .map(|cell| match cell {
                    GridCell::Grapheme { width, .. } => *width,
                    GridCell::Continuation => 0,
                })
                .sum();
            assert_eq!(total, 4);
        }
    }

    #[test]
    fn test_changed_lines_identical() {
        let frame = Frame::new(vec!["ab".into(), "cd".into()], size(2_u16, 2_u16));
        let lhs = frame.to_grid();
        let rhs = frame.to_grid();
        assert!(lhs.changed_lines(&rhs).is_empty());
    }

    #[test]
    fn test_changed_lines_single_row() {
        let lhs = Frame::new(
            vec!["hello".into(), "world".into(), "!".into()],
            size(20_u16, 3_u16),
        )
        .to_grid();
        let rhs = Frame::new(
            vec!["hello".into(), "World".into(), "!".into()],
            size(20_u16, 3_u16),
        )
        .to_grid();
        assert_eq!(lhs.changed_lines(&rhs), vec![row(1_u16)]);
    }

    #[test]
    fn test_changed_lines_attribute_only_difference() {
        let lhs = Frame::new(vec!["\u{1b}[1mx\u{1b}[0m".into()], size(3_u16, 1_u16))
            .to_grid();
        let rhs = Frame::new(vec!["x".into()], size(3_u16, 1_u16)).to_grid();
        assert_eq!(lhs.changed_lines(&rhs), vec![row(0_u16)]);
    }

    #[test]
    fn test_changed_lines_dimension_mismatch_returns_all() {
        let lhs = TerminalGrid::new_blank(size(2_u16, 3_u16));
        let rhs = TerminalGrid::new_blank(size(2_u16, 2_u16));
        assert_eq!(
            lhs.changed_lines(&rhs),
            vec![row(0_u16), row(1_u16), row(2_u16)]
        );
    }
}
