// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The component capability and the external layout seam.
//!
//! Components are a capability set, not a hierarchy: render into a rect,
//! producing styled lines. Concrete component libraries (Text, Box, …) live
//! outside this crate; the runtime only needs the trait. Nested components
//! render through [`crate::Hooks::render_child`], which is what threads
//! identity paths through the tree.
//!
//! The flexbox solver is likewise an external collaborator: the runtime
//! talks to it through [`LayoutEngine`]. Two engines ship here — the
//! [`FullViewport`] default (root owns the whole viewport, children overlay
//! it) and the [`VerticalStack`] engine (children split the rows
//! top-to-bottom), which is what containers hand to
//! [`LayoutEngine::split`] when they lay out a column of children.

use crate::{RowIndex, Size, StyledText, row, size};

use super::hooks::Hooks;

/// A renderable view. `type_name` and `identity` feed the identity path;
/// `render` produces at most `bounds.row_count` styled lines (extra lines
/// are clipped by the frame).
pub trait Component: Send {
    fn type_name(&self) -> &str;

    /// Optional explicit identity, distinguishing siblings of the same type.
    fn identity(&self) -> Option<String> { None }

    fn render(&mut self, bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText>;
}

/// A rect in viewport coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayoutRect {
    pub origin: RowIndex,
    pub size: Size,
}

/// External layout-solver boundary (a flexbox engine in a full stack).
pub trait LayoutEngine: Send {
    /// The rect the root component renders into.
    fn solve(&mut self, viewport: Size) -> LayoutRect;

    /// Allocate rects for children requesting `heights` rows inside
    /// `bounds`.
    fn split(&mut self, heights: &[u16], bounds: Size) -> Vec<LayoutRect>;
}

/// Default engine: the root owns the whole viewport and every child overlays
/// the full bounds (containers position their own content).
#[derive(Debug, Default)]
pub struct FullViewport;

impl LayoutEngine for FullViewport {
    fn solve(&mut self, viewport: Size) -> LayoutRect {
        LayoutRect {
            origin: row(0_u16),
            size: viewport,
        }
    }

    fn split(&mut self, heights: &[u16], bounds: Size) -> Vec<LayoutRect> {
        heights
            .iter()
            .map(|_| LayoutRect {
                origin: row(0_u16),
                size: bounds,
            })
            .collect()
    }
}

/// Stacking engine: children are laid out top-to-bottom at full width, each
/// getting its requested height clipped to the rows still available. Children
/// past the bottom edge get zero-height rects rather than being dropped, so
/// the output always has one rect per child.
#[derive(Debug, Default)]
pub struct VerticalStack;

impl LayoutEngine for VerticalStack {
    fn solve(&mut self, viewport: Size) -> LayoutRect {
        LayoutRect {
            origin: row(0_u16),
            size: viewport,
        }
    }

    fn split(&mut self, heights: &[u16], bounds: Size) -> Vec<LayoutRect> {
        let total_rows = bounds.row_count.as_u16();
        let mut rects = Vec::with_capacity(heights.len());
        let mut cursor: u16 = 0;
        for requested in heights {
            let remaining = total_rows.saturating_sub(cursor);
            let allotted = (*requested).min(remaining);
            rects.push(LayoutRect {
                origin: row(cursor),
                size: size(bounds.col_count.as_u16(), allotted),
            });
            cursor = cursor.saturating_add(allotted);
        }
        rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_viewport_overlays_children() {
        let mut engine = FullViewport;
        let viewport = size(20_u16, 6_u16);
        assert_eq!(
            engine.solve(viewport),
            LayoutRect {
                origin: row(0_u16),
                size: viewport,
            }
        );
        let rects = engine.split(&[1, 4], viewport);
        assert_eq!(rects.len(), 2);
        assert!(rects.iter().all(|rect| rect.origin == row(0_u16)
            && rect.size == viewport));
    }

    #[test]
    fn test_vertical_stack_places_children_top_to_bottom() {
        let mut engine = VerticalStack;
        let bounds = size(20_u16, 6_u16);
        let rects = engine.split(&[1, 2, 3], bounds);
        assert_eq!(
            rects,
            vec![
                LayoutRect {
                    origin: row(0_u16),
                    size: size(20_u16, 1_u16),
                },
                LayoutRect {
                    origin: row(1_u16),
                    size: size(20_u16, 2_u16),
                },
                LayoutRect {
                    origin: row(3_u16),
                    size: size(20_u16, 3_u16),
                },
            ]
        );
    }

    #[test]
    fn test_vertical_stack_clips_overflowing_children() {
        let mut engine = VerticalStack;
        let bounds = size(10_u16, 3_u16);
        let rects = engine.split(&[2, 2, 2], bounds);
        assert_eq!(rects[0].size.row_count.as_u16(), 2);
        // Second child only gets the one remaining row.
        assert_eq!(rects[1].origin, row(2_u16));
        assert_eq!(rects[1].size.row_count.as_u16(), 1);
        // Third child is off the bottom edge: zero rows, but still present.
        assert_eq!(rects[2].origin, row(3_u16));
        assert_eq!(rects[2].size.row_count.as_u16(), 0);
        assert_eq!(rects.len(), 3);
    }

    #[test]
    fn test_vertical_stack_differs_from_full_viewport() {
        let bounds = size(8_u16, 4_u16);
        let stacked = VerticalStack.split(&[1, 1], bounds);
        let overlaid = FullViewport.split(&[1, 1], bounds);
        assert_ne!(stacked, overlaid);
    }
}
