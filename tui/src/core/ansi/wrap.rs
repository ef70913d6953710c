// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Width-correct split / slice / wrap / truncate over styled text and raw
//! ANSI strings.
//!
//! All operations advance cluster by cluster: a grapheme cluster is never
//! split, and a width-2 cluster is never divided across the cut. Attributes
//! of each output span match the source span it was cut from, so no broken
//! SGR can be produced downstream.
//!
//! The `last_column_guard` flag controls what happens to a width-2 cluster
//! that straddles the cut column: with the guard on (the wrapping case) the
//! cluster moves entirely to the right side; with the guard off (plain
//! column arithmetic) a wide cluster that *starts* before the cut column
//! stays on the left, overflowing by one column the way terminals let a wide
//! glyph hang over the last cell.

use std::fmt::Write as _;

use super::{
    attributes::TextAttributes,
    sgr::apply_sgr_params,
    styled_text::{StyledText, TextSpan},
    token::{AnsiToken, ESC},
    tokenizer::tokenize,
};
use crate::{ColIndex, ColWidth, clusters, cluster_display_width};

/// Split styled text at display column `at`.
///
/// Clusters accumulate left to right. A cluster of width `w` fits when
/// `running + w ≤ at`; without the guard a width-2 cluster additionally fits
/// when it starts on the last column (`running + 1 == at`). The first unfit
/// cluster and everything after it go to the right side.
#[must_use]
pub fn split_by_display_width(
    styled: &StyledText,
    at: ColWidth,
    last_column_guard: bool,
) -> (StyledText, StyledText) {
    let limit = at.as_u16();
    let mut left = StyledText::new();
    let mut right = StyledText::new();
    let mut running: u16 = 0;
    let mut cut = false;

    for span in &styled.spans {
        if cut {
            right.push_span(span.clone());
            continue;
        }

        let mut left_text = String::new();
        let mut right_text = String::new();

        for cluster in clusters(&span.text) {
            if !cut {
                let cluster_width = cluster_display_width(cluster).as_u16();
                let fits = if cluster_width == 2 && !last_column_guard {
                    running + 1 <= limit
                } else {
                    running + cluster_width <= limit
                };
                if fits {
                    running += cluster_width;
                    left_text.push_str(cluster);
                    continue;
                }
                cut = true;
            }
            right_text.push_str(cluster);
        }

        if !left_text.is_empty() {
            left.push_span(TextSpan::new(left_text, span.attributes));
        }
        if !right_text.is_empty() {
            right.push_span(TextSpan::new(right_text, span.attributes));
        }
    }

    (left, right)
}

/// Slice by display columns: everything from column `from` (inclusive) to
/// column `to` (exclusive). Equivalent to splitting at `from`, then splitting
/// the remainder at `to − from`.
#[must_use]
pub fn slice_by_display_columns(
    styled: &StyledText,
    from: ColIndex,
    to: ColIndex,
) -> StyledText {
    let span_width = to.as_u16().saturating_sub(from.as_u16());
    let (_, rest) = split_by_display_width(styled, ColWidth(from.as_u16()), false);
    let (middle, _) = split_by_display_width(&rest, ColWidth(span_width), false);
    middle
}

/// Wrap styled text so every output line is at most `max_width` columns wide.
///
/// Rejoining the output lines' plain text reproduces the input exactly. A
/// cluster wider than the wrap width itself (a width-2 cluster at width 1) is
/// force-placed on its own line so the operation always makes progress.
#[must_use]
pub fn wrap_by_display_width(styled: &StyledText, max_width: ColWidth) -> Vec<StyledText> {
    let mut lines = Vec::new();
    let mut rest = styled.clone();

    if rest.is_empty() {
        return vec![rest];
    }

    while !rest.is_empty() {
        let (line, remainder) = split_by_display_width(&rest, max_width, true);
        if line.is_empty() {
            // First cluster is wider than the whole line. Take it anyway.
            let (forced, remainder) = take_first_cluster(&remainder);
            lines.push(forced);
            rest = remainder;
            continue;
        }
        lines.push(line);
        rest = remainder;
    }

    lines
}

/// Split off the first grapheme cluster, preserving attributes.
fn take_first_cluster(styled: &StyledText) -> (StyledText, StyledText) {
    let mut head = StyledText::new();
    let mut tail = StyledText::new();
    let mut taken = false;

    for span in &styled.spans {
        if taken || span.text.is_empty() {
            if !span.text.is_empty() {
                tail.push_span(span.clone());
            }
            continue;
        }
        let mut iter = clusters(&span.text);
        if let Some(first) = iter.next() {
            head.push_span(TextSpan::new(first.to_string(), span.attributes));
            let rest: String = iter.collect();
            if !rest.is_empty() {
                tail.push_span(TextSpan::new(rest, span.attributes));
            }
            taken = true;
        }
    }

    (head, tail)
}

/// Width-aware truncation of a raw ANSI string to `max_width` visible
/// columns. Escape sequences before the cut are preserved verbatim; if
/// truncation occurred while the live SGR state was non-default, a final
/// `[0]` is appended so the cut cannot leak styling.
#[must_use]
pub fn truncate_visible_columns(ansi: &str, max_width: ColWidth) -> String {
    let limit = max_width.as_u16();
    let mut acc = String::new();
    let mut state = TextAttributes::default();
    let mut running: u16 = 0;
    let mut truncated = false;

    for token in tokenize(ansi) {
        if truncated {
            break;
        }
        match token {
            AnsiToken::Text(text) => {
                for cluster in clusters(&text) {
                    let cluster_width = cluster_display_width(cluster).as_u16();
                    if running + cluster_width > limit {
                        truncated = true;
                        break;
                    }
                    running += cluster_width;
                    acc.push_str(cluster);
                }
            }
            AnsiToken::Sgr(ref params) => {
                apply_sgr_params(&mut state, params);
                let _unused = write!(acc, "{token}");
            }
            other => {
                let _unused = write!(acc, "{other}");
            }
        }
    }

    if truncated && !state.is_default() {
        let _unused = write!(acc, "{ESC}[0m");
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, col, width};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn styled(text: &str) -> StyledText { StyledText::plain(text) }

    #[test]
    fn test_wide_cluster_guard() {
        // "Test世": widths 1,1,1,1,2.
        let (left, right) = split_by_display_width(&styled("Test世"), width(5_u16), true);
        assert_eq!(left.plain_text(), "Test");
        assert_eq!(right.plain_text(), "世");

        let (left, right) = split_by_display_width(&styled("Test世"), width(5_u16), false);
        assert_eq!(left.plain_text(), "Test世");
        assert_eq!(right.plain_text(), "");
    }

    #[test]
    fn test_split_keeps_attributes_per_source_span() {
        let bold = TextAttributes::default().with_bold();
        let input = StyledText::from_spans(vec![
            TextSpan::new("ab", bold),
            TextSpan::plain("cd"),
        ]);
        let (left, right) = split_by_display_width(&input, width(3_u16), true);
        assert_eq!(
            left.spans,
            vec![TextSpan::new("ab", bold), TextSpan::plain("c")]
        );
        assert_eq!(right.spans, vec![TextSpan::plain("d")]);
    }

    #[test]
    fn test_split_wide_exactly_at_boundary_is_placed() {
        // A wide cluster ending exactly at the cut fits even with the guard.
        let (left, right) = split_by_display_width(&styled("ab世"), width(4_u16), true);
        assert_eq!(left.plain_text(), "ab世");
        assert_eq!(right.plain_text(), "");
    }

    #[test]
    fn test_zwj_family_wrap() {
        // "A👨‍👩‍👧‍👦B": widths 1,2,1.
        let lines = wrap_by_display_width(&styled("A👨‍👩‍👧‍👦B"), width(2_u16));
        let texts: Vec<String> = lines.iter().map(StyledText::plain_text).collect();
        assert_eq!(texts, vec!["A", "👨‍👩‍👧‍👦", "B"]);
    }

    #[test_case("hello world", 5, vec!["hello", " worl", "d"]; "ascii")]
    #[test_case("", 4, vec![""]; "empty input")]
    #[test_case("世界世", 4, vec!["世界", "世"]; "wide pairs")]
    #[test_case("世", 1, vec!["世"]; "cluster wider than line is force placed")]
    fn test_wrap_rejoins_to_plain_text(input: &str, at: u16, expected: Vec<&str>) {
        let lines = wrap_by_display_width(&styled(input), width(at));
        let texts: Vec<String> = lines.iter().map(StyledText::plain_text).collect();
        assert_eq!(texts, expected);
        assert_eq!(texts.concat(), input);
    }

    #[test]
    fn test_wrap_line_widths_bounded() {
        let input = styled("the quick 世界 brown 🦊 jumps");
        for wrap_width in 2..=10_u16 {
            for line in wrap_by_display_width(&input, width(wrap_width)) {
                assert!(
                    line.display_width().as_u16() <= wrap_width.max(2),
                    "line {:?} too wide for {wrap_width}",
                    line.plain_text()
                );
            }
        }
    }

    #[test]
    fn test_slice_by_display_columns() {
        let sliced = slice_by_display_columns(&styled("hello"), col(1_u16), col(4_u16));
        assert_eq!(sliced.plain_text(), "ell");

        // Slicing across a wide boundary never splits the cluster.
        let sliced = slice_by_display_columns(&styled("a世b"), col(1_u16), col(3_u16));
        assert_eq!(sliced.plain_text(), "世");
    }

    #[test]
    fn test_truncate_visible_columns_plain() {
        assert_eq!(
            truncate_visible_columns("hello", width(3_u16)),
            "hel"
        );
        assert_eq!(
            truncate_visible_columns("hi", width(5_u16)),
            "hi"
        );
    }

    #[test]
    fn test_truncate_does_not_split_wide_cluster() {
        assert_eq!(truncate_visible_columns("ab世", width(3_u16)), "ab");
    }

    #[test]
    fn test_truncate_appends_reset_when_cut_in_styled_run() {
        let input = "\u{1b}[1;31mhello\u{1b}[0m";
        assert_eq!(
            truncate_visible_columns(input, width(3_u16)),
            "\u{1b}[1;31mhel\u{1b}[0m"
        );
    }

    #[test]
    fn test_truncate_no_reset_when_nothing_cut() {
        let input = "\u{1b}[1mok\u{1b}[0m";
        assert_eq!(truncate_visible_columns(input, width(5_u16)), input);
    }

    #[test]
    fn test_wrap_preserves_attributes_per_line() {
        let red = TextAttributes::default().with_fg(Color::Basic16(1));
        let input = StyledText::from_spans(vec![
            TextSpan::new("abc", red),
            TextSpan::plain("def"),
        ]);
        let lines = wrap_by_display_width(&input, width(2_u16));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans, vec![TextSpan::new("ab", red)]);
        assert_eq!(
            lines[1].spans,
            vec![TextSpan::new("c", red), TextSpan::plain("d")]
        );
        assert_eq!(lines[2].spans, vec![TextSpan::plain("ef")]);
    }
}
