// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Display width of extended grapheme clusters and whole strings.
//!
//! A grapheme cluster is the unit a user perceives as one character; it is
//! what cursor movement, wrapping and slicing must never split. Segmentation
//! comes from [`unicode_segmentation`]; widths come from
//! [`super::scalar_width`] plus two cluster-level rules:
//!
//! 1. A cluster containing *any* Extended_Pictographic scalar renders as one
//!    emoji, 2 columns wide. This covers ZWJ families (`👨‍👩‍👧‍👦`), keycaps, skin
//!    tones, and text-presentation pictographs forced to emoji presentation
//!    via VS16.
//! 2. A regional-indicator pair (a flag, `🇺🇸`) is 2 columns wide.
//!
//! Otherwise the width is the width of the first non-zero scalar; trailing
//! combining scalars contribute nothing. A cluster of only zero-width scalars
//! (a stray ZWJ, a bare variation selector) has width 0.

use unicode_segmentation::UnicodeSegmentation;

use super::scalar_width::scalar_display_width;
use crate::{ColWidth, width};

/// Extended_Pictographic ranges (UTS #51 emoji-data, Unicode 15.1). Sorted,
/// for binary search.
const EXTENDED_PICTOGRAPHIC_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x2199),
    (0x21A9, 0x21AA),
    (0x231A, 0x231B),
    (0x2328, 0x2328),
    (0x2388, 0x2388),
    (0x23CF, 0x23CF),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25AB),
    (0x25B6, 0x25B6),
    (0x25C0, 0x25C0),
    (0x25FB, 0x25FE),
    (0x2600, 0x2605),
    (0x2607, 0x2612),
    (0x2614, 0x2685),
    (0x2690, 0x2705),
    (0x2708, 0x2712),
    (0x2714, 0x2714),
    (0x2716, 0x2716),
    (0x271D, 0x271D),
    (0x2721, 0x2721),
    (0x2728, 0x2728),
    (0x2733, 0x2734),
    (0x2744, 0x2744),
    (0x2747, 0x2747),
    (0x274C, 0x274C),
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2763, 0x2767),
    (0x2795, 0x2797),
    (0x27A1, 0x27A1),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0x1F000, 0x1F0FF),
    (0x1F10D, 0x1F10F),
    (0x1F12F, 0x1F12F),
    (0x1F16C, 0x1F171),
    (0x1F17E, 0x1F17F),
    (0x1F18E, 0x1F18E),
    (0x1F191, 0x1F19A),
    (0x1F1AD, 0x1F1E5),
    (0x1F201, 0x1F20F),
    (0x1F21A, 0x1F21A),
    (0x1F22F, 0x1F22F),
    (0x1F232, 0x1F23A),
    (0x1F23C, 0x1F23F),
    (0x1F249, 0x1F3FA),
    (0x1F400, 0x1F53D),
    (0x1F546, 0x1F64F),
    (0x1F680, 0x1F6FF),
    (0x1F774, 0x1F77F),
    (0x1F7D5, 0x1F7FF),
    (0x1F80C, 0x1F80F),
    (0x1F848, 0x1F84F),
    (0x1F85A, 0x1F85F),
    (0x1F888, 0x1F88F),
    (0x1F8AE, 0x1F8FF),
    (0x1F90C, 0x1F93A),
    (0x1F93C, 0x1F945),
    (0x1F947, 0x1FAFF),
    (0x1FC00, 0x1FFFD),
];

const REGIONAL_INDICATOR_RANGE: (u32, u32) = (0x1F1E6, 0x1F1FF);

/// True if the scalar carries the Extended_Pictographic property.
#[must_use]
pub fn is_extended_pictographic(scalar: char) -> bool {
    let code_point = u32::from(scalar);
    EXTENDED_PICTOGRAPHIC_RANGES
        .binary_search_by(|&(lo, hi)| {
            if code_point < lo {
                std::cmp::Ordering::Greater
            } else if code_point > hi {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

fn is_regional_indicator(scalar: char) -> bool {
    let code_point = u32::from(scalar);
    code_point >= REGIONAL_INDICATOR_RANGE.0 && code_point <= REGIONAL_INDICATOR_RANGE.1
}

/// Display width of one extended grapheme cluster.
#[must_use]
pub fn cluster_display_width(cluster: &str) -> ColWidth {
    // Regional-indicator pair = one flag.
    if let (Some(first), Some(second), None) = {
        let mut probe = cluster.chars();
        (probe.next(), probe.next(), probe.next())
    } && is_regional_indicator(first)
        && is_regional_indicator(second)
    {
        return width(2_u16);
    }

    if cluster.chars().any(is_extended_pictographic) {
        return width(2_u16);
    }

    // First non-zero scalar wins; combining scalars after it contribute 0.
    match cluster.chars().map(scalar_display_width).find(|w| *w > 0) {
        Some(w) => width(u16::from(w)),
        None => width(0_u16),
    }
}

/// Display width of a whole string: the sum of its cluster widths.
#[must_use]
pub fn str_display_width(text: &str) -> ColWidth {
    let total: u16 = text
        .graphemes(true)
        .map(|cluster| cluster_display_width(cluster).as_u16())
        .sum();
    width(total)
}

/// Iterate the extended grapheme clusters of a string.
pub fn clusters(text: &str) -> impl Iterator<Item = &str> { text.graphemes(true) }

/// Width operations over anything string-like.
pub trait GraphemeWidthExt {
    /// Display width in terminal columns.
    fn display_width(&self) -> ColWidth;
}

impl<T: AsRef<str>> GraphemeWidthExt for T {
    fn display_width(&self) -> ColWidth { str_display_width(self.as_ref()) }
}
