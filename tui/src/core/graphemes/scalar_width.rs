// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Display width of a single Unicode scalar value.
//!
//! [`unicode_width`] supplies the East Asian Width data (Wide and Fullwidth
//! scalars are 2 columns, combining marks are 0). A terminal runtime needs a
//! few deliberate overrides on top of that:
//!
//! - C0/C1 controls occupy no cells (they are never painted), except TAB
//!   which we count as one column,
//! - zero-width joiners, variation selectors and the format controls (`Cf`)
//!   occupy no cells,
//! - everything else falls through to the EAW tables.
//!
//! Emoji *cluster* semantics (ZWJ families, regional-indicator flags, text
//! presentation scalars forced to emoji presentation) live one level up in
//! [`super::cluster`]; this module is strictly per-scalar.

use unicode_width::UnicodeWidthChar;

/// Version of the Unicode data backing the embedded
/// [Extended_Pictographic](super::cluster::is_extended_pictographic) table.
/// The EAW data tracks the `unicode-width` crate.
pub const UNICODE_DATA_VERSION: &str = "15.1.0";

/// Format controls (`Cf`) and other zero-width scalars that the EAW tables
/// report as width 1. Sorted, for binary search.
const ZERO_WIDTH_RANGES: &[(u32, u32)] = &[
    (0x00AD, 0x00AD),   // soft hyphen
    (0x0600, 0x0605),   // Arabic number signs
    (0x061C, 0x061C),   // Arabic letter mark
    (0x06DD, 0x06DD),   // Arabic end of ayah
    (0x070F, 0x070F),   // Syriac abbreviation mark
    (0x0890, 0x0891),   // Arabic pound/piastre marks
    (0x08E2, 0x08E2),   // Arabic disputed end of ayah
    (0x180E, 0x180E),   // Mongolian vowel separator
    (0x200B, 0x200F),   // ZWSP, ZWNJ, ZWJ, LRM, RLM
    (0x202A, 0x202E),   // bidi embedding controls
    (0x2060, 0x2064),   // word joiner, invisible operators
    (0x2066, 0x206F),   // bidi isolate controls, deprecated format chars
    (0xFE00, 0xFE0F),   // variation selectors
    (0xFEFF, 0xFEFF),   // zero width no-break space / BOM
    (0xFFF9, 0xFFFB),   // interlinear annotation controls
    (0x110BD, 0x110BD), // Kaithi number sign
    (0x110CD, 0x110CD), // Kaithi number sign above
    (0x13430, 0x1343F), // Egyptian hieroglyph format controls
    (0x1BCA0, 0x1BCA3), // shorthand format controls
    (0x1D173, 0x1D17A), // musical notation format controls
    (0xE0001, 0xE0001), // language tag
    (0xE0020, 0xE007F), // tag characters
    (0xE0100, 0xE01EF), // variation selectors supplement
];

fn in_ranges(table: &[(u32, u32)], code_point: u32) -> bool {
    table
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

/// Display width of one scalar: `0`, `1` or `2`.
///
/// - `0`: combining marks, format / zero-width controls, variation selectors,
///   ZWJ, and C0/C1 controls (TAB excepted).
/// - `2`: East Asian Wide / Fullwidth and emoji-presentation scalars.
/// - `1`: everything else, including TAB.
#[must_use]
pub fn scalar_display_width(scalar: char) -> u8 {
    let code_point = u32::from(scalar);

    // TAB is the one control that advances the cursor.
    if scalar == '\t' {
        return 1;
    }

    // C0, DEL, C1.
    if code_point < 0x20 || (0x7F..=0x9F).contains(&code_point) {
        return 0;
    }

    if in_ranges(ZERO_WIDTH_RANGES, code_point) {
        return 0;
    }

    // EAW tables: combining marks come back as Some(0), Wide/Fullwidth and
    // emoji-presentation scalars as Some(2), remaining controls as None.
    match UnicodeWidthChar::width(scalar) {
        Some(w @ (0 | 1 | 2)) => w as u8,
        Some(_) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case('a', 1; "ascii letter")]
    #[test_case('\t', 1; "tab advances one column")]
    #[test_case('\u{0003}', 0; "c0 control")]
    #[test_case('\u{009B}', 0; "c1 control")]
    #[test_case('\u{0301}', 0; "combining acute accent")]
    #[test_case('\u{200D}', 0; "zero width joiner")]
    #[test_case('\u{FE0F}', 0; "variation selector 16")]
    #[test_case('\u{00AD}', 0; "soft hyphen")]
    #[test_case('\u{FEFF}', 0; "byte order mark")]
    #[test_case('世', 2; "east asian wide")]
    #[test_case('Ａ', 2; "fullwidth latin")]
    #[test_case('😀', 2; "emoji presentation")]
    fn test_scalar_display_width(scalar: char, expected: u8) {
        assert_eq!(scalar_display_width(scalar), expected);
    }
}
