// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Terminal color model and palette conversions.
//!
//! More info:
//! - <https://tintin.mudhalla.net/info/256color/>
//! - <https://talyian.github.io/ansicolors/>

/// A terminal color in one of the three wire encodings. Equality is
/// structural: `Rgb(255, 0, 0)` and `Basic16(9)` are different colors even
/// when a terminal would render them identically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the 16 base palette entries (0..=15). 8..=15 are the bright
    /// variants.
    Basic16(u8),
    /// Index into the xterm 256-color palette.
    Palette256(u8),
    /// 24-bit truecolor.
    Rgb(u8, u8, u8),
}

/// The 16-swatch reference palette used for distance mapping down to
/// [`Color::Basic16`]. Values are the xterm defaults.
pub const BASIC16_SWATCHES: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00), // 0 black
    (0x80, 0x00, 0x00), // 1 maroon
    (0x00, 0x80, 0x00), // 2 green
    (0x80, 0x80, 0x00), // 3 olive
    (0x00, 0x00, 0x80), // 4 navy
    (0x80, 0x00, 0x80), // 5 purple
    (0x00, 0x80, 0x80), // 6 teal
    (0xC0, 0xC0, 0xC0), // 7 silver
    (0x80, 0x80, 0x80), // 8 gray
    (0xFF, 0x00, 0x00), // 9 red
    (0x00, 0xFF, 0x00), // 10 lime
    (0xFF, 0xFF, 0x00), // 11 yellow
    (0x00, 0x00, 0xFF), // 12 blue
    (0xFF, 0x00, 0xFF), // 13 fuchsia
    (0x00, 0xFF, 0xFF), // 14 aqua
    (0xFF, 0xFF, 0xFF), // 15 white
];

impl Color {
    /// Expand any encoding to its nominal RGB value.
    #[must_use]
    pub fn as_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Basic16(index) => BASIC16_SWATCHES[usize::from(index & 0x0F)],
            Color::Palette256(index) => palette256_to_rgb(index),
        }
    }
}

/// Nominal RGB value of a 256-palette index: 0..=15 are the base swatches,
/// 16..=231 the 6×6×6 color cube, 232..=255 the grayscale ramp.
#[must_use]
pub fn palette256_to_rgb(index: u8) -> (u8, u8, u8) {
    match index {
        0..=15 => BASIC16_SWATCHES[usize::from(index)],
        16..=231 => {
            let cube = index - 16;
            let level = |v: u8| if v == 0 { 0 } else { 55 + 40 * v };
            (level(cube / 36), level((cube / 6) % 6), level(cube % 6))
        }
        232..=255 => {
            let gray = 8 + 10 * (index - 232);
            (gray, gray, gray)
        }
    }
}

fn squared_distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let diff = |x: u8, y: u8| {
        let d = i32::from(x) - i32::from(y);
        (d * d) as u32
    };
    diff(a.0, b.0) + diff(a.1, b.1) + diff(a.2, b.2)
}

/// Nearest 256-palette index for an RGB value.
///
/// Two candidates are computed: the nearest point in the 6×6×6 color cube and
/// the nearest entry of the grayscale ramp. Whichever is closer to the input
/// wins. The base 16 entries are skipped; terminals commonly remap those, so
/// the cube gives more predictable output.
#[must_use]
pub fn rgb_to_palette256(r: u8, g: u8, b: u8) -> u8 {
    // Cube candidate: snap each channel to the nearest of {0, 95, 135, 175,
    // 215, 255}.
    let cube_level = |v: u8| -> u8 {
        if v < 48 {
            0
        } else if v < 115 {
            1
        } else {
            ((u16::from(v) - 35) / 40).min(5) as u8
        }
    };
    let (cr, cg, cb) = (cube_level(r), cube_level(g), cube_level(b));
    let cube_index = 16 + 36 * cr + 6 * cg + cb;
    let cube_rgb = palette256_to_rgb(cube_index);

    // Grayscale candidate: average luminance snapped onto the 24-step ramp.
    let average = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
    let gray_step = if average < 8 {
        0
    } else {
        (((average - 8) + 5) / 10).min(23) as u8
    };
    let gray_index = 232 + gray_step;
    let gray_rgb = palette256_to_rgb(gray_index);

    let input = (r, g, b);
    if squared_distance(input, cube_rgb) <= squared_distance(input, gray_rgb) {
        cube_index
    } else {
        gray_index
    }
}

/// Nearest base-16 index for an RGB value: simple squared distance over
/// [`BASIC16_SWATCHES`].
#[must_use]
pub fn rgb_to_basic16(r: u8, g: u8, b: u8) -> u8 {
    let input = (r, g, b);
    let mut best_index = 0_u8;
    let mut best_distance = u32::MAX;
    for (index, swatch) in BASIC16_SWATCHES.iter().enumerate() {
        let distance = squared_distance(input, *swatch);
        if distance < best_distance {
            best_distance = distance;
            best_index = index as u8;
        }
    }
    best_index
}
