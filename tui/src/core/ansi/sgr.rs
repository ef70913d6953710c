// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! SGR state machine: applying parameter groups to [`TextAttributes`], and
//! emitting the *minimal* parameter sequence that transforms one attribute
//! state into another.
//!
//! The minimal-diff discipline (used by the span encoder and the line-diff
//! renderer):
//!
//! 1. default → default: emit nothing.
//! 2. non-default → default: emit `[0]` once.
//! 3. otherwise: disable codes for styles turning off, `39`/`49` only for a
//!    color going set → unset, enable codes for styles turning on, and color
//!    parameter groups only when the color value changes. One combined SGR.
//!
//! One wrinkle worth naming: `22` clears *both* bold and dim. When only one
//! of the two turns off, the other must be re-asserted after the `22`.

use smallvec::smallvec;

use super::{attributes::TextAttributes, color::Color};
use crate::SgrParams;

pub const SGR_RESET: u16 = 0;
pub const SGR_BOLD: u16 = 1;
pub const SGR_DIM: u16 = 2;
pub const SGR_ITALIC: u16 = 3;
pub const SGR_UNDERLINE: u16 = 4;
pub const SGR_INVERSE: u16 = 7;
pub const SGR_STRIKETHROUGH: u16 = 9;
pub const SGR_BOLD_DIM_OFF: u16 = 22;
pub const SGR_ITALIC_OFF: u16 = 23;
pub const SGR_UNDERLINE_OFF: u16 = 24;
pub const SGR_INVERSE_OFF: u16 = 27;
pub const SGR_STRIKETHROUGH_OFF: u16 = 29;
pub const SGR_FG_RESET: u16 = 39;
pub const SGR_BG_RESET: u16 = 49;
pub const SGR_FG_EXTENDED: u16 = 38;
pub const SGR_BG_EXTENDED: u16 = 48;

/// Apply one SGR parameter list to an attribute state.
///
/// Invalid extended color groups (`38;5;n` with `n > 255`, `38;2;r;g;b` with
/// any component out of range, or truncated groups) are skipped without
/// disturbing the rest of the parameters, per the decode-failure policy.
pub fn apply_sgr_params(attrs: &mut TextAttributes, params: &[u16]) {
    // ECMA-48: an empty parameter list defaults to a single 0.
    if params.is_empty() {
        *attrs = TextAttributes::default();
        return;
    }

    let mut index = 0;
    while index < params.len() {
        let param = params[index];
        match param {
            SGR_RESET => *attrs = TextAttributes::default(),
            SGR_BOLD => attrs.bold = true,
            SGR_DIM => attrs.dim = true,
            SGR_ITALIC => attrs.italic = true,
            SGR_UNDERLINE => attrs.underline = true,
            SGR_INVERSE => attrs.inverse = true,
            SGR_STRIKETHROUGH => attrs.strikethrough = true,
            SGR_BOLD_DIM_OFF => {
                attrs.bold = false;
                attrs.dim = false;
            }
            SGR_ITALIC_OFF => attrs.italic = false,
            SGR_UNDERLINE_OFF => attrs.underline = false,
            SGR_INVERSE_OFF => attrs.inverse = false,
            SGR_STRIKETHROUGH_OFF => attrs.strikethrough = false,
            30..=37 => attrs.fg = Some(Color::Basic16((param - 30) as u8)),
            90..=97 => attrs.fg = Some(Color::Basic16((param - 90 + 8) as u8)),
            40..=47 => attrs.bg = Some(Color::Basic16((param - 40) as u8)),
            100..=107 => attrs.bg = Some(Color::Basic16((param - 100 + 8) as u8)),
            SGR_FG_RESET => attrs.fg = None,
            SGR_BG_RESET => attrs.bg = None,
            SGR_FG_EXTENDED | SGR_BG_EXTENDED => {
                let (color, consumed) = parse_extended_color(&params[index..]);
                if let Some(color) = color {
                    if param == SGR_FG_EXTENDED {
                        attrs.fg = Some(color);
                    } else {
                        attrs.bg = Some(color);
                    }
                }
                index += consumed;
                continue;
            }
            _ => {} // Unknown parameter: ignored, state unchanged.
        }
        index += 1;
    }
}

/// Parse a `38;…` / `48;…` group starting at `group[0]`. Returns the decoded
/// color (or `None` when invalid) and how many parameters the group spans, so
/// the caller can resume after it either way.
fn parse_extended_color(group: &[u16]) -> (Option<Color>, usize) {
    match group.get(1) {
        Some(5) => match group.get(2) {
            Some(&index) if index <= 255 => {
                (Some(Color::Palette256(index as u8)), 3)
            }
            Some(_) => (None, 3),
            None => (None, group.len()),
        },
        Some(2) => match (group.get(2), group.get(3), group.get(4)) {
            (Some(&r), Some(&g), Some(&b)) if r <= 255 && g <= 255 && b <= 255 => {
                (Some(Color::Rgb(r as u8, g as u8, b as u8)), 5)
            }
            (Some(_), Some(_), Some(_)) => (None, 5),
            _ => (None, group.len()),
        },
        // `38` followed by an unknown sub-kind (or nothing): skip the rest of
        // the group conservatively by consuming just the introducer.
        Some(_) => (None, 2),
        None => (None, 1),
    }
}

/// Parameters that set `attrs` starting from the default state.
#[must_use]
pub fn sgr_params_from_default(attrs: &TextAttributes) -> SgrParams {
    minimal_sgr_transition(&TextAttributes::default(), attrs)
}

/// The shortest parameter list transforming live state `prev` into `next`.
/// Empty result means no SGR needs to be emitted at all.
#[must_use]
pub fn minimal_sgr_transition(
    prev: &TextAttributes,
    next: &TextAttributes,
) -> SgrParams {
    if next == prev {
        return smallvec![];
    }
    if next.is_default() {
        // prev is non-default here (the equal case returned above).
        return smallvec![SGR_RESET];
    }

    let mut params: SgrParams = smallvec![];

    // Disable codes for styles turning off. 22 clears bold AND dim, so after
    // emitting it, whichever of the two `next` still wants must be re-added.
    let bold_or_dim_off =
        (prev.bold && !next.bold) || (prev.dim && !next.dim);
    if bold_or_dim_off {
        params.push(SGR_BOLD_DIM_OFF);
    }
    if prev.italic && !next.italic {
        params.push(SGR_ITALIC_OFF);
    }
    if prev.underline && !next.underline {
        params.push(SGR_UNDERLINE_OFF);
    }
    if prev.inverse && !next.inverse {
        params.push(SGR_INVERSE_OFF);
    }
    if prev.strikethrough && !next.strikethrough {
        params.push(SGR_STRIKETHROUGH_OFF);
    }

    // Color resets only for set → unset.
    if prev.fg.is_some() && next.fg.is_none() {
        params.push(SGR_FG_RESET);
    }
    if prev.bg.is_some() && next.bg.is_none() {
        params.push(SGR_BG_RESET);
    }

    // Enable codes for styles turning on (or clobbered by 22 above).
    if next.bold && (!prev.bold || bold_or_dim_off) {
        params.push(SGR_BOLD);
    }
    if next.dim && (!prev.dim || bold_or_dim_off) {
        params.push(SGR_DIM);
    }
    if next.italic && !prev.italic {
        params.push(SGR_ITALIC);
    }
    if next.underline && !prev.underline {
        params.push(SGR_UNDERLINE);
    }
    if next.inverse && !prev.inverse {
        params.push(SGR_INVERSE);
    }
    if next.strikethrough && !prev.strikethrough {
        params.push(SGR_STRIKETHROUGH);
    }

    // Color groups only when the value changes.
    if next.fg != prev.fg
        && let Some(color) = next.fg
    {
        push_color_params(&mut params, color, false);
    }
    if next.bg != prev.bg
        && let Some(color) = next.bg
    {
        push_color_params(&mut params, color, true);
    }

    params
}

/// Append the parameter group selecting `color` as foreground or background.
pub fn push_color_params(params: &mut SgrParams, color: Color, is_bg: bool) {
    match color {
        Color::Basic16(index) => {
            let base: u16 = match (index < 8, is_bg) {
                (true, false) => 30 + u16::from(index),
                (true, true) => 40 + u16::from(index),
                (false, false) => 90 + u16::from(index - 8),
                (false, true) => 100 + u16::from(index - 8),
            };
            params.push(base);
        }
        Color::Palette256(index) => {
            params.push(if is_bg { SGR_BG_EXTENDED } else { SGR_FG_EXTENDED });
            params.push(5);
            params.push(u16::from(index));
        }
        Color::Rgb(r, g, b) => {
            params.push(if is_bg { SGR_BG_EXTENDED } else { SGR_FG_EXTENDED });
            params.push(2);
            params.push(u16::from(r));
            params.push(u16::from(g));
            params.push(u16::from(b));
        }
    }
}
