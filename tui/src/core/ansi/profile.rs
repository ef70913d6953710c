// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Terminal color-profile detection and downmapping.
//!
//! Resolution order: explicit override > `RUNE_TERMINAL_PROFILE` env var >
//! heuristics (`COLORTERM`, `TERM`, `NO_COLOR`) > [`TerminalProfile::Basic16`].
//!
//! Downmapping converts colors to what the profile can express:
//! - `TrueColor` passes everything through;
//! - `Xterm256` maps RGB onto the 256-palette via nearest-cube mapping;
//! - `Basic16` maps RGB and palette indices onto the base 16 by swatch
//!   distance;
//! - `NoColor` strips colors but preserves effect attributes.

use std::env;

use strum_macros::{Display, EnumString};

use super::{
    attributes::TextAttributes,
    color::{Color, rgb_to_basic16, rgb_to_palette256},
};

/// Env var consulted for an explicit profile choice.
pub const PROFILE_ENV_VAR: &str = "RUNE_TERMINAL_PROFILE";

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum TerminalProfile {
    #[strum(serialize = "truecolor", serialize = "24bit")]
    TrueColor,
    #[strum(serialize = "256", serialize = "xterm256")]
    Xterm256,
    #[strum(serialize = "16", serialize = "basic16")]
    Basic16,
    #[strum(serialize = "none", serialize = "no_color", serialize = "nocolor")]
    NoColor,
}

impl TerminalProfile {
    /// Resolve the active profile. `override_profile` wins outright; the env
    /// var is consulted next; then the conventional heuristics.
    #[must_use]
    pub fn resolve(override_profile: Option<TerminalProfile>) -> TerminalProfile {
        if let Some(profile) = override_profile {
            return profile;
        }
        if let Ok(value) = env::var(PROFILE_ENV_VAR)
            && let Ok(profile) = value.trim().parse::<TerminalProfile>()
        {
            return profile;
        }
        Self::from_heuristics(
            env::var("COLORTERM").ok().as_deref(),
            env::var("TERM").ok().as_deref(),
            env::var("NO_COLOR").is_ok(),
        )
    }

    /// The conventional `COLORTERM` / `TERM` / `NO_COLOR` heuristics, split
    /// out so tests don't have to mutate the process environment.
    #[must_use]
    pub fn from_heuristics(
        colorterm: Option<&str>,
        term: Option<&str>,
        no_color: bool,
    ) -> TerminalProfile {
        if let Some(colorterm) = colorterm {
            let lower = colorterm.to_ascii_lowercase();
            if lower.contains("truecolor") || lower.contains("24bit") {
                return TerminalProfile::TrueColor;
            }
        }
        if let Some(term) = term
            && term.contains("256color")
        {
            return TerminalProfile::Xterm256;
        }
        if no_color {
            return TerminalProfile::NoColor;
        }
        TerminalProfile::Basic16
    }

    /// Convert one color to this profile's gamut.
    #[must_use]
    pub fn downmap_color(self, color: Color) -> Option<Color> {
        match self {
            TerminalProfile::TrueColor => Some(color),
            TerminalProfile::Xterm256 => match color {
                Color::Rgb(r, g, b) => {
                    Some(Color::Palette256(rgb_to_palette256(r, g, b)))
                }
                other => Some(other),
            },
            TerminalProfile::Basic16 => match color {
                Color::Rgb(r, g, b) => Some(Color::Basic16(rgb_to_basic16(r, g, b))),
                Color::Palette256(index) => {
                    let (r, g, b) = Color::Palette256(index).as_rgb();
                    Some(Color::Basic16(rgb_to_basic16(r, g, b)))
                }
                basic => Some(basic),
            },
            TerminalProfile::NoColor => None,
        }
    }

    /// Convert an attribute set: colors are downmapped (or stripped for
    /// [`TerminalProfile::NoColor`]); effect booleans always survive.
    #[must_use]
    pub fn downmap_attributes(self, attrs: TextAttributes) -> TextAttributes {
        let mut out = attrs;
        out.fg = attrs.fg.and_then(|color| self.downmap_color(color));
        out.bg = attrs.bg.and_then(|color| self.downmap_color(color));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_heuristics_order() {
        assert_eq!(
            TerminalProfile::from_heuristics(Some("truecolor"), None, false),
            TerminalProfile::TrueColor
        );
        assert_eq!(
            TerminalProfile::from_heuristics(Some("24bit"), Some("xterm"), true),
            TerminalProfile::TrueColor
        );
        assert_eq!(
            TerminalProfile::from_heuristics(None, Some("xterm-256color"), true),
            TerminalProfile::Xterm256
        );
        assert_eq!(
            TerminalProfile::from_heuristics(None, Some("vt100"), true),
            TerminalProfile::NoColor
        );
        assert_eq!(
            TerminalProfile::from_heuristics(None, None, false),
            TerminalProfile::Basic16
        );
    }

    #[test]
    #[serial]
    fn test_env_var_beats_heuristics_and_override_beats_env() {
        // SAFETY: test runs serialized; no other thread reads the env here.
        unsafe { std::env::set_var(PROFILE_ENV_VAR, "nocolor") };
        assert_eq!(TerminalProfile::resolve(None), TerminalProfile::NoColor);
        assert_eq!(
            TerminalProfile::resolve(Some(TerminalProfile::TrueColor)),
            TerminalProfile::TrueColor
        );
        unsafe { std::env::set_var(PROFILE_ENV_VAR, "24bit") };
        assert_eq!(TerminalProfile::resolve(None), TerminalProfile::TrueColor);
        unsafe { std::env::remove_var(PROFILE_ENV_VAR) };
    }

    #[test]
    fn test_downmap_color() {
        let rgb = Color::Rgb(255, 0, 0);
        assert_eq!(
            TerminalProfile::TrueColor.downmap_color(rgb),
            Some(rgb)
        );
        assert_eq!(
            TerminalProfile::Xterm256.downmap_color(rgb),
            Some(Color::Palette256(196))
        );
        assert_eq!(
            TerminalProfile::Basic16.downmap_color(rgb),
            Some(Color::Basic16(9))
        );
        assert_eq!(
            TerminalProfile::Basic16.downmap_color(Color::Palette256(196)),
            Some(Color::Basic16(9))
        );
        assert_eq!(TerminalProfile::NoColor.downmap_color(rgb), None);
    }

    #[test]
    fn test_no_color_strips_colors_keeps_effects() {
        let attrs = TextAttributes::default()
            .with_bold()
            .with_underline()
            .with_fg(Color::Rgb(1, 2, 3))
            .with_bg(Color::Palette256(30));
        let mapped = TerminalProfile::NoColor.downmap_attributes(attrs);
        assert_eq!(mapped.fg, None);
        assert_eq!(mapped.bg, None);
        assert!(mapped.bold && mapped.underline);
    }
}
