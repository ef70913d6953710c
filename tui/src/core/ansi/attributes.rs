// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The SGR attribute set carried by every styled span and grid cell.

use super::color::Color;

/// Text attributes: optional foreground / background colors plus the six
/// style booleans we track. Equality is field-wise, which is what the
/// minimal-diff SGR emitter relies on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextAttributes {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
    pub strikethrough: bool,
    pub dim: bool,
}

impl TextAttributes {
    /// True iff no color is set and every style boolean is off. The default
    /// state is what a terminal shows after `SGR 0`.
    #[must_use]
    pub fn is_default(&self) -> bool { *self == Self::default() }

    #[must_use]
    pub fn with_fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    #[must_use]
    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    #[must_use]
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    #[must_use]
    pub fn with_inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    #[must_use]
    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    #[must_use]
    pub fn with_dim(mut self) -> Self {
        self.dim = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default() {
        assert!(TextAttributes::default().is_default());
        assert!(!TextAttributes::default().with_bold().is_default());
        assert!(
            !TextAttributes::default()
                .with_fg(Color::Basic16(0))
                .is_default()
        );
    }

    #[test]
    fn test_field_wise_equality() {
        let lhs = TextAttributes::default()
            .with_fg(Color::Rgb(1, 2, 3))
            .with_underline();
        let rhs = TextAttributes::default()
            .with_underline()
            .with_fg(Color::Rgb(1, 2, 3));
        assert_eq!(lhs, rhs);
    }
}
