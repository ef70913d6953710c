// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Decoded terminal input events.

/// Modifier keys reported by xterm-style CSI parameter encoding
/// (`m = code − 1`, bits: shift=1, alt=2, ctrl=4).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        alt: false,
        ctrl: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: true,
    };

    /// Decode from the xterm modifier parameter (the raw `code`, before the
    /// `− 1` offset is applied).
    #[must_use]
    pub fn from_xterm_code(code: u16) -> Modifiers {
        let mask = code.saturating_sub(1);
        Modifiers {
            shift: mask & 0b001 != 0,
            alt: mask & 0b010 != 0,
            ctrl: mask & 0b100 != 0,
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool { self == Self::NONE }
}

/// What key was pressed (for the modifier-aware [`KeyEvent::Key`] form).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Tab,
    Enter,
    Backspace,
    /// F1..=F12.
    Function(u8),
    /// A printable character.
    Char(char),
}

/// A decoded input event.
///
/// The bare `Arrow*` variants are the back-compat form emitted for
/// unmodified arrow sequences; modified arrows arrive as
/// `Key { kind: Up, .. }` and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CtrlC,
    CtrlD,
    Key {
        kind: KeyKind,
        modifiers: Modifiers,
    },
    Paste(String),
}

impl KeyEvent {
    #[must_use]
    pub fn key(kind: KeyKind) -> Self {
        KeyEvent::Key {
            kind,
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub fn key_with(kind: KeyKind, modifiers: Modifiers) -> Self {
        KeyEvent::Key { kind, modifiers }
    }

    /// True for Tab without Shift (focus advance).
    #[must_use]
    pub fn is_tab(&self) -> bool {
        matches!(
            self,
            KeyEvent::Key {
                kind: KeyKind::Tab,
                modifiers
            } if !modifiers.shift
        )
    }

    /// True for Shift-Tab (focus retreat).
    #[must_use]
    pub fn is_back_tab(&self) -> bool {
        matches!(
            self,
            KeyEvent::Key {
                kind: KeyKind::Tab,
                modifiers
            } if modifiers.shift
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, Modifiers::NONE; "no modifiers")]
    #[test_case(2, Modifiers::SHIFT; "shift")]
    #[test_case(5, Modifiers::CTRL; "ctrl")]
    #[test_case(8, Modifiers { shift: true, alt: true, ctrl: true }; "all")]
    fn test_xterm_modifier_decoding(code: u16, expected: Modifiers) {
        assert_eq!(Modifiers::from_xterm_code(code), expected);
    }

    #[test]
    fn test_tab_classification() {
        assert!(KeyEvent::key(KeyKind::Tab).is_tab());
        assert!(!KeyEvent::key(KeyKind::Tab).is_back_tab());
        let back = KeyEvent::key_with(KeyKind::Tab, Modifiers::SHIFT);
        assert!(back.is_back_tab());
        assert!(!back.is_tab());
    }
}
