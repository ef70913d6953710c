// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Raw-mode termios handling via rustix's safe API, plus TTY detection and
//! terminal size queries.
//!
//! The original settings are saved when raw mode is entered and restored by
//! [`RawModeGuard::restore`] (or on drop, as a backstop). `VMIN = 0`,
//! `VTIME = 1` gives the reader a short poll: `read()` returns within a
//! tenth of a second even with no input, so shutdown flags get observed.

use rustix::termios::{
    self, ControlModes, InputModes, LocalModes, OptionalActions, OutputModes,
    SpecialCodeIndex, Termios,
};

use crate::{CommonResult, Size, size};

/// Saved termios state; restores on [`RawModeGuard::restore`] or drop.
#[derive(Debug)]
pub struct RawModeGuard {
    original: Option<Termios>,
}

impl RawModeGuard {
    /// Enable raw mode on stdin: no canonical mode, no echo, no signal
    /// generation, 8-bit chars, short `VTIME` poll.
    pub fn enable() -> CommonResult<Self> {
        let stdin = std::io::stdin();
        let mut attrs = termios::tcgetattr(&stdin).map_err(|e| {
            miette::miette!("failed to retrieve terminal attributes: {e}")
        })?;
        let original = attrs.clone();

        // cfmakeraw(), spelled out with rustix's typed flag sets.
        attrs.input_modes.remove(
            InputModes::IGNBRK
                | InputModes::BRKINT
                | InputModes::PARMRK
                | InputModes::ISTRIP
                | InputModes::INLCR
                | InputModes::IGNCR
                | InputModes::ICRNL
                | InputModes::IXON,
        );
        attrs.output_modes.remove(OutputModes::OPOST);
        attrs.local_modes.remove(
            LocalModes::ECHO
                | LocalModes::ECHONL
                | LocalModes::ICANON
                | LocalModes::ISIG
                | LocalModes::IEXTEN,
        );
        attrs
            .control_modes
            .remove(ControlModes::CSIZE | ControlModes::PARENB);
        attrs.control_modes.insert(ControlModes::CS8);

        // Short poll: read returns after 0.1 s with zero bytes when idle.
        attrs.special_codes[SpecialCodeIndex::VMIN] = 0;
        attrs.special_codes[SpecialCodeIndex::VTIME] = 1;

        termios::tcsetattr(&stdin, OptionalActions::Now, &attrs)
            .map_err(|e| miette::miette!("failed to set terminal attributes: {e}"))?;

        Ok(Self {
            original: Some(original),
        })
    }

    /// Restore the saved settings. Idempotent.
    pub fn restore(&mut self) {
        if let Some(original) = self.original.take() {
            let stdin = std::io::stdin();
            if let Err(error) =
                termios::tcsetattr(&stdin, OptionalActions::Now, &original)
            {
                tracing::warn!(%error, "failed to restore terminal attributes");
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) { self.restore(); }
}

/// Is stdout a terminal?
#[must_use]
pub fn stdout_is_tty() -> bool { termios::isatty(&std::io::stdout()) }

/// Is stdin a terminal?
#[must_use]
pub fn stdin_is_tty() -> bool { termios::isatty(&std::io::stdin()) }

/// Current terminal dimensions, with an 80×24 fallback when the query fails
/// (not a TTY, or a degenerate zero-sized report).
#[must_use]
pub fn terminal_size() -> Size {
    match termios::tcgetwinsize(&std::io::stdout()) {
        Ok(winsize) if winsize.ws_col > 0 && winsize.ws_row > 0 => {
            size(winsize.ws_col, winsize.ws_row)
        }
        Ok(_) | Err(_) => size(80_u16, 24_u16),
    }
}
