// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Crate-wide error and result types.
//!
//! The public seam uses [`miette`] diagnostics; internal fallible operations
//! use the [`RuntimeError`] enum, which `?` converts into a miette report. A
//! thiserror enum inside, fancy diagnostics at the boundary.

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used across the crate's fallible public API.
pub type CommonResult<T> = miette::Result<T>;

#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream is not a terminal")]
    NotATty,

    #[error("terminal attributes could not be changed: {0}")]
    Termios(String),

    #[error("signal handlers are already installed for another session")]
    SignalHandlersAlreadyInstalled,

    #[error("output writer has shut down")]
    WriterClosed,

    #[error("render session has already been unmounted")]
    SessionUnmounted,
}

/// Terminal exit status recorded by [`crate::RenderSession`] when the app
/// exits, either cleanly or due to an error.
///
/// `code` follows process conventions: `0` for success, non-zero otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: i32,
    pub description: Option<String>,
}

impl ExitStatus {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: 0,
            description: None,
        }
    }

    #[must_use]
    pub fn failure(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool { self.code == 0 }
}

/// Errors surfaced through [`crate::AppHandle::exit`] may implement this to
/// control the process exit code; otherwise exiting with an error maps to
/// code `1`.
pub trait ExitCodeProvider {
    fn exit_code(&self) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        assert!(ExitStatus::success().is_success());
        let failed = ExitStatus::failure(2, "terminal closed");
        assert_eq!(failed.code, 2);
        assert_eq!(failed.description.as_deref(), Some("terminal closed"));
    }
}
