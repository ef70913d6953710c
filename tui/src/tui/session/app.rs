// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The app-exit / re-render capability handed to hooks and effects.
//!
//! Hooks never hold the session itself — they hold this handle, which can
//! only post messages onto the session's serialized mailbox. That keeps the
//! object graph acyclic and makes the session trivial to stub in tests.

use tokio::sync::{mpsc, oneshot};

use crate::{ExitCodeProvider, ExitStatus, KeyEvent, RuntimeError};

/// Messages processed serially by the session driver task.
pub(crate) enum SessionMsg {
    Rerender,
    Input(KeyEvent),
    Resize,
    Exit(ExitStatus),
    Unmount(oneshot::Sender<()>),
    FocusPath(String),
    FocusId(String),
    Fatal(RuntimeError),
}

/// Cloneable capability: request re-renders, move focus, exit the app.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct AppHandle {
    pub(crate) msg_tx: mpsc::UnboundedSender<SessionMsg>,
}

impl AppHandle {
    /// Ask the session to evaluate and commit a new frame.
    pub fn request_rerender(&self) {
        let _unused = self.msg_tx.send(SessionMsg::Rerender);
    }

    /// Exit cleanly (code 0).
    pub fn exit(&self) {
        let _unused = self.msg_tx.send(SessionMsg::Exit(ExitStatus::success()));
    }

    /// Exit with an error. The exit code comes from the error's
    /// [`ExitCodeProvider`] when it has one; [`Self::exit_with_error`] uses
    /// the conventional `1`.
    pub fn exit_with_error(&self, error: impl std::fmt::Display) {
        let _unused = self
            .msg_tx
            .send(SessionMsg::Exit(ExitStatus::failure(1, error.to_string())));
    }

    /// Exit with an error that knows its own exit code.
    pub fn exit_with_coded_error<E>(&self, error: &E)
    where
        E: std::fmt::Display + ExitCodeProvider,
    {
        let _unused = self.msg_tx.send(SessionMsg::Exit(ExitStatus::failure(
            error.exit_code(),
            error.to_string(),
        )));
    }

    /// Programmatic focus jump to an exact identity path.
    pub fn focus_path(&self, path: impl Into<String>) {
        let _unused = self.msg_tx.send(SessionMsg::FocusPath(path.into()));
    }

    /// Programmatic focus jump: `id` matches any segment of a focusable's
    /// path.
    pub fn focus_id(&self, id: impl Into<String>) {
        let _unused = self.msg_tx.send(SessionMsg::FocusId(id.into()));
    }
}
