// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Signal plumbing: SIGINT/SIGTERM trampolines and a debounced SIGWINCH
//! observer, posting onto the session mailbox.
//!
//! Signal handlers are process-global, so at most one session may own them:
//! installation refuses if another guard is alive. The guard clears the
//! process-wide slot on drop and aborts the observer tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use super::app::SessionMsg;
use crate::{CommonResult, ExitStatus, RuntimeError};

/// Resize events are debounced this long; terminals fire SIGWINCH in bursts
/// while the user drags the window edge.
pub const SIGWINCH_DEBOUNCE: Duration = Duration::from_millis(25);

static SIGNAL_HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Live signal subscriptions for one session.
#[derive(Debug)]
pub(crate) struct SignalGuard {
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        SIGNAL_HANDLERS_INSTALLED.store(false, Ordering::Release);
    }
}

/// Install the process-wide handlers. `watch_terminate` gates the
/// SIGINT/SIGTERM trampolines (`exit_on_ctrl_c`); SIGWINCH is always
/// observed for resize.
pub(crate) fn install_signal_handlers(
    watch_terminate: bool,
    msg_tx: mpsc::UnboundedSender<SessionMsg>,
) -> CommonResult<SignalGuard> {
    if SIGNAL_HANDLERS_INSTALLED.swap(true, Ordering::AcqRel) {
        return Err(RuntimeError::SignalHandlersAlreadyInstalled.into());
    }

    let mut tasks = Vec::with_capacity(3);

    if watch_terminate {
        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let tx = msg_tx.clone();
            tasks.push(tokio::spawn(async move {
                let Ok(mut stream) = signal(kind) else {
                    tracing::warn!(?kind, "failed to subscribe to signal");
                    return;
                };
                while stream.recv().await.is_some() {
                    if tx.send(SessionMsg::Exit(ExitStatus::success())).is_err() {
                        break;
                    }
                }
            }));
        }
    }

    let tx = msg_tx;
    tasks.push(tokio::spawn(async move {
        let Ok(mut stream) = signal(SignalKind::window_change()) else {
            tracing::warn!("failed to subscribe to SIGWINCH");
            return;
        };
        while stream.recv().await.is_some() {
            // Debounce: swallow the burst, fire once when it goes quiet.
            loop {
                tokio::select! {
                    more = stream.recv() => {
                        if more.is_none() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(SIGWINCH_DEBOUNCE) => break,
                }
            }
            if tx.send(SessionMsg::Resize).is_err() {
                return;
            }
        }
    }));

    Ok(SignalGuard { tasks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_second_install_refuses() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let guard = install_signal_handlers(true, tx.clone()).unwrap();
        assert!(install_signal_handlers(true, tx.clone()).is_err());
        drop(guard);
        // Slot cleared: install works again.
        let guard = install_signal_handlers(false, tx).unwrap();
        drop(guard);
    }
}
