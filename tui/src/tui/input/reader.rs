// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Background input reader: raw bytes in, [`KeyEvent`]s out.
//!
//! A single blocking task owns the input source. With raw mode's `VTIME`
//! poll a TTY read returns within ~100 ms even when idle, so the shutdown
//! flag is observed promptly without any signal plumbing. For non-TTY
//! sources (tests, piped input) a zero-byte read means EOF and ends the
//! loop. Transient read errors back off 10 ms.

use std::io::Read;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tokio::sync::mpsc;

use super::{decoder::InputDecoder, key_event::KeyEvent};

const READ_CHUNK_SIZE: usize = 1024;
const TRANSIENT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// The byte source the reader drains. Mirrors the output device: real stdin
/// in production, an in-memory script in tests.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub source: Box<dyn Read + Send>,
    pub is_tty: bool,
}

impl InputDevice {
    #[must_use]
    pub fn new_stdin() -> Self {
        Self {
            source: Box::new(std::io::stdin()),
            is_tty: super::raw_mode::stdin_is_tty(),
        }
    }

    /// Scripted input for tests; EOF after the script is exhausted.
    #[must_use]
    pub fn new_mock(script: Vec<u8>) -> Self {
        Self {
            source: Box::new(std::io::Cursor::new(script)),
            is_tty: false,
        }
    }
}

/// Handle to the background reader. Dropping it (or calling
/// [`InputReader::stop`]) asks the loop to finish; with a TTY source the
/// `VTIME` poll guarantees that happens within one poll interval.
#[derive(Debug)]
pub struct InputReader {
    shutdown: Arc<AtomicBool>,
}

impl InputReader {
    /// Spawn the reader; decoded events arrive on `event_tx` in input order.
    #[must_use]
    pub fn spawn(device: InputDevice, event_tx: mpsc::UnboundedSender<KeyEvent>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let _unused = tokio::task::spawn_blocking(move || {
            read_loop(device, &event_tx, &flag);
        });
        Self { shutdown }
    }

    pub fn stop(&self) { self.shutdown.store(true, Ordering::Release); }
}

impl Drop for InputReader {
    fn drop(&mut self) { self.stop(); }
}

fn read_loop(
    mut device: InputDevice,
    event_tx: &mpsc::UnboundedSender<KeyEvent>,
    shutdown: &Arc<AtomicBool>,
) {
    let mut decoder = InputDecoder::new();
    let mut chunk = [0_u8; READ_CHUNK_SIZE];

    while !shutdown.load(Ordering::Acquire) {
        match device.source.read(&mut chunk) {
            Ok(0) => {
                if device.is_tty {
                    // VTIME poll tick with no input.
                    continue;
                }
                tracing::debug!("input source reached EOF");
                break;
            }
            Ok(count) => {
                for event in decoder.feed(&chunk[..count]) {
                    if event_tx.send(event).is_err() {
                        return; // Session is gone.
                    }
                }
            }
            Err(error)
                if matches!(
                    error.kind(),
                    std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                ) =>
            {
                std::thread::sleep(TRANSIENT_ERROR_BACKOFF);
            }
            Err(error) => {
                tracing::warn!(%error, "input read failed; backing off");
                std::thread::sleep(TRANSIENT_ERROR_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyKind;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_reader_decodes_script_and_stops_at_eof() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let device = InputDevice::new_mock(b"\x1b[A\x03x".to_vec());
        let _reader = InputReader::spawn(device, tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                KeyEvent::ArrowUp,
                KeyEvent::CtrlC,
                KeyEvent::key(KeyKind::Char('x')),
            ]
        );
    }
}
