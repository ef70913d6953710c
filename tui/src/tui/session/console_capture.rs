// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Console capture: redirect process stdout/stderr into pipes so stray
//! `println!` / `eprintln!` output (from the app or its dependencies) lands
//! in a log lane above the live region instead of corrupting the frame.
//!
//! Mechanics: the original fds are saved with `dup`, fds 1/2 are replaced by
//! pipe write ends with `dup2`, and background threads tag each line read
//! from the pipes with `{source, timestamp, text}` into a bounded ring
//! buffer. The session drains the ring before each frame. On teardown the
//! fds are restored, which closes the last write end and lets the reader
//! threads run out.
//!
//! The renderer keeps painting to the *saved* terminal fd
//! ([`ConsoleCapture::terminal_device`]) — otherwise frames would loop back
//! into the capture pipe.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Local};

use crate::{
    Color, CommonResult, OutputDevice, StyledText, TextAttributes, TextSpan,
};

/// Default ring capacity, in lines.
pub const CONSOLE_RING_CAPACITY: usize = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    Stdout,
    Stderr,
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureSource::Stdout => write!(f, "out"),
            CaptureSource::Stderr => write!(f, "err"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub source: CaptureSource,
    pub timestamp: DateTime<Local>,
    pub text: String,
}

type Ring = Arc<StdMutex<VecDeque<CapturedLine>>>;

/// Formatting knobs for the log lane.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LogLaneOptions {
    pub timestamps: bool,
    pub colorize: bool,
}

impl Default for LogLaneOptions {
    fn default() -> Self {
        Self {
            timestamps: true,
            colorize: true,
        }
    }
}

/// Active fd redirection. [`ConsoleCapture::stop`] (or drop) restores the
/// original fds.
#[allow(missing_debug_implementations)]
pub struct ConsoleCapture {
    ring: Ring,
    saved_stdout: Option<OwnedFd>,
    saved_stderr: Option<OwnedFd>,
    readers: Vec<std::thread::JoinHandle<()>>,
}

impl ConsoleCapture {
    /// Swap fds 1/2 for pipes and start the reader threads.
    pub fn start(capacity: usize) -> CommonResult<Self> {
        let ring: Ring = Arc::new(StdMutex::new(VecDeque::with_capacity(capacity)));
        let mut readers = Vec::with_capacity(2);

        let saved_stdout = std::io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| miette::miette!("failed to save stdout fd: {e}"))?;
        let saved_stderr = std::io::stderr()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| miette::miette!("failed to save stderr fd: {e}"))?;

        let (stdout_read, stdout_write) = rustix::pipe::pipe()
            .map_err(|e| miette::miette!("failed to create stdout pipe: {e}"))?;
        rustix::stdio::dup2_stdout(&stdout_write)
            .map_err(|e| miette::miette!("failed to redirect stdout: {e}"))?;
        drop(stdout_write);
        readers.push(spawn_reader(
            CaptureSource::Stdout,
            stdout_read,
            ring.clone(),
            capacity,
        ));

        let (stderr_read, stderr_write) = rustix::pipe::pipe()
            .map_err(|e| miette::miette!("failed to create stderr pipe: {e}"))?;
        rustix::stdio::dup2_stderr(&stderr_write)
            .map_err(|e| miette::miette!("failed to redirect stderr: {e}"))?;
        drop(stderr_write);
        readers.push(spawn_reader(
            CaptureSource::Stderr,
            stderr_read,
            ring.clone(),
            capacity,
        ));

        Ok(Self {
            ring,
            saved_stdout: Some(saved_stdout),
            saved_stderr: Some(saved_stderr),
            readers,
        })
    }

    /// An output device writing to the *original* terminal fd, for the
    /// renderer to use while the process-wide fds point at the pipes.
    pub fn terminal_device(&self) -> CommonResult<OutputDevice> {
        let fd = self
            .saved_stdout
            .as_ref()
            .ok_or_else(|| miette::miette!("console capture already stopped"))?
            .try_clone()
            .map_err(|e| miette::miette!("failed to clone saved stdout fd: {e}"))?;
        let file = std::fs::File::from(fd);
        Ok(OutputDevice {
            resource: Arc::new(StdMutex::new(Box::new(file))),
            is_mock: false,
        })
    }

    /// Take everything captured so far, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<CapturedLine> {
        self.ring.lock().unwrap().drain(..).collect()
    }

    /// Restore the original fds and join the reader threads. Idempotent.
    pub fn stop(&mut self) {
        if let Some(saved) = self.saved_stdout.take() {
            if let Err(error) = rustix::stdio::dup2_stdout(&saved) {
                tracing::warn!(%error, "failed to restore stdout fd");
            }
        }
        if let Some(saved) = self.saved_stderr.take() {
            if let Err(error) = rustix::stdio::dup2_stderr(&saved) {
                tracing::warn!(%error, "failed to restore stderr fd");
            }
        }
        for reader in self.readers.drain(..) {
            let _unused = reader.join();
        }
    }
}

impl Drop for ConsoleCapture {
    fn drop(&mut self) { self.stop(); }
}

fn spawn_reader(
    source: CaptureSource,
    read_end: OwnedFd,
    ring: Ring,
    capacity: usize,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let file = std::fs::File::from(read_end);
        for line in BufReader::new(file).lines() {
            let Ok(text) = line else { break };
            let mut buffer = ring.lock().unwrap();
            if buffer.len() >= capacity {
                buffer.pop_front();
            }
            buffer.push_back(CapturedLine {
                source,
                timestamp: Local::now(),
                text,
            });
        }
    })
}

/// Render captured lines as log-lane output: each line erases its row and
/// ends with CRLF so the lane scrolls above the live region.
#[must_use]
pub fn format_log_lane(lines: &[CapturedLine], options: &LogLaneOptions) -> String {
    let dim = TextAttributes::default().with_dim();
    let stderr_tag = TextAttributes::default().with_fg(Color::Basic16(9));

    let mut acc = String::new();
    for line in lines {
        let mut styled = StyledText::new();
        if options.timestamps {
            styled.push_span(TextSpan::new(
                format!("{} ", line.timestamp.format("%H:%M:%S%.3f")),
                if options.colorize { dim } else { TextAttributes::default() },
            ));
        }
        let tag_attrs = match (options.colorize, line.source) {
            (true, CaptureSource::Stderr) => stderr_tag,
            (true, CaptureSource::Stdout) => dim,
            (false, _) => TextAttributes::default(),
        };
        styled.push_span(TextSpan::new(format!("[{}] ", line.source), tag_attrs));
        styled.push_span(TextSpan::plain(line.text.clone()));

        acc.push_str("\r\u{1b}[2K");
        acc.push_str(&styled.to_ansi());
        acc.push_str("\r\n");
    }
    acc
}
