// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Tracing initialization.
//!
//! Stdout belongs to the rendered UI, so diagnostics go to a rolling log
//! file. Filtering follows `RUST_LOG` via [`tracing_subscriber::EnvFilter`],
//! defaulting to `info`.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::CommonResult;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install a global tracing subscriber writing to
/// `<directory>/<file_prefix>.log`, rolled daily. Idempotent-ish: a second
/// call fails with the subscriber error, which callers may ignore.
pub fn try_initialize_logging(directory: &str, file_prefix: &str) -> CommonResult<()> {
    let appender = tracing_appender::rolling::daily(directory, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| miette::miette!("failed to install tracing subscriber: {e}"))?;

    // Keep the worker alive for the life of the process.
    let _unused = LOG_GUARD.set(guard);
    Ok(())
}
