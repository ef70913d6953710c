// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Pure data types and algorithms: no I/O, no tasks. Everything in here is
//! deterministic and unit-testable without a terminal.

// Attach sources.
pub mod ansi;
pub mod common;
pub mod graphemes;
pub mod inline_types;
pub mod log;
pub mod units;

// Re-export.
pub use ansi::*;
pub use common::*;
pub use graphemes::*;
pub use inline_types::*;
pub use units::*;
