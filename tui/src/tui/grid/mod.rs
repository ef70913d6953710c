// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Frame and grid model: the reconciler's view of the terminal.

// Attach sources.
pub mod frame;
#[allow(clippy::module_inception)]
pub mod grid;

// Re-export.
pub use frame::*;
pub use grid::*;
