// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Unicode display-width engine.
//!
//! Terminals render text one cell at a time, but Unicode text is organized in
//! scalars and grapheme clusters whose display width ranges from 0 to 2
//! columns. This module is the single source of truth for "how many columns
//! does this occupy", used by the span model, the wrap/slice layer, and the
//! cell grid.

// Attach sources.
pub mod cluster;
pub mod scalar_width;

// Re-export.
pub use cluster::*;
pub use scalar_width::*;
