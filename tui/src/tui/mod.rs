// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The runtime half of the crate: grid/frame model, renderer, reconciler,
//! output writer, input stack, and the render session.

// Attach sources.
pub mod grid;
pub mod input;
pub mod reconciler;
pub mod renderer;
pub mod session;
pub mod writer;

// Re-export.
pub use grid::*;
pub use input::*;
pub use reconciler::*;
pub use renderer::*;
pub use session::*;
pub use writer::*;
