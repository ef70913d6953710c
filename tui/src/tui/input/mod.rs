// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Raw-mode terminal input: decoding, the background reader task, and
//! termios plumbing.

// Attach sources.
pub mod decoder;
pub mod key_event;
pub mod raw_mode;
pub mod reader;

// Re-export.
pub use decoder::*;
pub use key_event::*;
pub use raw_mode::*;
pub use reader::*;
