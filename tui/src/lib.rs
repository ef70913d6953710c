// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! # rune_tui
//!
//! The core of a declarative terminal-UI runtime: everything between "a
//! component tree produced some styled lines" and "a minimal sequence of
//! bytes hit the terminal fd", plus the hooks runtime that drives re-renders
//! from state, effects and input.
//!
//! The crate splits in two:
//!
//! - [`core`]: pure data and algorithms. The Unicode display-width engine
//!   (grapheme clusters, East Asian Width, emoji/ZWJ, combining marks), the
//!   ANSI tokenizer and styled-span model with a minimal-diff SGR state
//!   machine, width-correct wrap/slice/truncate, terminal color profiles
//!   with downmapping. Deterministic, I/O-free, heavily unit-tested.
//!
//! - [`tui`]: the runtime. A cell grid + frame model, the line-diff
//!   renderer, a frame reconciler that coalesces updates under a frame-rate
//!   cap and picks full-redraw vs per-line delta, a serialized backpressured
//!   output writer, a raw-mode input decoder (CSI/SS3, bracketed paste,
//!   modifier-aware), and the render session: identity-path-keyed state,
//!   effects with cleanup lifecycles, focus traversal, input dispatch,
//!   console capture, and signal-driven resize/teardown.
//!
//! Concurrency model: cooperative, on Tokio. The session, reconciler and
//! writer are serialized actors; the input reader is a single background
//! task; signal observers post onto the session mailbox. Ordering
//! guarantees: frames commit in submission order, input events are
//! delivered in arrival order, and effects commit only after their frame's
//! grid has been published to the reconciler.
//!
//! ## A minimal app
//!
//! ```no_run
//! use rune_tui::{
//!     Component, Hooks, KeyEvent, KeyKind, RenderSession, SessionOptions, Size,
//!     StyledText,
//! };
//!
//! struct Hello;
//!
//! impl Component for Hello {
//!     fn type_name(&self) -> &str { "Hello" }
//!
//!     fn render(&mut self, _bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
//!         let (count, set_count) = hooks.use_state("count", || 0_u32);
//!         let app = hooks.app();
//!         hooks.use_input(move |event| {
//!             if let KeyEvent::Key { kind: KeyKind::Char('+'), .. } = event {
//!                 set_count.set(set_count.get().unwrap_or(0) + 1);
//!                 app.request_rerender();
//!             }
//!         });
//!         vec![StyledText::plain(format!("count: {count} (press + / ctrl-c)"))]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let session = RenderSession::mount(Box::new(Hello), SessionOptions::default())?;
//!     let status = session.wait_until_exit().await;
//!     std::process::exit(status.code);
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod core;
pub mod tui;

// Re-export.
pub use core::*;
pub use tui::*;
