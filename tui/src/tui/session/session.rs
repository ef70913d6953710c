// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The render session: the serialized owner of all mutable runtime state.
//!
//! One driver task owns a [`SessionCore`] and processes a mailbox of
//! [`SessionMsg`]s — re-render requests, decoded input, signals, focus jumps
//! and exit — one at a time. Everything else (input reader, signal
//! observers, app handles held by effects) can only post messages, which is
//! the whole concurrency story: no lock ordering, no re-entrancy.
//!
//! One logical frame:
//! 1. drain the console-capture ring into the log lane;
//! 2. detect a root identity change (forces a full redraw and, after the
//!    render, evicts state for vanished identity paths);
//! 3. evaluate the root component with a fresh [`RenderCollector`]-backed
//!    [`Hooks`] scope, through the external layout seam;
//! 4. downmap span attributes to the terminal profile, build the
//!    [`Frame`], update the focus list (clamped);
//! 5. publish the grid to the reconciler;
//! 6. commit effects — only after the grid is published, so effects can
//!    never observe an unpublished frame.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Notify, mpsc, oneshot};

use super::{
    app::{AppHandle, SessionMsg},
    component::{Component, FullViewport, LayoutEngine},
    console_capture::{
        CONSOLE_RING_CAPACITY, ConsoleCapture, LogLaneOptions, format_log_lane,
    },
    effects::{EffectRegistry, EffectScope},
    focus::FocusManager,
    hooks::{Hooks, RenderCollector},
    identity::identity_segment,
    input_registry::InputRegistry,
    options::SessionOptions,
    signals::{SignalGuard, install_signal_handlers},
    state::StateRegistry,
};
use crate::{
    CommonResult, DISABLE_BRACKETED_PASTE, ENABLE_BRACKETED_PASTE, ExitStatus, Frame,
    InputReader, KeyEvent, OutputDevice, OutputWriter, RawModeGuard, Reconciler,
    ReconcilerConfig, RenderStats, Size, StyledText, TerminalProfile, TextSpan,
    WriterConfig, WriterMetricsSnapshot, stdout_is_tty, terminal_size,
};

struct ExitShared {
    notify: Notify,
    status: StdMutex<Option<ExitStatus>>,
}

/// Handle to a mounted session. Cloning is cheap; all clones address the
/// same serialized driver.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct RenderSession {
    msg_tx: mpsc::UnboundedSender<SessionMsg>,
    exit: Arc<ExitShared>,
    reconciler: Reconciler,
    writer: OutputWriter,
    state: StateRegistry,
}

impl RenderSession {
    /// Mount `root` and render the first frame. Must be called on a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Fails when signal handlers are already owned by another session, or
    /// when console capture cannot set up its fd plumbing.
    pub fn mount(
        root: Box<dyn Component>,
        options: SessionOptions,
    ) -> CommonResult<RenderSession> {
        Self::mount_with_layout(root, Box::new(FullViewport), options)
    }

    /// [`Self::mount`] with an explicit external layout engine.
    pub fn mount_with_layout(
        root: Box<dyn Component>,
        layout: Box<dyn LayoutEngine>,
        options: SessionOptions,
    ) -> CommonResult<RenderSession> {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let profile = TerminalProfile::resolve(options.terminal_profile_override);
        let real_terminal = !options.stdout.is_mock && stdout_is_tty();

        // Console capture first: when active, the renderer must write to the
        // saved terminal fd, not the patched fd 1.
        let mut console = None;
        let mut stdout_device = options.stdout;
        if options.patch_console && real_terminal {
            match ConsoleCapture::start(CONSOLE_RING_CAPACITY) {
                Ok(capture) => {
                    stdout_device = capture.terminal_device()?;
                    console = Some(capture);
                }
                Err(error) => {
                    tracing::warn!(%error, "console capture unavailable; continuing");
                }
            }
        }

        let stdout_stream = stdout_device.clone();
        let writer = OutputWriter::spawn(stdout_device, WriterConfig::default());
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
        let reconciler = Reconciler::spawn(
            writer.clone(),
            ReconcilerConfig {
                mode: options.render_mode,
                max_frame_rate: options.fps_cap,
                use_alternate_screen: options.use_alt_screen,
                ..ReconcilerConfig::default()
            },
            fatal_tx,
        );
        {
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                while let Some(error) = fatal_rx.recv().await {
                    if tx.send(SessionMsg::Fatal(error)).is_err() {
                        break;
                    }
                }
            });
        }

        let raw_mode = if options.enable_raw_mode && options.stdin.is_tty {
            match RawModeGuard::enable() {
                Ok(guard) => Some(guard),
                Err(error) => {
                    tracing::warn!(%error, "raw mode unavailable; continuing cooked");
                    None
                }
            }
        } else {
            None
        };

        if options.enable_bracketed_paste {
            writer.write(ENABLE_BRACKETED_PASTE);
        }

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let input_reader = InputReader::spawn(options.stdin, event_tx);
        {
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = event_rx.recv().await {
                    if tx.send(SessionMsg::Input(event)).is_err() {
                        break;
                    }
                }
            });
        }

        let signals = if real_terminal {
            Some(install_signal_handlers(
                options.exit_on_ctrl_c,
                msg_tx.clone(),
            )?)
        } else {
            None
        };

        let exit = Arc::new(ExitShared {
            notify: Notify::new(),
            status: StdMutex::new(None),
        });
        let size = options.viewport_override.unwrap_or_else(terminal_size);
        let app = AppHandle {
            msg_tx: msg_tx.clone(),
        };

        let state = StateRegistry::new();
        let core = SessionCore {
            root,
            layout,
            size,
            viewport_override: options.viewport_override,
            profile,
            exit_on_ctrl_c: options.exit_on_ctrl_c,
            bracketed_paste: options.enable_bracketed_paste,
            log_lane: options.log_lane,
            state: state.clone(),
            inputs: InputRegistry::new(),
            effects: EffectRegistry::new(),
            focus: FocusManager::new(),
            reconciler: reconciler.clone(),
            writer: writer.clone(),
            stdout_stream,
            stderr_stream: options.stderr,
            console,
            input_reader: Some(input_reader),
            raw_mode,
            signals,
            app,
            root_key: None,
            exit: exit.clone(),
            unmounted: false,
        };
        tokio::spawn(drive(core, msg_rx));

        let _unused = msg_tx.send(SessionMsg::Rerender);
        Ok(RenderSession {
            msg_tx,
            exit,
            reconciler,
            writer,
            state,
        })
    }

    /// Request a re-render; coalesced by the reconciler.
    pub fn rerender(&self) {
        let _unused = self.msg_tx.send(SessionMsg::Rerender);
    }

    /// Inject a decoded key event; what tests use in place of a TTY.
    pub fn dispatch_input(&self, event: KeyEvent) {
        let _unused = self.msg_tx.send(SessionMsg::Input(event));
    }

    #[must_use]
    pub fn app_handle(&self) -> AppHandle {
        AppHandle {
            msg_tx: self.msg_tx.clone(),
        }
    }

    /// Resolves once the session has exited and torn down.
    pub async fn wait_until_exit(&self) -> ExitStatus {
        loop {
            let notified = self.exit.notify.notified();
            if let Some(status) = self.exit.status.lock().unwrap().clone() {
                return status;
            }
            notified.await;
        }
    }

    /// Tear down now. Idempotent: repeated calls observe the same status.
    pub async fn unmount(&self) -> ExitStatus {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.msg_tx.send(SessionMsg::Unmount(reply_tx)).is_ok() {
            let _unused = reply_rx.await;
        }
        self.wait_until_exit().await
    }

    #[must_use]
    pub fn last_render_stats(&self) -> Option<RenderStats> {
        self.reconciler.last_stats()
    }

    #[must_use]
    pub fn commit_count(&self) -> u64 { self.reconciler.commit_count() }

    #[must_use]
    pub fn writer_metrics(&self) -> WriterMetricsSnapshot { self.writer.metrics() }

    /// Test instrumentation: the session's state registry.
    pub(crate) fn state_registry(&self) -> StateRegistry { self.state.clone() }
}

struct SessionCore {
    root: Box<dyn Component>,
    layout: Box<dyn LayoutEngine>,
    size: Size,
    viewport_override: Option<Size>,
    profile: TerminalProfile,
    exit_on_ctrl_c: bool,
    bracketed_paste: bool,
    log_lane: LogLaneOptions,
    state: StateRegistry,
    inputs: InputRegistry,
    effects: EffectRegistry,
    focus: FocusManager,
    reconciler: Reconciler,
    writer: OutputWriter,
    stdout_stream: OutputDevice,
    stderr_stream: OutputDevice,
    console: Option<ConsoleCapture>,
    input_reader: Option<InputReader>,
    raw_mode: Option<RawModeGuard>,
    signals: Option<SignalGuard>,
    app: AppHandle,
    root_key: Option<(String, Option<String>)>,
    exit: Arc<ExitShared>,
    unmounted: bool,
}

async fn drive(mut core: SessionCore, mut rx: mpsc::UnboundedReceiver<SessionMsg>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            SessionMsg::Rerender => core.render_frame().await,
            SessionMsg::Input(event) => core.dispatch_input(event).await,
            SessionMsg::Resize => {
                core.size = core.viewport_override.unwrap_or_else(terminal_size);
                core.reconciler.force_full_next();
                core.render_frame().await;
            }
            SessionMsg::FocusPath(path) => {
                if core.focus.focus_path(&path) {
                    core.render_frame().await;
                }
            }
            SessionMsg::FocusId(id) => {
                if core.focus.focus_id(&id) {
                    core.render_frame().await;
                }
            }
            SessionMsg::Exit(status) => {
                core.unmount(status).await;
            }
            SessionMsg::Unmount(reply) => {
                core.unmount(ExitStatus::success()).await;
                let _unused = reply.send(());
            }
            SessionMsg::Fatal(error) => {
                tracing::error!(%error, "fatal runtime error");
                core.unmount(ExitStatus::failure(1, error.to_string())).await;
            }
        }
        if core.unmounted {
            break;
        }
    }
    // Mailbox closed without an explicit exit: tear down anyway.
    if !core.unmounted {
        core.unmount(ExitStatus::success()).await;
    }
}

impl SessionCore {
    async fn render_frame(&mut self) {
        if self.unmounted {
            return;
        }

        // 1. Log lane above the live region.
        if let Some(console) = &self.console {
            let captured = console.drain();
            if !captured.is_empty() {
                self.writer
                    .write(format_log_lane(&captured, &self.log_lane));
                self.reconciler.force_full_next();
            }
        }

        // 2. Root identity change forces diff-state reset.
        let root_key = (self.root.type_name().to_string(), self.root.identity());
        let identity_reset = self
            .root_key
            .as_ref()
            .is_some_and(|previous| *previous != root_key);
        if identity_reset {
            self.reconciler.force_full_next();
        }

        // 3. Evaluate the view with registrars bound.
        let rect = self.layout.solve(self.size);
        let mut collector = RenderCollector::default();
        let root_path = identity_segment(&root_key.0, root_key.1.as_deref());
        self.root_key = Some(root_key);
        let focused_path = self.focus.focused_path().map(String::from);
        let lines = {
            let mut hooks = Hooks::new(
                root_path,
                &mut collector,
                self.state.clone(),
                self.app.clone(),
                focused_path,
                self.stdout_stream.clone(),
                self.stderr_stream.clone(),
            );
            self.root.render(rect.size, &mut hooks)
        };
        let RenderCollector {
            effects,
            focusables,
            identity_paths,
        } = collector;

        // 4. Profile downmapping, frame building, focus clamping.
        let mapped: Vec<StyledText> = lines
            .into_iter()
            .map(|line| StyledText {
                spans: line
                    .spans
                    .into_iter()
                    .map(|span| TextSpan {
                        text: span.text,
                        attributes: self.profile.downmap_attributes(span.attributes),
                    })
                    .collect(),
            })
            .collect();
        let frame = Frame::from_styled_lines(&mapped, rect.size);
        let focused_before = self.focus.focused_path().map(String::from);
        self.focus.set_focusables(focusables);
        if self.focus.focused_path().map(String::from) != focused_before {
            // Focus settled on a different component than the one this frame
            // was rendered with (typically the very first frame). Schedule a
            // follow-up; the reconciler coalesces the pair into one paint.
            self.app.request_rerender();
        }

        // 5. Publish, then 6. commit effects.
        self.reconciler.render(Arc::new(frame.to_grid()));
        let mut scope = EffectScope {
            app: self.app.clone(),
            inputs: self.inputs.clone(),
        };
        self.effects.commit(effects, &mut scope).await;

        if identity_reset {
            self.state.retain_paths(&identity_paths);
        }
    }

    async fn dispatch_input(&mut self, event: KeyEvent) {
        if self.unmounted {
            return;
        }

        // Ctrl-C / Ctrl-D exit before user handlers ever see the event.
        if self.exit_on_ctrl_c
            && matches!(event, KeyEvent::CtrlC | KeyEvent::CtrlD)
        {
            self.unmount(ExitStatus::success()).await;
            return;
        }

        // Tab / Shift-Tab drive focus traversal when focusables exist.
        if !self.focus.is_empty() && (event.is_tab() || event.is_back_tab()) {
            let moved = if event.is_tab() {
                self.focus.focus_next()
            } else {
                self.focus.focus_previous()
            };
            if moved {
                self.render_frame().await;
            }
            return;
        }

        let handlers = self.inputs.snapshot();
        let focused = self.focus.focused_path().map(String::from);
        let gate_on_focus = !self.focus.is_empty();
        for entry in handlers {
            if !entry.active {
                continue;
            }
            let deliver = !gate_on_focus
                || !entry.requires_focus
                || focused.as_deref() == Some(entry.identity_path.as_str());
            if deliver {
                (entry.handler)(&event);
            }
        }
    }

    async fn unmount(&mut self, status: ExitStatus) {
        if self.unmounted {
            return;
        }
        self.unmounted = true;

        // Signal handlers first (clears the process-wide slot), then input.
        self.signals = None;
        if let Some(reader) = self.input_reader.take() {
            reader.stop();
        }

        // Run every remaining effect cleanup.
        self.effects.cleanup_all();

        // Restore the console fds before the final writes so late log lines
        // go to the real terminal.
        if let Some(mut console) = self.console.take() {
            console.stop();
        }

        if self.bracketed_paste {
            self.writer.write(DISABLE_BRACKETED_PASTE);
        }
        self.reconciler.teardown().await;
        if let Err(error) = self.writer.flush().await {
            tracing::warn!(%error, "final flush failed");
        }
        self.writer.shutdown().await;

        if let Some(mut raw_mode) = self.raw_mode.take() {
            raw_mode.restore();
        }

        {
            let mut slot = self.exit.status.lock().unwrap();
            if slot.is_none() {
                *slot = Some(status);
            }
        }
        self.exit.notify.notify_waiters();
        tracing::info!("session unmounted");
    }
}
