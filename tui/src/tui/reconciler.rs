// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Frame reconciler: decides *how* to paint (full redraw vs per-line delta),
//! coalesces bursts of frames, enforces the frame-rate cap, and owns the
//! current/pending grid pair.
//!
//! The reconciler is a serialized actor. `render(grid)` replaces the pending
//! grid and (re)schedules a coalesced update one window (16 ms) later, so a
//! burst of updates collapses into one paint of the latest grid. At commit
//! time the frame-rate cap is enforced by sleeping out the remainder of
//! `1/fps` since the previous commit.
//!
//! Strategy selection is a pure function ([`decide_strategy`]) so it stays
//! deterministic and testable: identical inputs produce the identical
//! strategy and, through the renderer, the identical byte stream.

use std::sync::{
    Arc, Mutex as StdMutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{
    OutputWriter, RenderStats, RenderStrategy, Renderer, RuntimeError, TerminalGrid,
    estimate_delta_bytes, estimate_full_bytes,
};

/// Fraction of changed rows beyond which a full redraw wins outright.
const CHANGE_PCT_FULL_REDRAW: f64 = 0.70;
/// Periodic full-redraw triggers: frame count, wall-clock, quality floor.
const PERIODIC_FULL_FRAMES: u64 = 100;
const PERIODIC_FULL_SECS: f64 = 30.0;
const QUALITY_FLOOR: f64 = 0.7;
const QUALITY_CEILING: f64 = 0.9;
/// Adaptive delta-threshold tuning step sizes and clamp range.
const THRESHOLD_RAISE: f64 = 0.05;
const THRESHOLD_LOWER: f64 = 0.02;
const THRESHOLD_MIN: f64 = 0.05;
const THRESHOLD_MAX: f64 = 0.60;
const QUALITY_EMA_RATE: f64 = 0.10;

/// Configured rendering mode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Automatic,
    FullRedraw,
    LineDiff,
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub mode: RenderMode,
    /// Frames per second cap.
    pub max_frame_rate: u32,
    pub coalescing_window: Duration,
    pub use_alternate_screen: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Automatic,
            max_frame_rate: 60,
            coalescing_window: Duration::from_millis(16),
            use_alternate_screen: false,
        }
    }
}

/// Everything [`decide_strategy`] looks at. Gathering this into a plain
/// struct keeps the decision pure and the determinism property checkable.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyInputs {
    pub force_full_redraw: bool,
    pub mode: RenderMode,
    pub has_current_grid: bool,
    pub dimensions_differ: bool,
    pub changed_lines: usize,
    pub total_lines: usize,
    pub grid_size: crate::Size,
    pub delta_threshold: f64,
    pub frames_since_full_redraw: u64,
    pub seconds_since_full_redraw: f64,
    pub adaptive_quality: f64,
}

/// Pick the rendering strategy. Order matters and follows the contract:
/// forced/missing grid, configured mode, automatic heuristics, then the
/// periodic full-redraw upgrade applied to a delta decision.
#[must_use]
pub fn decide_strategy(inputs: &StrategyInputs) -> RenderStrategy {
    let decision = decide_before_periodic(inputs);
    if decision == RenderStrategy::Delta && periodic_full_due(inputs) {
        return RenderStrategy::FullRedraw;
    }
    decision
}

fn decide_before_periodic(inputs: &StrategyInputs) -> RenderStrategy {
    if inputs.force_full_redraw || !inputs.has_current_grid {
        return RenderStrategy::FullRedraw;
    }
    match inputs.mode {
        RenderMode::FullRedraw => RenderStrategy::FullRedraw,
        RenderMode::LineDiff => RenderStrategy::Delta,
        RenderMode::Automatic => {
            if inputs.dimensions_differ {
                return RenderStrategy::FullRedraw;
            }
            let change_pct = if inputs.total_lines == 0 {
                0.0
            } else {
                inputs.changed_lines as f64 / inputs.total_lines as f64
            };
            if change_pct > CHANGE_PCT_FULL_REDRAW {
                return RenderStrategy::FullRedraw;
            }
            let estimated_delta =
                estimate_delta_bytes(inputs.changed_lines, inputs.grid_size) as f64;
            let estimated_full = estimate_full_bytes(inputs.grid_size) as f64;
            if estimated_delta >= (1.0 - inputs.delta_threshold) * estimated_full {
                return RenderStrategy::FullRedraw;
            }
            RenderStrategy::Delta
        }
    }
}

fn periodic_full_due(inputs: &StrategyInputs) -> bool {
    inputs.frames_since_full_redraw >= PERIODIC_FULL_FRAMES
        || inputs.seconds_since_full_redraw >= PERIODIC_FULL_SECS
        || inputs.adaptive_quality < QUALITY_FLOOR
}

enum ReconcilerMsg {
    Render(Arc<TerminalGrid>),
    ForceFullNext,
    Teardown(oneshot::Sender<()>),
}

/// Shared observability counters; cheap to read from any task.
#[derive(Debug, Default)]
struct ReconcilerShared {
    last_stats: StdMutex<Option<RenderStats>>,
    commit_count: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Cloneable handle to the reconciler actor.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct Reconciler {
    tx: mpsc::UnboundedSender<ReconcilerMsg>,
    shared: Arc<ReconcilerShared>,
}

impl Reconciler {
    /// Spawn the actor. Fatal render failures (a delta *and* its full-redraw
    /// fallback both failing) are reported on `fatal_tx`; the session reacts
    /// by recording an exit status and unmounting.
    #[must_use]
    pub fn spawn(
        writer: OutputWriter,
        config: ReconcilerConfig,
        fatal_tx: mpsc::UnboundedSender<RuntimeError>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ReconcilerShared::default());
        let task = ReconcilerTask {
            writer,
            renderer: Renderer::new(config.use_alternate_screen),
            config,
            fatal_tx,
            shared: shared.clone(),
            current_grid: None,
            pending_grid: None,
            force_full: false,
            frames_since_full: 0,
            last_full_at: Instant::now(),
            last_commit_at: None,
            last_render_duration: None,
            delta_threshold: 0.30,
            adaptive_quality: 1.0,
        };
        tokio::spawn(task.run(rx));
        Self { tx, shared }
    }

    /// Submit a frame. Replaces any pending grid and (re)schedules the
    /// coalesced update.
    pub fn render(&self, grid: Arc<TerminalGrid>) {
        let _unused = self.tx.send(ReconcilerMsg::Render(grid));
    }

    /// Force the next commit to repaint fully (used on resize, console-lane
    /// output, and identity resets).
    pub fn force_full_next(&self) {
        let _unused = self.tx.send(ReconcilerMsg::ForceFullNext);
    }

    /// Emit terminal-restoring sequences and stop the actor.
    pub async fn teardown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(ReconcilerMsg::Teardown(reply_tx)).is_ok() {
            let _unused = reply_rx.await;
        }
    }

    #[must_use]
    pub fn last_stats(&self) -> Option<RenderStats> {
        self.shared.last_stats.lock().unwrap().clone()
    }

    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.shared.commit_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn frames_dropped(&self) -> u64 {
        self.shared.frames_dropped.load(Ordering::Relaxed)
    }
}

struct ReconcilerTask {
    writer: OutputWriter,
    renderer: Renderer,
    config: ReconcilerConfig,
    fatal_tx: mpsc::UnboundedSender<RuntimeError>,
    shared: Arc<ReconcilerShared>,
    current_grid: Option<Arc<TerminalGrid>>,
    pending_grid: Option<Arc<TerminalGrid>>,
    force_full: bool,
    frames_since_full: u64,
    last_full_at: Instant,
    last_commit_at: Option<Instant>,
    last_render_duration: Option<Duration>,
    delta_threshold: f64,
    adaptive_quality: f64,
}

impl ReconcilerTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ReconcilerMsg>) {
        let mut deadline: Option<Instant> = None;

        loop {
            let scheduled = deadline;
            let sleep_until = async move {
                match scheduled {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                maybe_msg = rx.recv() => match maybe_msg {
                    None => break,
                    Some(ReconcilerMsg::Render(grid)) => {
                        self.pending_grid = Some(grid);
                        // Replaces any earlier scheduled update.
                        deadline = Some(Instant::now() + self.config.coalescing_window);
                    }
                    Some(ReconcilerMsg::ForceFullNext) => self.force_full = true,
                    Some(ReconcilerMsg::Teardown(reply)) => {
                        let bytes = self.renderer.teardown();
                        if let Err(error) = self.writer.write_atomic(bytes).await {
                            tracing::warn!(%error, "teardown write failed");
                        }
                        let _unused = reply.send(());
                        break;
                    }
                },
                () = sleep_until => {
                    deadline = None;
                    self.perform_coalesced_update().await;
                }
            }
        }
    }

    async fn perform_coalesced_update(&mut self) {
        // Backpressure: a render that blew well past the window means the
        // terminal can't keep up; skip this frame entirely.
        if let Some(duration) = self.last_render_duration
            && duration > 2 * self.config.coalescing_window
        {
            self.last_render_duration = None;
            if self.pending_grid.take().is_some() {
                self.shared.frames_dropped.fetch_add(1, Ordering::Relaxed);
            }
            return;
        }

        let Some(grid) = self.pending_grid.take() else {
            return;
        };

        // Frame-rate cap: sleep out the remainder of 1/fps since the last
        // commit.
        if let Some(last_commit) = self.last_commit_at {
            let min_gap = Duration::from_secs_f64(
                1.0 / f64::from(self.config.max_frame_rate.max(1)),
            );
            let elapsed = last_commit.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }

        self.commit(grid).await;
    }

    async fn commit(&mut self, grid: Arc<TerminalGrid>) {
        let started = Instant::now();

        let inputs = self.strategy_inputs(&grid);
        let mut strategy = decide_strategy(&inputs);
        let (bytes, mut painted) = self.renderer.render(
            &grid,
            self.current_grid.as_deref(),
            strategy,
        );
        let mut byte_count = bytes.len();

        if let Err(error) = self.writer.write_atomic(bytes).await {
            tracing::warn!(%error, "delta render failed; forcing full redraw");
            strategy = RenderStrategy::FullRedraw;
            let (bytes, repainted) = self.renderer.render(&grid, None, strategy);
            painted = repainted;
            byte_count = bytes.len();
            if let Err(error) = self.writer.write_atomic(bytes).await {
                tracing::error!(%error, "full redraw fallback failed; giving up");
                let _unused = self
                    .fatal_tx
                    .send(RuntimeError::Io(std::io::Error::other(error.to_string())));
                return;
            }
        }

        let duration = started.elapsed();
        let total_lines = grid.size().row_count.as_usize();

        if strategy == RenderStrategy::FullRedraw {
            self.frames_since_full = 0;
            self.last_full_at = Instant::now();
        } else {
            self.frames_since_full += 1;
        }
        self.force_full = false;
        self.current_grid = Some(grid);
        self.last_commit_at = Some(Instant::now());
        self.last_render_duration = Some(duration);
        self.tune_adaptive_thresholds(duration);

        let stats = RenderStats {
            bytes_written: byte_count,
            changed_lines: painted,
            total_lines,
            strategy,
            duration,
        };
        tracing::debug!(
            ?strategy,
            changed = painted,
            total = total_lines,
            ?duration,
            "frame committed"
        );
        *self.shared.last_stats.lock().unwrap() = Some(stats);
        self.shared.commit_count.fetch_add(1, Ordering::Relaxed);
    }

    fn strategy_inputs(&self, next: &TerminalGrid) -> StrategyInputs {
        let (dimensions_differ, changed_lines) = match self.current_grid.as_deref() {
            Some(current) => (
                current.size() != next.size(),
                next.changed_lines(current).len(),
            ),
            None => (false, next.size().row_count.as_usize()),
        };
        StrategyInputs {
            force_full_redraw: self.force_full,
            mode: self.config.mode,
            has_current_grid: self.current_grid.is_some(),
            dimensions_differ,
            changed_lines,
            total_lines: next.size().row_count.as_usize(),
            grid_size: next.size(),
            delta_threshold: self.delta_threshold,
            frames_since_full_redraw: self.frames_since_full,
            seconds_since_full_redraw: self.last_full_at.elapsed().as_secs_f64(),
            adaptive_quality: self.adaptive_quality,
        }
    }

    /// Per-frame quality is `1 − min(1, duration / target_interval)`, folded
    /// into an EMA; poor quality raises the delta threshold (prefer full
    /// redraws less often), good quality lowers it.
    fn tune_adaptive_thresholds(&mut self, duration: Duration) {
        let target_interval =
            1.0 / f64::from(self.config.max_frame_rate.max(1));
        let frame_quality =
            1.0 - (duration.as_secs_f64() / target_interval).min(1.0);
        self.adaptive_quality = self.adaptive_quality * (1.0 - QUALITY_EMA_RATE)
            + frame_quality * QUALITY_EMA_RATE;

        if self.adaptive_quality < QUALITY_FLOOR {
            self.delta_threshold =
                (self.delta_threshold + THRESHOLD_RAISE).min(THRESHOLD_MAX);
        } else if self.adaptive_quality > QUALITY_CEILING {
            self.delta_threshold =
                (self.delta_threshold - THRESHOLD_LOWER).max(THRESHOLD_MIN);
        }
    }
}
