// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Serialized, batched, backpressured terminal output.
//!
//! A single actor task owns the output device; every producer goes through
//! the same mpsc channel, so bytes reach the fd in order of acceptance no
//! matter how many tasks write. Buffered writes merge until `buffer_size` is
//! reached or an atomic write forces a flush; each underlying `write_all`
//! bumps the syscall counter once.
//!
//! Buffered write failures are swallowed into a metric and logged — a
//! rendering runtime must not crash because one frame hit `EIO` — while
//! [`OutputWriter::write_atomic`] reports its result so the reconciler can
//! fall back to a full redraw.

use std::io::Write as _;
use std::sync::{
    Arc, Mutex as StdMutex,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{mpsc, oneshot};

use crate::{CommonResult, RuntimeError};

/// Raw terminal resource shared with the writer task. Teacher-style device:
/// cheap to clone, lockable, mockable for tests.
pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<Box<SendRawTerminal>>>;

/// The sink the writer drains into.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    pub is_mock: bool,
}

impl OutputDevice {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(Box::new(std::io::stdout()))),
            is_mock: false,
        }
    }

    #[must_use]
    pub fn new_stderr() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(Box::new(std::io::stderr()))),
            is_mock: false,
        }
    }

    /// An in-memory device for tests; the returned buffer observes every
    /// byte that reached the "terminal".
    #[must_use]
    pub fn new_mock() -> (Self, Arc<StdMutex<Vec<u8>>>) {
        #[derive(Clone)]
        struct MockSink(Arc<StdMutex<Vec<u8>>>);
        impl std::io::Write for MockSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
        }
        let buffer = Arc::new(StdMutex::new(Vec::new()));
        let device = Self {
            resource: Arc::new(StdMutex::new(Box::new(MockSink(buffer.clone())))),
            is_mock: true,
        };
        (device, buffer)
    }
}

/// What to do when `buffered + incoming` would exceed `max_buffered_bytes`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Drop the incoming bytes (default).
    #[default]
    DropNewest,
    /// Discard the buffer, then append the incoming bytes.
    DropOldest,
    /// Flush synchronously; if the incoming bytes still don't fit, fall back
    /// to dropping oldest.
    Block,
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Merge threshold: buffered bytes flush once this is reached.
    pub buffer_size: usize,
    /// Hard cap on buffered bytes; see [`BackpressurePolicy`]. Single writes
    /// larger than this bypass the buffer entirely.
    pub max_buffered_bytes: usize,
    pub policy: BackpressurePolicy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8 * 1024,
            max_buffered_bytes: 64 * 1024,
            policy: BackpressurePolicy::default(),
        }
    }
}

/// Counters exposed by [`OutputWriter::metrics`].
#[derive(Debug, Default)]
pub struct WriterMetrics {
    pub write_syscalls: AtomicU64,
    pub bytes_written: AtomicU64,
    pub dropped_messages: AtomicU64,
}

/// Point-in-time snapshot of [`WriterMetrics`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WriterMetricsSnapshot {
    pub write_syscalls: u64,
    pub bytes_written: u64,
    pub dropped_messages: u64,
}

enum WriterMsg {
    Write(Vec<u8>),
    WriteAtomic(Vec<u8>, oneshot::Sender<std::io::Result<()>>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to the writer actor.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputWriter {
    tx: mpsc::UnboundedSender<WriterMsg>,
    metrics: Arc<WriterMetrics>,
}

impl OutputWriter {
    /// Spawn the writer task draining into `device`.
    #[must_use]
    pub fn spawn(device: OutputDevice, config: WriterConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(WriterMetrics::default());
        let task_metrics = metrics.clone();
        tokio::spawn(writer_task(device, config, rx, task_metrics));
        Self { tx, metrics }
    }

    /// Buffered write. Never fails from the caller's point of view; sink
    /// errors become metrics.
    pub fn write(&self, bytes: impl Into<Vec<u8>>) {
        if self.tx.send(WriterMsg::Write(bytes.into())).is_err() {
            self.metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Flush the buffer, then issue `bytes` as one single write. Reports the
    /// sink error, which is how the reconciler notices a dead terminal.
    pub async fn write_atomic(&self, bytes: impl Into<Vec<u8>>) -> CommonResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterMsg::WriteAtomic(bytes.into(), reply_tx))
            .map_err(|_| RuntimeError::WriterClosed)?;
        let result = reply_rx.await.map_err(|_| RuntimeError::WriterClosed)?;
        result.map_err(|e| RuntimeError::Io(e).into())
    }

    /// Flush buffered bytes to the sink.
    pub async fn flush(&self) -> CommonResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterMsg::Flush(reply_tx))
            .map_err(|_| RuntimeError::WriterClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::WriterClosed)?;
        Ok(())
    }

    /// Flush and stop the actor. Idempotent: a second call is a no-op error
    /// swallowed internally.
    pub async fn shutdown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(WriterMsg::Shutdown(reply_tx)).is_ok() {
            let _unused = reply_rx.await;
        }
    }

    #[must_use]
    pub fn metrics(&self) -> WriterMetricsSnapshot {
        WriterMetricsSnapshot {
            write_syscalls: self.metrics.write_syscalls.load(Ordering::Relaxed),
            bytes_written: self.metrics.bytes_written.load(Ordering::Relaxed),
            dropped_messages: self.metrics.dropped_messages.load(Ordering::Relaxed),
        }
    }
}

async fn writer_task(
    device: OutputDevice,
    config: WriterConfig,
    mut rx: mpsc::UnboundedReceiver<WriterMsg>,
    metrics: Arc<WriterMetrics>,
) {
    let mut buffer: Vec<u8> = Vec::with_capacity(config.buffer_size);

    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMsg::Write(bytes) => {
                handle_buffered_write(&device, &config, &metrics, &mut buffer, bytes);
            }
            WriterMsg::WriteAtomic(bytes, reply) => {
                let flushed = flush_buffer(&device, &metrics, &mut buffer);
                let written = sink_write(&device, &metrics, &bytes);
                let _unused = reply.send(flushed.and(written));
            }
            WriterMsg::Flush(reply) => {
                if let Err(error) = flush_buffer(&device, &metrics, &mut buffer) {
                    tracing::warn!(%error, "output flush failed");
                    metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
                }
                let _unused = reply.send(());
            }
            WriterMsg::Shutdown(reply) => {
                if let Err(error) = flush_buffer(&device, &metrics, &mut buffer) {
                    tracing::warn!(%error, "final flush failed during shutdown");
                }
                let _unused = reply.send(());
                break;
            }
        }
    }
}

fn handle_buffered_write(
    device: &OutputDevice,
    config: &WriterConfig,
    metrics: &Arc<WriterMetrics>,
    buffer: &mut Vec<u8>,
    bytes: Vec<u8>,
) {
    // Oversized single writes bypass the buffer.
    if bytes.len() > config.max_buffered_bytes {
        swallow(metrics, flush_buffer(device, metrics, buffer));
        swallow(metrics, sink_write(device, metrics, &bytes));
        return;
    }

    if buffer.len() + bytes.len() > config.max_buffered_bytes {
        match config.policy {
            BackpressurePolicy::DropNewest => {
                metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
                return;
            }
            BackpressurePolicy::DropOldest => {
                buffer.clear();
                metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
            }
            BackpressurePolicy::Block => {
                swallow(metrics, flush_buffer(device, metrics, buffer));
                if bytes.len() > config.max_buffered_bytes {
                    buffer.clear();
                    metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    buffer.extend_from_slice(&bytes);
    if buffer.len() >= config.buffer_size {
        swallow(metrics, flush_buffer(device, metrics, buffer));
    }
}

fn swallow(metrics: &Arc<WriterMetrics>, result: std::io::Result<()>) {
    if let Err(error) = result {
        tracing::warn!(%error, "buffered terminal write failed");
        metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
    }
}

fn flush_buffer(
    device: &OutputDevice,
    metrics: &Arc<WriterMetrics>,
    buffer: &mut Vec<u8>,
) -> std::io::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let result = sink_write(device, metrics, buffer);
    buffer.clear();
    result
}

fn sink_write(
    device: &OutputDevice,
    metrics: &Arc<WriterMetrics>,
    bytes: &[u8],
) -> std::io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    let mut sink = device
        .resource
        .lock()
        .map_err(|_| std::io::Error::other("output device poisoned"))?;
    sink.write_all(bytes)?;
    sink.flush()?;
    metrics.write_syscalls.fetch_add(1, Ordering::Relaxed);
    metrics
        .bytes_written
        .fetch_add(bytes.len() as u64, Ordering::Relaxed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(buffer: &Arc<StdMutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    #[tokio::test]
    async fn test_writes_linearized_in_submission_order() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(device, WriterConfig::default());
        for index in 0..10 {
            writer.write(format!("{index};"));
        }
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "0;1;2;3;4;5;6;7;8;9;");
    }

    #[tokio::test]
    async fn test_buffered_writes_merge_into_one_syscall() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(device, WriterConfig::default());
        writer.write("aa");
        writer.write("bb");
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "aabb");
        assert_eq!(writer.metrics().write_syscalls, 1);
        assert_eq!(writer.metrics().bytes_written, 4);
    }

    #[tokio::test]
    async fn test_atomic_write_flushes_then_writes_once() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(device, WriterConfig::default());
        writer.write("buffered");
        writer.write_atomic("atomic").await.unwrap();
        assert_eq!(read(&observed), "bufferedatomic");
        assert_eq!(writer.metrics().write_syscalls, 2);
    }

    #[tokio::test]
    async fn test_buffer_size_threshold_triggers_flush() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(
            device,
            WriterConfig {
                buffer_size: 4,
                ..WriterConfig::default()
            },
        );
        writer.write("abcd");
        // Reaching buffer_size flushes without an explicit flush() call. The
        // flush below only synchronizes the assertion.
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "abcd");
        assert_eq!(writer.metrics().write_syscalls, 1);
    }

    #[tokio::test]
    async fn test_drop_newest_policy() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(
            device,
            WriterConfig {
                buffer_size: 1024,
                max_buffered_bytes: 4,
                policy: BackpressurePolicy::DropNewest,
            },
        );
        writer.write("abcd");
        writer.write("xyz"); // 4 + 3 > 4: dropped.
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "abcd");
        assert_eq!(writer.metrics().dropped_messages, 1);
    }

    #[tokio::test]
    async fn test_drop_oldest_policy() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(
            device,
            WriterConfig {
                buffer_size: 1024,
                max_buffered_bytes: 4,
                policy: BackpressurePolicy::DropOldest,
            },
        );
        writer.write("abcd");
        writer.write("xyz"); // buffer discarded, then appended.
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "xyz");
        assert_eq!(writer.metrics().dropped_messages, 1);
    }

    #[tokio::test]
    async fn test_block_policy_flushes_instead_of_dropping() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(
            device,
            WriterConfig {
                buffer_size: 1024,
                max_buffered_bytes: 4,
                policy: BackpressurePolicy::Block,
            },
        );
        writer.write("abcd");
        writer.write("xyz");
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "abcdxyz");
        assert_eq!(writer.metrics().dropped_messages, 0);
    }

    #[tokio::test]
    async fn test_oversized_write_bypasses_buffer() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(
            device,
            WriterConfig {
                buffer_size: 2,
                max_buffered_bytes: 4,
                policy: BackpressurePolicy::DropNewest,
            },
        );
        writer.write("way past the cap");
        writer.flush().await.unwrap();
        assert_eq!(read(&observed), "way past the cap");
    }

    #[tokio::test]
    async fn test_shutdown_flushes() {
        let (device, observed) = OutputDevice::new_mock();
        let writer = OutputWriter::spawn(device, WriterConfig::default());
        writer.write("tail");
        writer.shutdown().await;
        assert_eq!(read(&observed), "tail");
        // Idempotent.
        writer.shutdown().await;
    }
}
