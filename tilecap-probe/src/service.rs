//! Probe run loop.
//!
//! Wires the synthetic overlay into a [`CaptureScheduler`], optionally
//! records every delivered batch to disk, and stops on a batch limit, a
//! time limit, or an external stop request.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use tilecap_core::{
    CaptureEngine, CaptureError, CaptureResult, CaptureScheduler, CaptureSink, RollingStats,
    StopHandle,
};

use crate::config::ProbeConfig;
use crate::source::SyntheticOverlay;

// ── BatchRecorder ────────────────────────────────────────────────

/// Sink that counts batches, appends them to an optional file as
/// `[u32 little-endian length | bincode batch]`, and stops the scheduler
/// once `limit` batches have been delivered.
pub struct BatchRecorder {
    writer: Option<BufWriter<File>>,
    delivered: u64,
    failures: u64,
    limit: u64,
    stop: StopHandle,
}

impl BatchRecorder {
    pub fn new(writer: Option<BufWriter<File>>, limit: u64, stop: StopHandle) -> Self {
        Self {
            writer,
            delivered: 0,
            failures: 0,
            limit,
            stop,
        }
    }

    /// Open `path` for appending batches.
    pub fn open(path: &Path, limit: u64, stop: StopHandle) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Some(BufWriter::new(file)), limit, stop))
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Flush any buffered batches.
    pub fn finish(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }

    fn write_batch(&mut self, result: &CaptureResult) -> Result<(), CaptureError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let batch = result.to_bytes()?;
        let len = u32::try_from(batch.len())
            .map_err(|_| CaptureError::Encoding(format!("batch of {} bytes", batch.len())))?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&batch)?;
        Ok(())
    }
}

impl CaptureSink for BatchRecorder {
    fn on_capture(&mut self, result: &CaptureResult) {
        self.delivered += 1;
        debug!(
            "batch #{}: {} regions, {:.1}% dirty, {} bytes{}",
            result.sequence,
            result.regions.len(),
            result.dirty_percent,
            result.total_bytes,
            if result.full_refresh { " (full refresh)" } else { "" }
        );

        if let Err(e) = self.write_batch(result) {
            error!("failed to record batch #{}: {e}; stopping", result.sequence);
            self.writer = None;
            self.stop.stop();
            return;
        }

        if self.limit > 0 && self.delivered >= self.limit {
            info!("batch limit {} reached", self.limit);
            self.stop.stop();
        }
    }

    fn on_error(&mut self, error: &CaptureError) {
        self.failures += 1;
        warn!("frame skipped: {error}");
    }
}

// ── ProbeService ─────────────────────────────────────────────────

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub delivered: u64,
    pub failures: u64,
    pub pulls: u64,
    pub stats: RollingStats,
}

/// The top-level probe service.
pub struct ProbeService {
    config: ProbeConfig,
    stop: StopHandle,
    scheduler: CaptureScheduler,
}

impl ProbeService {
    pub fn new(config: ProbeConfig) -> Self {
        let scheduler = CaptureScheduler::new(CaptureEngine::new(config.capture_config()));
        Self {
            stop: scheduler.stop_handle(),
            config,
            scheduler,
        }
    }

    /// A handle that stops the run before its next capture.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run continuous capture until a limit is hit or the handle is
    /// triggered.
    pub async fn run(&mut self) -> Result<ProbeReport, Box<dyn std::error::Error>> {
        let mut source = SyntheticOverlay::new(self.config.source.clone());

        let path = self.config.run.record_path.trim();
        let mut sink = if path.is_empty() {
            BatchRecorder::new(None, self.config.run.max_captures, self.stop.clone())
        } else {
            info!("recording batches to {path}");
            BatchRecorder::open(Path::new(path), self.config.run.max_captures, self.stop.clone())?
        };

        let deadline = match self.config.run.duration_secs {
            0 => None,
            secs => {
                let stop = self.stop.clone();
                Some(tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    info!("run duration of {secs}s elapsed");
                    stop.stop();
                }))
            }
        };

        self.scheduler
            .run(&mut source, &mut sink, self.config.refresh_interval())
            .await;

        if let Some(handle) = deadline {
            handle.abort();
        }
        sink.finish()?;

        Ok(ProbeReport {
            delivered: sink.delivered(),
            failures: sink.failures(),
            pulls: source.pulls(),
            stats: self.scheduler.engine().stats(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
