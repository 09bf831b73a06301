//! Continuous capture driven by a periodic host callback.
//!
//! The host calls [`CaptureScheduler::tick`] roughly once per display
//! refresh. A tick only captures when at least `1 / target_fps` has passed
//! since the previous attempt; otherwise it returns immediately. Captures
//! run to completion inside the tick and are never interleaved.
//!
//! Cancellation is cooperative: a [`StopHandle`] sets a flag that is
//! checked at the top of every tick, so a stop takes effect before the next
//! capture and never in the middle of one.
//!
//! ```no_run
//! # use std::time::Duration;
//! # use tilecap_core::{CaptureEngine, CaptureScheduler, CaptureResult, FrameSource};
//! # async fn example(mut source: impl FrameSource) {
//! let mut scheduler = CaptureScheduler::new(CaptureEngine::default());
//! let stop = scheduler.stop_handle();
//! let mut sink = |result: &CaptureResult| {
//!     println!("{} regions", result.regions.len());
//!     if result.sequence >= 100 {
//!         stop.stop();
//!     }
//! };
//! scheduler.run(&mut source, &mut sink, Duration::from_millis(16)).await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::clamp_fps;
use crate::engine::CaptureEngine;
use crate::error::CaptureError;
use crate::frame::FrameBuffer;
use crate::result::CaptureResult;

// ── FrameSource ──────────────────────────────────────────────────

/// Synchronous pull of the most recently presented frame.
///
/// The returned buffer borrows the source, so it is only valid until the
/// next call; the engine copies whatever it needs to keep.
pub trait FrameSource {
    fn frame(&mut self) -> Result<FrameBuffer<'_>, CaptureError>;
}

// ── CaptureSink ──────────────────────────────────────────────────

/// Consumer of capture results.
pub trait CaptureSink {
    fn on_capture(&mut self, result: &CaptureResult);

    /// Called when the frame source fails for one tick. The scheduler
    /// carries on with the next tick either way.
    fn on_error(&mut self, error: &CaptureError) {
        warn!("capture skipped: {error}");
    }
}

impl<F> CaptureSink for F
where
    F: FnMut(&CaptureResult),
{
    fn on_capture(&mut self, result: &CaptureResult) {
        self(result)
    }
}

// ── StopHandle ───────────────────────────────────────────────────

/// Cloneable cancellation flag for a [`CaptureScheduler`].
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the scheduler to stop before its next capture.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── TickOutcome ──────────────────────────────────────────────────

/// What a single [`CaptureScheduler::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The stop flag was set; nothing was captured.
    Stopped,
    /// Too early for the next capture.
    Idle,
    /// Captured, nothing changed, consumer not called.
    Unchanged,
    /// Captured and handed to the consumer.
    Delivered,
    /// The frame source failed; the error went to the consumer.
    SourceFailed,
}

// ── CaptureScheduler ─────────────────────────────────────────────

/// fps-gated driver around a [`CaptureEngine`].
///
/// Owns the engine; use [`engine_mut`](Self::engine_mut) between ticks to
/// invalidate or retile it. Rate and skip policy are read from the engine's
/// [`CaptureConfig`](crate::config::CaptureConfig) on every tick.
#[derive(Debug)]
pub struct CaptureScheduler {
    engine: CaptureEngine,
    last_attempt: Option<Instant>,
    stop: StopHandle,
}

impl CaptureScheduler {
    /// Wrap `engine`, taking rate and skip policy from its config.
    pub fn new(engine: CaptureEngine) -> Self {
        Self {
            engine,
            last_attempt: None,
            stop: StopHandle::default(),
        }
    }

    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CaptureEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> CaptureEngine {
        self.engine
    }

    /// A handle that stops this scheduler from anywhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Minimum time between two capture attempts.
    pub fn interval(&self) -> Duration {
        frame_interval(self.engine.config().target_fps)
    }

    /// Change the capture rate, clamped to `[1, 240]`. Returns the rate
    /// applied.
    pub fn set_target_fps(&mut self, fps: u32) -> u32 {
        self.engine.set_target_fps(fps)
    }

    pub fn set_skip_unchanged(&mut self, skip: bool) {
        self.engine.set_skip_unchanged(skip);
    }

    /// One host callback.
    ///
    /// A failed frame pull counts as an attempt, so the next try waits a
    /// full interval.
    pub fn tick<S, K>(&mut self, now: Instant, source: &mut S, sink: &mut K) -> TickOutcome
    where
        S: FrameSource + ?Sized,
        K: CaptureSink + ?Sized,
    {
        if self.stop.is_stopped() {
            return TickOutcome::Stopped;
        }
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.interval() {
                return TickOutcome::Idle;
            }
        }
        self.last_attempt = Some(now);

        match self.engine.capture_from(source) {
            Ok(result) if self.engine.config().skip_unchanged && !result.has_changes() => {
                TickOutcome::Unchanged
            }
            Ok(result) => {
                sink.on_capture(&result);
                TickOutcome::Delivered
            }
            Err(e) => {
                sink.on_error(&e);
                TickOutcome::SourceFailed
            }
        }
    }

    /// Drive [`tick`](Self::tick) from a timer firing every
    /// `refresh_interval` until the stop handle is triggered.
    ///
    /// Runs entirely on the calling task; intended for a current-thread
    /// runtime. Missed timer ticks are skipped, not replayed.
    pub async fn run<S, K>(&mut self, source: &mut S, sink: &mut K, refresh_interval: Duration)
    where
        S: FrameSource + ?Sized,
        K: CaptureSink + ?Sized,
    {
        let mut ticker = tokio::time::interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let now = ticker.tick().await.into_std();
            if self.tick(now, source, sink) == TickOutcome::Stopped {
                debug!("continuous capture stopped");
                break;
            }
        }
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / clamp_fps(fps) as f64)
}

// ── Tests ────────────────────────────────────────────────────────
