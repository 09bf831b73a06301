//! Per-capture diagnostics and tuning advice.
//!
//! Keeps the last [`WINDOW`] samples for moving averages and unbounded
//! lifetime counters for the transparent-tile savings.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of captures the moving averages cover.
pub const WINDOW: usize = 60;

/// Dirty share above which larger tiles or a lower rate pay off.
const HIGH_DIRTY_PERCENT: f64 = 50.0;
/// Dirty share below which smaller tiles give finer updates.
const LOW_DIRTY_PERCENT: f64 = 5.0;

// ── CaptureSample ────────────────────────────────────────────────

/// Measurements of a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureSample {
    /// Wall time of the whole capture.
    pub total: Duration,
    /// Classification phase.
    pub compare: Duration,
    /// Merge phase.
    pub merge: Duration,
    /// Payload extraction phase.
    pub extract: Duration,
    pub dirty_count: usize,
    pub dirty_percent: f64,
    pub region_count: usize,
    /// Payload bytes emitted.
    pub bytes: usize,
    pub transparent_tiles: usize,
    /// `width * height * 4` summed over transparent regions, using the
    /// clipped region size, so partial edge tiles count only their pixels.
    pub transparent_saved: usize,
}

// ── Recommendation ───────────────────────────────────────────────

/// Tuning advice derived from the latest capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Most of the frame changes every capture.
    LargerTilesOrLowerRate,
    /// Changes are small and sparse.
    SmallerTiles,
    Optimal,
}

impl Recommendation {
    fn from_latest(sample: Option<&CaptureSample>) -> Self {
        match sample {
            Some(s) if s.dirty_percent > HIGH_DIRTY_PERCENT => Self::LargerTilesOrLowerRate,
            Some(s) if s.dirty_percent < LOW_DIRTY_PERCENT && s.dirty_count > 0 => {
                Self::SmallerTiles
            }
            _ => Self::Optimal,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LargerTilesOrLowerRate => {
                "high dirty ratio: consider a larger tile size or a lower capture rate"
            }
            Self::SmallerTiles => "low dirty ratio: consider a smaller tile size for finer granularity",
            Self::Optimal => "current settings are optimal",
        })
    }
}

// ── RollingStats ─────────────────────────────────────────────────

/// Point-in-time view of the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    /// Samples in the moving window (at most [`WINDOW`]).
    pub samples: usize,
    pub avg_total_ms: f64,
    pub avg_compare_ms: f64,
    pub avg_extract_ms: f64,
    pub avg_dirty_percent: f64,
    pub avg_bytes: f64,
    pub last_total_ms: f64,
    pub last_dirty_percent: f64,
    pub last_bytes: usize,
    pub last_region_count: usize,
    pub lifetime_captures: u64,
    pub lifetime_bytes: u64,
    pub lifetime_transparent_skipped: u64,
    pub lifetime_transparent_saved: u64,
    pub recommendation: Recommendation,
}

// ── DiagnosticsCollector ─────────────────────────────────────────

/// Rolling-window capture statistics.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsCollector {
    window: VecDeque<CaptureSample>,
    lifetime_captures: u64,
    lifetime_bytes: u64,
    lifetime_transparent_skipped: u64,
    lifetime_transparent_saved: u64,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW),
            ..Self::default()
        }
    }

    /// Record one capture, evicting the oldest sample once the window is full.
    pub fn record(&mut self, sample: CaptureSample) {
        if self.window.len() == WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        self.lifetime_captures += 1;
        self.lifetime_bytes += sample.bytes as u64;
        self.lifetime_transparent_skipped += sample.transparent_tiles as u64;
        self.lifetime_transparent_saved += sample.transparent_saved as u64;
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&CaptureSample> {
        self.window.back()
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_latest(self.latest())
    }

    pub fn stats(&self) -> RollingStats {
        let last = self.latest().copied().unwrap_or_default();
        RollingStats {
            samples: self.window.len(),
            avg_total_ms: self.mean(|s| ms(s.total)),
            avg_compare_ms: self.mean(|s| ms(s.compare)),
            avg_extract_ms: self.mean(|s| ms(s.extract)),
            avg_dirty_percent: self.mean(|s| s.dirty_percent),
            avg_bytes: self.mean(|s| s.bytes as f64),
            last_total_ms: ms(last.total),
            last_dirty_percent: last.dirty_percent,
            last_bytes: last.bytes,
            last_region_count: last.region_count,
            lifetime_captures: self.lifetime_captures,
            lifetime_bytes: self.lifetime_bytes,
            lifetime_transparent_skipped: self.lifetime_transparent_skipped,
            lifetime_transparent_saved: self.lifetime_transparent_saved,
            recommendation: self.recommendation(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────

    fn mean(&self, f: impl Fn(&CaptureSample) -> f64) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().map(f).sum::<f64>() / self.window.len() as f64
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

// ── Tests ────────────────────────────────────────────────────────
