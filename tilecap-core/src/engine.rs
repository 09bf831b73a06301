//! The capture engine: classify → merge → encode, once per frame.
//!
//! The engine exclusively owns the previous-frame snapshot. Each capture
//! diffs against it and then replaces it wholesale with a copy of the frame
//! just captured, so capture N is always compared with exactly capture N-1.
//!
//! Continuous capture is driven from outside by a
//! [`CaptureScheduler`](crate::scheduler::CaptureScheduler).

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::classify::TileClassifier;
use crate::config::{CaptureConfig, clamp_fps};
use crate::diagnostics::{CaptureSample, DiagnosticsCollector, RollingStats};
use crate::encode::DeltaEncoder;
use crate::error::CaptureError;
use crate::frame::{FrameBuffer, FrameSnapshot};
use crate::grid::{TileClass, TileGrid, TileMap, clamp_tile_size};
use crate::merge::{MergedRect, RegionMerger};
use crate::result::{CaptureResult, DirtyRegion};
use crate::scheduler::FrameSource;

// ── CaptureEngine ────────────────────────────────────────────────

/// Stateful delta capture engine.
#[derive(Debug, Clone, Default)]
pub struct CaptureEngine {
    config: CaptureConfig,
    previous: Option<FrameSnapshot>,
    diagnostics: DiagnosticsCollector,
    sequence: u64,
}

impl CaptureEngine {
    /// Create an engine with `config`, clamped into range.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config: config.normalized(),
            previous: None,
            diagnostics: DiagnosticsCollector::new(),
            sequence: 0,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    /// Whether a previous frame is stored to diff against.
    pub fn has_snapshot(&self) -> bool {
        self.previous.is_some()
    }

    /// Drop the previous frame; the next capture is a full refresh.
    pub fn invalidate(&mut self) {
        if self.previous.take().is_some() {
            debug!("capture snapshot invalidated");
        }
    }

    /// Change the tile edge, clamped to `[8, 256]`, and invalidate.
    ///
    /// Returns the size actually applied.
    pub fn set_tile_size(&mut self, n: u32) -> u32 {
        let size = clamp_tile_size(n);
        if size != n {
            debug!("tile size {n} clamped to {size}");
        }
        self.config.tile_size = size;
        self.invalidate();
        size
    }

    /// Change the continuous-capture rate, clamped to `[1, 240]`. Returns
    /// the rate applied.
    pub fn set_target_fps(&mut self, fps: u32) -> u32 {
        let fps = clamp_fps(fps);
        self.config.target_fps = fps;
        debug!("capture rate set to {fps} fps");
        fps
    }

    pub fn set_skip_unchanged(&mut self, skip: bool) {
        self.config.skip_unchanged = skip;
    }

    /// Diagnostics snapshot with tuning advice.
    pub fn stats(&self) -> RollingStats {
        self.diagnostics.stats()
    }

    pub fn diagnostics(&self) -> &DiagnosticsCollector {
        &self.diagnostics
    }

    /// Pull one frame from `source` and capture it.
    ///
    /// A source failure is returned as-is and leaves the engine untouched.
    pub fn capture_from<S>(&mut self, source: &mut S) -> Result<CaptureResult, CaptureError>
    where
        S: FrameSource + ?Sized,
    {
        let frame = source.frame()?;
        Ok(self.capture_once(&frame))
    }

    /// Capture `frame` against the stored snapshot.
    ///
    /// A zero-sized frame yields an empty result and leaves all state
    /// untouched.
    pub fn capture_once(&mut self, frame: &FrameBuffer<'_>) -> CaptureResult {
        let tile_size = self.config.tile_size;
        if frame.is_empty() {
            return CaptureResult::empty(unix_millis(), tile_size);
        }

        let started = Instant::now();
        let grid = TileGrid::new(frame.width(), frame.height(), tile_size);
        let full_refresh = !matches!(&self.previous, Some(prev) if prev.matches(frame));
        if full_refresh {
            match &self.previous {
                Some(prev) => debug!(
                    "frame size changed {}x{} -> {}x{}; full refresh",
                    prev.width(),
                    prev.height(),
                    frame.width(),
                    frame.height()
                ),
                None => debug!("no previous frame; full refresh"),
            }
        }

        // 1. Classify.
        let map = TileClassifier::classify_grid(frame, self.previous.as_ref(), &grid);
        let compare = started.elapsed();

        // 2. Merge.
        let merge_started = Instant::now();
        let merged = settle_coverage(&map, RegionMerger::merge(&map));
        let merge = merge_started.elapsed();

        // 3. Encode.
        let extract_started = Instant::now();
        let mut regions = Vec::with_capacity(merged.len());
        let mut dirty_count = 0;
        let mut transparent_skipped = 0;
        let mut transparent_saved = 0;
        let mut total_bytes = 0;

        for rect in &merged {
            let bounds = rect.to_pixels(&grid);
            if bounds.is_empty() {
                continue;
            }
            let tiles = rect.tiles_w as usize * rect.tiles_h as usize;
            dirty_count += tiles;

            let payload = DeltaEncoder::encode(frame, bounds, rect.class);
            if rect.class == TileClass::Transparent {
                transparent_skipped += tiles;
                transparent_saved += DeltaEncoder::packed_len(bounds);
            }
            total_bytes += payload.len();

            regions.push(DirtyRegion {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
                class: rect.class,
                payload,
                tile_origin_x: rect.tile_x,
                tile_origin_y: rect.tile_y,
            });
        }
        let extract = extract_started.elapsed();

        // 4. Replace the snapshot wholesale.
        self.previous = Some(FrameSnapshot::capture(frame));
        self.sequence += 1;

        let total_tiles = grid.total_tiles();
        let dirty_percent = if total_tiles == 0 {
            0.0
        } else {
            dirty_count as f64 / total_tiles as f64 * 100.0
        };

        self.diagnostics.record(CaptureSample {
            total: started.elapsed(),
            compare,
            merge,
            extract,
            dirty_count,
            dirty_percent,
            region_count: regions.len(),
            bytes: total_bytes,
            transparent_tiles: transparent_skipped,
            transparent_saved,
        });

        trace!(
            "capture #{}: {dirty_count}/{total_tiles} tiles dirty, {} regions, {total_bytes} bytes",
            self.sequence,
            regions.len()
        );

        CaptureResult {
            sequence: self.sequence,
            timestamp: unix_millis(),
            screen_width: frame.width(),
            screen_height: frame.height(),
            tile_size,
            tiles_x: grid.tiles_x,
            tiles_y: grid.tiles_y,
            regions,
            dirty_count,
            total_tiles,
            dirty_percent,
            total_bytes,
            full_refresh,
            transparent_skipped,
            transparent_saved,
        }
    }
}

/// Verified rectangles for `map`. A set that does not cover the dirty tiles
/// exactly once fails fast in debug builds; release builds replace it with
/// single-tile rectangles, ambiguous tiles reported as `Content`.
fn settle_coverage(map: &TileMap, merged: Vec<MergedRect>) -> Vec<MergedRect> {
    match RegionMerger::verify(map, &merged) {
        Ok(()) => merged,
        Err(violation) => {
            if cfg!(debug_assertions) {
                panic!("{violation}");
            }
            warn!("{violation}; reporting affected tiles as content");
            RegionMerger::fallback(map, &violation)
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Tests ────────────────────────────────────────────────────────
