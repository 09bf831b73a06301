//! Capture engine configuration.
//!
//! Out-of-range values are clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::grid::{DEFAULT_TILE_SIZE, clamp_tile_size};

/// Lowest accepted capture rate.
pub const MIN_FPS: u32 = 1;
/// Highest accepted capture rate.
pub const MAX_FPS: u32 = 240;

/// Engine and scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Tile edge in pixels, clamped to `[8, 256]`.
    pub tile_size: u32,
    /// Continuous-capture rate, clamped to `[1, 240]`.
    pub target_fps: u32,
    /// Do not hand unchanged captures to the consumer.
    pub skip_unchanged: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            target_fps: 30,
            skip_unchanged: true,
        }
    }
}

impl CaptureConfig {
    /// Copy with every field clamped into its accepted range.
    pub fn normalized(&self) -> Self {
        let cfg = Self {
            tile_size: clamp_tile_size(self.tile_size),
            target_fps: clamp_fps(self.target_fps),
            skip_unchanged: self.skip_unchanged,
        };
        if cfg != *self {
            tracing::debug!(
                "capture config clamped: tile_size {} -> {}, target_fps {} -> {}",
                self.tile_size,
                cfg.tile_size,
                self.target_fps,
                cfg.target_fps
            );
        }
        cfg
    }
}

/// Clamp a capture rate into `[MIN_FPS, MAX_FPS]`.
pub fn clamp_fps(fps: u32) -> u32 {
    fps.clamp(MIN_FPS, MAX_FPS)
}

// ── Tests ────────────────────────────────────────────────────────
