//! Capture results handed to the consumer.
//!
//! # Batch format
//!
//! A [`CaptureResult`] is self-describing: frame dimensions, grid shape and
//! an ordered list of [`DirtyRegion`]s with pixel bounds and payloads. On
//! the wire it is a single bincode value:
//!
//! ```text
//! CaptureResult
//!   ├─ header: sequence, timestamp, screen size, tile size, grid shape
//!   ├─ regions: [DirtyRegion { bounds, class, tile origin, payload }]
//!   └─ counters: dirty/total tiles, bytes, transparent savings
//! ```
//!
//! Consumers replay a batch by writing `Content` payloads into their
//! rectangles and clearing `Transparent` rectangles; see
//! [`CaptureResult::apply_to`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::frame::BYTES_PER_PIXEL;
use crate::grid::{TileClass, TileRect};

// ── DirtyRegion ──────────────────────────────────────────────────

/// One merged rectangle of same-class dirty tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyRegion {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels, clipped to the frame.
    pub width: u32,
    /// Height in pixels, clipped to the frame.
    pub height: u32,
    pub class: TileClass,
    /// Packed RGBA8 for `Content`; empty for `Transparent`.
    pub payload: Bytes,
    /// Column of the top-left tile.
    pub tile_origin_x: u32,
    /// Row of the top-left tile.
    pub tile_origin_y: u32,
}

impl DirtyRegion {
    pub fn bounds(&self) -> TileRect {
        TileRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Bytes the region would carry if it were sent as pixels.
    pub fn raw_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

// ── CaptureResult ────────────────────────────────────────────────

/// The outcome of one capture: everything a consumer needs to bring its
/// copy of the frame up to date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Per-engine counter; 0 for an empty capture.
    pub sequence: u64,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub tile_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// Ordered by the row-major position of each region's top-left tile.
    pub regions: Vec<DirtyRegion>,
    pub dirty_count: usize,
    pub total_tiles: usize,
    /// `dirty_count / total_tiles * 100`, or 0 for an empty grid.
    pub dirty_percent: f64,
    /// Sum of all payload lengths.
    pub total_bytes: usize,
    /// No usable previous frame; every tile was reported as `Content`.
    pub full_refresh: bool,
    /// Number of transparent tiles sent without payload.
    pub transparent_skipped: usize,
    /// Payload bytes avoided by sending transparent tiles as bounds only.
    pub transparent_saved: usize,
}

impl CaptureResult {
    /// A result describing "nothing to capture".
    pub fn empty(timestamp: u64, tile_size: u32) -> Self {
        Self {
            timestamp,
            tile_size,
            ..Self::default()
        }
    }

    /// Whether any tile changed.
    pub fn has_changes(&self) -> bool {
        self.dirty_count > 0
    }

    /// Regions of a single class, in emission order.
    pub fn regions_of(&self, class: TileClass) -> impl Iterator<Item = &DirtyRegion> {
        self.regions.iter().filter(move |r| r.class == class)
    }

    /// Total pixel area covered by regions.
    pub fn dirty_area(&self) -> u64 {
        self.regions.iter().map(|r| r.bounds().area()).sum()
    }

    /// Replay this result onto a packed-or-strided RGBA8 canvas of the same
    /// screen size: `Content` payloads are copied in, `Transparent` areas
    /// are zeroed. Every region is bounds-checked before anything is
    /// written, so a malformed batch leaves the canvas untouched.
    pub fn apply_to(&self, canvas: &mut [u8], canvas_stride: usize) -> Result<(), CaptureError> {
        let row_len = self.screen_width as usize * BYTES_PER_PIXEL;
        if canvas_stride < row_len || canvas.len() < canvas_stride * self.screen_height as usize {
            return Err(CaptureError::invalid_frame(format!(
                "canvas too small for {}x{}",
                self.screen_width, self.screen_height
            )));
        }

        for region in &self.regions {
            self.check_bounds(region)?;
        }

        for region in &self.regions {
            let span = region.width as usize * BYTES_PER_PIXEL;
            let left = region.x as usize * BYTES_PER_PIXEL;
            match region.class {
                TileClass::Content => {
                    if region.payload.len() != region.raw_len() {
                        return Err(CaptureError::Encoding(format!(
                            "region at ({}, {}) carries {} bytes, expected {}",
                            region.x,
                            region.y,
                            region.payload.len(),
                            region.raw_len()
                        )));
                    }
                    for (row, src) in region.payload.chunks_exact(span).enumerate() {
                        let start = (region.y as usize + row) * canvas_stride + left;
                        canvas[start..start + span].copy_from_slice(src);
                    }
                }
                TileClass::Transparent => {
                    for row in 0..region.height as usize {
                        let start = (region.y as usize + row) * canvas_stride + left;
                        canvas[start..start + span].fill(0);
                    }
                }
                TileClass::Clean => {}
            }
        }
        Ok(())
    }

    /// Reject empty regions and regions reaching past the screen edges.
    fn check_bounds(&self, region: &DirtyRegion) -> Result<(), CaptureError> {
        let out_of_bounds = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_none_or(|end| end > limit)
        };
        if region.width == 0 || region.height == 0 {
            return Err(CaptureError::Encoding(format!(
                "region at ({}, {}) is empty",
                region.x, region.y
            )));
        }
        if out_of_bounds(region.x, region.width, self.screen_width)
            || out_of_bounds(region.y, region.height, self.screen_height)
        {
            return Err(CaptureError::Encoding(format!(
                "region {}x{} at ({}, {}) exceeds {}x{} screen",
                region.width,
                region.height,
                region.x,
                region.y,
                self.screen_width,
                self.screen_height
            )));
        }
        Ok(())
    }

    /// Serialize to a bincode batch.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from a bincode batch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> CaptureResult {
        CaptureResult {
            sequence: 3,
            timestamp: 1_700_000_000_000,
            screen_width: 4,
            screen_height: 2,
            tile_size: 8,
            tiles_x: 1,
            tiles_y: 1,
            regions: vec![
                DirtyRegion {
                    x: 0,
                    y: 0,
                    width: 2,
                    height: 2,
                    class: TileClass::Content,
                    payload: Bytes::from(vec![7u8; 16]),
                    tile_origin_x: 0,
                    tile_origin_y: 0,
                },
                DirtyRegion {
                    x: 2,
                    y: 0,
                    width: 2,
                    height: 2,
                    class: TileClass::Transparent,
                    payload: Bytes::new(),
                    tile_origin_x: 0,
                    tile_origin_y: 0,
                },
            ],
            dirty_count: 1,
            total_tiles: 1,
            dirty_percent: 100.0,
            total_bytes: 16,
            full_refresh: false,
            transparent_skipped: 1,
            transparent_saved: 16,
        }
    }

    #[test]
    fn batch_survives_bincode() {
        let result = sample_result();
        let bytes = result.to_bytes().unwrap();
        let decoded = CaptureResult::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn truncated_batch_is_an_encoding_error() {
        let bytes = sample_result().to_bytes().unwrap();
        let err = CaptureResult::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
    }

    #[test]
    fn apply_writes_content_and_clears_transparent() {
        let result = sample_result();
        let mut canvas = vec![1u8; 4 * 2 * 4];
        result.apply_to(&mut canvas, 16).unwrap();
        assert_eq!(&canvas[0..8], &[7; 8]);
        assert_eq!(&canvas[8..16], &[0; 8]);
        assert_eq!(&canvas[16..24], &[7; 8]);
        assert_eq!(&canvas[24..32], &[0; 8]);
    }

    #[test]
    fn apply_rejects_small_canvas() {
        let mut canvas = vec![0u8; 8];
        assert!(sample_result().apply_to(&mut canvas, 16).is_err());
    }

    #[test]
    fn apply_rejects_empty_region() {
        let mut result = sample_result();
        result.regions = vec![DirtyRegion {
            width: 0,
            payload: Bytes::new(),
            ..result.regions[0].clone()
        }];
        let decoded = CaptureResult::from_bytes(&result.to_bytes().unwrap()).unwrap();
        let mut canvas = vec![0u8; 32];
        let err = decoded.apply_to(&mut canvas, 16).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
    }

    #[test]
    fn apply_rejects_region_past_screen_edge() {
        let mut result = sample_result();
        result.regions = vec![DirtyRegion {
            x: 3,
            ..result.regions[1].clone()
        }];
        let mut canvas = vec![1u8; 32];
        let err = result.apply_to(&mut canvas, 16).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
        assert!(canvas.iter().all(|&b| b == 1));

        result.regions[0].x = 0;
        result.regions[0].y = u32::MAX;
        assert!(result.apply_to(&mut canvas, 16).is_err());
    }

    #[test]
    fn region_helpers() {
        let result = sample_result();
        assert_eq!(result.regions_of(TileClass::Transparent).count(), 1);
        assert_eq!(result.dirty_area(), 8);
        assert!(result.has_changes());
        assert!(!CaptureResult::empty(0, 32).has_changes());
    }
}
