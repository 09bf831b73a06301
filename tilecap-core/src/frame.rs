//! Pixel buffers flowing into the capture pipeline.
//!
//! [`FrameBuffer`] is a read-only borrow of whatever the renderer last
//! presented; it is only valid for the duration of one capture.
//! [`FrameSnapshot`] is the engine's private, owned copy of the previous
//! frame. The two never alias.

use crate::error::CaptureError;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

// ── FrameBuffer ──────────────────────────────────────────────────

/// A borrowed RGBA8, row-major frame.
///
/// `pixels` holds `height` rows of `stride` bytes each. `stride` may exceed
/// `width * 4` when the producer pads rows.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuffer<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Wrap a tightly packed buffer (`stride == width * 4`).
    pub fn new(pixels: &'a [u8], width: u32, height: u32) -> Result<Self, CaptureError> {
        let stride = width
            .checked_mul(BYTES_PER_PIXEL as u32)
            .ok_or_else(|| CaptureError::invalid_frame(format!("width {width} overflows stride")))?;
        Self::with_stride(pixels, width, height, stride)
    }

    /// Wrap a buffer whose rows are `stride` bytes apart.
    ///
    /// Validates the buffer up front so that every later pixel access is in
    /// bounds.
    pub fn with_stride(
        pixels: &'a [u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> Result<Self, CaptureError> {
        let row_len = width as usize * BYTES_PER_PIXEL;
        if (stride as usize) < row_len {
            return Err(CaptureError::invalid_frame(format!(
                "stride {stride} shorter than a {width}px row"
            )));
        }
        let needed = stride as usize * height as usize;
        if pixels.len() < needed {
            return Err(CaptureError::invalid_frame(format!(
                "buffer holds {} bytes, need {needed} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// `true` when there is nothing to capture.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the four RGBA bytes at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &'a [u8] {
        let offset = y as usize * self.stride as usize + x as usize * BYTES_PER_PIXEL;
        &self.pixels[offset..offset + BYTES_PER_PIXEL]
    }

    /// Alpha byte at `(x, y)`.
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y)[3]
    }

    /// The pixel bytes of row `y` between columns `x0` (inclusive) and `x1`
    /// (exclusive), without row padding.
    pub fn span(&self, y: u32, x0: u32, x1: u32) -> &'a [u8] {
        let row_start = y as usize * self.stride as usize;
        &self.pixels[row_start + x0 as usize * BYTES_PER_PIXEL..row_start + x1 as usize * BYTES_PER_PIXEL]
    }
}

// ── FrameSnapshot ────────────────────────────────────────────────

/// Owned, tightly packed copy of a previously captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameSnapshot {
    /// Copy `frame` row by row, dropping any row padding.
    pub fn capture(frame: &FrameBuffer<'_>) -> Self {
        let row_len = frame.width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(row_len * frame.height as usize);
        for y in 0..frame.height {
            pixels.extend_from_slice(frame.span(y, 0, frame.width));
        }
        Self {
            pixels,
            width: frame.width,
            height: frame.height,
        }
    }

    /// Snapshot width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Snapshot height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `frame` has the same dimensions as this snapshot.
    pub fn matches(&self, frame: &FrameBuffer<'_>) -> bool {
        self.width == frame.width && self.height == frame.height
    }

    /// Borrow the snapshot as a frame for comparison.
    pub fn view(&self) -> FrameBuffer<'_> {
        FrameBuffer {
            pixels: &self.pixels,
            width: self.width,
            height: self.height,
            stride: self.width * BYTES_PER_PIXEL as u32,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
