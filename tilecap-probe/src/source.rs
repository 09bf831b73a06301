//! Synthetic overlay renderer used as the probe's frame source.
//!
//! Draws a transparent canvas with an opaque status bar along the bottom
//! and an opaque square that bounces horizontally. Every pull renders the
//! next animation step into an internal buffer and lends it out.

use tilecap_core::{CaptureError, FrameBuffer, FrameSource};

use crate::config::SourceConfig;

const SQUARE_RGBA: [u8; 4] = [230, 80, 40, 255];
const BAR_RGBA: [u8; 4] = [24, 24, 32, 220];

/// Animated overlay frame generator.
pub struct SyntheticOverlay {
    config: SourceConfig,
    pixels: Vec<u8>,
    /// Left edge of the square.
    x: u32,
    /// +1 moving right, -1 moving left.
    direction: i8,
    pulls: u64,
}

impl SyntheticOverlay {
    pub fn new(config: SourceConfig) -> Self {
        let len = config.width as usize * config.height as usize * 4;
        Self {
            config,
            pixels: vec![0; len],
            x: 0,
            direction: 1,
            pulls: 0,
        }
    }

    /// Number of frames requested so far, failed pulls included.
    pub fn pulls(&self) -> u64 {
        self.pulls
    }

    fn advance(&mut self) {
        let max_x = self.config.width.saturating_sub(self.config.square_size);
        let step = self.config.speed;
        if self.direction > 0 {
            self.x = self.x.saturating_add(step).min(max_x);
            if self.x == max_x {
                self.direction = -1;
            }
        } else {
            self.x = self.x.saturating_sub(step);
            if self.x == 0 {
                self.direction = 1;
            }
        }
    }

    fn render(&mut self) {
        let (w, h) = (self.config.width, self.config.height);
        self.pixels.fill(0);

        let bar = self.config.status_bar_height.min(h);
        self.fill(0, h - bar, w, bar, BAR_RGBA);

        let size = self.config.square_size.min(w).min(h - bar);
        let y = (h - bar).saturating_sub(size) / 2;
        self.fill(self.x, y, size, size, SQUARE_RGBA);
    }

    fn fill(&mut self, x0: u32, y0: u32, rw: u32, rh: u32, rgba: [u8; 4]) {
        let w = self.config.width;
        let x1 = (x0 + rw).min(w);
        let y1 = (y0 + rh).min(self.config.height);
        for y in y0..y1 {
            let row = y as usize * w as usize * 4;
            for x in x0..x1 {
                let off = row + x as usize * 4;
                self.pixels[off..off + 4].copy_from_slice(&rgba);
            }
        }
    }
}

impl FrameSource for SyntheticOverlay {
    fn frame(&mut self) -> Result<FrameBuffer<'_>, CaptureError> {
        self.pulls += 1;
        let every = self.config.fail_every as u64;
        if every > 0 && self.pulls % every == 0 {
            return Err(CaptureError::FrameNotReady);
        }

        if self.pulls > 1 {
            self.advance();
        }
        self.render();
        FrameBuffer::new(&self.pixels, self.config.width, self.config.height)
    }
}

// ── Tests ────────────────────────────────────────────────────────
