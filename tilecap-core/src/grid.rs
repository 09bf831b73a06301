//! The tile grid laid over a frame and the per-tile classification map.

use serde::{Deserialize, Serialize};

/// Smallest accepted tile edge in pixels.
pub const MIN_TILE_SIZE: u32 = 8;
/// Largest accepted tile edge in pixels.
pub const MAX_TILE_SIZE: u32 = 256;
/// Tile edge used when none is configured.
pub const DEFAULT_TILE_SIZE: u32 = 32;

// ── TileClass ────────────────────────────────────────────────────

/// Classification of one tile relative to the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileClass {
    /// Unchanged since the previous capture.
    #[default]
    Clean,
    /// Changed, with visible pixels.
    Content,
    /// Changed, and every sampled alpha is zero.
    Transparent,
}

impl TileClass {
    /// Whether this tile must be reported to the consumer.
    pub const fn is_dirty(self) -> bool {
        !matches!(self, TileClass::Clean)
    }
}

// ── TileRect ─────────────────────────────────────────────────────

/// A pixel rectangle, `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    /// Exclusive right edge.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ── TileGrid ─────────────────────────────────────────────────────

/// Shape of the tile grid for a given frame size and tile edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub tile_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl TileGrid {
    /// Lay a grid of `tile_size` tiles over a `width × height` frame.
    ///
    /// `tile_size` must be non-zero; callers clamp it first.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        debug_assert!(tile_size > 0, "tile_size must be > 0");
        let tile_size = tile_size.max(1);
        Self {
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
            width,
            height,
        }
    }

    pub fn total_tiles(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Flat index of tile `(tx, ty)`.
    pub fn index(&self, tx: u32, ty: u32) -> usize {
        ty as usize * self.tiles_x as usize + tx as usize
    }

    /// Pixel bounds of tile `(tx, ty)`, clipped to the frame.
    pub fn tile_rect(&self, tx: u32, ty: u32) -> TileRect {
        self.block_rect(tx, ty, 1, 1)
    }

    /// Pixel bounds of a `tiles_w × tiles_h` block whose top-left tile is
    /// `(tx, ty)`, clipped to the frame. Partial edge tiles shrink; nothing
    /// ever extends past the frame.
    pub fn block_rect(&self, tx: u32, ty: u32, tiles_w: u32, tiles_h: u32) -> TileRect {
        let x = (tx * self.tile_size).min(self.width);
        let y = (ty * self.tile_size).min(self.height);
        let right = ((tx + tiles_w) * self.tile_size).min(self.width);
        let bottom = ((ty + tiles_h) * self.tile_size).min(self.height);
        TileRect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Clamp a requested tile edge into `[MIN_TILE_SIZE, MAX_TILE_SIZE]`.
pub fn clamp_tile_size(n: u32) -> u32 {
    n.clamp(MIN_TILE_SIZE, MAX_TILE_SIZE)
}

// ── TileMap ──────────────────────────────────────────────────────

/// One [`TileClass`] per grid cell, stored flat at `ty * tiles_x + tx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    grid: TileGrid,
    classes: Vec<TileClass>,
}

impl TileMap {
    /// A map with every tile set to `class`.
    pub fn filled(grid: TileGrid, class: TileClass) -> Self {
        Self {
            grid,
            classes: vec![class; grid.total_tiles()],
        }
    }

    /// Build a map from row-major classes. Returns `None` if the length does
    /// not match the grid.
    pub fn from_classes(grid: TileGrid, classes: Vec<TileClass>) -> Option<Self> {
        (classes.len() == grid.total_tiles()).then_some(Self { grid, classes })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn get(&self, tx: u32, ty: u32) -> TileClass {
        self.classes[self.grid.index(tx, ty)]
    }

    pub fn set(&mut self, tx: u32, ty: u32, class: TileClass) {
        let idx = self.grid.index(tx, ty);
        self.classes[idx] = class;
    }

    /// All classes in row-major order.
    pub fn classes(&self) -> &[TileClass] {
        &self.classes
    }

    pub fn count(&self, class: TileClass) -> usize {
        self.classes.iter().filter(|&&c| c == class).count()
    }

    pub fn dirty_count(&self) -> usize {
        self.classes.iter().filter(|c| c.is_dirty()).count()
    }
}

// ── Tests ────────────────────────────────────────────────────────
