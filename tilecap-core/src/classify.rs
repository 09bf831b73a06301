//! Per-tile change and transparency classification.
//!
//! Dirty detection samples five points per tile (four corners and the
//! centre) and only falls back to a full row scan when all five match, so
//! the common "something moved" case costs O(1) per tile.
//!
//! Transparency is decided from a 4×4 lattice of alpha samples plus the
//! exact centre. A tile whose visible pixels all fall between lattice
//! points is reported `Transparent`; that loss is accepted in exchange for
//! a bounded per-tile cost.

use crate::frame::{FrameBuffer, FrameSnapshot};
use crate::grid::{TileClass, TileGrid, TileMap, TileRect};

/// Side of the alpha sampling lattice.
const ALPHA_LATTICE: u32 = 4;

/// Stateless tile classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileClassifier;

impl TileClassifier {
    /// Classify one tile of `current` against `previous`.
    ///
    /// With no previous frame every tile is dirty.
    pub fn classify(
        current: &FrameBuffer<'_>,
        previous: Option<&FrameSnapshot>,
        tile: TileRect,
    ) -> TileClass {
        let dirty = match previous {
            Some(prev) if prev.matches(current) => Self::tile_differs(current, &prev.view(), tile),
            _ => true,
        };

        if !dirty {
            TileClass::Clean
        } else if Self::is_transparent(current, tile) {
            TileClass::Transparent
        } else {
            TileClass::Content
        }
    }

    /// Classify every tile of `grid`.
    ///
    /// Without a usable previous frame (none stored, or its dimensions
    /// differ) every tile is `Content`: the consumer has nothing to diff
    /// against, so it must receive real pixels everywhere.
    pub fn classify_grid(
        current: &FrameBuffer<'_>,
        previous: Option<&FrameSnapshot>,
        grid: &TileGrid,
    ) -> TileMap {
        let prev = match previous {
            Some(prev) if prev.matches(current) => prev,
            _ => return TileMap::filled(*grid, TileClass::Content),
        };

        let mut map = TileMap::filled(*grid, TileClass::Clean);
        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                map.set(tx, ty, Self::classify(current, Some(prev), grid.tile_rect(tx, ty)));
            }
        }
        map
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Sparse sample first, then a full row-by-row comparison.
    fn tile_differs(current: &FrameBuffer<'_>, previous: &FrameBuffer<'_>, tile: TileRect) -> bool {
        if tile.is_empty() {
            return false;
        }
        let sampled_change = Self::change_samples(tile)
            .into_iter()
            .any(|(x, y)| current.pixel(x, y) != previous.pixel(x, y));
        if sampled_change {
            return true;
        }

        (tile.y..tile.bottom())
            .any(|y| current.span(y, tile.x, tile.right()) != previous.span(y, tile.x, tile.right()))
    }

    /// Four corners and the centre.
    fn change_samples(tile: TileRect) -> [(u32, u32); 5] {
        let (x0, y0) = (tile.x, tile.y);
        let (x1, y1) = (tile.right() - 1, tile.bottom() - 1);
        [
            (x0, y0),
            (x1, y0),
            (x0, y1),
            (x1, y1),
            (x0 + tile.width / 2, y0 + tile.height / 2),
        ]
    }

    /// `true` when every lattice sample and the centre have zero alpha.
    fn is_transparent(current: &FrameBuffer<'_>, tile: TileRect) -> bool {
        if tile.is_empty() {
            return false;
        }
        let lattice_clear = (0..ALPHA_LATTICE).all(|j| {
            let y = tile.y + (2 * j + 1) * tile.height / (2 * ALPHA_LATTICE);
            (0..ALPHA_LATTICE).all(|i| {
                let x = tile.x + (2 * i + 1) * tile.width / (2 * ALPHA_LATTICE);
                current.alpha(x, y) == 0
            })
        });
        lattice_clear && current.alpha(tile.x + tile.width / 2, tile.y + tile.height / 2) == 0
    }
}

// ── Tests ────────────────────────────────────────────────────────
