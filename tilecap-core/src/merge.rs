//! Greedy merging of same-class tiles into rectangles.
//!
//! Scans the tile map in row-major order. From each unvisited dirty tile it
//! grows right while the row continues with the same class, then grows
//! down while every tile of the next row under that span matches. The
//! result is deterministic and linear in the number of tiles, but it is not
//! a minimum rectangle cover: a checkerboard yields one rectangle per tile.

use thiserror::Error;

use crate::grid::{TileClass, TileGrid, TileMap, TileRect};

// ── MergedRect ───────────────────────────────────────────────────

/// A block of same-class tiles, in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRect {
    pub tile_x: u32,
    pub tile_y: u32,
    pub tiles_w: u32,
    pub tiles_h: u32,
    pub class: TileClass,
}

impl MergedRect {
    /// Pixel bounds, clipped to the frame.
    pub fn to_pixels(&self, grid: &TileGrid) -> TileRect {
        grid.block_rect(self.tile_x, self.tile_y, self.tiles_w, self.tiles_h)
    }

    fn single(tile_x: u32, tile_y: u32, class: TileClass) -> Self {
        Self {
            tile_x,
            tile_y,
            tiles_w: 1,
            tiles_h: 1,
            class,
        }
    }
}

// ── CoverageViolation ────────────────────────────────────────────

/// Rectangles that do not cover the dirty tiles exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("merge coverage violated at {} tile(s): {reason}", .ambiguous.len())]
pub struct CoverageViolation {
    /// Tiles whose coverage is wrong, as `(tx, ty)`.
    pub ambiguous: Vec<(u32, u32)>,
    pub reason: &'static str,
}

// ── RegionMerger ─────────────────────────────────────────────────

/// Greedy scan-and-extend mesher.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionMerger;

impl RegionMerger {
    /// Merge the dirty tiles of `map` into maximal-by-greedy rectangles,
    /// in row-major order of their top-left tile.
    pub fn merge(map: &TileMap) -> Vec<MergedRect> {
        let grid = map.grid();
        let mut visited = vec![false; grid.total_tiles()];
        let mut rects = Vec::new();

        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                let class = map.get(tx, ty);
                if !class.is_dirty() || visited[grid.index(tx, ty)] {
                    continue;
                }

                let open = |x: u32, y: u32, visited: &[bool]| {
                    !visited[grid.index(x, y)] && map.get(x, y) == class
                };

                let mut w = 1;
                while tx + w < grid.tiles_x && open(tx + w, ty, &visited) {
                    w += 1;
                }

                let mut h = 1;
                while ty + h < grid.tiles_y && (tx..tx + w).all(|x| open(x, ty + h, &visited)) {
                    h += 1;
                }

                for y in ty..ty + h {
                    for x in tx..tx + w {
                        visited[grid.index(x, y)] = true;
                    }
                }

                rects.push(MergedRect {
                    tile_x: tx,
                    tile_y: ty,
                    tiles_w: w,
                    tiles_h: h,
                    class,
                });
            }
        }

        rects
    }

    /// Check that `rects` cover every dirty tile of `map` exactly once with
    /// its own class, cover no clean tile, and stay inside the grid.
    pub fn verify(map: &TileMap, rects: &[MergedRect]) -> Result<(), CoverageViolation> {
        let grid = map.grid();
        let mut hits = vec![0u32; grid.total_tiles()];
        let mut ambiguous = Vec::new();
        let mut reason = "";

        for r in rects {
            if r.tiles_w == 0
                || r.tiles_h == 0
                || r.tile_x + r.tiles_w > grid.tiles_x
                || r.tile_y + r.tiles_h > grid.tiles_y
            {
                ambiguous.push((r.tile_x, r.tile_y));
                reason = "rectangle outside the tile grid";
                continue;
            }
            for y in r.tile_y..r.tile_y + r.tiles_h {
                for x in r.tile_x..r.tile_x + r.tiles_w {
                    hits[grid.index(x, y)] += 1;
                    if map.get(x, y) != r.class {
                        ambiguous.push((x, y));
                        reason = "rectangle class differs from tile class";
                    }
                }
            }
        }

        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                let expected = u32::from(map.get(tx, ty).is_dirty());
                if hits[grid.index(tx, ty)] != expected {
                    ambiguous.push((tx, ty));
                    reason = "tile covered the wrong number of times";
                }
            }
        }

        if ambiguous.is_empty() {
            Ok(())
        } else {
            ambiguous.sort_unstable_by_key(|&(x, y)| (y, x));
            ambiguous.dedup();
            Err(CoverageViolation { ambiguous, reason })
        }
    }

    /// Conservative replacement for a rectangle set that failed
    /// [`verify`](Self::verify): one single-tile rectangle per dirty tile,
    /// with every ambiguous tile reported as `Content`.
    pub fn fallback(map: &TileMap, violation: &CoverageViolation) -> Vec<MergedRect> {
        let grid = map.grid();
        let mut rects = Vec::new();
        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                if violation.ambiguous.contains(&(tx, ty)) {
                    rects.push(MergedRect::single(tx, ty, TileClass::Content));
                } else if map.get(tx, ty).is_dirty() {
                    rects.push(MergedRect::single(tx, ty, map.get(tx, ty)));
                }
            }
        }
        rects
    }
}

// ── Tests ────────────────────────────────────────────────────────
