//! Integration tests: capture properties over whole frames: idempotence,
//! coverage, merge maximality, transparency accounting, full refreshes and
//! batch replay.

use std::collections::HashSet;

use tilecap_core::{
    CaptureConfig, CaptureEngine, CaptureResult, FrameBuffer, TileClass, TileClassifier, TileGrid,
};

// ── Helpers ──────────────────────────────────────────────────────

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn engine(tile_size: u32) -> CaptureEngine {
    CaptureEngine::new(CaptureConfig {
        tile_size,
        ..CaptureConfig::default()
    })
}

fn make_pixels(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.iter().copied().cycle().take((w * h * 4) as usize).collect()
}

fn fill_rect(data: &mut [u8], w: u32, x0: u32, y0: u32, rw: u32, rh: u32, rgba: [u8; 4]) {
    for y in y0..y0 + rh {
        for x in x0..x0 + rw {
            let off = ((y * w + x) * 4) as usize;
            data[off..off + 4].copy_from_slice(&rgba);
        }
    }
}

fn capture(eng: &mut CaptureEngine, data: &[u8], w: u32, h: u32) -> CaptureResult {
    eng.capture_once(&FrameBuffer::new(data, w, h).unwrap())
}

/// Deterministic xorshift so property tests are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u32) -> u32 {
        (self.next() % n as u64) as u32
    }
}

/// A frame where each tile of a `tile`-sized grid is randomly left as is,
/// repainted opaque, or cleared to fully transparent.
fn scramble_tiles(rng: &mut XorShift, base: &[u8], w: u32, h: u32, tile: u32) -> Vec<u8> {
    let mut data = base.to_vec();
    let grid = TileGrid::new(w, h, tile);
    for ty in 0..grid.tiles_y {
        for tx in 0..grid.tiles_x {
            let r = grid.tile_rect(tx, ty);
            match rng.below(3) {
                0 => {}
                1 => {
                    let shade = rng.below(255) as u8;
                    fill_rect(&mut data, w, r.x, r.y, r.width, r.height, [shade, 10, 20, 255]);
                }
                _ => fill_rect(&mut data, w, r.x, r.y, r.width, r.height, CLEAR),
            }
        }
    }
    data
}

/// Pixel coordinates covered by the result's regions.
fn covered_pixels(result: &CaptureResult) -> HashSet<(u32, u32)> {
    let mut set = HashSet::new();
    for r in &result.regions {
        for y in r.y..r.y + r.height {
            for x in r.x..r.x + r.width {
                assert!(set.insert((x, y)), "pixel ({x}, {y}) covered twice");
            }
        }
    }
    set
}

// ── Concrete scenario ────────────────────────────────────────────

#[test]
fn test_four_step_scenario() {
    let mut eng = engine(32);

    // 1. First capture: everything is content.
    let frame1 = make_pixels(64, 64, OPAQUE_BLACK);
    let r1 = capture(&mut eng, &frame1, 64, 64);
    assert_eq!((r1.tiles_x, r1.tiles_y, r1.total_tiles), (2, 2, 4));
    assert!(r1.full_refresh);
    assert_eq!(r1.dirty_count, 4);
    assert!(r1.regions.iter().all(|r| r.class == TileClass::Content));

    // 2. Identical pixels.
    let r2 = capture(&mut eng, &frame1, 64, 64);
    assert!(!r2.full_refresh);
    assert_eq!(r2.dirty_count, 0);
    assert!(r2.regions.is_empty());

    // 3. Only the top-left tile changes.
    let mut frame3 = frame1.clone();
    fill_rect(&mut frame3, 64, 0, 0, 32, 32, [200, 100, 50, 255]);
    let r3 = capture(&mut eng, &frame3, 64, 64);
    assert_eq!(r3.dirty_count, 1);
    assert_eq!(r3.regions.len(), 1);
    let region = &r3.regions[0];
    assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 32, 32));
    assert_eq!(region.class, TileClass::Content);
    assert_eq!(region.payload.len(), 32 * 32 * 4);
    assert_eq!(&region.payload[..4], &[200, 100, 50, 255]);

    // 4. Whole frame goes transparent.
    let frame4 = make_pixels(64, 64, CLEAR);
    let r4 = capture(&mut eng, &frame4, 64, 64);
    assert_eq!(r4.dirty_count, 4);
    assert!(r4.regions.iter().all(|r| r.class == TileClass::Transparent));
    assert_eq!(r4.total_bytes, 0);
    assert_eq!(r4.transparent_skipped, 4);
    assert_eq!(r4.transparent_saved, 64 * 64 * 4);
}

// ── Properties ───────────────────────────────────────────────────

#[test]
fn test_idempotence() {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let base = make_pixels(100, 70, OPAQUE_BLACK);
    for _ in 0..10 {
        let mut eng = engine(16);
        let frame = scramble_tiles(&mut rng, &base, 100, 70, 16);
        capture(&mut eng, &frame, 100, 70);
        let again = capture(&mut eng, &frame, 100, 70);
        assert_eq!(again.dirty_count, 0);
        assert!(again.regions.is_empty());
        assert_eq!(again.dirty_percent, 0.0);
    }
}

#[test]
fn test_coverage_matches_dirty_tiles() {
    let mut rng = XorShift(42);
    let (w, h, tile) = (100, 70, 16);
    let base = make_pixels(w, h, OPAQUE_BLACK);

    for _ in 0..20 {
        let mut eng = engine(tile);
        capture(&mut eng, &base, w, h);
        let frame = scramble_tiles(&mut rng, &base, w, h, tile);

        // Independent classification of the same pair of frames.
        let prev = tilecap_core::FrameSnapshot::capture(&FrameBuffer::new(&base, w, h).unwrap());
        let grid = TileGrid::new(w, h, tile);
        let map = TileClassifier::classify_grid(&FrameBuffer::new(&frame, w, h).unwrap(), Some(&prev), &grid);

        let result = capture(&mut eng, &frame, w, h);
        assert_eq!(result.dirty_count, map.dirty_count());

        let mut expected = HashSet::new();
        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                if map.get(tx, ty).is_dirty() {
                    let r = grid.tile_rect(tx, ty);
                    for y in r.y..r.bottom() {
                        for x in r.x..r.right() {
                            expected.insert((x, y));
                        }
                    }
                }
            }
        }
        assert_eq!(covered_pixels(&result), expected);

        // Every region is a single class over its tiles and never exceeds the frame.
        for r in &result.regions {
            assert!(r.x + r.width <= w && r.y + r.height <= h);
            assert_eq!(map.get(r.tile_origin_x, r.tile_origin_y), r.class);
        }
    }
}

#[test]
fn test_same_class_regions_cannot_be_joined() {
    let mut rng = XorShift(7);
    let (w, h, tile) = (128, 96, 16);
    let base = make_pixels(w, h, OPAQUE_BLACK);

    for _ in 0..20 {
        let mut eng = engine(tile);
        capture(&mut eng, &base, w, h);
        let frame = scramble_tiles(&mut rng, &base, w, h, tile);
        let result = capture(&mut eng, &frame, w, h);

        // Two regions of one class sharing a whole edge would form a larger
        // rectangle; the greedy scan always absorbs such a neighbour.
        for (i, a) in result.regions.iter().enumerate() {
            for b in &result.regions[i + 1..] {
                if a.class != b.class {
                    continue;
                }
                let side_by_side = a.y == b.y
                    && a.height == b.height
                    && (a.x + a.width == b.x || b.x + b.width == a.x);
                let stacked = a.x == b.x
                    && a.width == b.width
                    && (a.y + a.height == b.y || b.y + b.height == a.y);
                assert!(!side_by_side && !stacked, "{a:?} and {b:?} should have merged");
            }
        }
    }
}

#[test]
fn test_transparency_bandwidth_law() {
    let mut rng = XorShift(1234);
    let (w, h, tile) = (90, 60, 32);
    let base = make_pixels(w, h, OPAQUE_BLACK);

    for _ in 0..10 {
        let mut eng = engine(tile);
        capture(&mut eng, &base, w, h);
        let frame = scramble_tiles(&mut rng, &base, w, h, tile);
        let result = capture(&mut eng, &frame, w, h);

        let mut saved = 0;
        for r in result.regions_of(TileClass::Transparent) {
            assert!(r.payload.is_empty());
            saved += (r.width * r.height * 4) as usize;
        }
        assert_eq!(saved, result.transparent_saved);

        let payload: usize = result.regions.iter().map(|r| r.payload.len()).sum();
        assert_eq!(payload, result.total_bytes);
        for r in result.regions_of(TileClass::Content) {
            assert_eq!(r.payload.len(), (r.width * r.height * 4) as usize);
        }
    }
}

#[test]
fn test_full_refresh_law() {
    let data = make_pixels(80, 48, CLEAR);
    let mut eng = engine(16);

    let first = capture(&mut eng, &data, 80, 48);
    assert!(first.full_refresh);
    assert_eq!(first.dirty_count, first.total_tiles);
    // No previous frame: transparent pixels are still sent as content.
    assert_eq!(first.transparent_skipped, 0);

    eng.invalidate();
    let after_invalidate = capture(&mut eng, &data, 80, 48);
    assert!(after_invalidate.full_refresh);
    assert_eq!(after_invalidate.dirty_count, after_invalidate.total_tiles);

    let steady = capture(&mut eng, &data, 80, 48);
    assert!(!steady.full_refresh);
}

// ── Replay ───────────────────────────────────────────────────────

#[test]
fn test_replaying_batches_reconstructs_frames() {
    let mut rng = XorShift(99);
    let (w, h, tile) = (75, 50, 16);
    let base = make_pixels(w, h, OPAQUE_BLACK);
    let mut eng = engine(tile);
    let mut canvas = vec![0u8; (w * h * 4) as usize];

    let mut frame = base.clone();
    for _ in 0..15 {
        let result = capture(&mut eng, &frame, w, h);
        let batch = result.to_bytes().unwrap();
        let decoded = CaptureResult::from_bytes(&batch).unwrap();
        decoded.apply_to(&mut canvas, (w * 4) as usize).unwrap();
        assert_eq!(canvas, frame);

        frame = scramble_tiles(&mut rng, &frame, w, h, tile);
    }
}

#[test]
fn test_diagnostics_track_captures() {
    let mut eng = engine(32);
    let frame = make_pixels(64, 64, OPAQUE_BLACK);
    capture(&mut eng, &frame, 64, 64);
    capture(&mut eng, &frame, 64, 64);
    capture(&mut eng, &make_pixels(64, 64, CLEAR), 64, 64);

    let stats = eng.stats();
    assert_eq!(stats.samples, 3);
    assert_eq!(stats.lifetime_captures, 3);
    assert_eq!(stats.lifetime_transparent_skipped, 4);
    assert_eq!(stats.lifetime_transparent_saved, 16384);
    assert_eq!(stats.last_dirty_percent, 100.0);
    assert!((stats.avg_dirty_percent - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.recommendation, tilecap_core::Recommendation::LargerTilesOrLowerRate);
}
