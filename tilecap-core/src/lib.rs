//! # tilecap-core
//!
//! Frame delta capture engine for overlay rendering.
//!
//! Given a freshly rendered RGBA8 frame each tick, the engine works out
//! which tiles changed since the previous capture, merges neighbouring
//! tiles of the same kind into rectangles, and emits a compact batch of
//! dirty regions instead of a full frame.
//!
//! ## Pipeline
//!
//! ```text
//! FrameSource ──► TileClassifier ──► RegionMerger ──► DeltaEncoder ──► CaptureResult ──► CaptureSink
//!                       │                                                   │
//!                 FrameSnapshot (previous frame)              DiagnosticsCollector
//! ```
//!
//! | Module        | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | `frame`       | Borrowed frame view and owned previous-frame snapshot   |
//! | `grid`        | Tile grid geometry and the flat tile classification map |
//! | `classify`    | Sampled dirty / transparency classification per tile    |
//! | `merge`       | Greedy rectangle merging and coverage verification      |
//! | `encode`      | Packed payload extraction per region                    |
//! | `result`      | `CaptureResult` / `DirtyRegion` and the bincode batch   |
//! | `diagnostics` | Rolling timings, sizes and tuning advice                |
//! | `engine`      | `CaptureEngine`: one-shot capture and snapshot state    |
//! | `scheduler`   | fps-gated continuous capture with cooperative stop      |
//! | `config`      | `CaptureConfig` and clamping                            |
//! | `error`       | `CaptureError`                                          |

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod encode;
pub mod engine;
pub mod error;
pub mod frame;
pub mod grid;
pub mod merge;
pub mod result;
pub mod scheduler;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use classify::TileClassifier;
pub use config::CaptureConfig;
pub use diagnostics::{CaptureSample, DiagnosticsCollector, Recommendation, RollingStats};
pub use encode::DeltaEncoder;
pub use engine::CaptureEngine;
pub use error::CaptureError;
pub use frame::{FrameBuffer, FrameSnapshot};
pub use grid::{TileClass, TileGrid, TileMap, TileRect};
pub use merge::{CoverageViolation, MergedRect, RegionMerger};
pub use result::{CaptureResult, DirtyRegion};
pub use scheduler::{CaptureScheduler, CaptureSink, FrameSource, StopHandle, TickOutcome};
