//! # tilecap-probe: capture engine probe
//!
//! Runs the tile-delta capture engine continuously against a synthetic
//! overlay renderer, optionally records every emitted batch, and reports
//! rolling diagnostics with a tuning recommendation.
//!
//! Useful for choosing a tile size and capture rate for a given overlay
//! before wiring the engine to a real renderer.

pub mod config;
pub mod service;
pub mod source;
