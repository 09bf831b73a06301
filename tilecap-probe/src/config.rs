//! Configuration for the capture probe.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tilecap_core::CaptureConfig;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Engine and scheduler settings.
    pub capture: CaptureConfig,
    /// Synthetic overlay settings.
    pub source: SourceConfig,
    /// Run limits and output.
    pub run: RunConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Synthetic overlay frame settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Edge of the moving opaque square.
    pub square_size: u32,
    /// Pixels the square moves per pulled frame.
    pub speed: u32,
    /// Height of the static status bar along the bottom edge (0 = none).
    pub status_bar_height: u32,
    /// Report "no frame ready" on every Nth pull (0 = never).
    pub fail_every: u32,
}

/// Run limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after this many delivered batches (0 = no limit).
    pub max_captures: u64,
    /// Stop after this many seconds (0 = no limit).
    pub duration_secs: u64,
    /// Host refresh period driving the scheduler, in milliseconds.
    pub refresh_ms: u64,
    /// Append length-prefixed bincode batches to this file. Empty = off.
    pub record_path: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            square_size: 48,
            speed: 6,
            status_bar_height: 24,
            fail_every: 0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_captures: 300,
            duration_secs: 0,
            refresh_ms: 16,
            record_path: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ProbeConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Capture settings clamped into range.
    pub fn capture_config(&self) -> CaptureConfig {
        self.capture.normalized()
    }

    /// Host refresh period, at least one millisecond.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.run.refresh_ms.max(1))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = ProbeConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("tile_size"));
        assert!(text.contains("square_size"));
        assert!(text.contains("refresh_ms"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = ProbeConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ProbeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.capture.tile_size, 32);
        assert_eq!(parsed.capture.target_fps, 30);
        assert_eq!(parsed.source.width, 640);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: ProbeConfig = toml::from_str("[capture]\ntile_size = 64\n").unwrap();
        assert_eq!(parsed.capture.tile_size, 64);
        assert!(parsed.capture.skip_unchanged);
        assert_eq!(parsed.run.max_captures, 300);
    }

    #[test]
    fn capture_config_clamps() {
        let mut cfg = ProbeConfig::default();
        cfg.capture.tile_size = 4;
        cfg.capture.target_fps = 500;
        let capture = cfg.capture_config();
        assert_eq!(capture.tile_size, 8);
        assert_eq!(capture.target_fps, 240);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = ProbeConfig::load(Path::new("/nonexistent/tilecap-probe.toml"));
        assert_eq!(cfg.logging.level, "info");
    }
}
