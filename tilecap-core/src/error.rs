//! Error types for the capture engine.
//!
//! Only the frame source can genuinely fail. Classification, merging and
//! encoding run over validated, copied data and are infallible; the batch
//! codec is the one other fallible surface.

use thiserror::Error;

/// The canonical error type for `tilecap-core`.
#[derive(Debug, Error)]
pub enum CaptureError {
    // ── Frame Errors ─────────────────────────────────────────────
    /// A pixel buffer did not match the dimensions it was described with.
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    // ── Source Errors ────────────────────────────────────────────
    /// The upstream renderer has no frame ready for this tick.
    #[error("frame source has no frame ready")]
    FrameNotReady,

    /// Any other failure reported by the frame source.
    #[error("frame source error: {0}")]
    Source(String),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding or decoding of a capture batch failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl CaptureError {
    pub(crate) fn invalid_frame(reason: impl Into<String>) -> Self {
        CaptureError::InvalidFrame {
            reason: reason.into(),
        }
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Source(e.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for CaptureError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        CaptureError::Encoding(e.to_string())
    }
}
