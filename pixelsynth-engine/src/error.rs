//! Error types for the control side.
//!
//! Nothing here ever reaches the render path: the audio thread only sees
//! fully validated snapshots. These errors describe messages that were dropped.

use thiserror::Error;

/// Why a pixel buffer could not be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PixelError {
    #[error("pixelData must be an object with numeric width, height and a data array")]
    Shape,
    #[error("pixel buffer has zero width or height")]
    Empty,
    #[error("{width}x{height} RGBA buffer does not fit in memory")]
    TooLarge { width: usize, height: usize },
    #[error("pixel data holds {actual} bytes, expected at least {expected}")]
    TooShort { expected: usize, actual: usize },
}

/// A control message that could not be understood at all.
///
/// Individual out-of-range fields are not errors; they fall back silently.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`pixels` message carries no pixelData")]
    MissingPixels,
    #[error("pixel buffer rejected: {0}")]
    Pixels(#[from] PixelError),
}

/// Failure to hand a message to the render thread.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("command queue is full; the render thread is not draining it")]
    QueueFull,
}
