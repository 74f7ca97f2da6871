// THEORY:
// Nothing in the engine is fatal. A denied camera, a missing hand-tracking
// model or a half-initialised frame all have a degraded-mode continuation, so
// these variants exist to be caught and logged at the call site, not to abort
// the render loop. Missing per-frame data is modelled as `None`, never as an
// error.

use thiserror::Error;

/// Errors raised by the mirror_field engine.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Malformed frame buffer: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("Camera capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Hand landmark set must have 21 points, got {0}")]
    InvalidLandmarks(usize),

    #[error("Hand tracking model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Audio controller used before init")]
    AudioNotInitialized,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FieldError>;
