//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while creating or manipulating image buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Invalid image dimensions (zero width or height).
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A raw pixel buffer does not match the declared dimensions.
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA ({expected} bytes)")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
