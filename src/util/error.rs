//! Error types for gridyolo.

use thiserror::Error;

/// Result alias for gridyolo operations.
pub type GridYoloResult<T> = std::result::Result<T, GridYoloError>;

/// Errors that can occur while decoding or filtering detections.
///
/// Every error is raised before any decoding work starts; a failed call
/// never returns partial detections.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridYoloError {
    /// Tensor size disagrees with the anchor spec.
    ///
    /// Shapes are `[channels, rows, cols]`. `got` is `None` for a flat buffer
    /// whose length does not split into whole grid planes; `got_len` is the
    /// observed element count either way.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?} ({got_len} elements)")]
    ShapeMismatch {
        expected: [usize; 3],
        got: Option<[usize; 3]>,
        got_len: usize,
    },
    /// A buffer has the wrong number of elements for an explicitly declared view shape.
    #[error("tensor length mismatch: expected {expected} elements, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    /// The backing buffer is shorter than the declared view requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A tensor view was declared with a zero-sized dimension.
    #[error("invalid tensor dimensions: {channels}x{rows}x{cols}")]
    InvalidDimensions {
        channels: usize,
        rows: usize,
        cols: usize,
    },
    /// Thresholds, anchor layout, grid size, or catalog are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// The input data is invalid for the requested operation.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
