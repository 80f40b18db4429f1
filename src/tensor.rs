//! Borrowed views over detector output tensors.
//!
//! `TensorView` is a `[channels, rows, cols]` view into a 1D buffer with
//! explicit element strides per axis. A contiguous channel-major buffer has
//! strides `(rows * cols, cols, 1)`; larger strides describe padded layouts as
//! handed out by some inference runtimes. Construction checks that every
//! addressable element lies inside the buffer, so reads never go out of bounds.

use crate::util::{GridYoloError, GridYoloResult};

/// Numeric element type accepted by the decoder.
pub trait TensorElement: Copy + Send + Sync {
    /// Converts the raw value to `f32` for scoring.
    fn to_f32(self) -> f32;
}

impl TensorElement for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

impl TensorElement for f64 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// Element strides of a 3D tensor, in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strides {
    /// Distance between consecutive channels.
    pub channel: usize,
    /// Distance between consecutive rows.
    pub row: usize,
    /// Distance between consecutive columns.
    pub col: usize,
}

impl Strides {
    /// Strides of a contiguous channel-major buffer.
    pub fn contiguous(rows: usize, cols: usize) -> Self {
        Self {
            channel: rows * cols,
            row: cols,
            col: 1,
        }
    }
}

/// Borrowed `[channels, rows, cols]` view with explicit strides.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a, T> {
    data: &'a [T],
    channels: usize,
    rows: usize,
    cols: usize,
    strides: Strides,
}

impl<'a, T: TensorElement> TensorView<'a, T> {
    /// Creates a contiguous channel-major view.
    ///
    /// The buffer length must equal `channels * rows * cols`.
    pub fn from_slice(
        data: &'a [T],
        channels: usize,
        rows: usize,
        cols: usize,
    ) -> GridYoloResult<Self> {
        let view = Self::new(data, channels, rows, cols, Strides::contiguous(rows, cols))?;
        let expected = channels * rows * cols;
        if data.len() != expected {
            return Err(GridYoloError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(view)
    }

    /// Creates a view with explicit strides.
    pub fn new(
        data: &'a [T],
        channels: usize,
        rows: usize,
        cols: usize,
        strides: Strides,
    ) -> GridYoloResult<Self> {
        let needed = required_len(channels, rows, cols, strides)?;
        if data.len() < needed {
            return Err(GridYoloError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            channels,
            rows,
            cols,
            strides,
        })
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `[channels, rows, cols]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.rows, self.cols]
    }

    /// Element strides.
    pub fn strides(&self) -> Strides {
        self.strides
    }

    /// Returns the element at `(channel, row, col)` if it is within bounds.
    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<T> {
        if channel >= self.channels || row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(self.offset(channel, row, col)).copied()
    }

    /// Reads `(channel, row, col)` as `f32`. Callers keep indices in range.
    #[inline]
    pub(crate) fn value(&self, channel: usize, row: usize, col: usize) -> f32 {
        debug_assert!(channel < self.channels && row < self.rows && col < self.cols);
        self.data[self.offset(channel, row, col)].to_f32()
    }

    #[inline]
    fn offset(&self, channel: usize, row: usize, col: usize) -> usize {
        channel * self.strides.channel + row * self.strides.row + col * self.strides.col
    }
}

fn required_len(
    channels: usize,
    rows: usize,
    cols: usize,
    strides: Strides,
) -> GridYoloResult<usize> {
    if channels == 0 || rows == 0 || cols == 0 {
        return Err(GridYoloError::InvalidDimensions {
            channels,
            rows,
            cols,
        });
    }
    let overflow = GridYoloError::InvalidDimensions {
        channels,
        rows,
        cols,
    };
    let last_channel = (channels - 1)
        .checked_mul(strides.channel)
        .ok_or_else(|| overflow.clone())?;
    let last_row = (rows - 1)
        .checked_mul(strides.row)
        .ok_or_else(|| overflow.clone())?;
    let last_col = (cols - 1)
        .checked_mul(strides.col)
        .ok_or_else(|| overflow.clone())?;
    last_channel
        .checked_add(last_row)
        .and_then(|v| v.checked_add(last_col))
        .and_then(|v| v.checked_add(1))
        .ok_or(overflow)
}
