//! Anchor box layout of a grid detector's output tensor.

use crate::util::{GridYoloError, GridYoloResult};

/// Box regression outputs plus objectness preceding the class logits of each anchor.
pub const BOX_CHANNELS: usize = 5;

/// Prior box shape in grid-cell units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorShape {
    /// Width in grid cells.
    pub width: f32,
    /// Height in grid cells.
    pub height: f32,
}

impl AnchorShape {
    /// Creates an anchor shape.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Fixed description of the detector output: grid, classes, and anchors.
///
/// Together these define the tensor layout contract with the inference
/// collaborator: `num_anchors_per_cell * (num_classes + 5)` channels of
/// `grid_rows x grid_cols` values each.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorSpec {
    /// Grid height in cells.
    pub grid_rows: usize,
    /// Grid width in cells.
    pub grid_cols: usize,
    /// Number of class logits per anchor.
    pub num_classes: usize,
    /// Anchors predicted by each cell.
    pub num_anchors_per_cell: usize,
    /// Anchor shapes in channel order, one per anchor.
    pub anchors: Vec<AnchorShape>,
}

impl AnchorSpec {
    /// Creates a spec with `num_anchors_per_cell` taken from `anchors`.
    pub fn new(
        grid_rows: usize,
        grid_cols: usize,
        num_classes: usize,
        anchors: Vec<AnchorShape>,
    ) -> GridYoloResult<Self> {
        let spec = Self {
            grid_rows,
            grid_cols,
            num_classes,
            num_anchors_per_cell: anchors.len(),
            anchors,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Creates a spec from interleaved `[w0, h0, w1, h1, ...]` anchor values.
    pub fn from_flat_anchors(
        grid_rows: usize,
        grid_cols: usize,
        num_classes: usize,
        anchors: &[f32],
    ) -> GridYoloResult<Self> {
        if anchors.len() % 2 != 0 {
            return Err(GridYoloError::InvalidConfiguration(
                "flat anchor list must contain (width, height) pairs",
            ));
        }
        let shapes = anchors
            .chunks_exact(2)
            .map(|pair| AnchorShape::new(pair[0], pair[1]))
            .collect();
        Self::new(grid_rows, grid_cols, num_classes, shapes)
    }

    /// Tiny-YOLO-v2 trained on Pascal VOC: 13x13 grid, 20 classes, 5 anchors.
    pub fn tiny_yolo_voc() -> Self {
        Self {
            grid_rows: 13,
            grid_cols: 13,
            num_classes: 20,
            num_anchors_per_cell: 5,
            anchors: vec![
                AnchorShape::new(1.08, 1.19),
                AnchorShape::new(3.42, 4.41),
                AnchorShape::new(6.63, 11.38),
                AnchorShape::new(9.42, 5.11),
                AnchorShape::new(16.62, 10.52),
            ],
        }
    }

    /// Validates grid, class, and anchor settings.
    pub fn validate(&self) -> GridYoloResult<()> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(GridYoloError::InvalidConfiguration(
                "grid dimensions must be positive",
            ));
        }
        if self.num_classes == 0 {
            return Err(GridYoloError::InvalidConfiguration(
                "num_classes must be at least 1",
            ));
        }
        if self.num_anchors_per_cell == 0 {
            return Err(GridYoloError::InvalidConfiguration(
                "num_anchors_per_cell must be at least 1",
            ));
        }
        if self.anchors.len() != self.num_anchors_per_cell {
            return Err(GridYoloError::InvalidConfiguration(
                "anchor shape count must equal num_anchors_per_cell",
            ));
        }
        for anchor in &self.anchors {
            if !(anchor.width.is_finite() && anchor.height.is_finite())
                || anchor.width <= 0.0
                || anchor.height <= 0.0
            {
                return Err(GridYoloError::InvalidConfiguration(
                    "anchor shapes must be finite and positive",
                ));
            }
        }
        if self.checked_tensor_len().is_none() {
            return Err(GridYoloError::InvalidConfiguration(
                "tensor size overflows usize",
            ));
        }
        Ok(())
    }

    fn checked_tensor_len(&self) -> Option<usize> {
        self.num_classes
            .checked_add(BOX_CHANNELS)?
            .checked_mul(self.num_anchors_per_cell)?
            .checked_mul(self.grid_rows)?
            .checked_mul(self.grid_cols)
    }

    /// Values per anchor: box regression, objectness, and class logits.
    #[inline]
    pub fn channels_per_anchor(&self) -> usize {
        self.num_classes + BOX_CHANNELS
    }

    /// Total channel count of the output tensor.
    #[inline]
    pub fn channels(&self) -> usize {
        self.num_anchors_per_cell * self.channels_per_anchor()
    }

    /// Expected tensor shape as `[channels, rows, cols]`.
    pub fn tensor_shape(&self) -> [usize; 3] {
        [self.channels(), self.grid_rows, self.grid_cols]
    }

    /// Expected number of elements in a contiguous tensor.
    ///
    /// Shape helpers assume a spec that passed [`validate`](Self::validate),
    /// which rejects layouts whose element count overflows `usize`.
    pub fn tensor_len(&self) -> usize {
        self.channels() * self.grid_rows * self.grid_cols
    }

    /// First channel belonging to `anchor`.
    #[inline]
    pub(crate) fn anchor_base(&self, anchor: usize) -> usize {
        anchor * self.channels_per_anchor()
    }
}

impl Default for AnchorSpec {
    fn default() -> Self {
        Self::tiny_yolo_voc()
    }
}

#[cfg(test)]
mod tests {
    use super::{AnchorShape, AnchorSpec};
    use crate::GridYoloError;

    #[test]
    fn tiny_yolo_layout_has_125_channels() {
        let spec = AnchorSpec::tiny_yolo_voc();
        spec.validate().unwrap();
        assert_eq!(spec.channels(), 125);
        assert_eq!(spec.tensor_shape(), [125, 13, 13]);
        assert_eq!(spec.anchor_base(3), 75);
    }

    #[test]
    fn flat_anchors_pair_up() {
        let spec = AnchorSpec::from_flat_anchors(7, 9, 3, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(spec.num_anchors_per_cell, 2);
        assert_eq!(spec.anchors[1], AnchorShape::new(3.0, 4.0));
        assert!(AnchorSpec::from_flat_anchors(7, 9, 3, &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn mismatched_anchor_count_is_rejected() {
        let mut spec = AnchorSpec::tiny_yolo_voc();
        spec.num_anchors_per_cell = 4;
        assert_eq!(
            spec.validate(),
            Err(GridYoloError::InvalidConfiguration(
                "anchor shape count must equal num_anchors_per_cell"
            ))
        );
    }

    #[test]
    fn overflowing_tensor_size_is_rejected() {
        let err = AnchorSpec::new(usize::MAX, 2, 1, vec![AnchorShape::new(1.0, 1.0)]).unwrap_err();
        assert_eq!(
            err,
            GridYoloError::InvalidConfiguration("tensor size overflows usize")
        );
        let mut spec = AnchorSpec::tiny_yolo_voc();
        spec.num_classes = usize::MAX;
        assert!(spec.validate().is_err());
    }
}
