//! Detections and their suppression.
//!
//! Includes the `Detection` record shared by the decoder, the suppressor, and
//! the pipeline, plus greedy Non-Max Suppression.

pub(crate) mod nms;
pub(crate) mod order;

use crate::catalog::DetectableClass;
use crate::geometry::BoundingBox;
use crate::util::{GridYoloError, GridYoloResult};

/// A labeled box with a confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    class: DetectableClass,
    bounds: BoundingBox,
    confidence: f32,
}

impl Detection {
    /// Creates a detection, rejecting confidences outside `[0, 1]`.
    pub fn new(
        class: DetectableClass,
        bounds: BoundingBox,
        confidence: f32,
    ) -> GridYoloResult<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(GridYoloError::InvalidInput(
                "detection confidence must be within [0, 1]",
            ));
        }
        Ok(Self {
            class,
            bounds,
            confidence,
        })
    }

    /// Predicted class.
    pub fn class(&self) -> &DetectableClass {
        &self.class
    }

    /// Shorthand for `self.class().label()`.
    pub fn label(&self) -> &str {
        self.class.label()
    }

    /// Box in whatever coordinate space produced it.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Class probability times objectness.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns a copy of this detection with new bounds.
    pub fn with_bounds(&self, bounds: BoundingBox) -> Self {
        Self {
            class: self.class.clone(),
            bounds,
            confidence: self.confidence,
        }
    }
}
