//! Coordinate transforms applied to surviving detections.
//!
//! The decoder emits boxes as fractions of the model input. How that input was
//! cut from the original image (center crop, letterbox, plain resize) is only
//! known to the caller, who picks or supplies a [`CoordinateTransform`] to map
//! boxes back. Any `Fn(BoundingBox) -> BoundingBox` closure works too.

use crate::geometry::BoundingBox;
use crate::util::{GridYoloError, GridYoloResult};

/// Maps a box from model-input coordinates to caller coordinates.
pub trait CoordinateTransform {
    /// Returns the remapped box.
    fn apply(&self, bounds: BoundingBox) -> BoundingBox;
}

impl<F> CoordinateTransform for F
where
    F: Fn(BoundingBox) -> BoundingBox,
{
    fn apply(&self, bounds: BoundingBox) -> BoundingBox {
        self(bounds)
    }
}

/// Leaves boxes in normalized model-input coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl CoordinateTransform for Identity {
    fn apply(&self, bounds: BoundingBox) -> BoundingBox {
        bounds
    }
}

fn check_extent(value: f32) -> GridYoloResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(GridYoloError::InvalidConfiguration(
            "transform dimensions must be finite and positive",
        ));
    }
    Ok(())
}

/// Scales normalized boxes to the pixel size of the model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleToPixels {
    width: f32,
    height: f32,
}

impl ScaleToPixels {
    /// Creates a transform onto a `width x height` pixel frame.
    pub fn new(width: f32, height: f32) -> GridYoloResult<Self> {
        check_extent(width)?;
        check_extent(height)?;
        Ok(Self { width, height })
    }
}

impl CoordinateTransform for ScaleToPixels {
    fn apply(&self, b: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            b.x * self.width,
            b.y * self.height,
            b.width * self.width,
            b.height * self.height,
        )
    }
}

/// Undoes a center crop to the largest central square of the original image.
///
/// The model saw the central `side x side` square (`side = min(w, h)`)
/// resized to its input; normalized boxes are mapped back into original image
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterCrop {
    side: f32,
    offset_x: f32,
    offset_y: f32,
}

impl CenterCrop {
    /// Creates a transform for an original image of `image_width x image_height` pixels.
    pub fn new(image_width: f32, image_height: f32) -> GridYoloResult<Self> {
        check_extent(image_width)?;
        check_extent(image_height)?;
        let side = image_width.min(image_height);
        Ok(Self {
            side,
            offset_x: (image_width - side) / 2.0,
            offset_y: (image_height - side) / 2.0,
        })
    }
}

impl CoordinateTransform for CenterCrop {
    fn apply(&self, b: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.offset_x + b.x * self.side,
            self.offset_y + b.y * self.side,
            b.width * self.side,
            b.height * self.side,
        )
    }
}

/// Undoes an aspect-preserving resize with symmetric padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    input_width: f32,
    input_height: f32,
    gain: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    /// Creates a transform for an `image_*` original letterboxed into an `input_*` frame.
    pub fn new(
        image_width: f32,
        image_height: f32,
        input_width: f32,
        input_height: f32,
    ) -> GridYoloResult<Self> {
        for v in [image_width, image_height, input_width, input_height] {
            check_extent(v)?;
        }
        let gain = (input_width / image_width).min(input_height / image_height);
        Ok(Self {
            input_width,
            input_height,
            gain,
            pad_x: (input_width - image_width * gain) / 2.0,
            pad_y: (input_height - image_height * gain) / 2.0,
        })
    }
}

impl CoordinateTransform for Letterbox {
    fn apply(&self, b: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (b.x * self.input_width - self.pad_x) / self.gain,
            (b.y * self.input_height - self.pad_y) / self.gain,
            b.width * self.input_width / self.gain,
            b.height * self.input_height / self.gain,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CenterCrop, CoordinateTransform, Identity, Letterbox, ScaleToPixels};
    use crate::geometry::BoundingBox;

    fn close(a: BoundingBox, b: BoundingBox) -> bool {
        (a.x - b.x).abs() < 1e-3
            && (a.y - b.y).abs() < 1e-3
            && (a.width - b.width).abs() < 1e-3
            && (a.height - b.height).abs() < 1e-3
    }

    const FULL: BoundingBox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

    #[test]
    fn center_crop_maps_full_frame_to_central_square() {
        let t = CenterCrop::new(640.0, 480.0).unwrap();
        assert!(close(t.apply(FULL), BoundingBox::new(80.0, 0.0, 480.0, 480.0)));
    }

    #[test]
    fn letterbox_maps_full_frame_past_image_edges() {
        // 800x400 into 416x416: gain 0.52, vertical padding 104 px.
        let t = Letterbox::new(800.0, 400.0, 416.0, 416.0).unwrap();
        let inner = BoundingBox::new(0.0, 104.0 / 416.0, 1.0, 208.0 / 416.0);
        assert!(close(t.apply(inner), BoundingBox::new(0.0, 0.0, 800.0, 400.0)));
    }

    #[test]
    fn scale_and_identity() {
        let t = ScaleToPixels::new(416.0, 416.0).unwrap();
        let b = BoundingBox::new(0.25, 0.5, 0.5, 0.25);
        assert!(close(t.apply(b), BoundingBox::new(104.0, 208.0, 208.0, 104.0)));
        assert_eq!(Identity.apply(b), b);
        assert!(ScaleToPixels::new(0.0, 1.0).is_err());
    }

    #[test]
    fn closures_are_transforms() {
        let shift = |b: BoundingBox| BoundingBox::new(b.x + 1.0, b.y, b.width, b.height);
        assert_eq!(shift.apply(FULL).x, 1.0);
    }
}
