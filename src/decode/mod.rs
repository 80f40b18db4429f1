//! Grid decoder: raw output tensor to candidate detections.
//!
//! Each `(row, col, anchor)` slot of the tensor carries box regression
//! outputs `(tx, ty, tw, th)`, an objectness logit, and one logit per class.
//! Decoding scores every slot as `softmax(class logits)[best] *
//! sigmoid(objectness)`, drops slots below the object threshold, and maps the
//! rest to boxes in normalized image coordinates:
//!
//! ```text
//! cx = (col + sigmoid(tx)) / cols      w = anchor_w * exp(tw) / cols
//! cy = (row + sigmoid(ty)) / rows      h = anchor_h * exp(th) / rows
//! ```
//!
//! Slots are visited row by row, then column, then anchor. The decoder does
//! not sort or suppress.

use crate::anchor::AnchorSpec;
use crate::candidate::Detection;
use crate::catalog::ClassCatalog;
use crate::geometry::BoundingBox;
use crate::tensor::{TensorElement, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{argmax, sigmoid, softmax_in_place};
use crate::util::{GridYoloError, GridYoloResult};

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(feature = "rayon")]
pub use self::rayon::decode_par;

/// Decodes every slot of `tensor` whose confidence reaches `object_threshold`.
///
/// Fails before decoding anything if the anchor layout is invalid, the catalog size
/// differs from `spec.num_classes`, the tensor shape differs from
/// `spec.tensor_shape()`, or the threshold is NaN. Thresholds outside
/// `[0, 1]` are accepted here: above 1 nothing passes, below 0 everything does.
pub fn decode<T: TensorElement>(
    tensor: TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    object_threshold: f32,
) -> GridYoloResult<Vec<Detection>> {
    check_inputs(&tensor, spec, catalog, object_threshold)?;

    let _span = trace_span!(
        "decode",
        rows = spec.grid_rows,
        cols = spec.grid_cols,
        anchors = spec.num_anchors_per_cell
    )
    .entered();

    let mut scratch = vec![0.0f32; spec.num_classes];
    let mut out = Vec::new();
    for row in 0..spec.grid_rows {
        decode_row(&tensor, spec, catalog, object_threshold, row, &mut scratch, &mut out)?;
    }

    trace_event!("decoded_candidates", count = out.len());
    Ok(out)
}

/// Decodes a contiguous `[channels, rows, cols]` buffer laid out per `spec`.
pub fn decode_slice<T: TensorElement>(
    data: &[T],
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    object_threshold: f32,
) -> GridYoloResult<Vec<Detection>> {
    let tensor = view_for_spec(data, spec)?;
    decode(tensor, spec, catalog, object_threshold)
}

/// Wraps a contiguous buffer in a view shaped like `spec.tensor_shape()`.
///
/// Any length other than `spec.tensor_len()` is a
/// [`GridYoloError::ShapeMismatch`]. When the buffer holds whole grid planes
/// the implied channel count is reported in `got`.
pub fn view_for_spec<'a, T: TensorElement>(
    data: &'a [T],
    spec: &AnchorSpec,
) -> GridYoloResult<TensorView<'a, T>> {
    spec.validate()?;
    if data.len() != spec.tensor_len() {
        // validate() guarantees the plane size is non-zero and fits in usize.
        let plane = spec.grid_rows * spec.grid_cols;
        let got = (data.len() % plane == 0)
            .then(|| [data.len() / plane, spec.grid_rows, spec.grid_cols]);
        return Err(GridYoloError::ShapeMismatch {
            expected: spec.tensor_shape(),
            got,
            got_len: data.len(),
        });
    }
    TensorView::from_slice(data, spec.channels(), spec.grid_rows, spec.grid_cols)
}

pub(crate) fn check_inputs<T: TensorElement>(
    tensor: &TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    object_threshold: f32,
) -> GridYoloResult<()> {
    spec.validate()?;
    if catalog.len() != spec.num_classes {
        return Err(GridYoloError::InvalidConfiguration(
            "class catalog size must equal num_classes",
        ));
    }
    if tensor.shape() != spec.tensor_shape() {
        let [c, r, k] = tensor.shape();
        return Err(GridYoloError::ShapeMismatch {
            expected: spec.tensor_shape(),
            got: Some([c, r, k]),
            got_len: c.saturating_mul(r).saturating_mul(k),
        });
    }
    if object_threshold.is_nan() {
        return Err(GridYoloError::InvalidConfiguration(
            "object_threshold must not be NaN",
        ));
    }
    Ok(())
}

/// Decodes all columns and anchors of one grid row into `out`.
///
/// `scratch` must hold `spec.num_classes` values; its contents are overwritten.
pub(crate) fn decode_row<T: TensorElement>(
    tensor: &TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    object_threshold: f32,
    row: usize,
    scratch: &mut [f32],
    out: &mut Vec<Detection>,
) -> GridYoloResult<()> {
    let rows = spec.grid_rows as f32;
    let cols = spec.grid_cols as f32;

    for col in 0..spec.grid_cols {
        for (b, anchor) in spec.anchors.iter().enumerate() {
            let base = spec.anchor_base(b);

            let objectness = sigmoid(tensor.value(base + 4, row, col));
            for (c, slot) in scratch.iter_mut().enumerate() {
                *slot = tensor.value(base + 5 + c, row, col);
            }
            softmax_in_place(scratch)?;
            let class_idx = argmax(scratch)
                .ok_or(GridYoloError::InvalidInput("class logits are empty"))?;
            let confidence = scratch[class_idx] * objectness;
            if confidence.is_nan() {
                return Err(GridYoloError::InvalidInput(
                    "tensor contains non-finite class or objectness values",
                ));
            }
            if confidence < object_threshold {
                continue;
            }

            let tx = tensor.value(base, row, col);
            let ty = tensor.value(base + 1, row, col);
            let tw = tensor.value(base + 2, row, col);
            let th = tensor.value(base + 3, row, col);

            let cx = (col as f32 + sigmoid(tx)) / cols;
            let cy = (row as f32 + sigmoid(ty)) / rows;
            let w = anchor.width * tw.exp() / cols;
            let h = anchor.height * th.exp() / rows;

            let class = catalog
                .get(class_idx)
                .ok_or(GridYoloError::InvalidConfiguration(
                    "class catalog size must equal num_classes",
                ))?
                .clone();
            out.push(Detection::new(
                class,
                BoundingBox::from_center(cx, cy, w, h),
                confidence.clamp(0.0, 1.0),
            )?);
        }
    }
    Ok(())
}
