//! Rayon-parallel decoding (feature-gated).
//!
//! Grid rows are independent, so each row is decoded on its own task with a
//! private class-logit scratch buffer. Row results are concatenated in row
//! order, which keeps the output identical to the sequential decoder.

use crate::anchor::AnchorSpec;
use crate::candidate::Detection;
use crate::catalog::ClassCatalog;
use crate::decode::{check_inputs, decode_row};
use crate::tensor::{TensorElement, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::GridYoloResult;
use rayon::prelude::*;

/// Row-parallel variant of [`decode`](crate::decode::decode).
pub fn decode_par<T: TensorElement>(
    tensor: TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    object_threshold: f32,
) -> GridYoloResult<Vec<Detection>> {
    check_inputs(&tensor, spec, catalog, object_threshold)?;

    let _span = trace_span!(
        "decode_par",
        rows = spec.grid_rows,
        cols = spec.grid_cols,
        anchors = spec.num_anchors_per_cell
    )
    .entered();

    let per_row: Vec<Vec<Detection>> = (0..spec.grid_rows)
        .into_par_iter()
        .map(|row| {
            let mut scratch = vec![0.0f32; spec.num_classes];
            let mut row_out = Vec::new();
            decode_row(
                &tensor,
                spec,
                catalog,
                object_threshold,
                row,
                &mut scratch,
                &mut row_out,
            )?;
            Ok(row_out)
        })
        .collect::<GridYoloResult<_>>()?;

    let out: Vec<Detection> = per_row.into_iter().flatten().collect();
    trace_event!("decoded_candidates", count = out.len());
    Ok(out)
}
