//! Greedy IoU-based non-maximum suppression.

use crate::candidate::order::argsort_desc;
use crate::candidate::Detection;
use crate::geometry::{compute_iou, BoundingBox};
use crate::trace::{trace_event, trace_span};
use crate::util::{GridYoloError, GridYoloResult};

/// Which detections may suppress each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Any two overlapping boxes compete, whatever their class.
    #[default]
    ClassAgnostic,
    /// Only boxes that share a class index compete.
    PerClass,
}

pub(crate) fn validate_nms_threshold(nms_threshold: f32) -> GridYoloResult<()> {
    if !(0.0..=1.0).contains(&nms_threshold) {
        return Err(GridYoloError::InvalidConfiguration(
            "nms_threshold must be within [0, 1]",
        ));
    }
    Ok(())
}

/// Class-agnostic NMS over `detections`.
///
/// Returns survivors in acceptance order, which is descending confidence with
/// ties kept in input order. A detection is dropped when its IoU with an
/// already accepted detection exceeds `nms_threshold`. Detections with zero
/// confidence are never accepted. Empty input yields an empty result.
pub fn suppress(detections: &[Detection], nms_threshold: f32) -> GridYoloResult<Vec<Detection>> {
    suppress_with_mode(detections, nms_threshold, SuppressionMode::ClassAgnostic)
}

/// NMS over `detections` with an explicit [`SuppressionMode`].
pub fn suppress_with_mode(
    detections: &[Detection],
    nms_threshold: f32,
    mode: SuppressionMode,
) -> GridYoloResult<Vec<Detection>> {
    validate_nms_threshold(nms_threshold)?;
    if detections.is_empty() {
        return Ok(Vec::new());
    }

    let _span = trace_span!("suppress", candidates = detections.len()).entered();

    let boxes: Vec<BoundingBox> = detections.iter().map(Detection::bounds).collect();
    let scores: Vec<f32> = detections.iter().map(Detection::confidence).collect();
    let classes: Option<Vec<usize>> = match mode {
        SuppressionMode::ClassAgnostic => None,
        SuppressionMode::PerClass => Some(detections.iter().map(|d| d.class().index()).collect()),
    };

    let kept = greedy_nms(&boxes, &scores, nms_threshold, classes.as_deref());
    trace_event!(
        "suppressed",
        kept = kept.len(),
        dropped = detections.len() - kept.len()
    );
    Ok(kept.into_iter().map(|i| detections[i].clone()).collect())
}

/// Index form of NMS for callers holding boxes and scores in parallel arrays.
///
/// When `classes` is given, only boxes with equal class ids suppress each
/// other. Returns indices into `boxes` in acceptance order.
pub fn suppress_indices(
    boxes: &[BoundingBox],
    scores: &[f32],
    nms_threshold: f32,
    classes: Option<&[usize]>,
) -> GridYoloResult<Vec<usize>> {
    validate_nms_threshold(nms_threshold)?;
    if boxes.len() != scores.len() {
        return Err(GridYoloError::InvalidInput(
            "boxes and scores must have the same length",
        ));
    }
    if classes.is_some_and(|c| c.len() != boxes.len()) {
        return Err(GridYoloError::InvalidInput(
            "boxes and classes must have the same length",
        ));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(GridYoloError::InvalidInput("scores must not be NaN"));
    }
    Ok(greedy_nms(boxes, scores, nms_threshold, classes))
}

fn greedy_nms(
    boxes: &[BoundingBox],
    scores: &[f32],
    nms_threshold: f32,
    classes: Option<&[usize]>,
) -> Vec<usize> {
    // Working copy: a suppressed entry is zeroed and skipped from then on.
    let mut working = scores.to_vec();
    let order = argsort_desc(scores);
    let mut kept = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        if working[i] <= 0.0 {
            continue;
        }
        kept.push(i);

        for &j in &order[pos + 1..] {
            if working[j] <= 0.0 {
                continue;
            }
            if let Some(classes) = classes {
                if classes[i] != classes[j] {
                    continue;
                }
            }
            if compute_iou(&boxes[i], &boxes[j]) > nms_threshold {
                working[j] = 0.0;
            }
        }
    }

    kept
}
