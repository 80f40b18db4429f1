//! Deterministic confidence ordering for candidates.

use std::cmp::Ordering;

#[inline]
fn score_cmp_desc(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}

/// Indices of `scores` sorted by descending score.
///
/// The sort is stable: equal scores keep their original relative order, so
/// suppression results do not depend on the sort implementation.
pub(crate) fn argsort_desc(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| score_cmp_desc(scores[a], scores[b]));
    order
}
