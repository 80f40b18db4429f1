//! Scoring primitives: logistic sigmoid, softmax, and argmax.

use crate::util::{GridYoloError, GridYoloResult};

/// Logistic sigmoid `1 / (1 + e^-x)`.
///
/// Uses the two-branch form so that `exp` is only ever called on a
/// non-positive argument and cannot overflow.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Normalizes `values` into a probability distribution in place.
///
/// The maximum is subtracted before exponentiating. Returns
/// [`GridYoloError::InvalidInput`] for an empty slice.
pub fn softmax_in_place(values: &mut [f32]) -> GridYoloResult<()> {
    let max = values
        .iter()
        .copied()
        .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |m| m.max(v))))
        .ok_or(GridYoloError::InvalidInput("softmax requires at least one value"))?;

    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    // sum >= 1.0 because the max element contributes exp(0).
    let inv = 1.0 / sum;
    for v in values.iter_mut() {
        *v *= inv;
    }
    Ok(())
}

/// Returns the softmax of `values` as a new vector.
pub fn softmax(values: &[f32]) -> GridYoloResult<Vec<f32>> {
    let mut out = values.to_vec();
    softmax_in_place(&mut out)?;
    Ok(out)
}

/// Index of the largest element; ties resolve to the lowest index.
///
/// Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::{argmax, sigmoid, softmax, softmax_in_place};
    use crate::GridYoloError;

    #[test]
    fn sigmoid_is_centered_and_saturates() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        assert!(sigmoid(50.0) <= 1.0 && sigmoid(50.0) > 0.999_999);
        assert!(sigmoid(-50.0) >= 0.0 && sigmoid(-50.0) < 1e-6);
        assert!(sigmoid(-1000.0).is_finite());
        assert!(sigmoid(1000.0).is_finite());
    }

    #[test]
    fn sigmoid_is_odd_around_half() {
        for &x in &[0.1f32, 1.0, 3.5, 9.0] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn softmax_rejects_empty_input() {
        let mut empty: [f32; 0] = [];
        assert_eq!(
            softmax_in_place(&mut empty),
            Err(GridYoloError::InvalidInput(
                "softmax requires at least one value"
            ))
        );
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-3.0]), Some(0));
    }
}
