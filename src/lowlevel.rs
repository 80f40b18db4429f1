//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the scoring primitives, index-based suppression, and the
//! contiguous-buffer view helper used by the high-level `Detector`. Most users
//! should prefer `Detector` or `detect_objects`.

pub use crate::anchor::BOX_CHANNELS;
pub use crate::candidate::nms::suppress_indices;
pub use crate::decode::view_for_spec;
pub use crate::tensor::{Strides, TensorElement};
pub use crate::util::math::{argmax, sigmoid, softmax, softmax_in_place};
