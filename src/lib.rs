//! gridyolo turns the raw output tensor of a YOLO-v2 style grid detector into
//! labeled bounding boxes.
//!
//! The pipeline is CPU-only and allocation-light: anchor-box decoding with
//! sigmoid/softmax scoring, greedy IoU non-maximum suppression, and a
//! caller-supplied coordinate transform. Row-parallel decoding is available
//! via the `rayon` feature.

pub mod anchor;
mod candidate;
pub mod catalog;
pub mod decode;
pub mod geometry;
pub mod lowlevel;
pub mod pipeline;
pub mod tensor;
mod trace;
pub mod transform;
pub mod util;

pub use anchor::{AnchorShape, AnchorSpec};
pub use candidate::nms::{suppress, suppress_with_mode, SuppressionMode};
pub use candidate::Detection;
pub use catalog::{ClassCatalog, DetectableClass, VOC_LABELS};
pub use decode::{decode, decode_slice};
pub use geometry::{compute_iou, BoundingBox};
pub use pipeline::{detect_objects, DetectConfig, Detector};
pub use tensor::TensorView;
pub use transform::{CenterCrop, CoordinateTransform, Identity, Letterbox, ScaleToPixels};
pub use util::math::{argmax, sigmoid, softmax};
pub use util::{GridYoloError, GridYoloResult};

#[cfg(feature = "rayon")]
pub use decode::decode_par;
