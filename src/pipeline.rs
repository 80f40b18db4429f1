//! Decode, suppress, and remap in one call.

use crate::anchor::AnchorSpec;
use crate::candidate::nms::{suppress_with_mode, validate_nms_threshold, SuppressionMode};
use crate::candidate::Detection;
use crate::catalog::ClassCatalog;
use crate::decode::{decode, view_for_spec};
use crate::tensor::{TensorElement, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::transform::CoordinateTransform;
use crate::util::{GridYoloError, GridYoloResult};

/// Thresholds and execution options for the detection pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectConfig {
    /// Minimum `class probability * objectness` for a slot to become a candidate.
    pub object_threshold: f32,
    /// IoU above which a lower-confidence candidate is suppressed.
    pub nms_threshold: f32,
    /// Whether suppression crosses class boundaries.
    pub suppression: SuppressionMode,
    /// Decode grid rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            object_threshold: 0.3,
            nms_threshold: 0.3,
            suppression: SuppressionMode::ClassAgnostic,
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Checks that both thresholds lie in `[0, 1]`.
    pub fn validate(&self) -> GridYoloResult<()> {
        if !(0.0..=1.0).contains(&self.object_threshold) {
            return Err(GridYoloError::InvalidConfiguration(
                "object_threshold must be within [0, 1]",
            ));
        }
        validate_nms_threshold(self.nms_threshold)
    }
}

/// Runs decode, suppression, and `transform` on one output tensor.
pub fn detect_objects<T, C>(
    tensor: TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    config: &DetectConfig,
    transform: &C,
) -> GridYoloResult<Vec<Detection>>
where
    T: TensorElement,
    C: CoordinateTransform + ?Sized,
{
    config.validate()?;
    let _span = trace_span!("detect_objects").entered();

    let candidates = run_decode(tensor, spec, catalog, config)?;
    let kept = suppress_with_mode(&candidates, config.nms_threshold, config.suppression)?;
    let out: Vec<Detection> = kept
        .iter()
        .map(|det| det.with_bounds(transform.apply(det.bounds())))
        .collect();

    trace_event!("detections", count = out.len());
    Ok(out)
}

#[cfg(feature = "rayon")]
fn run_decode<T: TensorElement>(
    tensor: TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    config: &DetectConfig,
) -> GridYoloResult<Vec<Detection>> {
    if config.parallel {
        crate::decode::decode_par(tensor, spec, catalog, config.object_threshold)
    } else {
        decode(tensor, spec, catalog, config.object_threshold)
    }
}

#[cfg(not(feature = "rayon"))]
fn run_decode<T: TensorElement>(
    tensor: TensorView<'_, T>,
    spec: &AnchorSpec,
    catalog: &ClassCatalog,
    config: &DetectConfig,
) -> GridYoloResult<Vec<Detection>> {
    decode(tensor, spec, catalog, config.object_threshold)
}

/// Detector bound to one model layout and class catalog.
///
/// Holds only read-only configuration, so one instance can serve many
/// threads.
#[derive(Clone, Debug)]
pub struct Detector {
    spec: AnchorSpec,
    catalog: ClassCatalog,
    config: DetectConfig,
}

impl Detector {
    /// Creates a detector with the default [`DetectConfig`].
    pub fn new(spec: AnchorSpec, catalog: ClassCatalog) -> GridYoloResult<Self> {
        spec.validate()?;
        if catalog.len() != spec.num_classes {
            return Err(GridYoloError::InvalidConfiguration(
                "class catalog size must equal num_classes",
            ));
        }
        Ok(Self {
            spec,
            catalog,
            config: DetectConfig::default(),
        })
    }

    /// Tiny-YOLO-v2 VOC layout with the 20 VOC labels.
    pub fn tiny_yolo_voc() -> Self {
        Self {
            spec: AnchorSpec::tiny_yolo_voc(),
            catalog: ClassCatalog::voc(),
            config: DetectConfig::default(),
        }
    }

    /// Replaces the pipeline configuration after validating it.
    pub fn with_config(mut self, config: DetectConfig) -> GridYoloResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Anchor layout.
    pub fn spec(&self) -> &AnchorSpec {
        &self.spec
    }

    /// Class catalog.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Current configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Decodes candidates without suppression.
    pub fn decode<T: TensorElement>(&self, tensor: TensorView<'_, T>) -> GridYoloResult<Vec<Detection>> {
        run_decode(tensor, &self.spec, &self.catalog, &self.config)
    }

    /// Full pipeline on a tensor view.
    pub fn detect<T, C>(&self, tensor: TensorView<'_, T>, transform: &C) -> GridYoloResult<Vec<Detection>>
    where
        T: TensorElement,
        C: CoordinateTransform + ?Sized,
    {
        detect_objects(tensor, &self.spec, &self.catalog, &self.config, transform)
    }

    /// Full pipeline on a contiguous buffer shaped like the detector's spec.
    pub fn detect_slice<T, C>(&self, data: &[T], transform: &C) -> GridYoloResult<Vec<Detection>>
    where
        T: TensorElement,
        C: CoordinateTransform + ?Sized,
    {
        let tensor = view_for_spec(data, &self.spec)?;
        self.detect(tensor, transform)
    }
}

#[cfg(test)]
mod tests {
    use super::{DetectConfig, Detector};
    use crate::transform::Identity;
    use crate::GridYoloError;

    #[test]
    fn default_config_matches_observed_model() {
        let cfg = DetectConfig::default();
        assert_eq!(cfg.object_threshold, 0.3);
        assert_eq!(cfg.nms_threshold, 0.3);
        cfg.validate().unwrap();
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let cfg = DetectConfig {
            object_threshold: 1.2,
            ..DetectConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(GridYoloError::InvalidConfiguration(
                "object_threshold must be within [0, 1]"
            ))
        );
        let cfg = DetectConfig {
            nms_threshold: f32::NAN,
            ..DetectConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(Detector::tiny_yolo_voc().with_config(cfg).is_err());
    }

    #[test]
    fn silent_tensor_yields_nothing() {
        let detector = Detector::tiny_yolo_voc();
        let data = vec![0.0f32; detector.spec().tensor_len()];
        // 0.5 objectness * 1/20 class probability is far below 0.3.
        let dets = detector.detect_slice(&data, &Identity).unwrap();
        assert!(dets.is_empty());
    }
}
