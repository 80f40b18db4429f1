//! Python bindings for the gridyolo post-processing library.
//!
//! This module exposes the detector pipeline and the standalone NMS/IoU
//! helpers to Python via PyO3.

use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use gridyolo::lowlevel::suppress_indices;
use gridyolo::{
    AnchorSpec, BoundingBox, CenterCrop, ClassCatalog, CoordinateTransform,
    DetectConfig as RustDetectConfig, Detection as RustDetection, Detector as RustDetector,
    GridYoloError, Identity, Letterbox, ScaleToPixels, SuppressionMode, TensorView,
};

/// Convert a GridYoloError to a Python exception.
fn to_py_err(err: GridYoloError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// A labeled box with its confidence.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Class label.
    #[pyo3(get)]
    pub label: String,
    /// Class index in the model's logits.
    #[pyo3(get)]
    pub class_index: usize,
    /// Class probability times objectness, in [0, 1].
    #[pyo3(get)]
    pub confidence: f32,
    /// Left edge.
    #[pyo3(get)]
    pub x: f32,
    /// Top edge.
    #[pyo3(get)]
    pub y: f32,
    /// Box width.
    #[pyo3(get)]
    pub width: f32,
    /// Box height.
    #[pyo3(get)]
    pub height: f32,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(label='{}', confidence={:.4}, x={:.3}, y={:.3}, width={:.3}, height={:.3})",
            self.label, self.confidence, self.x, self.y, self.width, self.height
        )
    }
}

impl From<&RustDetection> for Detection {
    fn from(d: &RustDetection) -> Self {
        let b = d.bounds();
        Self {
            label: d.label().to_owned(),
            class_index: d.class().index(),
            confidence: d.confidence(),
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }
    }
}

fn parse_suppression(value: &str) -> PyResult<SuppressionMode> {
    match value.to_lowercase().as_str() {
        "class_agnostic" => Ok(SuppressionMode::ClassAgnostic),
        "per_class" => Ok(SuppressionMode::PerClass),
        _ => Err(PyValueError::new_err(
            "suppression must be 'class_agnostic' or 'per_class'",
        )),
    }
}

/// Thresholds and options for the detection pipeline.
#[pyclass]
#[derive(Clone)]
pub struct DetectConfig {
    inner: RustDetectConfig,
}

#[pymethods]
impl DetectConfig {
    /// Create a new DetectConfig.
    ///
    /// Args:
    ///     object_threshold: Minimum candidate confidence (default: 0.3)
    ///     nms_threshold: IoU above which candidates are suppressed (default: 0.3)
    ///     suppression: "class_agnostic" or "per_class" (default: "class_agnostic")
    ///     parallel: Decode grid rows in parallel (default: False)
    #[new]
    #[pyo3(signature = (object_threshold=0.3, nms_threshold=0.3, suppression="class_agnostic", parallel=false))]
    fn new(
        object_threshold: f32,
        nms_threshold: f32,
        suppression: &str,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustDetectConfig {
            object_threshold,
            nms_threshold,
            suppression: parse_suppression(suppression)?,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        let suppression = match self.inner.suppression {
            SuppressionMode::ClassAgnostic => "class_agnostic",
            SuppressionMode::PerClass => "per_class",
        };
        format!(
            "DetectConfig(object_threshold={}, nms_threshold={}, suppression='{}', parallel={})",
            self.inner.object_threshold, self.inner.nms_threshold, suppression, self.inner.parallel
        )
    }
}

fn build_transform(
    kind: &str,
    image_size: Option<(f32, f32)>,
    input_size: (f32, f32),
) -> PyResult<Box<dyn CoordinateTransform>> {
    let need_image = || {
        image_size.ok_or_else(|| PyValueError::new_err("image_size is required for this transform"))
    };
    let transform: Box<dyn CoordinateTransform> = match kind.to_lowercase().as_str() {
        "normalized" => Box::new(Identity),
        "scale_to_pixels" => {
            Box::new(ScaleToPixels::new(input_size.0, input_size.1).map_err(to_py_err)?)
        }
        "center_crop" => {
            let (w, h) = need_image()?;
            Box::new(CenterCrop::new(w, h).map_err(to_py_err)?)
        }
        "letterbox" => {
            let (w, h) = need_image()?;
            Box::new(Letterbox::new(w, h, input_size.0, input_size.1).map_err(to_py_err)?)
        }
        _ => {
            return Err(PyValueError::new_err(
                "transform must be 'normalized', 'scale_to_pixels', 'center_crop', or 'letterbox'",
            ))
        }
    };
    Ok(transform)
}

/// Decoder + NMS bound to one model layout and class catalog.
#[pyclass]
pub struct Detector {
    inner: RustDetector,
}

#[pymethods]
impl Detector {
    /// Create a detector.
    ///
    /// Args:
    ///     grid_rows: Output grid height (default: 13)
    ///     grid_cols: Output grid width (default: 13)
    ///     anchors: Interleaved anchor widths/heights in grid cells (default: Tiny-YOLO VOC)
    ///     labels: Class labels in logit order (default: Pascal VOC)
    ///     config: DetectConfig (default: DetectConfig())
    #[new]
    #[pyo3(signature = (grid_rows=13, grid_cols=13, anchors=None, labels=None, config=None))]
    fn new(
        grid_rows: usize,
        grid_cols: usize,
        anchors: Option<Vec<f32>>,
        labels: Option<Vec<String>>,
        config: Option<DetectConfig>,
    ) -> PyResult<Self> {
        let catalog = match labels {
            Some(labels) => ClassCatalog::from_labels(labels).map_err(to_py_err)?,
            None => ClassCatalog::voc(),
        };
        let spec = match anchors {
            Some(anchors) => {
                AnchorSpec::from_flat_anchors(grid_rows, grid_cols, catalog.len(), &anchors)
            }
            None => {
                let base = AnchorSpec::tiny_yolo_voc();
                AnchorSpec::new(grid_rows, grid_cols, catalog.len(), base.anchors)
            }
        }
        .map_err(to_py_err)?;
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = RustDetector::new(spec, catalog)
            .and_then(|d| d.with_config(cfg))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Expected tensor shape (channels, rows, cols).
    #[getter]
    fn tensor_shape(&self) -> (usize, usize, usize) {
        let [c, r, k] = self.inner.spec().tensor_shape();
        (c, r, k)
    }

    /// Class labels in index order.
    #[getter]
    fn labels(&self) -> Vec<String> {
        self.inner
            .catalog()
            .iter()
            .map(|c| c.label().to_owned())
            .collect()
    }

    /// Decode, suppress, and remap one output tensor.
    ///
    /// Args:
    ///     tensor: C-contiguous float32 array shaped (channels, rows, cols)
    ///     transform: "normalized", "scale_to_pixels", "center_crop", or "letterbox"
    ///     image_size: Original image (width, height) for crop/letterbox transforms
    ///     input_size: Model input (width, height) (default: (416, 416))
    ///
    /// Returns:
    ///     List of Detection objects, highest confidence first
    #[pyo3(signature = (tensor, transform="normalized", image_size=None, input_size=(416.0, 416.0)))]
    fn detect(
        &self,
        tensor: PyReadonlyArray3<'_, f32>,
        transform: &str,
        image_size: Option<(f32, f32)>,
        input_size: (f32, f32),
    ) -> PyResult<Vec<Detection>> {
        let shape = tensor.shape();
        let (channels, rows, cols) = (shape[0], shape[1], shape[2]);
        let data = tensor.as_slice()?;

        let view = TensorView::from_slice(data, channels, rows, cols).map_err(to_py_err)?;
        let transform = build_transform(transform, image_size, input_size)?;
        let detections = self
            .inner
            .detect(view, transform.as_ref())
            .map_err(to_py_err)?;
        Ok(detections.iter().map(Detection::from).collect())
    }

    fn __repr__(&self) -> String {
        let spec = self.inner.spec();
        format!(
            "Detector(grid={}x{}, classes={}, anchors={})",
            spec.grid_rows, spec.grid_cols, spec.num_classes, spec.num_anchors_per_cell
        )
    }
}

/// Greedy non-maximum suppression over (N, 4) boxes in (x, y, width, height) form.
///
/// Args:
///     boxes: float32 array shaped (N, 4)
///     scores: float32 array shaped (N,)
///     iou_threshold: IoU above which a lower score box is dropped (default: 0.3)
///     classes: Optional class ids; when given, only equal ids suppress each other
///
/// Returns:
///     Indices of kept boxes, highest score first
#[pyfunction]
#[pyo3(signature = (boxes, scores, iou_threshold=0.3, classes=None))]
fn nms(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    iou_threshold: f32,
    classes: Option<Vec<usize>>,
) -> PyResult<Vec<usize>> {
    let boxes_view = boxes.as_array();
    if boxes_view.ncols() != 4 {
        return Err(PyValueError::new_err("boxes must have shape (N, 4)"));
    }
    let rects: Vec<BoundingBox> = boxes_view
        .rows()
        .into_iter()
        .map(|r| BoundingBox::new(r[0], r[1], r[2], r[3]))
        .collect();
    let scores: Vec<f32> = scores.as_array().iter().copied().collect();

    suppress_indices(&rects, &scores, iou_threshold, classes.as_deref()).map_err(to_py_err)
}

/// Intersection-over-Union of two (x, y, width, height) boxes.
#[pyfunction]
fn iou(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> f32 {
    let a = BoundingBox::new(a.0, a.1, a.2, a.3);
    let b = BoundingBox::new(b.0, b.1, b.2, b.3);
    gridyolo::compute_iou(&a, &b)
}

/// Python module for gridyolo detection post-processing.
#[pymodule]
fn _gridyolo(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<DetectConfig>()?;
    m.add_class::<Detector>()?;
    m.add_function(wrap_pyfunction!(nms, m)?)?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
