use gridyolo::lowlevel::{view_for_spec, Strides};
use gridyolo::{decode, decode_slice, AnchorSpec, ClassCatalog, GridYoloError, TensorView};

/// Writes `value` into a contiguous CHW Tiny-YOLO tensor.
fn set(data: &mut [f32], spec: &AnchorSpec, channel: usize, row: usize, col: usize, value: f32) {
    data[(channel * spec.grid_rows + row) * spec.grid_cols + col] = value;
}

/// Tensor with a single confident slot: anchor `b` at `(row, col)`, class `class_idx`.
fn single_hot_tensor(
    spec: &AnchorSpec,
    row: usize,
    col: usize,
    b: usize,
    class_idx: usize,
) -> Vec<f32> {
    let mut data = vec![0.0f32; spec.tensor_len()];
    let base = b * (spec.num_classes + 5);
    set(&mut data, spec, base + 4, row, col, 10.0);
    set(&mut data, spec, base + 5 + class_idx, row, col, 10.0);
    data
}

#[test]
fn single_hot_anchor_decodes_one_detection() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let (row, col, b, class_idx) = (4, 9, 2, 11);
    let data = single_hot_tensor(&spec, row, col, b, class_idx);
    assert_eq!(data.len(), 125 * 13 * 13);

    let dets = decode_slice(&data, &spec, &catalog, 0.3).unwrap();
    assert_eq!(dets.len(), 1);
    let det = &dets[0];
    assert_eq!(det.class().index(), class_idx);
    assert_eq!(det.label(), "dog");

    // sigmoid(10) * softmax with one logit at 10 among 20.
    let objectness = 1.0 / (1.0 + (-10.0f32).exp());
    let class_prob = 1.0 / (1.0 + 19.0 * (-10.0f32).exp());
    assert!((det.confidence() - objectness * class_prob).abs() < 1e-5);
    assert!(det.confidence() > 0.999);

    let (cx, cy) = det.bounds().center();
    assert!((cx - (col as f32 + 0.5) / 13.0).abs() < 1e-5);
    assert!((cy - (row as f32 + 0.5) / 13.0).abs() < 1e-5);
    let anchor = spec.anchors[b];
    assert!((det.bounds().width - anchor.width / 13.0).abs() < 1e-5);
    assert!((det.bounds().height - anchor.height / 13.0).abs() < 1e-5);
}

#[test]
fn threshold_above_one_yields_nothing() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let data = single_hot_tensor(&spec, 0, 0, 0, 0);
    assert!(decode_slice(&data, &spec, &catalog, 1.01).unwrap().is_empty());
}

#[test]
fn negative_threshold_matches_zero_threshold() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let data = single_hot_tensor(&spec, 6, 6, 4, 3);
    let at_zero = decode_slice(&data, &spec, &catalog, 0.0).unwrap();
    let below_zero = decode_slice(&data, &spec, &catalog, -0.01).unwrap();
    assert_eq!(at_zero.len(), 13 * 13 * 5);
    assert_eq!(at_zero, below_zero);
}

#[test]
fn iteration_order_is_row_col_anchor() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let dets = decode_slice(&vec![0.0f32; spec.tensor_len()], &spec, &catalog, 0.0).unwrap();
    // Slot (row 0, col 1, anchor 0) follows the five anchors of (0, 0).
    let (cx, cy) = dets[5].bounds().center();
    assert!((cx - 1.5 / 13.0).abs() < 1e-5);
    assert!((cy - 0.5 / 13.0).abs() < 1e-5);
    let (_, cy_next_row) = dets[13 * 5].bounds().center();
    assert!((cy_next_row - 1.5 / 13.0).abs() < 1e-5);
}

#[test]
fn box_regression_offsets_move_the_box() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let (row, col, b) = (2, 3, 1);
    let mut data = single_hot_tensor(&spec, row, col, b, 0);
    let base = b * 25;
    set(&mut data, &spec, base, row, col, 2.0);
    set(&mut data, &spec, base + 1, row, col, -1.0);
    set(&mut data, &spec, base + 2, row, col, 0.5);
    set(&mut data, &spec, base + 3, row, col, -0.5);

    let dets = decode_slice(&data, &spec, &catalog, 0.5).unwrap();
    assert_eq!(dets.len(), 1);
    let bounds = dets[0].bounds();
    let sig = |x: f32| 1.0 / (1.0 + (-x).exp());
    let (cx, cy) = bounds.center();
    assert!((cx - (col as f32 + sig(2.0)) / 13.0).abs() < 1e-5);
    assert!((cy - (row as f32 + sig(-1.0)) / 13.0).abs() < 1e-5);
    assert!((bounds.width - 3.42 * 0.5f32.exp() / 13.0).abs() < 1e-5);
    assert!((bounds.height - 4.41 * (-0.5f32).exp() / 13.0).abs() < 1e-5);
}

#[test]
fn f64_tensors_decode_like_f32() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let data = single_hot_tensor(&spec, 12, 0, 3, 19);
    let data64: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    let a = decode_slice(&data, &spec, &catalog, 0.3).unwrap();
    let b = decode_slice(&data64, &spec, &catalog, 0.3).unwrap();
    assert_eq!(a, b);
    assert_eq!(b[0].label(), "tvmonitor");
}

#[test]
fn strided_view_matches_contiguous_decode() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let data = single_hot_tensor(&spec, 7, 5, 0, 14);

    // Re-layout as channel-last (HWC).
    let channels = spec.channels();
    let mut hwc = vec![0.0f32; data.len()];
    for c in 0..channels {
        for r in 0..13 {
            for k in 0..13 {
                hwc[(r * 13 + k) * channels + c] = data[(c * 13 + r) * 13 + k];
            }
        }
    }
    let strides = Strides {
        channel: 1,
        row: 13 * channels,
        col: channels,
    };
    let view = TensorView::new(&hwc, channels, 13, 13, strides).unwrap();
    let strided = decode(view, &spec, &catalog, 0.3).unwrap();
    let contiguous = decode(view_for_spec(&data, &spec).unwrap(), &spec, &catalog, 0.3).unwrap();
    assert_eq!(strided, contiguous);
    assert_eq!(strided[0].label(), "person");
}

#[test]
fn wrong_anchor_count_in_buffer_is_shape_mismatch() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    // A 4-anchor tensor handed to a 5-anchor spec.
    let data = vec![0.0f32; 100 * 13 * 13];
    let err = decode_slice(&data, &spec, &catalog, 0.3).unwrap_err();
    assert_eq!(
        err,
        GridYoloError::ShapeMismatch {
            expected: [125, 13, 13],
            got: Some([100, 13, 13]),
            got_len: 100 * 13 * 13,
        }
    );
}

#[test]
fn ragged_buffer_is_shape_mismatch() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    for len in [125 * 13 * 13 - 1, 125 * 13 * 13 + 1, 4] {
        let ragged = vec![0.0f32; len];
        assert_eq!(
            decode_slice(&ragged, &spec, &catalog, 0.3).unwrap_err(),
            GridYoloError::ShapeMismatch {
                expected: [125, 13, 13],
                got: None,
                got_len: len,
            }
        );
    }
    assert!(matches!(
        decode_slice(&Vec::<f32>::new(), &spec, &catalog, 0.3),
        Err(GridYoloError::ShapeMismatch { got: Some([0, 13, 13]), .. })
    ));
}

#[test]
fn overflowing_grid_fails_instead_of_panicking() {
    let mut spec = AnchorSpec::tiny_yolo_voc();
    spec.grid_rows = 1 << (usize::BITS / 2);
    spec.grid_cols = 1 << (usize::BITS / 2);
    let data = [0.0f32; 4];
    assert_eq!(
        decode_slice(&data, &spec, &ClassCatalog::voc(), 0.3).unwrap_err(),
        GridYoloError::InvalidConfiguration("tensor size overflows usize")
    );
}

#[test]
fn nan_threshold_is_rejected() {
    let spec = AnchorSpec::tiny_yolo_voc();
    let data = vec![0.0f32; spec.tensor_len()];
    assert_eq!(
        decode_slice(&data, &spec, &ClassCatalog::voc(), f32::NAN).unwrap_err(),
        GridYoloError::InvalidConfiguration("object_threshold must not be NaN")
    );
}
