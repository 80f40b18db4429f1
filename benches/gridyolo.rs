use gridyolo::{
    decode, suppress, AnchorSpec, BoundingBox, ClassCatalog, DetectConfig, Detection, Detector,
    ScaleToPixels, TensorView,
};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn make_tensor(spec: &AnchorSpec) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..spec.tensor_len())
        .map(|_| rng.random_range(-4.0f32..4.0))
        .collect()
}

fn make_detections(catalog: &ClassCatalog, count: usize) -> Vec<Detection> {
    let mut rng = StdRng::seed_from_u64(9);
    (0..count)
        .map(|_| {
            let class = catalog
                .get(rng.random_range(0..catalog.len()))
                .unwrap()
                .clone();
            let bounds = BoundingBox::new(
                rng.random_range(0.0f32..0.9),
                rng.random_range(0.0f32..0.9),
                rng.random_range(0.02f32..0.3),
                rng.random_range(0.02f32..0.3),
            );
            Detection::new(class, bounds, rng.random_range(0.01f32..1.0)).unwrap()
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let spec = AnchorSpec::tiny_yolo_voc();
    let catalog = ClassCatalog::voc();
    let data = make_tensor(&spec);
    let view = TensorView::from_slice(&data, 125, 13, 13).unwrap();

    c.bench_function("decode_tiny_yolo_voc", |b| {
        b.iter(|| black_box(decode(view, &spec, &catalog, 0.05).unwrap()));
    });

    let dets = make_detections(&catalog, 500);
    c.bench_function("suppress_500", |b| {
        b.iter(|| black_box(suppress(&dets, 0.3).unwrap()));
    });

    let detector = Detector::tiny_yolo_voc()
        .with_config(DetectConfig {
            object_threshold: 0.05,
            ..DetectConfig::default()
        })
        .unwrap();
    let to_pixels = ScaleToPixels::new(416.0, 416.0).unwrap();
    c.bench_function("detect_tiny_yolo_voc", |b| {
        b.iter(|| black_box(detector.detect_slice(&data, &to_pixels).unwrap()));
    });

    #[cfg(feature = "rayon")]
    {
        let parallel = detector
            .clone()
            .with_config(DetectConfig {
                parallel: true,
                ..*detector.config()
            })
            .unwrap();
        c.bench_function("detect_tiny_yolo_voc_parallel", |b| {
            b.iter(|| black_box(parallel.detect_slice(&data, &to_pixels).unwrap()));
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
