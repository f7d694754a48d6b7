use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use sorter::postprocess::{decode_best_detection, decode_classification, softmax};

/// YOLOv8n at 640px emits 8400 candidates
const DETECTOR_ROWS: usize = 8400;

fn create_logits(n: usize) -> Vec<f32> {
    (0..n).map(|i| ((i * 37) % 101) as f32 / 10.0 - 5.0).collect()
}

fn create_detector_rows(rows: usize, classes: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, 5 + classes), |(r, c)| match c {
        0 | 1 => ((r * 13) % 640) as f32,
        2 | 3 => 20.0 + (r % 50) as f32,
        _ => ((r * 7 + c * 3) % 100) as f32 / 100.0,
    })
}

fn benchmark_softmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("softmax");

    for n in [4usize, 6, 1000] {
        let logits = create_logits(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &logits, |b, logits| {
            b.iter(|| softmax(black_box(logits)))
        });
    }

    group.finish();
}

fn benchmark_decode_classification(c: &mut Criterion) {
    let labels: Vec<String> = ["cardboard", "glass", "metal", "paper", "plastic", "trash"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let logits = create_logits(labels.len());

    c.bench_function("decode_classification_6", |b| {
        b.iter(|| decode_classification(black_box(&logits), black_box(&labels)))
    });
}

fn benchmark_best_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_detection");

    for classes in [1usize, 80] {
        let rows = create_detector_rows(DETECTOR_ROWS, classes);
        group.bench_with_input(
            BenchmarkId::new("rows_8400", format!("{}_classes", classes)),
            &rows,
            |b, rows| b.iter(|| decode_best_detection(black_box(rows.view()), 640)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_softmax,
    benchmark_decode_classification,
    benchmark_best_detection
);
criterion_main!(benches);
