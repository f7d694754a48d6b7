use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use preprocess::{CpuPreProcessor, Image, NormalizedBox, Normalization};

/// Gradient test image so the resampler cannot shortcut flat regions
fn create_test_image(width: u32, height: u32) -> Image {
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            pixels[idx] = (x % 256) as u8; // R
            pixels[idx + 1] = (y % 256) as u8; // G
            pixels[idx + 2] = ((x + y) % 256) as u8; // B
        }
    }
    Image::from_rgb(width, height, pixels).unwrap()
}

fn benchmark_classifier_tensor(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier_tensor");

    let resolutions = [(224, 224), (640, 480), (1280, 720), (1920, 1080), (4032, 3024)];
    let preprocessor = CpuPreProcessor::new(224, Normalization::imagenet());

    for (width, height) in resolutions.iter() {
        let image = create_test_image(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("imagenet_224", format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| preprocessor.to_tensor(black_box(image)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_detector_tensor(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector_tensor");

    let resolutions = [(640, 640), (1280, 720), (1920, 1080)];
    let preprocessor = CpuPreProcessor::new(640, Normalization::UnitScale);

    for (width, height) in resolutions.iter() {
        let image = create_test_image(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("unit_640", format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| preprocessor.to_tensor(black_box(image)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_crop(c: &mut Criterion) {
    let image = create_test_image(1920, 1080);
    let region = NormalizedBox::centered(0.5);

    c.bench_function("crop_center_1080p", |b| {
        b.iter(|| image.crop(black_box(&region)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_classifier_tensor,
    benchmark_detector_tensor,
    benchmark_crop
);
criterion_main!(benches);
