use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use keyloc_features::{Brisk, BriskConfig, HammingMatcher, LocaliserConfig, ObjectLocaliser};

/// Blocky texture with plenty of corners
fn create_benchmark_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let cell = (x / 12).wrapping_mul(2654435761) ^ (y / 12).wrapping_mul(40503);
        Luma([(cell >> 5) as u8])
    })
}

fn bench_detect_and_compute(c: &mut Criterion) {
    let brisk = Brisk::new(BriskConfig::default()).unwrap();
    let mut group = c.benchmark_group("detect_and_compute");
    for &(w, h) in &[(320u32, 240u32), (640, 480)] {
        let img = create_benchmark_image(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &img, |b, img| {
            b.iter(|| brisk.detect_and_compute(black_box(img)).unwrap())
        });
    }
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let brisk = Brisk::new(BriskConfig::default()).unwrap();
    let (_, query) = brisk.detect_and_compute(&create_benchmark_image(320, 240)).unwrap();
    let (_, train) = brisk.detect_and_compute(&create_benchmark_image(640, 480)).unwrap();
    let matcher = HammingMatcher::default();

    c.bench_function("hamming_match", |b| {
        b.iter(|| matcher.match_descriptors(black_box(&query), black_box(&train)))
    });
}

fn bench_localise(c: &mut Criterion) {
    let object = imageops::crop_imm(&create_benchmark_image(640, 480), 200, 150, 160, 120).to_image();
    let object = RgbImage::from_fn(object.width(), object.height(), |x, y| {
        let v = object.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    let mut scene = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
    imageops::replace(&mut scene, &object, 240, 180);
    let localiser = ObjectLocaliser::new(LocaliserConfig::default()).unwrap();

    c.bench_function("localise_160x120_in_640x480", |b| {
        b.iter(|| localiser.localise(black_box(&object), black_box(&scene)).unwrap())
    });
}

criterion_group!(benches, bench_detect_and_compute, bench_matching, bench_localise);
criterion_main!(benches);
