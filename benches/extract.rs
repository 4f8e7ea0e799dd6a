use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use scene_geometry::contour::trace_filtered;
use scene_geometry::mask::{clean_mask, threshold_mask};
use scene_geometry::sampling::sample;
use scene_geometry::{extract_levels, Dimensions, DetectorError};

fn synthetic_edges(width: usize, height: usize) -> Array2<u8> {
    Array2::from_shape_fn((height, width), |(y, x)| {
        let grid = x % 64 < 2 || y % 48 < 2;
        let diagonal = (x + y) % 97 < 2;
        if grid || diagonal {
            220
        } else if (x * 31 + y * 17) % 101 == 0 {
            150
        } else {
            8
        }
    })
}

fn bench_mask_and_trace(c: &mut Criterion) {
    let edges = synthetic_edges(1024, 768);
    let mask = threshold_mask(edges.view(), 0.3).unwrap();

    c.bench_function("clean_mask_1024x768", |b| {
        b.iter(|| {
            let cleaned = clean_mask(black_box(mask.view()), 50).unwrap();
            black_box(cleaned);
        });
    });

    let cleaned = clean_mask(mask.view(), 50).unwrap();
    c.bench_function("trace_filtered_1024x768", |b| {
        b.iter(|| {
            let contours = trace_filtered(black_box(cleaned.view()), 20.0, 2.0, 0);
            black_box(contours.len());
        });
    });
}

fn bench_extract_levels(c: &mut Criterion) {
    let mut detector = |w: usize, h: usize| -> Result<Array2<u8>, DetectorError> {
        Ok(synthetic_edges(w, h))
    };

    c.bench_function("extract_levels_512_768_1024", |b| {
        b.iter(|| {
            let levels =
                extract_levels(&mut detector, &[512, 768, 1024], 4000, 3000, 0.3, 10.0).unwrap();
            black_box(levels.len());
        });
    });
}

fn bench_sample(c: &mut Criterion) {
    let edges = synthetic_edges(512, 384);
    let original = Dimensions::new(4000, 3000);

    c.bench_function("sample_50k_points", |b| {
        b.iter(|| {
            let cloud = sample(black_box(edges.view()), 50_000, 0.8, original, Some(1)).unwrap();
            black_box(cloud.points.len());
        });
    });
}

criterion_group!(benches, bench_mask_and_trace, bench_extract_levels, bench_sample);
criterion_main!(benches);
