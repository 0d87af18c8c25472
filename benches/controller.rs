//! Benchmarks for the sliding-window layout engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use videopan::panorama::{FrameController, PanoramaParams};

fn params(start_frame: u64, max_frames: usize) -> PanoramaParams {
    PanoramaParams {
        start_frame,
        max_frames,
        ..Default::default()
    }
}

fn bench_steady_state_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_state_update");
    for max_frames in [100, 400] {
        group.bench_function(format!("{max_frames}_slices"), |b| {
            let mut controller: FrameController<u32> = FrameController::new();
            controller.update(&params(0, max_frames));
            b.iter(|| {
                controller.update(black_box(&params(0, max_frames)));
            });
        });
    }
    group.finish();
}

fn bench_window_slide(c: &mut Criterion) {
    c.bench_function("window_slide_1_frame", |b| {
        let mut controller: FrameController<u32> = FrameController::new();
        let mut start = 0u64;
        controller.update(&params(start, 200));
        b.iter(|| {
            start += 1;
            controller.update(black_box(&params(start, 200)));
        });
    });
}

fn bench_window_rebuild(c: &mut Criterion) {
    c.bench_function("window_rebuild_disjoint_jump", |b| {
        let mut controller: FrameController<u32> = FrameController::new();
        let mut start = 0u64;
        b.iter(|| {
            start += 10_000;
            controller.update(black_box(&params(start, 200)));
        });
    });
}

criterion_group!(
    benches,
    bench_steady_state_update,
    bench_window_slide,
    bench_window_rebuild
);
criterion_main!(benches);
