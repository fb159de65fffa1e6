//! Benchmarks for the CPU side of a frame.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orrery::camera::CameraControls;
use orrery::shader;
use orrery::time::Tick;
use orrery::{Action, RecordingBackend, Scene, SceneConfig};

fn tick(sim_time: f32) -> Tick {
    Tick {
        dt: 1.0 / 60.0,
        animation_dt: 1.0 / 60.0,
        sim_time,
        paused: false,
    }
}

fn build() -> (Scene, RecordingBackend) {
    let mut backend = RecordingBackend::new();
    let scene = Scene::build(&SceneConfig::solar_system(), &mut backend).expect("default scene is valid");
    (scene, backend)
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    let controls = CameraControls::default();

    group.bench_function("orbital", |b| {
        let (mut scene, _) = build();
        let mut t = 0.0;
        b.iter(|| {
            t += 1.0 / 60.0;
            black_box(scene.step(tick(t), &[], &controls))
        })
    });

    group.bench_function("collapsing", |b| {
        let (mut scene, _) = build();
        scene.step(tick(0.0), &[Action::ActivateCollapse], &controls);
        // Stays mid-collapse.
        b.iter(|| black_box(scene.step(tick(3.0), &[], &controls)))
    });

    group.bench_function("following", |b| {
        let (mut scene, _) = build();
        scene.step(tick(0.0), &[Action::CycleSelection], &controls);
        let mut t = 0.0;
        b.iter(|| {
            t += 1.0 / 60.0;
            black_box(scene.step(tick(t), &[], &controls))
        })
    });

    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    let controls = CameraControls::default();

    // Full trails are the expensive part of a submit.
    for frames in [1usize, 150, 600] {
        group.bench_with_input(BenchmarkId::new("trail_frames", frames), &frames, |b, &frames| {
            let (mut scene, mut backend) = build();
            for i in 0..frames {
                let mut t = tick(i as f32 * 0.25);
                t.dt = 0.25;
                t.animation_dt = 0.25;
                scene.step(t, &[], &controls);
            }
            b.iter(|| {
                scene.submit(&mut backend, 16.0 / 9.0);
                black_box(backend.draws.len())
            })
        });
    }

    group.finish();
}

fn bench_shader_compose(c: &mut Criterion) {
    c.bench_function("body_shader", |b| b.iter(|| black_box(shader::body_shader())));
}

criterion_group!(benches, bench_step, bench_submit, bench_shader_compose);
criterion_main!(benches);
