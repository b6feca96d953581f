//! Brush engine benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pigmix::brush::{build_centerline, stamp_positions, DEFAULT_STEPS_PER_SEGMENT};
use pigmix::{BrushSettings, EngineConfig, PaintEngine, Point, Region};

fn generate_stroke(count: usize) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            Point::new(
                20.0 + t * 700.0,
                (t * std::f32::consts::PI * 4.0).sin() * 150.0 + 380.0,
            )
        })
        .collect()
}

fn make_engine(settings: BrushSettings) -> PaintEngine {
    let config = EngineConfig {
        brush: settings,
        ..EngineConfig::default()
    };
    match PaintEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => panic!("benchmark engine: {}", e),
    }
}

fn draw(engine: &mut PaintEngine, points: &[Point]) {
    engine.begin_stroke(points[0].x, points[0].y, Region::Canvas);
    for p in &points[1..] {
        engine.extend_stroke(p.x, p.y);
    }
    engine.end_stroke();
}

fn benchmark_curve_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("Curve Building");

    for count in [10, 100, 1000].iter() {
        let points = generate_stroke(*count);
        group.bench_with_input(BenchmarkId::new("centerline", count), &points, |b, points| {
            b.iter(|| {
                let line = build_centerline(points, DEFAULT_STEPS_PER_SEGMENT);
                stamp_positions(&line, 4.8)
            })
        });
    }

    group.finish();
}

fn benchmark_live_stroke(c: &mut Criterion) {
    let mut group = c.benchmark_group("Live Stroke");
    group.sample_size(10);

    let points = generate_stroke(100);
    for (name, spacing) in [("default", 0.2), ("high_spacing", 0.5), ("low_spacing", 0.1)] {
        let settings = BrushSettings {
            spacing,
            ..Default::default()
        };
        group.bench_function(name, |b| {
            b.iter_batched(
                || make_engine(settings.clone()),
                |mut engine| draw(&mut engine, &points),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn benchmark_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ledger Replay");
    group.sample_size(10);

    let mut engine = make_engine(BrushSettings::default());
    for offset in 0..5 {
        let points: Vec<Point> = generate_stroke(60)
            .into_iter()
            .map(|p| Point::new(p.x, p.y + offset as f32 * 30.0 - 60.0))
            .collect();
        draw(&mut engine, &points);
    }

    group.bench_function("redraw_all", |b| {
        b.iter(|| engine.redraw_all())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_curve_building,
    benchmark_live_stroke,
    benchmark_replay
);
criterion_main!(benches);
