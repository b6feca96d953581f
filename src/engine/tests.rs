use super::*;
use image::Rgba;

const BLUE: Color = Color::new(0.2, 0.3, 0.8, 1.0);
const ORANGE: Color = Color::new(0.9, 0.5, 0.1, 1.0);

/// 480×240 surface: canvas is x < 360, palette is x >= 360
fn test_config(brush: BrushSettings) -> EngineConfig {
    EngineConfig {
        width: 480,
        height: 240,
        brush,
        selected_color: BLUE,
        ..EngineConfig::default()
    }
}

fn make_engine() -> PaintEngine {
    PaintEngine::new(test_config(BrushSettings::default())).unwrap()
}

fn wavy_points(x0: f32, count: usize) -> Vec<(f32, f32)> {
    (0..count)
        .map(|i| (x0 + i as f32 * 12.0, 120.0 + (i as f32 * 0.7).sin() * 40.0))
        .collect()
}

fn draw(engine: &mut PaintEngine, region: Region, points: &[(f32, f32)]) {
    engine.begin_stroke(points[0].0, points[0].1, region);
    for &(x, y) in &points[1..] {
        engine.extend_stroke(x, y);
    }
    engine.end_stroke();
}

fn draw_scene(engine: &mut PaintEngine) {
    draw(engine, Region::Canvas, &wavy_points(30.0, 20));

    engine.set_brush_size(40.0);
    engine.set_pickup_amount(0.5);
    engine.begin_stroke(60.0, 60.0, Region::Canvas);
    for i in 1..15 {
        if i == 7 {
            engine.set_selected_color(ORANGE);
        }
        engine.extend_stroke(60.0 + i as f32 * 15.0, 60.0 + i as f32 * 8.0);
    }
    engine.end_stroke();

    draw(engine, Region::Palette, &[(380.0, 40.0), (400.0, 60.0), (420.0, 50.0), (440.0, 80.0), (460.0, 90.0)]);
}

/// Straight horizontal stroke through y = 100.5 whose stamps land every 10px
fn hard_line_engine(background: Option<RgbaImage>) -> PaintEngine {
    let brush = BrushSettings {
        size: 40.0,
        flow: 0.3,
        spacing: 0.25,
        hardness: 1.0,
        pickup_amount: 0.0,
        return_rate: 0.0,
    };
    let assets = EngineAssets::new();
    if let Some(bg) = background {
        assets.background.replace(bg);
    }
    let mut engine = PaintEngine::with_assets(test_config(brush), assets).unwrap();
    let points: Vec<(f32, f32)> = (0..11).map(|i| (95.5 + i as f32 * 20.0, 100.5)).collect();
    draw(&mut engine, Region::Canvas, &points);
    engine
}

#[test]
fn test_redraw_is_idempotent() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    let live = engine.surface().fingerprints();

    engine.redraw_all().unwrap();
    assert_eq!(engine.surface().fingerprints(), live);
    engine.redraw_all().unwrap();
    assert_eq!(engine.surface().fingerprints(), live);
}

#[test]
fn test_same_input_same_pixels() {
    let mut a = make_engine();
    let mut b = make_engine();
    draw_scene(&mut a);
    draw_scene(&mut b);
    assert_eq!(a.surface().fingerprints(), b.surface().fingerprints());
}

#[test]
fn test_display_mode_never_touches_buffers() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    let before = engine.surface().fingerprints();

    for _ in 0..5 {
        let mode = engine.display_mode().toggled();
        let frame = engine.set_display_mode(mode);
        assert_eq!(frame.dimensions(), (480, 240));
    }
    assert_eq!(engine.display_mode(), MixModel::Linear);
    assert_eq!(engine.surface().fingerprints(), before);
}

#[test]
fn test_hard_stamps_accumulate_alpha() {
    let engine = hard_line_engine(None);

    // Stamps at x = 185.5, 195.5, 205.5, 215.5 fully cover (200, 100)
    let mut expected = 0.0f32;
    for _ in 0..4 {
        expected += 0.3 * (1.0 - expected);
    }
    for model in MixModel::ALL {
        let px = engine
            .surface()
            .sample_color(200.5, 100.5, model, Region::Canvas)
            .unwrap();
        assert!((px.a - expected).abs() < 1e-5, "{:?}: {} vs {}", model, px.a, expected);
        assert!(Color::new(px.r, px.g, px.b, 1.0).max_channel_delta(&BLUE) < 1e-3);
    }
}

#[test]
fn test_blue_over_yellow_turns_green_only_in_pigment() {
    let yellow = RgbaImage::from_pixel(1, 1, Rgba([255, 230, 25, 255]));
    let engine = hard_line_engine(Some(yellow));
    let surface = engine.surface();

    let pigment = surface
        .sample_color(200.5, 100.5, MixModel::Pigment, Region::Canvas)
        .unwrap();
    let linear = surface
        .sample_color(200.5, 100.5, MixModel::Linear, Region::Canvas)
        .unwrap();

    assert!(pigment.g > pigment.b, "pigment {:?}", pigment);
    assert!(linear.b > linear.g, "linear {:?}", linear);
    assert!(pigment.max_channel_delta(&linear) > 0.1);
    assert_eq!(pigment.a, 1.0);
    assert_eq!(linear.a, 1.0);
}

#[test]
fn test_clear_palette_keeps_canvas() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    let before = engine.surface().fingerprints();

    engine.clear_region(Region::Palette);
    let after = engine.surface().fingerprints();
    assert_eq!(after[..2], before[..2]);
    assert_ne!(after[2], before[2]);

    let blank = make_engine();
    assert_eq!(after[2..], blank.surface().fingerprints()[2..]);
    assert!(engine.ledger().iter().all(|s| s.region == Region::Canvas));

    // Palette strokes stay gone after a full replay
    engine.redraw_all().unwrap();
    assert_eq!(engine.surface().fingerprints(), after);
}

#[test]
fn test_short_stroke_is_recorded_but_invisible() {
    let mut engine = make_engine();
    let before = engine.surface().fingerprints();
    draw(&mut engine, Region::Canvas, &[(50.0, 50.0), (60.0, 55.0), (70.0, 52.0)]);

    assert_eq!(engine.ledger().len(), 1);
    assert_eq!(engine.ledger().strokes()[0].len(), 3);
    assert_eq!(engine.surface().fingerprints(), before);
}

#[test]
fn test_pick_color_outside_surface_is_none() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    assert_eq!(engine.pick_color_at(-5.0, 10.0), None);
    assert_eq!(engine.pick_color_at(10.0, 500.0), None);
    assert_eq!(engine.pick_color_at(480.0, 10.0), None);
}

#[test]
fn test_pick_color_follows_display_mode() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    let (x, y) = wavy_points(30.0, 20)[5];

    let pigment = engine.pick_color_at(x, y).unwrap();
    assert!(pigment.a > 0.0);

    engine.set_display_mode(MixModel::Linear);
    let linear = engine.pick_color_at(x, y).unwrap();
    let expected = engine
        .surface()
        .sample_color(x, y, MixModel::Linear, Region::Canvas)
        .unwrap();
    assert_eq!(linear, expected);
}

#[test]
fn test_stroke_outside_region_is_ignored() {
    let mut engine = make_engine();
    engine.begin_stroke(400.0, 50.0, Region::Canvas);
    assert!(!engine.brush().is_stroking());
    engine.extend_stroke(410.0, 60.0);
    engine.end_stroke();
    assert!(engine.ledger().is_empty());
}

#[test]
fn test_leaving_region_seals_stroke() {
    let mut engine = make_engine();
    engine.begin_stroke(320.0, 100.0, Region::Canvas);
    for x in [330.0, 340.0, 350.0] {
        engine.extend_stroke(x, 100.0);
    }
    engine.extend_stroke(370.0, 100.0);

    assert!(!engine.brush().is_stroking());
    assert_eq!(engine.ledger().len(), 1);
    assert_eq!(engine.ledger().strokes()[0].len(), 4);

    // Further points go nowhere
    engine.extend_stroke(355.0, 100.0);
    assert_eq!(engine.ledger().strokes()[0].len(), 4);
}

#[test]
fn test_resize_replays_strokes() {
    let mut engine = make_engine();
    let points = wavy_points(30.0, 20);
    draw(&mut engine, Region::Canvas, &points);

    engine.resize(640, 320).unwrap();
    assert_eq!((engine.surface().width(), engine.surface().height()), (640, 320));
    assert_eq!(engine.ledger().len(), 1);
    let (x, y) = points[6];
    let px = engine
        .surface()
        .sample_color(x, y, MixModel::Pigment, Region::Canvas)
        .unwrap();
    assert!(px.a > 0.0);
}

#[test]
fn test_failed_resize_keeps_drawing() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    let before = engine.surface().fingerprints();

    assert!(engine.resize(0, 100).is_err());
    assert_eq!(engine.surface().width(), 480);
    assert_eq!(engine.surface().fingerprints(), before);
}

#[test]
fn test_clear_all_forgets_everything() {
    let mut engine = make_engine();
    draw_scene(&mut engine);
    engine.clear_all().unwrap();

    assert!(engine.ledger().is_empty());
    assert_eq!(engine.surface().fingerprints(), make_engine().surface().fingerprints());
}

#[test]
fn test_sync_assets_redraws_with_new_background() {
    let assets = EngineAssets::new();
    let mut engine = PaintEngine::with_assets(test_config(BrushSettings::default()), assets.clone()).unwrap();
    draw(&mut engine, Region::Canvas, &wavy_points(30.0, 10));
    assert!(!engine.sync_assets().unwrap());

    assets
        .background
        .replace(RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 255])));
    assert!(engine.sync_assets().unwrap());
    assert!(!engine.sync_assets().unwrap());

    assert_eq!(engine.ledger().len(), 1);
    let untouched = engine
        .surface()
        .sample_color(300.0, 230.0, MixModel::Pigment, Region::Canvas)
        .unwrap();
    assert_eq!(untouched, Color::new(0.0, 1.0, 0.0, 1.0));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = EngineConfig {
        width: 0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        PaintEngine::new(config),
        Err(CoreError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_huge_pickup_radius_is_rejected() {
    let config = EngineConfig {
        pickup_radius: 20_000,
        ..test_config(BrushSettings::default())
    };
    assert!(matches!(PaintEngine::new(config), Err(CoreError::InvalidInput(_))));
}
