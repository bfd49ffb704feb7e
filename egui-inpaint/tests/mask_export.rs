use std::num::NonZeroU32;

use egui::{Pos2, Rect, Vec2};
use egui_inpaint::{DisplayMap, MaskEditor, PROTECTED};

fn nz(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap()
}

/// A 800x600 photo shown at half scale: an on-screen gesture from (50,50) to
/// (150,50) lands at image-space (100,100)..(300,100), and the export comes
/// back at native resolution with a ~20px white band around y=100.
#[test]
fn half_scale_gesture_exports_native_resolution_band() {
    let map = DisplayMap::fit(
        Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 300.0)),
        Vec2::new(800.0, 600.0),
    );
    let mut editor = MaskEditor::new(nz(800), nz(600));
    editor.set_brush_diameter(20.0);

    editor.begin_gesture(map.to_image(Pos2::new(50.0, 50.0)));
    editor.extend_gesture(map.to_image(Pos2::new(100.0, 50.0)));
    editor.extend_gesture(map.to_image(Pos2::new(150.0, 50.0)));

    // Pulling the export mid-gesture must behave as if the gesture never
    // started.
    assert!(editor.export_mask().unwrap().is_none());

    assert!(editor.end_gesture());
    let mask = editor.export_mask().unwrap().unwrap();
    assert_eq!((mask.width.get(), mask.height.get()), (800, 600));

    let raster = image::load_from_memory(&mask.png).unwrap().to_luma8();
    assert_eq!(raster.dimensions(), (800, 600));

    let white = |x: u32, y: u32| raster.get_pixel(x, y).0[0] == 255;
    // Band interior around y=100.
    assert!(white(200, 100));
    assert!(white(200, 91));
    assert!(white(200, 109));
    // Just past the band edges.
    assert!(!white(200, 89));
    assert!(!white(200, 110));
    // Round caps reach past both endpoints.
    assert!(white(93, 100));
    assert!(white(306, 100));
    assert!(!white(85, 100));
    assert!(!white(314, 100));
    // Far corners stay protected.
    assert!(!white(0, 0));
    assert!(!white(799, 599));
}

#[test]
fn export_is_stable_until_state_changes() {
    let mut editor = MaskEditor::new(nz(320), nz(240));
    editor.tap(Pos2::new(160.0, 120.0));
    let first = editor.export_mask().unwrap().unwrap();
    let second = editor.export_mask().unwrap().unwrap();
    assert_eq!(first.png, second.png);

    editor.tap(Pos2::new(40.0, 40.0));
    let third = editor.export_mask().unwrap().unwrap();
    assert_ne!(first.png, third.png);
}

#[test]
fn committed_stroke_ignores_later_brush_changes() {
    let mut editor = MaskEditor::new(nz(200), nz(200));
    editor.set_brush_diameter(10.0);
    editor.tap(Pos2::new(100.0, 100.0));
    let before = editor.export_mask().unwrap().unwrap();

    editor.set_brush_diameter(80.0);
    let after = editor.export_mask().unwrap().unwrap();
    assert_eq!(before.png, after.png);
}

#[test]
fn clear_returns_to_no_mask() {
    let mut editor = MaskEditor::new(nz(64), nz(64));
    editor.tap(Pos2::new(32.0, 32.0));
    assert!(editor.has_strokes());
    assert!(editor.export_mask().unwrap().is_some());

    editor.clear();
    assert!(!editor.has_strokes());
    assert!(editor.export_mask().unwrap().is_none());
}

#[test]
fn all_protected_outside_any_stroke() {
    let mut editor = MaskEditor::new(nz(100), nz(100));
    editor.set_brush_diameter(8.0);
    editor.tap(Pos2::new(10.0, 10.0));
    let mask = editor.export_mask().unwrap().unwrap();
    let raster = image::load_from_memory(&mask.png).unwrap().to_luma8();
    // Everything beyond the disc's reach is untouched.
    for y in 20..100 {
        for x in 20..100 {
            assert_eq!(raster.get_pixel(x, y).0[0], PROTECTED, "at {x},{y}");
        }
    }
}
