use std::num::NonZeroU32;

use egui::{Color32, Pos2, Rect, Sense, Shape, Slider, TextureHandle, TextureOptions, Ui};
use log::debug;

use crate::{BrushStroke, DisplayMap, MaskPng, SourceImage, StrokeRecorder, raster};

pub const MIN_BRUSH_DIAMETER: f32 = 4.0;
pub const MAX_BRUSH_DIAMETER: f32 = 128.0;
const DEFAULT_BRUSH_DIAMETER: f32 = 32.0;

/// Overlay color for strokes, distinct from the exported black/white
/// encoding. Premultiplied (101,33,24,110) is (235,78,56) at ~43% alpha.
const PREVIEW_COLOR: Color32 = Color32::from_rgba_premultiplied(101, 33, 24, 110);

/// Mask-editor state for one mounted photo: accumulated strokes, the live
/// gesture and the brush setting. Display-independent, so the surrounding
/// layout can move and resize the canvas freely between frames.
///
/// All drawing state starts empty; switching photos is constructing a fresh
/// editor.
#[derive(Debug)]
pub struct MaskEditor {
    width: NonZeroU32,
    height: NonZeroU32,
    recorder: StrokeRecorder,
    brush_diameter: f32,
    notified_presence: bool,
}

impl MaskEditor {
    pub fn new(width: NonZeroU32, height: NonZeroU32) -> Self {
        Self {
            width,
            height,
            recorder: StrokeRecorder::default(),
            brush_diameter: DEFAULT_BRUSH_DIAMETER,
            notified_presence: false,
        }
    }

    pub fn image_size(&self) -> (NonZeroU32, NonZeroU32) {
        (self.width, self.height)
    }

    pub fn brush_diameter(&self) -> f32 {
        self.brush_diameter
    }

    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.brush_diameter = diameter.clamp(MIN_BRUSH_DIAMETER, MAX_BRUSH_DIAMETER);
    }

    /// Starts a gesture at an image-space position, freezing the current
    /// brush diameter into the new stroke.
    pub fn begin_gesture(&mut self, at: Pos2) {
        self.recorder.begin(at, self.brush_diameter);
    }

    pub fn extend_gesture(&mut self, to: Pos2) {
        self.recorder.extend(to);
    }

    /// Commits the live gesture. Returns whether a stroke was added.
    pub fn end_gesture(&mut self) -> bool {
        self.recorder.finish()
    }

    /// A tap stamps a single-point stroke.
    pub fn tap(&mut self, at: Pos2) -> bool {
        self.recorder.tap(at, self.brush_diameter)
    }

    pub fn clear(&mut self) {
        self.recorder.clear();
    }

    pub fn has_strokes(&self) -> bool {
        self.recorder.has_committed()
    }

    pub fn is_drawing(&self) -> bool {
        self.recorder.is_drawing()
    }

    pub fn strokes(&self) -> &[BrushStroke] {
        self.recorder.committed()
    }

    pub fn live_stroke(&self) -> Option<&BrushStroke> {
        self.recorder.live()
    }

    /// Edge-triggered change notification for [`Self::has_strokes`]:
    /// `Some(new_state)` exactly once per flip, `None` otherwise. Containers
    /// poll this once per frame to enable or disable mask-dependent actions.
    pub fn take_presence_change(&mut self) -> Option<bool> {
        let present = self.has_strokes();
        if present != self.notified_presence {
            self.notified_presence = present;
            Some(present)
        } else {
            None
        }
    }

    /// Rasterizes the committed strokes at native resolution and encodes
    /// them as a binary PNG. `Ok(None)` means "no mask": nothing committed,
    /// so the caller should send a plain generation request. A live,
    /// unfinished gesture never contributes.
    pub fn export_mask(&self) -> Result<Option<MaskPng>, ExportError> {
        if !self.recorder.has_committed() {
            return Ok(None);
        }
        let mask = raster::rasterize(self.recorder.committed(), self.width, self.height);
        let png = raster::encode_png(&mask)?;
        debug!(
            "Exported mask {}x{} from {} strokes ({} bytes)",
            self.width,
            self.height,
            self.recorder.committed().len(),
            png.len()
        );
        Ok(Some(MaskPng {
            width: self.width,
            height: self.height,
            png,
        }))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("could not encode mask: {0}")]
pub struct ExportError(#[from] image::ImageError);

/// Egui widget around [`MaskEditor`]: paints the mounted photo letterboxed
/// into the available space, translates pointer gestures into strokes and
/// overlays the stroke preview.
pub struct MaskEditorView {
    editor: MaskEditor,
    // Strong reference; egui frees the texture when the handle drops.
    texture: TextureHandle,
}

// Manual impl because `TextureHandle` is not `Debug`.
impl std::fmt::Debug for MaskEditorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskEditorView")
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

/// Per-frame interaction summary of [`MaskEditorView::ui`].
pub struct MaskEditorOutput {
    /// Hovered position in image-space pixels, when over the photo.
    pub cursor_image_pos: Option<(u32, u32)>,
    /// A gesture finished this frame and committed a stroke.
    pub stroke_committed: bool,
}

impl MaskEditorView {
    /// Uploads the photo as a texture and mounts a fresh editor over it.
    pub fn mount(ctx: &egui::Context, source: &SourceImage) -> Result<Self, TextureTooLarge> {
        let (width, height) = (source.width(), source.height());
        let max_texture_side = ctx.input(|i| i.max_texture_side);
        if width.get() as usize > max_texture_side || height.get() as usize > max_texture_side {
            return Err(TextureTooLarge {
                width,
                height,
                max_texture_side,
            });
        }
        let texture =
            ctx.load_texture("scene_photo", source.to_color_image(), TextureOptions::LINEAR);
        Ok(Self {
            editor: MaskEditor::new(width, height),
            texture,
        })
    }

    pub fn editor(&self) -> &MaskEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut MaskEditor {
        &mut self.editor
    }

    /// Paints photo and overlay, and feeds this frame's pointer events into
    /// the recorder. Call once per frame.
    pub fn ui(&mut self, ui: &mut Ui) -> MaskEditorOutput {
        let avail = ui.available_rect_before_wrap();
        let image_size = egui::Vec2::new(
            self.editor.width.get() as f32,
            self.editor.height.get() as f32,
        );
        let map = DisplayMap::fit(avail, image_size);

        let response = ui.allocate_rect(map.display_rect(), Sense::drag().union(Sense::click()));
        let painter = ui.painter().with_clip_rect(map.display_rect());
        let uv = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0));
        painter.image(self.texture.id(), map.display_rect(), uv, Color32::WHITE);

        let mut stroke_committed = false;
        if response.drag_started() {
            self.editor
                .begin_gesture(map.to_image_or_origin(response.interact_pointer_pos()));
        } else if response.dragged() {
            self.editor
                .extend_gesture(map.to_image_or_origin(response.interact_pointer_pos()));
        }
        if response.drag_stopped() {
            stroke_committed = self.editor.end_gesture();
        } else if response.clicked() {
            stroke_committed = self
                .editor
                .tap(map.to_image_or_origin(response.interact_pointer_pos()));
        }

        self.paint_overlay(&painter, &map);

        let cursor_image_pos = response.hover_pos().map(|hover| {
            let p = map.to_image(hover);
            (
                (p.x as u32).min(self.editor.width.get() - 1),
                (p.y as u32).min(self.editor.height.get() - 1),
            )
        });

        MaskEditorOutput {
            cursor_image_pos,
            stroke_committed,
        }
    }

    /// Fully repaints the stroke overlay, committed strokes first, then the
    /// live gesture. Repainting from scratch keeps the overlay in sync with
    /// clears and layout changes for free.
    fn paint_overlay(&self, painter: &egui::Painter, map: &DisplayMap) {
        let scale = map.display_scale();
        let live = self.editor.recorder.live();
        for stroke in self.editor.recorder.committed().iter().chain(live) {
            let width = (stroke.diameter() * scale).max(1.0);
            let points: Vec<Pos2> = stroke.points().iter().map(|p| map.to_display(*p)).collect();
            match points.as_slice() {
                [] => {}
                [p] => {
                    painter.circle_filled(*p, width / 2.0, PREVIEW_COLOR);
                }
                _ => {
                    painter.add(Shape::line(points, egui::Stroke::new(width, PREVIEW_COLOR)));
                }
            }
        }
    }

    /// Brush slider and clear button. Kept separate from [`Self::ui`] so the
    /// surrounding layout can place the controls in a toolbar.
    pub fn controls_ui(&mut self, ui: &mut Ui) {
        let mut diameter = self.editor.brush_diameter();
        ui.add(
            Slider::new(&mut diameter, MIN_BRUSH_DIAMETER..=MAX_BRUSH_DIAMETER)
                .text("Brush px")
                .integer(),
        );
        self.editor.set_brush_diameter(diameter);

        let can_clear = self.editor.has_strokes() || self.editor.is_drawing();
        ui.scope(|ui| {
            if !can_clear {
                ui.disable();
            }
            if ui.button("Clear mask").clicked() {
                self.editor.clear();
            }
        });
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Image too large: {width}x{height}, max texture side is {max_texture_side}")]
pub struct TextureTooLarge {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
    pub max_texture_side: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> MaskEditor {
        MaskEditor::new(NonZeroU32::new(100).unwrap(), NonZeroU32::new(50).unwrap())
    }

    #[test]
    fn brush_diameter_is_clamped() {
        let mut e = editor();
        e.set_brush_diameter(1.0);
        assert_eq!(e.brush_diameter(), MIN_BRUSH_DIAMETER);
        e.set_brush_diameter(1000.0);
        assert_eq!(e.brush_diameter(), MAX_BRUSH_DIAMETER);
        e.set_brush_diameter(20.0);
        assert_eq!(e.brush_diameter(), 20.0);
    }

    #[test]
    fn export_without_strokes_is_none() {
        let e = editor();
        assert!(e.export_mask().unwrap().is_none());
    }

    #[test]
    fn live_gesture_does_not_export() {
        let mut e = editor();
        e.begin_gesture(Pos2::new(10.0, 10.0));
        e.extend_gesture(Pos2::new(30.0, 10.0));
        assert!(e.export_mask().unwrap().is_none());
        assert!(e.end_gesture());
        assert!(e.export_mask().unwrap().is_some());
    }

    #[test]
    fn export_is_idempotent() {
        let mut e = editor();
        e.tap(Pos2::new(50.0, 25.0));
        let a = e.export_mask().unwrap().unwrap();
        let b = e.export_mask().unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn export_uses_native_dimensions() {
        let mut e = editor();
        e.tap(Pos2::new(5.0, 5.0));
        let mask = e.export_mask().unwrap().unwrap();
        assert_eq!(mask.width.get(), 100);
        assert_eq!(mask.height.get(), 50);
        let decoded = image::load_from_memory(&mask.png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn presence_change_fires_once_per_flip() {
        let mut e = editor();
        assert_eq!(e.take_presence_change(), None);
        e.tap(Pos2::new(1.0, 1.0));
        assert_eq!(e.take_presence_change(), Some(true));
        assert_eq!(e.take_presence_change(), None);
        e.tap(Pos2::new(2.0, 2.0));
        assert_eq!(e.take_presence_change(), None);
        e.clear();
        assert_eq!(e.take_presence_change(), Some(false));
        assert_eq!(e.take_presence_change(), None);
    }

    #[test]
    fn gesture_uses_diameter_from_its_start() {
        let mut e = editor();
        e.set_brush_diameter(10.0);
        e.begin_gesture(Pos2::new(10.0, 25.0));
        // Slider moves mid-gesture must not affect the live stroke.
        e.set_brush_diameter(90.0);
        e.extend_gesture(Pos2::new(20.0, 25.0));
        e.end_gesture();
        assert_eq!(e.strokes()[0].diameter(), 10.0);
        // The next gesture picks up the new setting.
        e.tap(Pos2::new(40.0, 25.0));
        assert_eq!(e.strokes()[1].diameter(), 90.0);
    }

    #[test]
    fn mount_rejects_oversized_photo() {
        let ctx = egui::Context::default();
        let max = ctx.input(|i| i.max_texture_side);
        let img = image::RgbaImage::new(max as u32 + 1, 8);
        let source = SourceImage::from_dynamic(&image::DynamicImage::ImageRgba8(img)).unwrap();
        let err = MaskEditorView::mount(&ctx, &source).unwrap_err();
        assert_eq!(err.max_texture_side, max);
    }

    #[test]
    fn mount_accepts_regular_photo() {
        let ctx = egui::Context::default();
        let img = image::RgbaImage::new(64, 48);
        let source = SourceImage::from_dynamic(&image::DynamicImage::ImageRgba8(img)).unwrap();
        let view = MaskEditorView::mount(&ctx, &source).unwrap();
        assert_eq!(view.editor().image_size().0.get(), 64);
        assert!(!view.editor().has_strokes());
    }
}
