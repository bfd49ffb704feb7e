use std::{io::Cursor, num::NonZeroU32};

use egui::Pos2;
use image::{GrayImage, ImageFormat, Luma};

use crate::BrushStroke;

/// Mask value for pixels a generation call may repaint.
pub const EDITABLE: u8 = 255;
/// Mask value for pixels that must survive unchanged.
pub const PROTECTED: u8 = 0;

/// A PNG-encoded export of the mask together with the raster dimensions it
/// was produced at (always the photo's native dimensions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPng {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
    pub png: Vec<u8>,
}

/// Rasterizes committed strokes into a binary mask at native resolution.
///
/// The canvas starts fully [`PROTECTED`]; every stroke stamps an [`EDITABLE`]
/// band of its own diameter along its path. Strokes only ever turn pixels
/// white, so overlaps and repeated passes are idempotent.
pub fn rasterize(strokes: &[BrushStroke], width: NonZeroU32, height: NonZeroU32) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width.get(), height.get(), Luma([PROTECTED]));
    for stroke in strokes {
        paint_stroke(&mut mask, stroke);
    }
    mask
}

/// Losslessly encodes the mask as a single-channel PNG.
pub fn encode_png(mask: &GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn paint_stroke(mask: &mut GrayImage, stroke: &BrushStroke) {
    let radius = stroke.diameter() / 2.0;
    match stroke.points() {
        [] => {}
        [p] => paint_capsule(mask, *p, *p, radius),
        points => {
            for seg in points.windows(2) {
                paint_capsule(mask, seg[0], seg[1], radius);
            }
        }
    }
}

/// Fills every pixel whose center lies within `radius` of the segment `a-b`.
/// Capsule coverage gives round caps and round joins without special cases;
/// a zero-length segment degenerates to a disc.
fn paint_capsule(mask: &mut GrayImage, a: Pos2, b: Pos2, radius: f32) {
    let (w, h) = mask.dimensions();
    let min_x = (a.x.min(b.x) - radius).floor().max(0.0) as u32;
    let min_y = (a.y.min(b.y) - radius).floor().max(0.0) as u32;
    let max_x = (a.x.max(b.x) + radius).ceil().min((w - 1) as f32) as u32;
    let max_y = (a.y.max(b.y) + radius).ceil().min((h - 1) as f32) as u32;

    let ab = b - a;
    let len_sq = ab.length_sq();
    let radius_sq = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            // Sample the pixel center, not its corner.
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            let t = if len_sq <= f32::EPSILON {
                0.0
            } else {
                ((center - a).dot(ab) / len_sq).clamp(0.0, 1.0)
            };
            let closest = a + ab * t;
            if (center - closest).length_sq() <= radius_sq {
                mask.put_pixel(x, y, Luma([EDITABLE]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: u32, h: u32) -> (NonZeroU32, NonZeroU32) {
        (NonZeroU32::new(w).unwrap(), NonZeroU32::new(h).unwrap())
    }

    fn stroke(points: &[(f32, f32)], diameter: f32) -> BrushStroke {
        let mut rec = crate::StrokeRecorder::default();
        let mut iter = points.iter();
        let (x, y) = iter.next().unwrap();
        rec.begin(Pos2::new(*x, *y), diameter);
        for (x, y) in iter {
            rec.extend(Pos2::new(*x, *y));
        }
        rec.finish();
        rec.committed()[0].clone()
    }

    #[test]
    fn empty_stroke_list_yields_all_protected() {
        let (w, h) = dims(16, 8);
        let mask = rasterize(&[], w, h);
        assert!(mask.pixels().all(|p| p.0[0] == PROTECTED));
    }

    #[test]
    fn mask_is_strictly_binary() {
        let (w, h) = dims(64, 64);
        let mask = rasterize(&[stroke(&[(10.0, 10.0), (40.0, 50.0)], 9.0)], w, h);
        assert!(mask.pixels().all(|p| p.0[0] == PROTECTED || p.0[0] == EDITABLE));
        assert!(mask.pixels().any(|p| p.0[0] == EDITABLE));
    }

    #[test]
    fn horizontal_stroke_covers_band_with_round_caps() {
        let (w, h) = dims(400, 200);
        let mask = rasterize(&[stroke(&[(100.0, 100.0), (300.0, 100.0)], 20.0)], w, h);

        // Band interior.
        assert_eq!(mask.get_pixel(200, 100).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(200, 90).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(200, 109).0[0], EDITABLE);
        // Just outside the band.
        assert_eq!(mask.get_pixel(200, 89).0[0], PROTECTED);
        assert_eq!(mask.get_pixel(200, 110).0[0], PROTECTED);
        // Round caps extend past the endpoints on the axis...
        assert_eq!(mask.get_pixel(92, 100).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(307, 100).0[0], EDITABLE);
        // ...but the cap corner stays outside the disc.
        assert_eq!(mask.get_pixel(91, 92).0[0], PROTECTED);
    }

    #[test]
    fn single_point_stroke_stamps_a_disc() {
        let (w, h) = dims(40, 40);
        let mask = rasterize(&[stroke(&[(20.0, 20.0)], 10.0)], w, h);
        assert_eq!(mask.get_pixel(20, 20).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(16, 20).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(20, 24).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(14, 20).0[0], PROTECTED);
        // Diagonal corner: center (15.5,15.5) sits sqrt(40.5) > 5 away.
        assert_eq!(mask.get_pixel(15, 15).0[0], PROTECTED);
    }

    #[test]
    fn strokes_clamp_to_canvas_bounds() {
        let (w, h) = dims(32, 32);
        // Path leaves the canvas on both ends; rasterization must not panic
        // and must still fill the in-bounds part.
        let mask = rasterize(&[stroke(&[(-10.0, 16.0), (50.0, 16.0)], 8.0)], w, h);
        assert_eq!(mask.get_pixel(0, 16).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(31, 16).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(16, 2).0[0], PROTECTED);
    }

    #[test]
    fn fully_offscreen_stroke_is_a_no_op() {
        let (w, h) = dims(16, 16);
        let mask = rasterize(&[stroke(&[(-100.0, -100.0), (-80.0, -100.0)], 6.0)], w, h);
        assert!(mask.pixels().all(|p| p.0[0] == PROTECTED));
    }

    #[test]
    fn overlapping_strokes_stay_binary() {
        let (w, h) = dims(64, 64);
        let strokes = [
            stroke(&[(10.0, 32.0), (54.0, 32.0)], 12.0),
            stroke(&[(32.0, 10.0), (32.0, 54.0)], 12.0),
        ];
        let mask = rasterize(&strokes, w, h);
        assert_eq!(mask.get_pixel(32, 32).0[0], EDITABLE);
        assert!(mask.pixels().all(|p| p.0[0] == PROTECTED || p.0[0] == EDITABLE));
    }

    #[test]
    fn rasterize_is_deterministic() {
        let (w, h) = dims(128, 96);
        let strokes = [stroke(&[(5.0, 5.0), (100.0, 80.0), (120.0, 10.0)], 15.0)];
        let a = rasterize(&strokes, w, h);
        let b = rasterize(&strokes, w, h);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let (w, h) = dims(48, 32);
        let mask = rasterize(&[stroke(&[(8.0, 8.0), (40.0, 24.0)], 7.0)], w, h);
        let png = encode_png(&mask).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (48, 32));
        assert_eq!(decoded.as_raw(), mask.as_raw());
    }
}
