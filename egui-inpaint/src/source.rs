use std::{io::Cursor, num::NonZeroU32, sync::Arc};

use egui::ColorImage;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Decoded photo the editor mounts: interleaved RGBA8 pixels at native
/// resolution. Pixels are shared, so clones are cheap and the same photo can
/// sit in the editor and travel along a generation request at once.
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: NonZeroU32,
    height: NonZeroU32,
    rgba: Arc<RgbaImage>,
}

impl SourceImage {
    /// Decodes any supported container format (PNG/JPEG/TIFF).
    pub fn decode(bytes: &[u8]) -> Result<Self, AcquireError> {
        Self::from_dynamic(&image::load_from_memory(bytes)?)
    }

    pub fn from_dynamic(img: &DynamicImage) -> Result<Self, AcquireError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let width = NonZeroU32::new(width).ok_or(AcquireError::EmptyImage)?;
        let height = NonZeroU32::new(height).ok_or(AcquireError::EmptyImage)?;
        Ok(Self {
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }

    pub fn width(&self) -> NonZeroU32 {
        self.width
    }

    pub fn height(&self) -> NonZeroU32 {
        self.height
    }

    pub fn size_vec(&self) -> egui::Vec2 {
        egui::Vec2::new(self.width.get() as f32, self.height.get() as f32)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn rgba(&self) -> &[u8] {
        self.rgba.as_raw()
    }

    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(
            [self.width.get() as usize, self.height.get() as usize],
            self.rgba(),
        )
    }

    /// Re-encodes the pixels as PNG, e.g. for request payloads or session
    /// persistence.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    EmptyImage,
}
