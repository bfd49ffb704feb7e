use egui::{Pos2, Rect, Vec2};

/// Affine mapping between the on-screen rect a photo occupies and the
/// photo's native pixel grid.
///
/// The displayed size and the backing raster size usually differ (responsive
/// layout, HiDPI), so pointer positions have to be rescaled before they can
/// address pixels. The mapping is recomputed every frame from the current
/// layout, which keeps it correct across window resizes without any resize
/// bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMap {
    display: Rect,
    image_size: Vec2,
}

impl DisplayMap {
    pub fn new(display: Rect, image_size: Vec2) -> Self {
        Self { display, image_size }
    }

    /// Fits `image_size` into `avail` keeping the aspect ratio and centers it
    /// (letterboxed/pillarboxed). Degenerate inputs fall back to a 1:1 scale
    /// so the mapping stays finite.
    pub fn fit(avail: Rect, image_size: Vec2) -> Self {
        let mut scale = (avail.width() / image_size.x).min(avail.height() / image_size.y);
        if !scale.is_finite() || scale <= 0.0 {
            scale = 1.0;
        }
        let size = image_size * scale;
        let min = avail.min + (avail.size() - size) * 0.5;
        Self::new(Rect::from_min_size(min, size), image_size)
    }

    pub fn display_rect(&self) -> Rect {
        self.display
    }

    pub fn image_size(&self) -> Vec2 {
        self.image_size
    }

    /// Display pixels per image pixel along x. With [`Self::fit`] the y scale
    /// is the same value.
    pub fn display_scale(&self) -> f32 {
        self.display.width() / self.image_size.x
    }

    /// Screen position to image-space coordinates.
    ///
    /// Positions outside the displayed rect map to coordinates outside
    /// `0..image_size`; callers decide whether those are meaningful.
    pub fn to_image(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.display.left()) * self.image_size.x / self.display.width(),
            (screen.y - self.display.top()) * self.image_size.y / self.display.height(),
        )
    }

    /// [`Self::to_image`] with the image origin as fallback for events that
    /// arrive without a usable pointer position.
    pub fn to_image_or_origin(&self, screen: Option<Pos2>) -> Pos2 {
        screen.map(|p| self.to_image(p)).unwrap_or(Pos2::ZERO)
    }

    /// Image-space coordinates back to the screen. Inverse of
    /// [`Self::to_image`].
    pub fn to_display(&self, image: Pos2) -> Pos2 {
        Pos2::new(
            self.display.left() + image.x * self.display.width() / self.image_size.x,
            self.display.top() + image.y * self.display.height() / self.image_size.y,
        )
    }
}
