/// Bounding box in normalized YOLO format: center and size expressed as
/// fractions of the image dimensions. Raw detector output may reach outside
/// `[0, 1]`; values are clamped when converting to pixel space, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBox {
    pub class_id: u32,
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    /// Present when the detector was run with confidence saving enabled.
    pub confidence: Option<f32>,
}

/// Axis-aligned rectangle in pixel coordinates, origin top-left.
/// Always non-degenerate and fully inside its image once produced by
/// `NormalizedBox::to_pixel_rect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

impl NormalizedBox {
    pub fn new(class_id: u32, x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            class_id,
            x_center,
            y_center,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// The label a crop carries for itself: the object covers the full image.
    pub fn full_coverage(class_id: u32) -> Self {
        Self::new(class_id, 0.5, 0.5, 1.0, 1.0)
    }

    /// Convert to a pixel rectangle inside an `img_width` x `img_height`
    /// image. Both corners are rounded and clamped into the image, so a box
    /// hanging over an edge shrinks to its visible part and a box fully
    /// outside the image collapses. Returns `None` for the degenerate case
    /// (zero or negative width/height after clamping).
    pub fn to_pixel_rect(&self, img_width: u32, img_height: u32) -> Option<PixelRect> {
        let iw = img_width as f32;
        let ih = img_height as f32;

        let x1 = ((self.x_center - self.width / 2.0) * iw).round() as i64;
        let x2 = ((self.x_center + self.width / 2.0) * iw).round() as i64;
        let y1 = ((self.y_center - self.height / 2.0) * ih).round() as i64;
        let y2 = ((self.y_center + self.height / 2.0) * ih).round() as i64;

        let x1 = x1.clamp(0, img_width as i64);
        let x2 = x2.clamp(0, img_width as i64);
        let y1 = y1.clamp(0, img_height as i64);
        let y2 = y2.clamp(0, img_height as i64);

        let w = x2 - x1;
        let h = y2 - y1;
        if w <= 0 || h <= 0 {
            return None;
        }

        Some(PixelRect {
            x: x1 as u32,
            y: y1 as u32,
            w: w as u32,
            h: h as u32,
        })
    }

    /// Inverse of `to_pixel_rect` for a rectangle inside the image.
    pub fn from_pixel_rect(
        rect: PixelRect,
        class_id: u32,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        let iw = img_width as f32;
        let ih = img_height as f32;
        Self::new(
            class_id,
            (rect.x as f32 + rect.w as f32 / 2.0) / iw,
            (rect.y as f32 + rect.h as f32 / 2.0) / ih,
            rect.w as f32 / iw,
            rect.h as f32 / ih,
        )
    }
}
