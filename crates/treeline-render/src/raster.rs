//! A software [`Painter`] that rasterizes into an [`ImageBuffer`].
//!
//! Only what a row snapshot needs is supported: axis-aligned fills and
//! strokes, lines, and image blits. Glyph rendering belongs to the host's font
//! system, so [`Painter::draw_text`] is a no-op here.

use treeline_core::logging::targets;

use crate::image_buffer::ImageBuffer;
use crate::painter::{ClipStack, Painter};
use crate::types::{Color, Point, Rect, Stroke, TextStyle};

/// Software painter drawing into an owned [`ImageBuffer`].
#[derive(Debug, Clone)]
pub struct RasterPainter {
    target: ImageBuffer,
    clips: ClipStack,
    origin: Point,
}

impl RasterPainter {
    /// Create a painter over a transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_target(ImageBuffer::new(width, height))
    }

    /// Create a painter drawing into an existing image.
    pub fn with_target(target: ImageBuffer) -> Self {
        Self {
            target,
            clips: ClipStack::default(),
            origin: Point::ZERO,
        }
    }

    /// Translate all subsequent drawing by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.origin = self.origin.offset(dx, dy);
    }

    /// Borrow the canvas.
    pub fn image(&self) -> &ImageBuffer {
        &self.target
    }

    /// Finish painting and take the canvas.
    pub fn into_image(self) -> ImageBuffer {
        self.target
    }

    /// Device-space pixel bounds covered by `rect` after translation and clipping.
    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let canvas = Rect::new(
            0.0,
            0.0,
            self.target.width() as f32,
            self.target.height() as f32,
        );
        let mut device = rect.offset(self.origin.x, self.origin.y).intersect(&canvas)?;
        if let Some(clip) = self.clips.current() {
            device = device.intersect(&clip.offset(self.origin.x, self.origin.y))?;
        }
        let x0 = device.left().round().max(0.0) as u32;
        let y0 = device.top().round().max(0.0) as u32;
        let x1 = device.right().round().max(0.0) as u32;
        let y1 = device.bottom().round().max(0.0) as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

impl Painter for RasterPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.target.blend_pixel(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        let w = stroke.width.max(1.0);
        self.fill_rect(Rect::new(rect.left(), rect.top(), rect.width(), w), stroke.color);
        self.fill_rect(
            Rect::new(rect.left(), rect.bottom() - w, rect.width(), w),
            stroke.color,
        );
        self.fill_rect(
            Rect::new(rect.left(), rect.top() + w, w, rect.height() - 2.0 * w),
            stroke.color,
        );
        self.fill_rect(
            Rect::new(rect.right() - w, rect.top() + w, w, rect.height() - 2.0 * w),
            stroke.color,
        );
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let w = stroke.width.max(1.0);
        let half = w / 2.0;
        if from.y == to.y {
            let (x0, x1) = (from.x.min(to.x), from.x.max(to.x));
            self.fill_rect(Rect::new(x0, from.y - half, x1 - x0, w), stroke.color);
        } else if from.x == to.x {
            let (y0, y1) = (from.y.min(to.y), from.y.max(to.y));
            self.fill_rect(Rect::new(from.x - half, y0, w, y1 - y0), stroke.color);
        } else {
            // DDA: one square stamp per unit step along the major axis.
            let dx = to.x - from.x;
            let dy = to.y - from.y;
            let steps = dx.abs().max(dy.abs()).ceil() as u32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let p = Point::new(from.x + dx * t, from.y + dy * t);
                self.fill_rect(Rect::new(p.x - half, p.y - half, w, w), stroke.color);
            }
        }
    }

    fn draw_text(&mut self, text: &str, bounds: Rect, _style: &TextStyle) {
        tracing::trace!(target: targets::RENDER, len = text.len(), ?bounds, "text skipped by raster painter");
    }

    fn draw_image(&mut self, image: &ImageBuffer, dest: Rect) {
        if image.is_empty() || dest.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_span(dest) else {
            return;
        };
        let left = dest.left() + self.origin.x;
        let top = dest.top() + self.origin.y;
        let sx = image.width() as f32 / dest.width();
        let sy = image.height() as f32 / dest.height();
        for y in y0..y1 {
            let src_y = (((y as f32 + 0.5 - top) * sy) as u32).min(image.height() - 1);
            for x in x0..x1 {
                let src_x = (((x as f32 + 0.5 - left) * sx) as u32).min(image.width() - 1);
                if let Some(color) = image.get_pixel(src_x, src_y) {
                    self.target.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clips.push(rect);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }

    fn clip_bounds(&self) -> Option<Rect> {
        self.clips.current()
    }
}
