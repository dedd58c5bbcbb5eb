//! CPU-side RGBA image buffer.
//!
//! [`ImageBuffer`] wraps an `image::RgbaImage` and provides the handful of
//! pixel operations Treeline needs to build drag previews: solid fills,
//! source-over blending, cropping and a vertical alpha fade.

use image::{Rgba, RgbaImage, imageops};

use crate::error::{RenderError, RenderResult};
use crate::types::{Color, Size};

/// A CPU-side RGBA8 image (straight alpha).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    inner: RgbaImage,
}

impl ImageBuffer {
    /// Create a fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: RgbaImage::new(width, height),
        }
    }

    /// Create an image filled with a single color.
    pub fn from_color(width: u32, height: u32, color: Color) -> Self {
        Self {
            inner: RgbaImage::from_pixel(width, height, Rgba(color.to_rgba8())),
        }
    }

    /// Create an image from raw RGBA8 bytes.
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        RgbaImage::from_raw(width, height, data.to_vec())
            .map(|inner| Self { inner })
            .ok_or(RenderError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Size as floating-point dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width() as f32, self.height() as f32)
    }

    /// Check whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Read a pixel. Returns `None` outside the image.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.inner.get_pixel_checked(x, y).map(|p| {
            let [r, g, b, a] = p.0;
            Color::from_rgba8(r, g, b, a)
        })
    }

    /// Overwrite a pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(pixel) = self.inner.get_pixel_mut_checked(x, y) {
            *pixel = Rgba(color.to_rgba8());
        }
    }

    /// Composite `color` over the pixel at (x, y) (source-over).
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color) {
        let Some(pixel) = self.inner.get_pixel_mut_checked(x, y) else {
            return;
        };
        if color.a >= 1.0 {
            *pixel = Rgba(color.to_rgba8());
            return;
        }
        if color.a <= 0.0 {
            return;
        }

        let [dr, dg, db, da] = pixel.0;
        let dst = Color::from_rgba8(dr, dg, db, da);
        let out_a = color.a + dst.a * (1.0 - color.a);
        let mix = |s: f32, d: f32| (s * color.a + d * dst.a * (1.0 - color.a)) / out_a;
        *pixel = Rgba(
            Color::new(
                mix(color.r, dst.r),
                mix(color.g, dst.g),
                mix(color.b, dst.b),
                out_a,
            )
            .to_rgba8(),
        );
    }

    /// Fill the whole image with one color.
    pub fn fill(&mut self, color: Color) {
        let rgba = Rgba(color.to_rgba8());
        for pixel in self.inner.pixels_mut() {
            *pixel = rgba;
        }
    }

    /// Copy out a sub-rectangle. The region is clamped to the image bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);
        Self {
            inner: imageops::crop_imm(&self.inner, x, y, width, height).to_image(),
        }
    }

    /// Fade the bottom `fade_height` rows linearly towards full transparency.
    ///
    /// Row alpha is multiplied by a factor that falls from just below 1 at the
    /// first faded row to just above 0 at the last row.
    pub fn apply_vertical_fade(&mut self, fade_height: u32) {
        let height = self.height();
        let fade_height = fade_height.min(height);
        if fade_height == 0 {
            return;
        }
        let start = height - fade_height;
        let steps = (fade_height + 1) as f32;
        for y in start..height {
            let factor = (height - y) as f32 / steps;
            for x in 0..self.width() {
                let pixel = self.inner.get_pixel_mut(x, y);
                pixel.0[3] = (pixel.0[3] as f32 * factor).round() as u8;
            }
        }
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_rgba8_bytes(&self) -> &[u8] {
        self.inner.as_raw()
    }

    /// Borrow the underlying `image` buffer.
    pub fn as_inner(&self) -> &RgbaImage {
        &self.inner
    }

    /// Consume into the underlying `image` buffer.
    pub fn into_inner(self) -> RgbaImage {
        self.inner
    }
}

impl From<RgbaImage> for ImageBuffer {
    fn from(inner: RgbaImage) -> Self {
        Self { inner }
    }
}
