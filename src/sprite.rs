//! Immutable RGBA pixel buffers and their geometric operations.
//!
//! A [`Sprite`] owns its pixel grid exclusively; every transform
//! (`crop`, `paste`, `flip_h`, `flip_v`, `replace_color`, `trim`)
//! allocates and returns a new sprite, leaving the receiver unchanged.
//! Internal constructors take buffers by value, so the no-aliasing
//! guarantee holds without defensive copies.

use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

use crate::color::TRANSPARENT;

/// Error type for sprite construction and access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteError {
    /// Dimensions must be at least 1x1
    #[error("sprite must be at least 1x1, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    /// Pixel grid rows have differing lengths
    #[error("row {row} has {len} pixels, expected {expected}")]
    JaggedRow { row: usize, len: usize, expected: usize },
    /// Pixel grid was empty
    #[error("sprite pixel grid is empty")]
    EmptyGrid,
    /// Coordinate outside the sprite extents
    #[error("({x}, {y}) out of bounds for {width}x{height}")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    /// Crop region clamped to nothing
    #[error("crop region is empty")]
    EmptyCrop,
    /// Raw buffer length does not match the dimensions
    #[error("raw buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Immutable pixel data. All transforms return a new `Sprite`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    image: RgbaImage,
}

impl Sprite {
    /// Create a fully transparent sprite of the given size.
    ///
    /// # Errors
    ///
    /// Returns `SpriteError::InvalidSize` if either dimension is zero.
    pub fn empty(width: u32, height: u32) -> Result<Self, SpriteError> {
        if width == 0 || height == 0 {
            return Err(SpriteError::InvalidSize { width, height });
        }
        Ok(Self { image: RgbaImage::from_pixel(width, height, TRANSPARENT) })
    }

    /// Adopt an existing image buffer.
    ///
    /// # Errors
    ///
    /// Returns `SpriteError::InvalidSize` if either dimension is zero.
    pub fn from_image(image: RgbaImage) -> Result<Self, SpriteError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SpriteError::InvalidSize { width, height });
        }
        Ok(Self { image })
    }

    /// Build a sprite from a 2D grid of colors (outer vec is rows,
    /// top-left origin).
    ///
    /// # Errors
    ///
    /// Returns `EmptyGrid` for an empty grid or empty first row, and
    /// `JaggedRow` when any row length differs from the first.
    pub fn from_pixel_rows(rows: Vec<Vec<Rgba<u8>>>) -> Result<Self, SpriteError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(SpriteError::EmptyGrid);
        }
        let width = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SpriteError::JaggedRow { row: i, len: row.len(), expected: width });
            }
        }
        let mut image = RgbaImage::new(width as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, &color) in row.iter().enumerate() {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
        Ok(Self { image })
    }

    /// Build a sprite from a raw RGBA byte buffer (8 bits per channel,
    /// row-major, top-left origin). The codec boundary.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` for zero dimensions, `BufferSize` when the
    /// buffer length is not `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, buf: Vec<u8>) -> Result<Self, SpriteError> {
        if width == 0 || height == 0 {
            return Err(SpriteError::InvalidSize { width, height });
        }
        let expected = width as usize * height as usize * 4;
        let actual = buf.len();
        let image = RgbaImage::from_raw(width, height, buf)
            .ok_or(SpriteError::BufferSize { expected, actual })?;
        Ok(Self { image })
    }

    /// The raw RGBA bytes, row-major from the top-left.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrow the underlying image buffer.
    pub fn to_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume the sprite, yielding its image buffer.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// (width, height) in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Get the pixel color at (x, y). Origin is top-left.
    ///
    /// # Errors
    ///
    /// Returns `SpriteError::OutOfBounds` naming the coordinate and the
    /// sprite extents.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Rgba<u8>, SpriteError> {
        if x >= self.width() || y >= self.height() {
            return Err(SpriteError::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(*self.image.get_pixel(x, y))
    }

    /// Unchecked pixel access for internal hot loops. Callers guarantee
    /// the coordinate is in bounds.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Extract a sub-region. Negative offsets clamp to 0 and the width
    /// and height clamp to the sprite extents.
    ///
    /// # Errors
    ///
    /// Returns `SpriteError::EmptyCrop` if the clamped region has zero
    /// area.
    pub fn crop(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Self, SpriteError> {
        let x = x.max(0) as u32;
        let y = y.max(0) as u32;
        if x >= self.width() || y >= self.height() {
            return Err(SpriteError::EmptyCrop);
        }
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);
        if width == 0 || height == 0 {
            return Err(SpriteError::EmptyCrop);
        }
        Ok(self.region(x, y, width, height))
    }

    /// Copy out a region known to be in bounds.
    fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let image = RgbaImage::from_fn(width, height, |dx, dy| self.pixel(x + dx, y + dy));
        Self { image }
    }

    /// Composite another sprite onto this one at (x, y) with alpha-over
    /// blending. Source pixels falling outside the destination are
    /// silently dropped; fully transparent source pixels leave the
    /// destination untouched; fully opaque ones overwrite directly.
    pub fn paste(&self, other: &Sprite, x: i32, y: i32) -> Self {
        let mut image = self.image.clone();
        for sy in 0..other.height() {
            let ty = y + sy as i32;
            if ty < 0 || ty >= self.height() as i32 {
                continue;
            }
            for sx in 0..other.width() {
                let tx = x + sx as i32;
                if tx < 0 || tx >= self.width() as i32 {
                    continue;
                }
                let src = other.pixel(sx, sy);
                if src[3] == 0 {
                    continue;
                }
                if src[3] == 255 {
                    image.put_pixel(tx as u32, ty as u32, src);
                } else {
                    let dst = *image.get_pixel(tx as u32, ty as u32);
                    image.put_pixel(tx as u32, ty as u32, alpha_over(src, dst));
                }
            }
        }
        Self { image }
    }

    /// Mirror left-to-right.
    pub fn flip_h(&self) -> Self {
        Self { image: imageops::flip_horizontal(&self.image) }
    }

    /// Mirror top-to-bottom.
    pub fn flip_v(&self) -> Self {
        Self { image: imageops::flip_vertical(&self.image) }
    }

    /// Replace every pixel exactly equal to `old` with `new`.
    pub fn replace_color(&self, old: Rgba<u8>, new: Rgba<u8>) -> Self {
        let image = RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let c = self.pixel(x, y);
            if c == old {
                new
            } else {
                c
            }
        });
        Self { image }
    }

    /// Tight bounding box (x, y, w, h) of all pixels with alpha > 0, or
    /// `None` if every pixel is fully transparent.
    pub fn opaque_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut min_x = self.width();
        let mut min_y = self.height();
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut found = false;
        for (x, y, pixel) in self.image.enumerate_pixels() {
            if pixel[3] > 0 {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        if !found {
            return None;
        }
        Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Crop away the transparent border. An all-transparent sprite
    /// yields a 1x1 transparent sprite.
    pub fn trim(&self) -> Self {
        match self.opaque_bounds() {
            Some((x, y, w, h)) => self.region(x, y, w, h),
            None => Self { image: RgbaImage::from_pixel(1, 1, TRANSPARENT) },
        }
    }
}

/// Alpha-over compositing of `src` onto `dst`. Channel math runs in f32,
/// rounds to nearest, and clamps to [0, 255].
pub(crate) fn alpha_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        let s_f = s as f32 / 255.0;
        let d_f = d as f32 / 255.0;
        let out = (s_f * sa + d_f * da * (1.0 - sa)) / out_a;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}
