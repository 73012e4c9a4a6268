//! StringCanvas: the core string-to-sprite renderer.
//!
//! Each character of an input row maps to one pixel via a [`Palette`].
//! The reverse direction ([`StringCanvas::to_string`]) turns a sprite
//! back into character rows for editing existing images as text.

use image::RgbaImage;
use thiserror::Error;

use crate::color::color_to_hex;
use crate::palette::Palette;
use crate::sprite::Sprite;

/// Error type for string rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// No rows, or every row was empty
    #[error("no rows to render")]
    EmptyRows,
    /// Block string contained nothing but whitespace
    #[error("block is empty after stripping blank lines")]
    EmptyBlock,
    /// A row's length differs from the first row's
    #[error("row {row} has {len} chars, expected {expected}")]
    RowWidthMismatch { row: usize, len: usize, expected: usize },
    /// A character has no palette entry
    #[error("character '{ch}' at ({x}, {y}) not in palette")]
    UnknownChar { ch: char, x: usize, y: usize },
    /// Reverse rendering hit a color with no palette entry
    #[error("color {color} at ({x}, {y}) has no palette entry")]
    UnmappedColor { color: String, x: u32, y: u32 },
}

/// Renders single-character-per-pixel string art into sprites.
///
/// # Examples
///
/// ```
/// use pixelgrid::canvas::StringCanvas;
/// use pixelgrid::palette::Palette;
///
/// let palette = Palette::parse([
///     ('.', "transparent"),
///     ('K', "#000000"),
///     ('r', "#FF0000"),
/// ]).unwrap();
///
/// let sprite = StringCanvas::new(palette).render_block("
///     ..KK..
///     .KrrK.
///     KrrrrK
///     .KrrK.
///     ..KK..
/// ").unwrap();
/// assert_eq!(sprite.size(), (6, 5));
/// ```
#[derive(Debug, Clone)]
pub struct StringCanvas {
    palette: Palette,
}

impl StringCanvas {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Render a list of rows into a sprite. Each character maps to one
    /// pixel; empty rows are dropped; all remaining rows must share the
    /// first row's length.
    ///
    /// # Errors
    ///
    /// `EmptyRows` when nothing is left to render, `RowWidthMismatch`
    /// for jagged input, `UnknownChar` (with the character and its
    /// coordinate) when the palette has no entry.
    pub fn render<S: AsRef<str>>(&self, rows: &[S]) -> Result<Sprite, CanvasError> {
        let rows: Vec<&str> = rows
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| !r.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(CanvasError::EmptyRows);
        }

        let width = rows[0].chars().count();
        for (i, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(CanvasError::RowWidthMismatch { row: i, len, expected: width });
            }
        }

        let mut image = RgbaImage::new(width as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let color = self
                    .palette
                    .get(ch)
                    .map_err(|_| CanvasError::UnknownChar { ch, x, y })?;
                image.put_pixel(x as u32, y as u32, color);
            }
        }

        // Dimensions validated above, the grid is at least 1x1
        Ok(Sprite::from_image(image).expect("validated non-empty grid"))
    }

    /// Render a multi-line block string.
    ///
    /// Common leading whitespace is stripped (so indented source
    /// literals render cleanly) along with leading and trailing blank
    /// lines.
    ///
    /// # Errors
    ///
    /// `EmptyBlock` when nothing remains after stripping, otherwise the
    /// same errors as [`render`](Self::render).
    pub fn render_block(&self, block: &str) -> Result<Sprite, CanvasError> {
        let lines = normalize_block(block);
        if lines.is_empty() {
            return Err(CanvasError::EmptyBlock);
        }
        self.render(&lines)
    }

    /// Reverse render: convert a sprite back to string rows using the
    /// given palette.
    ///
    /// # Errors
    ///
    /// `UnmappedColor` (with the hex color and coordinate) when a pixel
    /// has no palette entry.
    pub fn to_string(sprite: &Sprite, palette: &Palette) -> Result<Vec<String>, CanvasError> {
        let mut rows = Vec::with_capacity(sprite.height() as usize);
        for y in 0..sprite.height() {
            let mut chars = String::with_capacity(sprite.width() as usize);
            for x in 0..sprite.width() {
                let color = sprite.pixel(x, y);
                let ch = palette.reverse_lookup(color).ok_or_else(|| {
                    CanvasError::UnmappedColor { color: color_to_hex(color), x, y }
                })?;
                chars.push(ch);
            }
            rows.push(chars);
        }
        Ok(rows)
    }
}

/// Dedent a block string and strip leading/trailing blank lines.
///
/// The common indent is the minimum leading whitespace across non-blank
/// lines, matching how triple-quoted literals are written in source.
pub(crate) fn normalize_block(block: &str) -> Vec<String> {
    let lines: Vec<&str> = block.split('\n').collect();

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    // Whitespace-only lines normalize to empty; content lines keep any
    // trailing whitespace (it may be meaningful to the palette)
    let mut rows: Vec<String> = lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l[indent..].to_string()
            }
        })
        .collect();

    while rows.first().is_some_and(|r| r.trim().is_empty()) {
        rows.remove(0);
    }
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    rows
}
