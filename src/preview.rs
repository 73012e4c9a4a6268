//! Preview scaling: nearest-neighbor enlargement for human inspection.

use thiserror::Error;

use crate::color::TRANSPARENT;
use crate::sprite::Sprite;

/// Error type for preview generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// Scale factor must be at least 1
    #[error("scale factor must be >= 1, got {0}")]
    BadFactor(u32),
    /// No sprites supplied
    #[error("no sprites to display")]
    Empty,
}

/// Scale up using nearest-neighbor interpolation: each source pixel
/// becomes a `factor` x `factor` block. Factor 1 is the identity.
///
/// # Errors
///
/// Returns `PreviewError::BadFactor` for a zero factor.
pub fn scale_nearest(sprite: &Sprite, factor: u32) -> Result<Sprite, PreviewError> {
    if factor < 1 {
        return Err(PreviewError::BadFactor(factor));
    }
    if factor == 1 {
        return Ok(sprite.clone());
    }

    let image = image::RgbaImage::from_fn(
        sprite.width() * factor,
        sprite.height() * factor,
        |x, y| sprite.pixel(x / factor, y / factor),
    );
    Ok(Sprite::from_image(image).expect("scaled sprite keeps positive dimensions"))
}

/// Place sprites side by side for comparison, each scaled by `factor`,
/// separated by `gap` scaled pixels, over an optional background color.
///
/// # Errors
///
/// `Empty` when no sprites are given, `BadFactor` for a zero factor.
pub fn side_by_side(
    sprites: &[Sprite],
    factor: u32,
    gap: u32,
    background: Option<image::Rgba<u8>>,
) -> Result<Sprite, PreviewError> {
    if sprites.is_empty() {
        return Err(PreviewError::Empty);
    }

    let scaled: Vec<Sprite> = sprites
        .iter()
        .map(|s| scale_nearest(s, factor))
        .collect::<Result<_, _>>()?;

    let max_h = scaled.iter().map(|s| s.height()).max().unwrap_or(1);
    let total_w: u32 = scaled.iter().map(|s| s.width()).sum::<u32>()
        + gap * (scaled.len() as u32 - 1);

    let bg = background.unwrap_or(TRANSPARENT);
    let mut result = Sprite::from_image(image::RgbaImage::from_pixel(
        total_w.max(1),
        max_h.max(1),
        bg,
    ))
    .expect("comparison canvas is at least 1x1");

    let mut x_offset = 0i32;
    for s in &scaled {
        result = result.paste(s, x_offset, 0);
        x_offset += (s.width() + gap) as i32;
    }
    Ok(result)
}
