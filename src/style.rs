//! Outline and drop-shadow post effects.
//!
//! Both effects work on the opaque silhouette of a sprite and return a
//! larger sprite with the effect drawn behind the original pixels.

use image::{Rgba, RgbaImage};
use serde::Deserialize;

use crate::sprite::Sprite;

/// Outline rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineStyle {
    /// No outline; the sprite passes through unchanged
    None,
    /// 4-connected outline
    #[default]
    Thin,
    /// 8-connected outline
    Thick,
    /// Bottom-right only, for a grounded look
    Selective,
}

impl OutlineStyle {
    fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            OutlineStyle::None => &[],
            OutlineStyle::Thin => &[(0, -1), (0, 1), (-1, 0), (1, 0)],
            OutlineStyle::Thick => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
            OutlineStyle::Selective => &[(1, 0), (0, 1), (1, 1)],
        }
    }
}

/// Add an outline around opaque pixels. Returns a new sprite grown by
/// one pixel on every side; `OutlineStyle::None` returns the input
/// unchanged.
pub fn apply_outline(sprite: &Sprite, color: Rgba<u8>, style: OutlineStyle) -> Sprite {
    if style == OutlineStyle::None {
        return sprite.clone();
    }

    let (w, h) = sprite.size();
    let new_w = w + 2;
    let new_h = h + 2;
    let mut image = RgbaImage::new(new_w, new_h);

    // Outline first, only onto still-transparent pixels
    for y in 0..h {
        for x in 0..w {
            if sprite.pixel(x, y)[3] == 0 {
                continue;
            }
            for &(dx, dy) in style.offsets() {
                let nx = x as i32 + 1 + dx;
                let ny = y as i32 + 1 + dy;
                if nx >= 0 && nx < new_w as i32 && ny >= 0 && ny < new_h as i32 {
                    let existing = image.get_pixel(nx as u32, ny as u32);
                    if existing[3] == 0 {
                        image.put_pixel(nx as u32, ny as u32, color);
                    }
                }
            }
        }
    }

    // Original pixels on top, offset by (1, 1)
    for y in 0..h {
        for x in 0..w {
            let px = sprite.pixel(x, y);
            if px[3] > 0 {
                image.put_pixel(x + 1, y + 1, px);
            }
        }
    }

    Sprite::from_image(image).expect("outline canvas is larger than the input")
}

/// Add a drop shadow behind opaque pixels. The canvas grows to fit the
/// sprite plus the offset; the shadow silhouette is drawn first and the
/// sprite lands on top.
pub fn apply_shadow(
    sprite: &Sprite,
    offset: (i32, i32),
    color: Option<Rgba<u8>>,
    opacity: f32,
) -> Sprite {
    let base = color.unwrap_or(Rgba([0, 0, 0, 255]));
    let alpha = (opacity * 255.0).round().clamp(0.0, 255.0) as u8;
    let shadow = Rgba([base[0], base[1], base[2], alpha]);

    let (w, h) = sprite.size();
    let (ox, oy) = offset;
    let min_x = ox.min(0);
    let min_y = oy.min(0);
    let max_x = (w as i32).max(w as i32 + ox);
    let max_y = (h as i32).max(h as i32 + oy);
    let new_w = (max_x - min_x) as u32;
    let new_h = (max_y - min_y) as u32;

    // Sprite origin in the grown canvas
    let sx = -min_x;
    let sy = -min_y;

    let mut image = RgbaImage::new(new_w, new_h);

    for y in 0..h {
        for x in 0..w {
            if sprite.pixel(x, y)[3] > 0 {
                let nx = sx + x as i32 + ox;
                let ny = sy + y as i32 + oy;
                if nx >= 0 && nx < new_w as i32 && ny >= 0 && ny < new_h as i32 {
                    image.put_pixel(nx as u32, ny as u32, shadow);
                }
            }
        }
    }

    for y in 0..h {
        for x in 0..w {
            let px = sprite.pixel(x, y);
            if px[3] > 0 {
                image.put_pixel((sx + x as i32) as u32, (sy + y as i32) as u32, px);
            }
        }
    }

    Sprite::from_image(image).expect("shadow canvas contains the input")
}
