//! Sprite analysis: palette extraction, color counting, pixel hashing.

use std::collections::HashMap;

use image::Rgba;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::color::color_to_hex;
use crate::sprite::Sprite;

/// Information about a color's usage in a sprite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorInfo {
    #[serde(skip)]
    pub color: Rgba<u8>,
    pub hex: String,
    pub count: usize,
    pub percentage: f32,
}

/// Extract the most used colors from a sprite.
///
/// Transparent pixels are excluded. Results are ordered by descending
/// count; equal counts keep first-appearance order from the row-major
/// scan. Percentages are of the opaque total, rounded to one decimal.
pub fn extract_palette(sprite: &Sprite, top_n: usize) -> Vec<ColorInfo> {
    let mut counts: HashMap<[u8; 4], usize> = HashMap::new();
    let mut order: Vec<Rgba<u8>> = Vec::new();
    let mut total_opaque = 0usize;

    for y in 0..sprite.height() {
        for x in 0..sprite.width() {
            let c = sprite.pixel(x, y);
            if c[3] > 0 {
                let count = counts.entry(c.0).or_insert(0);
                if *count == 0 {
                    order.push(c);
                }
                *count += 1;
                total_opaque += 1;
            }
        }
    }

    if total_opaque == 0 {
        return Vec::new();
    }

    order.sort_by(|a, b| counts[&b.0].cmp(&counts[&a.0]));
    order
        .into_iter()
        .take(top_n)
        .map(|color| {
            let count = counts[&color.0];
            ColorInfo {
                color,
                hex: color_to_hex(color),
                count,
                percentage: (count as f32 / total_opaque as f32 * 1000.0).round() / 10.0,
            }
        })
        .collect()
}

/// Count unique non-transparent colors in a sprite.
pub fn color_count(sprite: &Sprite) -> usize {
    let mut colors: std::collections::HashSet<[u8; 4]> = std::collections::HashSet::new();
    for y in 0..sprite.height() {
        for x in 0..sprite.width() {
            let c = sprite.pixel(x, y);
            if c[3] > 0 {
                colors.insert(c.0);
            }
        }
    }
    colors.len()
}

/// SHA-256 hash of the pixel data, as lowercase hex. Useful for
/// uniqueness checks across generated sprites.
pub fn pixel_hash(sprite: &Sprite) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sprite.as_raw());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, TRANSPARENT};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_extract_palette_orders_by_count() {
        let sprite = Sprite::from_pixel_rows(vec![
            vec![RED, RED, BLACK],
            vec![RED, TRANSPARENT, TRANSPARENT],
        ])
        .unwrap();
        let info = extract_palette(&sprite, 12);
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].hex, "#FF0000");
        assert_eq!(info[0].count, 3);
        assert_eq!(info[0].percentage, 75.0);
        assert_eq!(info[1].hex, "#000000");
        assert_eq!(info[1].count, 1);
        assert_eq!(info[1].percentage, 25.0);
    }

    #[test]
    fn test_extract_palette_top_n() {
        let sprite = Sprite::from_pixel_rows(vec![vec![RED, BLACK, Rgba([0, 255, 0, 255])]])
            .unwrap();
        assert_eq!(extract_palette(&sprite, 2).len(), 2);
    }

    #[test]
    fn test_extract_palette_empty_for_transparent() {
        let sprite = Sprite::empty(3, 3).unwrap();
        assert!(extract_palette(&sprite, 12).is_empty());
    }

    #[test]
    fn test_color_count_ignores_transparent() {
        let sprite = Sprite::from_pixel_rows(vec![vec![RED, BLACK, TRANSPARENT, RED]]).unwrap();
        assert_eq!(color_count(&sprite), 2);
    }

    #[test]
    fn test_pixel_hash_distinguishes_sprites() {
        let a = Sprite::from_pixel_rows(vec![vec![RED]]).unwrap();
        let b = Sprite::from_pixel_rows(vec![vec![BLACK]]).unwrap();
        let ha = pixel_hash(&a);
        assert_eq!(ha.len(), 64);
        assert_eq!(ha, pixel_hash(&a.clone()));
        assert_ne!(ha, pixel_hash(&b));
    }
}
