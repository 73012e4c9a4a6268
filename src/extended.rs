//! Multi-character palettes and automatic palette extraction.
//!
//! [`MultiCharPalette`] generalizes [`Palette`](crate::palette::Palette)
//! to fixed-length keys, trading row compactness for a larger color
//! space. [`AutoPalette`] goes the other way: given an existing sprite
//! it derives a palette and character rows that round-trip exactly.

use std::collections::HashMap;

use image::Rgba;
use thiserror::Error;

use crate::canvas::normalize_block;
use crate::color::{color_to_hex, parse_color, ColorError};
use crate::palette::Palette;
use crate::sprite::Sprite;

/// Characters available for auto-assignment (a-z, A-Z, 0-9).
const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Error type for multi-character palette operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtendedError {
    /// Key length does not match the palette's fixed length
    #[error("key \"{key}\" has length {len}, expected {expected}")]
    KeyLength { key: String, len: usize, expected: usize },
    /// A color value failed to parse
    #[error("invalid color for key \"{key}\": {source}")]
    BadColor {
        key: String,
        #[source]
        source: ColorError,
    },
    /// No rows, or every row was empty
    #[error("no rows to render")]
    EmptyRows,
    /// Block string contained nothing but whitespace
    #[error("block is empty after stripping blank lines")]
    EmptyBlock,
    /// Row length is not a multiple of the key length
    #[error("row length {len} is not divisible by key length {key_length}")]
    NotDivisible { len: usize, key_length: usize },
    /// A row's length differs from the first row's
    #[error("row {row} has {len} chars, expected {expected}")]
    RowWidthMismatch { row: usize, len: usize, expected: usize },
    /// A key chunk has no palette entry
    #[error("key \"{key}\" at pixel ({x}, {y}) not in palette")]
    UnknownKey { key: String, x: usize, y: usize },
    /// Reverse rendering hit a color with no palette entry
    #[error("color {color} at ({x}, {y}) has no palette entry")]
    UnmappedColor { color: String, x: u32, y: u32 },
}

/// Palette with fixed-length multi-character keys.
///
/// Entries keep insertion order, so reverse lookups are deterministic:
/// the first-inserted key wins for duplicate colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiCharPalette {
    entries: Vec<(String, Rgba<u8>)>,
    key_length: usize,
}

impl MultiCharPalette {
    /// Create an empty palette with the given fixed key length.
    pub fn new(key_length: usize) -> Self {
        Self { entries: Vec::new(), key_length }
    }

    /// Build from (key, color string) pairs.
    ///
    /// # Errors
    ///
    /// `KeyLength` when a key's length differs from `key_length`,
    /// `BadColor` when a color string fails to parse.
    pub fn parse<'a, I>(pairs: I, key_length: usize) -> Result<Self, ExtendedError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut palette = Self::new(key_length);
        for (key, value) in pairs {
            let color = parse_color(value).map_err(|source| ExtendedError::BadColor {
                key: key.to_string(),
                source,
            })?;
            palette.insert(key.to_string(), color)?;
        }
        Ok(palette)
    }

    /// Insert or replace an entry.
    ///
    /// # Errors
    ///
    /// `KeyLength` when the key's length differs from the palette's.
    pub fn insert(&mut self, key: String, color: Rgba<u8>) -> Result<(), ExtendedError> {
        let len = key.chars().count();
        if len != self.key_length {
            return Err(ExtendedError::KeyLength { key, len, expected: self.key_length });
        }
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = color;
        } else {
            self.entries.push((key, color));
        }
        Ok(())
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn get(&self, key: &str) -> Option<Rgba<u8>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgba<u8>)> + '_ {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// First-inserted key for a color, scanning in insertion order.
    pub fn reverse_lookup(&self, color: Rgba<u8>) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == color)
            .map(|(k, _)| k.as_str())
    }

    /// Render rows where every `key_length` characters map to one pixel.
    ///
    /// # Errors
    ///
    /// `EmptyRows`, `NotDivisible`, `RowWidthMismatch`, or `UnknownKey`
    /// with the offending chunk and its pixel coordinate.
    pub fn render<S: AsRef<str>>(&self, rows: &[S]) -> Result<Sprite, ExtendedError> {
        let rows: Vec<&str> = rows
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| !r.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(ExtendedError::EmptyRows);
        }

        let kl = self.key_length;
        let width = rows[0].chars().count();
        if width % kl != 0 {
            return Err(ExtendedError::NotDivisible { len: width, key_length: kl });
        }
        for (i, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(ExtendedError::RowWidthMismatch { row: i, len, expected: width });
            }
        }

        let mut pixels: Vec<Vec<Rgba<u8>>> = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.chars().collect();
            let mut pixel_row = Vec::with_capacity(width / kl);
            for (x, chunk) in chars.chunks(kl).enumerate() {
                let key: String = chunk.iter().collect();
                let color = self
                    .get(&key)
                    .ok_or(ExtendedError::UnknownKey { key, x, y })?;
                pixel_row.push(color);
            }
            pixels.push(pixel_row);
        }

        // Rectangularity was validated above
        Ok(Sprite::from_pixel_rows(pixels).expect("validated rectangular grid"))
    }

    /// Render a multi-line block string, with the same dedent and
    /// blank-line stripping as `StringCanvas::render_block`.
    pub fn render_block(&self, block: &str) -> Result<Sprite, ExtendedError> {
        let lines = normalize_block(block);
        if lines.is_empty() {
            return Err(ExtendedError::EmptyBlock);
        }
        self.render(&lines)
    }

    /// Reverse render: convert a sprite back to string rows.
    ///
    /// # Errors
    ///
    /// `UnmappedColor` when a pixel's color has no palette entry.
    pub fn to_string(&self, sprite: &Sprite) -> Result<Vec<String>, ExtendedError> {
        let mut rows = Vec::with_capacity(sprite.height() as usize);
        for y in 0..sprite.height() {
            let mut keys = String::with_capacity(sprite.width() as usize * self.key_length);
            for x in 0..sprite.width() {
                let color = sprite.pixel(x, y);
                let key = self.reverse_lookup(color).ok_or_else(|| {
                    ExtendedError::UnmappedColor { color: color_to_hex(color), x, y }
                })?;
                keys.push_str(key);
            }
            rows.push(keys);
        }
        Ok(rows)
    }
}

/// The palette produced by [`AutoPalette::from_sprite`]: single-char when
/// the color count fits, 2-char otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedPalette {
    Single(Palette),
    Multi(MultiCharPalette),
}

/// Automatic palette extraction from existing sprites.
pub struct AutoPalette;

impl AutoPalette {
    /// Analyze a sprite and return a palette plus the string rows that
    /// re-render to it exactly.
    ///
    /// The most frequent colors get the earliest keys from the
    /// 62-symbol alphabet (a-z, A-Z, 0-9); ties keep first-appearance
    /// order from the row-major scan. When the unique color count
    /// exceeds `max_single_char` (capped at 62), keys become 2-char
    /// pairs from the alphabet's product, enumerated in alphabet order.
    pub fn from_sprite(sprite: &Sprite, max_single_char: usize) -> (GeneratedPalette, Vec<String>) {
        let colors_by_freq = count_colors(sprite);
        let alphabet: Vec<char> = ALPHABET.chars().collect();

        if colors_by_freq.len() <= max_single_char.min(alphabet.len()) {
            let mut palette = Palette::new();
            let mut color_to_key: HashMap<[u8; 4], char> = HashMap::new();
            for (i, color) in colors_by_freq.iter().enumerate() {
                palette.insert(alphabet[i], *color);
                color_to_key.insert(color.0, alphabet[i]);
            }
            let rows = (0..sprite.height())
                .map(|y| {
                    (0..sprite.width())
                        .map(|x| color_to_key[&sprite.pixel(x, y).0])
                        .collect()
                })
                .collect();
            (GeneratedPalette::Single(palette), rows)
        } else {
            let mut palette = MultiCharPalette::new(2);
            let mut color_to_key: HashMap<[u8; 4], String> = HashMap::new();
            let mut keys = alphabet
                .iter()
                .flat_map(|a| alphabet.iter().map(move |b| format!("{a}{b}")));
            for color in &colors_by_freq {
                let key = keys.next().expect("more unique colors than 2-char keys");
                color_to_key.insert(color.0, key.clone());
                palette.insert(key, *color).expect("generated keys have length 2");
            }
            let rows = (0..sprite.height())
                .map(|y| {
                    (0..sprite.width())
                        .map(|x| color_to_key[&sprite.pixel(x, y).0].as_str())
                        .collect::<Vec<_>>()
                        .concat()
                })
                .collect();
            (GeneratedPalette::Multi(palette), rows)
        }
    }

    /// Load an image file and convert it to a palette plus string rows.
    ///
    /// # Errors
    ///
    /// Propagates decode failures from the codec boundary.
    pub fn from_image(
        path: &std::path::Path,
    ) -> Result<(GeneratedPalette, Vec<String>), crate::output::OutputError> {
        let sprite = crate::output::load_png(path)?;
        Ok(Self::from_sprite(&sprite, 62))
    }
}

/// Unique colors ordered by descending frequency; equal counts keep
/// first-appearance order (stable sort over the row-major scan).
fn count_colors(sprite: &Sprite) -> Vec<Rgba<u8>> {
    let mut counts: HashMap<[u8; 4], usize> = HashMap::new();
    let mut order: Vec<Rgba<u8>> = Vec::new();
    for y in 0..sprite.height() {
        for x in 0..sprite.width() {
            let color = sprite.pixel(x, y);
            let count = counts.entry(color.0).or_insert(0);
            if *count == 0 {
                order.push(color);
            }
            *count += 1;
        }
    }
    order.sort_by(|a, b| counts[&b.0].cmp(&counts[&a.0]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, TRANSPARENT};

    #[test]
    fn test_multichar_render() {
        let p = MultiCharPalette::parse(
            [("..", "transparent"), ("KK", "#000000"), ("rr", "#FF0000")],
            2,
        )
        .unwrap();
        let sprite = p.render(&["KKrr", "..KK"]).unwrap();
        assert_eq!(sprite.size(), (2, 2));
        assert_eq!(sprite.get_pixel(0, 0).unwrap(), BLACK);
        assert_eq!(sprite.get_pixel(0, 1).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_multichar_key_length_validation() {
        let err = MultiCharPalette::parse([("abc", "#000000")], 2).unwrap_err();
        assert_eq!(
            err,
            ExtendedError::KeyLength { key: "abc".to_string(), len: 3, expected: 2 }
        );
    }

    #[test]
    fn test_multichar_not_divisible() {
        let p = MultiCharPalette::parse([("KK", "#000000")], 2).unwrap();
        assert_eq!(
            p.render(&["KKK"]),
            Err(ExtendedError::NotDivisible { len: 3, key_length: 2 })
        );
    }

    #[test]
    fn test_multichar_unknown_key_position() {
        let p = MultiCharPalette::parse([("KK", "#000000")], 2).unwrap();
        assert_eq!(
            p.render(&["KKxx"]),
            Err(ExtendedError::UnknownKey { key: "xx".to_string(), x: 1, y: 0 })
        );
    }

    #[test]
    fn test_multichar_roundtrip() {
        let p = MultiCharPalette::parse(
            [("..", "transparent"), ("KK", "#000000")],
            2,
        )
        .unwrap();
        let rows = vec!["KK..".to_string(), "..KK".to_string()];
        let sprite = p.render(&rows).unwrap();
        assert_eq!(p.to_string(&sprite).unwrap(), rows);
    }

    #[test]
    fn test_auto_palette_single_char() {
        // Black dominates, so it gets 'a'
        let sprite = Sprite::from_pixel_rows(vec![
            vec![BLACK, BLACK, BLACK],
            vec![BLACK, TRANSPARENT, BLACK],
        ])
        .unwrap();
        let (palette, rows) = AutoPalette::from_sprite(&sprite, 62);
        let palette = match palette {
            GeneratedPalette::Single(p) => p,
            GeneratedPalette::Multi(_) => panic!("expected single-char palette"),
        };
        assert_eq!(palette.get('a').unwrap(), BLACK);
        assert_eq!(palette.get('b').unwrap(), TRANSPARENT);
        assert_eq!(rows, vec!["aaa".to_string(), "aba".to_string()]);
    }

    #[test]
    fn test_auto_palette_roundtrip() {
        let sprite = Sprite::from_pixel_rows(vec![
            vec![BLACK, Rgba([255, 0, 0, 255])],
            vec![TRANSPARENT, Rgba([0, 0, 255, 128])],
        ])
        .unwrap();
        let (palette, rows) = AutoPalette::from_sprite(&sprite, 62);
        match palette {
            GeneratedPalette::Single(p) => {
                let back = crate::canvas::StringCanvas::new(p).render(&rows).unwrap();
                assert_eq!(back, sprite);
            }
            GeneratedPalette::Multi(_) => panic!("expected single-char palette"),
        }
    }

    #[test]
    fn test_auto_palette_overflows_to_two_chars() {
        // 6 unique colors with max_single_char=4 forces 2-char keys
        let colors: Vec<Rgba<u8>> = (0..6u8).map(|i| Rgba([i, 0, 0, 255])).collect();
        let sprite = Sprite::from_pixel_rows(vec![colors.clone()]).unwrap();
        let (palette, rows) = AutoPalette::from_sprite(&sprite, 4);
        match palette {
            GeneratedPalette::Multi(p) => {
                assert_eq!(p.key_length(), 2);
                assert_eq!(p.len(), 6);
                let back = p.render(&rows).unwrap();
                assert_eq!(back, sprite);
            }
            GeneratedPalette::Single(_) => panic!("expected multi-char palette"),
        }
    }

    #[test]
    fn test_count_colors_frequency_then_first_seen() {
        let a = Rgba([1, 0, 0, 255]);
        let b = Rgba([2, 0, 0, 255]);
        let c = Rgba([3, 0, 0, 255]);
        // a appears twice; b and c once each with b seen first
        let sprite = Sprite::from_pixel_rows(vec![vec![b, a], vec![a, c]]).unwrap();
        assert_eq!(count_colors(&sprite), vec![a, b, c]);
    }
}
