//! Single-character palettes mapping grid characters to colors.
//!
//! A [`Palette`] is the lookup table behind string rendering: each
//! character of a grid row maps to one RGBA color. Entries keep insertion
//! order, which makes [`Palette::reverse_lookup`] deterministic when two
//! keys share a color (the first-inserted key wins).

use image::Rgba;
use thiserror::Error;

use crate::color::{parse_color, ColorError};

/// Error type for palette construction and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// Character was not found in the palette
    #[error("character '{0}' not found in palette")]
    UnknownKey(char),
    /// A color value failed to parse
    #[error("invalid color for key '{key}': {source}")]
    BadColor {
        key: char,
        #[source]
        source: ColorError,
    },
}

/// Single-character to RGBA color mapping.
///
/// The `.` character conventionally maps to transparent. Backed by an
/// insertion-ordered vector; palettes are small (at most a few dozen
/// entries), so lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<(char, Rgba<u8>)>,
}

impl Palette {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build a palette from (character, color) pairs.
    pub fn from_colors<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, Rgba<u8>)>,
    {
        let mut palette = Self::new();
        for (key, color) in pairs {
            palette.insert(key, color);
        }
        palette
    }

    /// Build a palette from (character, color string) pairs.
    ///
    /// Color strings accept everything [`parse_color`] accepts: hex,
    /// named CSS colors, and functional notation.
    ///
    /// # Errors
    ///
    /// Returns `PaletteError::BadColor` naming the key whose color
    /// failed to parse.
    pub fn parse<'a, I>(pairs: I) -> Result<Self, PaletteError>
    where
        I: IntoIterator<Item = (char, &'a str)>,
    {
        let mut palette = Self::new();
        for (key, value) in pairs {
            let color =
                parse_color(value).map_err(|source| PaletteError::BadColor { key, source })?;
            palette.insert(key, color);
        }
        Ok(palette)
    }

    /// Insert or replace an entry. Replacing keeps the key's original
    /// position in the insertion order.
    pub fn insert(&mut self, key: char, color: Rgba<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = color;
        } else {
            self.entries.push((key, color));
        }
    }

    /// Look up the color for a character.
    ///
    /// # Errors
    ///
    /// Returns `PaletteError::UnknownKey` if the character has no entry.
    pub fn get(&self, key: char) -> Result<Rgba<u8>, PaletteError> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, c)| *c)
            .ok_or(PaletteError::UnknownKey(key))
    }

    /// Whether the palette has an entry for `key`.
    pub fn contains(&self, key: char) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (char, Rgba<u8>)> + '_ {
        self.entries.iter().copied()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Return a copy of this palette with one entry added or replaced.
    pub fn with(&self, key: char, color: Rgba<u8>) -> Self {
        let mut copy = self.clone();
        copy.insert(key, color);
        copy
    }

    /// Find the character key for a color, or `None` if no entry matches.
    ///
    /// When multiple keys map to the same color, the first-inserted key
    /// wins; the scan follows insertion order.
    pub fn reverse_lookup(&self, color: Rgba<u8>) -> Option<char> {
        self.entries
            .iter()
            .find(|(_, c)| *c == color)
            .map(|(k, _)| *k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, TRANSPARENT, WHITE};

    fn basic() -> Palette {
        Palette::parse([('.', "transparent"), ('K', "#000000"), ('r', "#FF0000")]).unwrap()
    }

    #[test]
    fn test_get_and_contains() {
        let p = basic();
        assert_eq!(p.get('K').unwrap(), BLACK);
        assert_eq!(p.get('.').unwrap(), TRANSPARENT);
        assert!(p.contains('r'));
        assert!(!p.contains('x'));
        assert_eq!(p.get('x'), Err(PaletteError::UnknownKey('x')));
    }

    #[test]
    fn test_bad_color_names_key() {
        let err = Palette::parse([('x', "#GG0000")]).unwrap_err();
        match err {
            PaletteError::BadColor { key, .. } => assert_eq!(key, 'x'),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut p = basic();
        p.insert('K', WHITE);
        assert_eq!(p.len(), 3);
        assert_eq!(p.get('K').unwrap(), WHITE);
        // Position preserved
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!['.', 'K', 'r']);
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let p = basic();
        let q = p.with('g', Rgba([0, 255, 0, 255]));
        assert_eq!(p.len(), 3);
        assert_eq!(q.len(), 4);
        assert!(q.contains('g'));
    }

    #[test]
    fn test_reverse_lookup() {
        let p = basic();
        assert_eq!(p.reverse_lookup(BLACK), Some('K'));
        assert_eq!(p.reverse_lookup(Rgba([1, 2, 3, 4])), None);
    }

    #[test]
    fn test_reverse_lookup_first_inserted_wins() {
        let p = Palette::from_colors([('a', BLACK), ('b', BLACK)]);
        assert_eq!(p.reverse_lookup(BLACK), Some('a'));
    }
}
