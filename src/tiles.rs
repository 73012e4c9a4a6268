//! TileMap system: large scenes from character grids of tile references.
//!
//! The same "one character, one cell" idea as string rendering, lifted a
//! level: a [`TileSet`] maps characters to whole sprites, and a
//! [`TileMap`] expands a character grid into one composed scene. A 32x32
//! grid of 8x8 tiles yields a 256x256 image from ~1KB of text.

use thiserror::Error;

use crate::canvas::normalize_block;
use crate::sprite::Sprite;

/// Error type for tile set and tile map validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    /// Tile set had no tiles
    #[error("tile set must have at least one tile")]
    Empty,
    /// A tile's size differs from the set's tile size
    #[error("tile '{key}' has size {got_w}x{got_h}, expected {want_w}x{want_h}")]
    TileSizeMismatch { key: char, got_w: u32, got_h: u32, want_w: u32, want_h: u32 },
    /// Grid had no rows
    #[error("tile map grid is empty")]
    EmptyGrid,
    /// A grid row's length differs from the first row's
    #[error("grid row {row} has {len} chars, expected {expected}")]
    RowWidthMismatch { row: usize, len: usize, expected: usize },
    /// A grid character has no tile
    #[error("character '{ch}' at grid ({x}, {y}) not in tile set")]
    UnknownTile { ch: char, x: usize, y: usize },
}

/// Named collection of tile sprites. All tiles share one size.
#[derive(Debug, Clone)]
pub struct TileSet {
    tiles: Vec<(char, Sprite)>,
    tile_width: u32,
    tile_height: u32,
}

impl TileSet {
    /// Build a tile set; the first tile fixes the tile size.
    ///
    /// # Errors
    ///
    /// `Empty` for no tiles, `TileSizeMismatch` naming the first
    /// offending key.
    pub fn new(tiles: Vec<(char, Sprite)>) -> Result<Self, TileError> {
        let (tile_width, tile_height) = match tiles.first() {
            Some((_, sprite)) => sprite.size(),
            None => return Err(TileError::Empty),
        };
        Self::with_tile_size(tiles, tile_width, tile_height)
    }

    /// Build a tile set with an explicit tile size.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), with every tile checked against the
    /// given size.
    pub fn with_tile_size(
        tiles: Vec<(char, Sprite)>,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, TileError> {
        if tiles.is_empty() {
            return Err(TileError::Empty);
        }
        for (key, sprite) in &tiles {
            let (got_w, got_h) = sprite.size();
            if (got_w, got_h) != (tile_width, tile_height) {
                return Err(TileError::TileSizeMismatch {
                    key: *key,
                    got_w,
                    got_h,
                    want_w: tile_width,
                    want_h: tile_height,
                });
            }
        }
        Ok(Self { tiles, tile_width, tile_height })
    }

    /// (width, height) of each tile in pixels.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn get(&self, key: char) -> Option<&Sprite> {
        self.tiles.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    pub fn contains(&self, key: char) -> bool {
        self.tiles.iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.tiles.iter().map(|(k, _)| *k)
    }
}

/// A scene: a tile set plus a rectangular character grid referencing it.
#[derive(Debug, Clone)]
pub struct TileMap {
    tileset: TileSet,
    rows: Vec<String>,
    cols: usize,
}

impl TileMap {
    /// Build a tile map from grid rows. Empty rows are dropped; the
    /// rest must be rectangular and reference only known tiles.
    ///
    /// # Errors
    ///
    /// `EmptyGrid`, `RowWidthMismatch`, or `UnknownTile` with the
    /// character and its grid coordinate.
    pub fn new<S: AsRef<str>>(tileset: TileSet, grid: &[S]) -> Result<Self, TileError> {
        let rows: Vec<String> = grid
            .iter()
            .map(|r| r.as_ref().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(TileError::EmptyGrid);
        }

        let cols = rows[0].chars().count();
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != cols {
                return Err(TileError::RowWidthMismatch { row: y, len, expected: cols });
            }
            for (x, ch) in row.chars().enumerate() {
                if !tileset.contains(ch) {
                    return Err(TileError::UnknownTile { ch, x, y });
                }
            }
        }

        Ok(Self { tileset, rows, cols })
    }

    /// Build from a multi-line block string, with the same dedent and
    /// blank-line stripping as `StringCanvas::render_block`.
    pub fn from_block(tileset: TileSet, block: &str) -> Result<Self, TileError> {
        let rows = normalize_block(block);
        Self::new(tileset, &rows)
    }

    /// (columns, rows) in tiles.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.cols, self.rows.len())
    }

    /// (width, height) in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let (tw, th) = self.tileset.tile_size();
        (self.cols as u32 * tw, self.rows.len() as u32 * th)
    }

    /// Render the full map by pasting each tile at its grid-cell origin
    /// in row-major order.
    pub fn to_sprite(&self) -> Sprite {
        let (tw, th) = self.tileset.tile_size();
        let (pw, ph) = self.pixel_size();
        // Grid and tile sizes are validated non-zero at construction
        let mut result = Sprite::empty(pw, ph).expect("tile map has positive pixel size");
        for (gy, row) in self.rows.iter().enumerate() {
            for (gx, ch) in row.chars().enumerate() {
                let tile = self.tileset.get(ch).expect("grid validated against tile set");
                result = result.paste(tile, gx as i32 * tw as i32, gy as i32 * th as i32);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> Sprite {
        Sprite::from_image(RgbaImage::from_pixel(w, h, color)).unwrap()
    }

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn tileset_2x2() -> TileSet {
        TileSet::new(vec![('r', solid(2, 2, RED)), ('g', solid(2, 2, GREEN))]).unwrap()
    }

    #[test]
    fn test_tileset_rejects_empty() {
        assert_eq!(TileSet::new(vec![]).unwrap_err(), TileError::Empty);
    }

    #[test]
    fn test_tileset_size_mismatch() {
        let err = TileSet::new(vec![('a', solid(2, 2, RED)), ('b', solid(3, 2, GREEN))])
            .unwrap_err();
        assert_eq!(
            err,
            TileError::TileSizeMismatch { key: 'b', got_w: 3, got_h: 2, want_w: 2, want_h: 2 }
        );
    }

    #[test]
    fn test_tileset_lookup() {
        let ts = tileset_2x2();
        assert_eq!(ts.tile_size(), (2, 2));
        assert!(ts.contains('r'));
        assert!(!ts.contains('x'));
        assert_eq!(ts.keys().collect::<Vec<_>>(), vec!['r', 'g']);
    }

    #[test]
    fn test_tilemap_unknown_tile_position() {
        let err = TileMap::new(tileset_2x2(), &["rg", "rx"]).unwrap_err();
        assert_eq!(err, TileError::UnknownTile { ch: 'x', x: 1, y: 1 });
    }

    #[test]
    fn test_tilemap_jagged_grid() {
        let err = TileMap::new(tileset_2x2(), &["rg", "r"]).unwrap_err();
        assert_eq!(err, TileError::RowWidthMismatch { row: 1, len: 1, expected: 2 });
    }

    #[test]
    fn test_tilemap_sizes() {
        let map = TileMap::new(tileset_2x2(), &["rgr", "grg"]).unwrap();
        assert_eq!(map.grid_size(), (3, 2));
        assert_eq!(map.pixel_size(), (6, 4));
    }

    #[test]
    fn test_tilemap_quadrants_match_tiles() {
        // 2x2 grid of 2x2 tiles: each quadrant of the 4x4 result equals
        // its referenced tile
        let map = TileMap::new(tileset_2x2(), &["rg", "gr"]).unwrap();
        let scene = map.to_sprite();
        assert_eq!(scene.size(), (4, 4));

        let quads = [
            (0, 0, RED),
            (2, 0, GREEN),
            (0, 2, GREEN),
            (2, 2, RED),
        ];
        for (qx, qy, color) in quads {
            for dy in 0..2 {
                for dx in 0..2 {
                    assert_eq!(
                        scene.get_pixel(qx + dx, qy + dy).unwrap(),
                        color,
                        "quadrant at ({qx}, {qy})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_tilemap_from_block() {
        let map = TileMap::from_block(
            tileset_2x2(),
            "
            rg
            gr
            ",
        )
        .unwrap();
        assert_eq!(map.grid_size(), (2, 2));
    }
}
