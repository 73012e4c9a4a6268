//! Sprite sheet packing: strip (animation) and grid (collection).

use serde::Serialize;
use thiserror::Error;

use crate::sprite::Sprite;

/// Error type for sheet packing and unpacking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// No frames or sprites supplied
    #[error("sheet requires at least one sprite")]
    Empty,
    /// A frame's size differs from the first frame's
    #[error("frame {index} has size {got_w}x{got_h}, expected {want_w}x{want_h}")]
    FrameSizeMismatch { index: usize, got_w: u32, got_h: u32, want_w: u32, want_h: u32 },
    /// Strip width is not a multiple of the frame width
    #[error("sprite width {width} not divisible by frame width {frame_width}")]
    NotDivisible { width: u32, frame_width: u32 },
    /// Grid column count must be positive
    #[error("columns must be >= 1, got {0}")]
    InvalidColumns(u32),
}

/// Horizontal strip of animation frames. All frames share one size.
#[derive(Debug, Clone)]
pub struct StripSheet {
    frames: Vec<Sprite>,
}

impl StripSheet {
    /// Build a strip; every frame must match the first frame's size.
    ///
    /// # Errors
    ///
    /// `Empty` for no frames, `FrameSizeMismatch` naming the first
    /// offending frame index.
    pub fn new(frames: Vec<Sprite>) -> Result<Self, SheetError> {
        let (want_w, want_h) = match frames.first() {
            Some(f) => f.size(),
            None => return Err(SheetError::Empty),
        };
        for (index, frame) in frames.iter().enumerate() {
            let (got_w, got_h) = frame.size();
            if (got_w, got_h) != (want_w, want_h) {
                return Err(SheetError::FrameSizeMismatch { index, got_w, got_h, want_w, want_h });
            }
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Sprite] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// (width, height) of each frame.
    pub fn frame_size(&self) -> (u32, u32) {
        self.frames[0].size()
    }

    /// Pack all frames into one horizontal strip.
    pub fn to_sprite(&self) -> Sprite {
        let (fw, fh) = self.frame_size();
        let mut result = Sprite::empty(fw * self.frames.len() as u32, fh)
            .expect("strip has at least one non-empty frame");
        for (i, frame) in self.frames.iter().enumerate() {
            result = result.paste(frame, (i as u32 * fw) as i32, 0);
        }
        result
    }

    /// Split a horizontal strip back into frames. The inverse of
    /// [`to_sprite`](Self::to_sprite) when the strip was packed that way.
    ///
    /// # Errors
    ///
    /// `NotDivisible` when the sprite width is not a multiple of
    /// `frame_width`.
    pub fn from_sprite(sprite: &Sprite, frame_width: u32) -> Result<Self, SheetError> {
        if frame_width == 0 || sprite.width() % frame_width != 0 {
            return Err(SheetError::NotDivisible { width: sprite.width(), frame_width });
        }
        let count = sprite.width() / frame_width;
        let mut frames = Vec::with_capacity(count as usize);
        for i in 0..count {
            let frame = sprite
                .crop((i * frame_width) as i32, 0, frame_width, sprite.height())
                .expect("strip slices are in bounds");
            frames.push(frame);
        }
        Self::new(frames)
    }
}

/// Placement of one sprite within a packed grid sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellMetadata {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Grid-based sprite collection packing.
///
/// Sprites are placed row-major into a fixed number of columns, each
/// cell sized to the largest input (or an explicit cell size) plus
/// optional padding. Placement metadata is available for every entry in
/// insertion order.
#[derive(Debug, Clone)]
pub struct GridSheet {
    sprites: Vec<(String, Sprite)>,
    columns: u32,
    cell_w: u32,
    cell_h: u32,
    padding: u32,
}

impl GridSheet {
    /// Build a grid sheet; cell size defaults to the maximum width and
    /// height among the inputs.
    ///
    /// # Errors
    ///
    /// `Empty` for no sprites, `InvalidColumns` for zero columns.
    pub fn new(sprites: Vec<(String, Sprite)>, columns: u32) -> Result<Self, SheetError> {
        if sprites.is_empty() {
            return Err(SheetError::Empty);
        }
        if columns < 1 {
            return Err(SheetError::InvalidColumns(columns));
        }
        let cell_w = sprites.iter().map(|(_, s)| s.width()).max().unwrap_or(1);
        let cell_h = sprites.iter().map(|(_, s)| s.height()).max().unwrap_or(1);
        Ok(Self { sprites, columns, cell_w, cell_h, padding: 0 })
    }

    /// Override the computed cell size.
    pub fn with_cell_size(mut self, cell_w: u32, cell_h: u32) -> Self {
        self.cell_w = cell_w;
        self.cell_h = cell_h;
        self
    }

    /// Set the padding between cells, in pixels.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// (width, height) of each cell.
    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_w, self.cell_h)
    }

    fn cell_origin(&self, index: usize) -> (u32, u32) {
        let col = index as u32 % self.columns;
        let row = index as u32 / self.columns;
        (col * (self.cell_w + self.padding), row * (self.cell_h + self.padding))
    }

    /// Pack all sprites into a grid.
    pub fn to_sprite(&self) -> Sprite {
        let rows = (self.sprites.len() as u32).div_ceil(self.columns);
        let total_w = (self.columns * (self.cell_w + self.padding)).saturating_sub(self.padding);
        let total_h = (rows * (self.cell_h + self.padding)).saturating_sub(self.padding);

        let mut result = Sprite::empty(total_w.max(1), total_h.max(1))
            .expect("grid sheet canvas is at least 1x1");
        for (idx, (_, sprite)) in self.sprites.iter().enumerate() {
            let (x, y) = self.cell_origin(idx);
            result = result.paste(sprite, x as i32, y as i32);
        }
        result
    }

    /// Placement metadata for every sprite, in insertion order.
    pub fn metadata(&self) -> Vec<CellMetadata> {
        self.sprites
            .iter()
            .enumerate()
            .map(|(idx, (name, sprite))| {
                let (x, y) = self.cell_origin(idx);
                CellMetadata { name: name.clone(), x, y, w: sprite.width(), h: sprite.height() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> Sprite {
        Sprite::from_image(RgbaImage::from_pixel(w, h, color)).unwrap()
    }

    #[test]
    fn test_strip_rejects_empty() {
        assert_eq!(StripSheet::new(vec![]).unwrap_err(), SheetError::Empty);
    }

    #[test]
    fn test_strip_frame_size_mismatch() {
        let err =
            StripSheet::new(vec![solid(2, 2, RED), solid(3, 2, GREEN)]).unwrap_err();
        assert_eq!(
            err,
            SheetError::FrameSizeMismatch { index: 1, got_w: 3, got_h: 2, want_w: 2, want_h: 2 }
        );
    }

    #[test]
    fn test_strip_packs_horizontally() {
        let strip = StripSheet::new(vec![solid(2, 2, RED), solid(2, 2, GREEN)]).unwrap();
        let sheet = strip.to_sprite();
        assert_eq!(sheet.size(), (4, 2));
        assert_eq!(sheet.get_pixel(0, 0).unwrap(), RED);
        assert_eq!(sheet.get_pixel(2, 0).unwrap(), GREEN);
    }

    #[test]
    fn test_strip_roundtrip() {
        let frames = vec![solid(2, 3, RED), solid(2, 3, GREEN), solid(2, 3, BLUE)];
        let strip = StripSheet::new(frames.clone()).unwrap();
        let back = StripSheet::from_sprite(&strip.to_sprite(), 2).unwrap();
        assert_eq!(back.frame_count(), 3);
        for (a, b) in back.frames().iter().zip(frames.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_strip_from_sprite_not_divisible() {
        let sprite = solid(5, 2, RED);
        assert_eq!(
            StripSheet::from_sprite(&sprite, 2).unwrap_err(),
            SheetError::NotDivisible { width: 5, frame_width: 2 }
        );
    }

    #[test]
    fn test_grid_rejects_zero_columns() {
        let err = GridSheet::new(vec![("a".to_string(), solid(1, 1, RED))], 0).unwrap_err();
        assert_eq!(err, SheetError::InvalidColumns(0));
    }

    #[test]
    fn test_grid_cell_size_is_max_of_inputs() {
        let sheet = GridSheet::new(
            vec![
                ("a".to_string(), solid(2, 4, RED)),
                ("b".to_string(), solid(3, 1, GREEN)),
            ],
            2,
        )
        .unwrap();
        assert_eq!(sheet.cell_size(), (3, 4));
    }

    #[test]
    fn test_grid_layout_and_metadata() {
        let sheet = GridSheet::new(
            vec![
                ("a".to_string(), solid(2, 2, RED)),
                ("b".to_string(), solid(2, 2, GREEN)),
                ("c".to_string(), solid(2, 2, BLUE)),
            ],
            2,
        )
        .unwrap()
        .with_padding(1);

        let packed = sheet.to_sprite();
        // 2 cols * (2+1) - 1 = 5 wide, 2 rows * (2+1) - 1 = 5 tall
        assert_eq!(packed.size(), (5, 5));
        assert_eq!(packed.get_pixel(0, 0).unwrap(), RED);
        assert_eq!(packed.get_pixel(3, 0).unwrap(), GREEN);
        assert_eq!(packed.get_pixel(0, 3).unwrap(), BLUE);
        // Padding column stays transparent
        assert_eq!(packed.get_pixel(2, 0).unwrap(), Rgba([0, 0, 0, 0]));

        let meta = sheet.metadata();
        assert_eq!(meta.len(), 3);
        assert_eq!(
            meta[0],
            CellMetadata { name: "a".to_string(), x: 0, y: 0, w: 2, h: 2 }
        );
        assert_eq!(
            meta[1],
            CellMetadata { name: "b".to_string(), x: 3, y: 0, w: 2, h: 2 }
        );
        assert_eq!(
            meta[2],
            CellMetadata { name: "c".to_string(), x: 0, y: 3, w: 2, h: 2 }
        );
    }

    #[test]
    fn test_grid_metadata_serializes() {
        let sheet = GridSheet::new(vec![("hero".to_string(), solid(1, 1, RED))], 4).unwrap();
        let json = serde_json::to_string(&sheet.metadata()).unwrap();
        assert!(json.contains("\"name\":\"hero\""));
    }
}
