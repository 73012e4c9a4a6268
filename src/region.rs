//! Region-based multi-part sprite layout.
//!
//! A [`RegionLayout`] names rectangles within one canvas so multi-part
//! sprites (weapon = blade + hilt + guard) can be composed from parts
//! and split back apart. Regions are non-overlapping by convention; the
//! layout does not enforce it.

use std::collections::HashMap;

use thiserror::Error;

use crate::sprite::{Sprite, SpriteError};

/// Error type for region layout validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// Canvas must be at least 1x1
    #[error("canvas must be at least 1x1, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    /// Region must be at least 1x1
    #[error("region '{name}' must be at least 1x1")]
    EmptyRegion { name: String },
    /// Region extends past the canvas
    #[error("region '{name}' exceeds canvas bounds ({right}x{bottom} > {width}x{height})")]
    ExceedsCanvas { name: String, right: u32, bottom: u32, width: u32, height: u32 },
    /// Crop failure while decomposing
    #[error(transparent)]
    Sprite(#[from] SpriteError),
}

/// A named rectangular region within a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(name: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { name: name.into(), x, y, width, height }
    }
}

/// Named regions over one canvas size, with compose/decompose.
#[derive(Debug, Clone)]
pub struct RegionLayout {
    width: u32,
    height: u32,
    regions: Vec<Region>,
}

impl RegionLayout {
    /// Validate that every region is non-empty and fully contained.
    ///
    /// # Errors
    ///
    /// `InvalidCanvas`, `EmptyRegion`, or `ExceedsCanvas` naming the
    /// offending region and both extents.
    pub fn new(canvas_size: (u32, u32), regions: Vec<Region>) -> Result<Self, RegionError> {
        let (width, height) = canvas_size;
        if width == 0 || height == 0 {
            return Err(RegionError::InvalidCanvas { width, height });
        }
        for r in &regions {
            if r.width == 0 || r.height == 0 {
                return Err(RegionError::EmptyRegion { name: r.name.clone() });
            }
            let right = r.x + r.width;
            let bottom = r.y + r.height;
            if right > width || bottom > height {
                return Err(RegionError::ExceedsCanvas {
                    name: r.name.clone(),
                    right,
                    bottom,
                    width,
                    height,
                });
            }
        }
        Ok(Self { width, height, regions })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Regions in declaration order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Compose named parts into a single canvas.
    ///
    /// Regions are walked in declaration order; a supplied part larger
    /// than its region is cropped to the region size first. Part names
    /// without a region are ignored; regions without a part stay
    /// transparent.
    pub fn compose(&self, parts: &HashMap<String, Sprite>) -> Sprite {
        let mut result =
            Sprite::empty(self.width, self.height).expect("layout canvas is at least 1x1");
        for r in &self.regions {
            let Some(sprite) = parts.get(&r.name) else {
                continue;
            };
            let cropped;
            let src = if sprite.width() > r.width || sprite.height() > r.height {
                cropped = sprite
                    .crop(0, 0, r.width, r.height)
                    .expect("regions are validated non-empty");
                &cropped
            } else {
                sprite
            };
            result = result.paste(src, r.x as i32, r.y as i32);
        }
        result
    }

    /// Extract every named region's rectangle from a sprite.
    ///
    /// The exact inverse of [`compose`](Self::compose) only when no part
    /// was cropped during compose and no two regions overlap.
    ///
    /// # Errors
    ///
    /// Propagates the crop error when a region falls entirely outside
    /// the given sprite.
    pub fn decompose(&self, sprite: &Sprite) -> Result<HashMap<String, Sprite>, RegionError> {
        let mut parts = HashMap::with_capacity(self.regions.len());
        for r in &self.regions {
            let part = sprite.crop(r.x as i32, r.y as i32, r.width, r.height)?;
            parts.insert(r.name.clone(), part);
        }
        Ok(parts)
    }
}
