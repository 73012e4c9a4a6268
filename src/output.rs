//! PNG input and output at the codec boundary.
//!
//! Sprites cross this boundary as RGBA byte buffers; everything else is
//! the `image` crate's business. Saving creates parent directories so
//! batch specs can write into fresh output trees.

use std::path::Path;

use thiserror::Error;

use crate::preview::{scale_nearest, PreviewError};
use crate::sprite::{Sprite, SpriteError};

/// Default enlargement factor for preview files.
pub const DEFAULT_PREVIEW_SCALE: u32 = 10;

/// Error type for file load/save operations.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Decoded image was unusable as a sprite
    #[error(transparent)]
    Sprite(#[from] SpriteError),
    /// Preview scaling failed
    #[error(transparent)]
    Preview(#[from] PreviewError),
}

/// Load an image file as a sprite, converting to RGBA8.
///
/// # Errors
///
/// Decoding failures and zero-sized images are reported as
/// `OutputError`.
pub fn load_png(path: &Path) -> Result<Sprite, OutputError> {
    let image = image::open(path)?.to_rgba8();
    Ok(Sprite::from_image(image)?)
}

/// Save a sprite as a PNG file, creating parent directories as needed.
pub fn save_png(sprite: &Sprite, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    sprite.to_image().save(path)?;
    Ok(())
}

/// Save an upscaled preview of a sprite (nearest-neighbor).
pub fn save_preview(sprite: &Sprite, path: &Path, scale: u32) -> Result<(), OutputError> {
    let scaled = scale_nearest(sprite, scale)?;
    save_png(&scaled, path)
}

fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
