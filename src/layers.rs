//! Layer stacks with blend modes for compositing multiple sprites.
//!
//! A [`LayerStack`] holds named layers bottom-to-top over a fixed canvas
//! size; [`LayerStack::flatten`] collapses the visible ones into a
//! single sprite. Each output pixel folds the layer stack sequentially
//! (later layers see the accumulated result), but distinct pixels are
//! independent, so rows are processed in parallel.

use std::collections::HashSet;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::color::TRANSPARENT;
use crate::sprite::Sprite;

/// Error type for layer stack operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Stack must be at least 1x1
    #[error("layer stack must be at least 1x1, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    /// A layer with this name already exists
    #[error("layer '{0}' already exists")]
    DuplicateName(String),
    /// Layer sprite does not match the stack size
    #[error("layer '{name}' sprite is {got_w}x{got_h}, stack is {want_w}x{want_h}")]
    SizeMismatch { name: String, got_w: u32, got_h: u32, want_w: u32, want_h: u32 },
    /// No layer with this name
    #[error("layer '{0}' not found")]
    NotFound(String),
    /// Reorder names are not a permutation of the current layer names
    #[error("reorder names must be exactly a permutation of all layer names")]
    BadReorder,
}

/// Per-pixel RGB combination applied before alpha compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Add,
    Subtract,
}

/// One named layer: a sprite with opacity, visibility, and a blend mode.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub sprite: Sprite,
    pub opacity: f32,
    pub visible: bool,
    pub blend_mode: BlendMode,
}

impl Layer {
    /// A fully opaque, visible, normal-mode layer.
    pub fn new(name: impl Into<String>, sprite: Sprite) -> Self {
        Self {
            name: name.into(),
            sprite,
            opacity: 1.0,
            visible: true,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// An ordered collection of layers (bottom to top) over a fixed size.
#[derive(Debug, Clone)]
pub struct LayerStack {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Create an empty stack with a fixed canvas size.
    ///
    /// # Errors
    ///
    /// Returns `LayerError::InvalidSize` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, LayerError> {
        if width == 0 || height == 0 {
            return Err(LayerError::InvalidSize { width, height });
        }
        Ok(Self { width, height, layers: Vec::new() })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Append a layer on top.
    ///
    /// # Errors
    ///
    /// `DuplicateName` or `SizeMismatch` against the stack size.
    pub fn add_layer(&mut self, layer: Layer) -> Result<(), LayerError> {
        let index = self.layers.len();
        self.insert_layer(index, layer)
    }

    /// Insert a layer at `index` (0 = bottom); indexes past the top
    /// append.
    ///
    /// # Errors
    ///
    /// Same as [`add_layer`](Self::add_layer).
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> Result<(), LayerError> {
        if self.layers.iter().any(|l| l.name == layer.name) {
            return Err(LayerError::DuplicateName(layer.name));
        }
        let (got_w, got_h) = layer.sprite.size();
        if (got_w, got_h) != (self.width, self.height) {
            return Err(LayerError::SizeMismatch {
                name: layer.name,
                got_w,
                got_h,
                want_w: self.width,
                want_h: self.height,
            });
        }
        self.layers.insert(index.min(self.layers.len()), layer);
        Ok(())
    }

    /// Remove and return a layer by name.
    ///
    /// # Errors
    ///
    /// `NotFound` when the name is absent.
    pub fn remove_layer(&mut self, name: &str) -> Result<Layer, LayerError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        Ok(self.layers.remove(index))
    }

    /// Look up a layer by name.
    ///
    /// # Errors
    ///
    /// `NotFound` when the name is absent.
    pub fn get_layer(&self, name: &str) -> Result<&Layer, LayerError> {
        self.layers
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| LayerError::NotFound(name.to_string()))
    }

    fn get_layer_mut(&mut self, name: &str) -> Result<&mut Layer, LayerError> {
        self.layers
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| LayerError::NotFound(name.to_string()))
    }

    pub fn set_visibility(&mut self, name: &str, visible: bool) -> Result<(), LayerError> {
        self.get_layer_mut(name)?.visible = visible;
        Ok(())
    }

    pub fn set_opacity(&mut self, name: &str, opacity: f32) -> Result<(), LayerError> {
        self.get_layer_mut(name)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_blend_mode(&mut self, name: &str, mode: BlendMode) -> Result<(), LayerError> {
        self.get_layer_mut(name)?.blend_mode = mode;
        Ok(())
    }

    /// Layer names from bottom to top.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Set the bottom-to-top order.
    ///
    /// # Errors
    ///
    /// `BadReorder` unless `names` is exactly a permutation of all
    /// current layer names.
    pub fn reorder<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), LayerError> {
        if names.len() != self.layers.len() {
            return Err(LayerError::BadReorder);
        }
        let mut seen = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) || !self.layers.iter().any(|l| l.name == name) {
                return Err(LayerError::BadReorder);
            }
        }
        let mut reordered = Vec::with_capacity(self.layers.len());
        for name in names {
            let index = self
                .layers
                .iter()
                .position(|l| l.name == name.as_ref())
                .expect("name presence checked above");
            reordered.push(self.layers.remove(index));
        }
        self.layers = reordered;
        Ok(())
    }

    /// Composite all visible layers, bottom to top, into one sprite.
    pub fn flatten(&self) -> Sprite {
        let visible: Vec<&Layer> = self.layers.iter().filter(|l| l.visible).collect();
        let width = self.width as usize;

        let mut buf = vec![0u8; width * self.height as usize * 4];
        buf.par_chunks_mut(width * 4).enumerate().for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = TRANSPARENT;
                for layer in &visible {
                    let src = layer.sprite.pixel(x as u32, y as u32);
                    if src[3] == 0 {
                        continue;
                    }
                    acc = blend_pixel(src, acc, layer.blend_mode, layer.opacity);
                }
                row[x * 4..x * 4 + 4].copy_from_slice(&acc.0);
            }
        });

        let image = RgbaImage::from_raw(self.width, self.height, buf)
            .expect("buffer sized to stack dimensions");
        Sprite::from_image(image).expect("stack dimensions validated at construction")
    }
}

/// Blend one source pixel onto the accumulated destination.
///
/// Source alpha is scaled by the layer opacity first; a zero effective
/// alpha leaves the destination untouched. Non-normal modes combine the
/// RGB channels in normalized space, then the result is alpha-composited
/// exactly like a normal-mode source.
fn blend_pixel(src: Rgba<u8>, dst: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    let sa = (src[3] as f32 / 255.0) * opacity;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a == 0.0 {
        return TRANSPARENT;
    }

    let channel = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let b = match mode {
            BlendMode::Normal => s,
            BlendMode::Multiply => s * d,
            BlendMode::Screen => 1.0 - (1.0 - s) * (1.0 - d),
            BlendMode::Overlay => {
                if d < 0.5 {
                    2.0 * s * d
                } else {
                    1.0 - 2.0 * (1.0 - s) * (1.0 - d)
                }
            }
            BlendMode::Add => (s + d).min(1.0),
            BlendMode::Subtract => (d - s).max(0.0),
        };
        let out = (b * sa + d * da * (1.0 - sa)) / out_a;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use image::RgbaImage;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> Sprite {
        Sprite::from_image(RgbaImage::from_pixel(w, h, color)).unwrap()
    }

    fn stack_1x1(layers: &[(&str, Rgba<u8>, f32, BlendMode)]) -> LayerStack {
        let mut stack = LayerStack::new(1, 1).unwrap();
        for (name, color, opacity, mode) in layers {
            stack
                .add_layer(
                    Layer::new(*name, solid(1, 1, *color))
                        .with_opacity(*opacity)
                        .with_blend_mode(*mode),
                )
                .unwrap();
        }
        stack
    }

    #[test]
    fn test_add_duplicate_name() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        stack.add_layer(Layer::new("bg", solid(1, 1, RED))).unwrap();
        assert_eq!(
            stack.add_layer(Layer::new("bg", solid(1, 1, RED))),
            Err(LayerError::DuplicateName("bg".to_string()))
        );
    }

    #[test]
    fn test_add_size_mismatch() {
        let mut stack = LayerStack::new(2, 2).unwrap();
        let err = stack.add_layer(Layer::new("bg", solid(1, 1, RED))).unwrap_err();
        assert_eq!(
            err,
            LayerError::SizeMismatch {
                name: "bg".to_string(),
                got_w: 1,
                got_h: 1,
                want_w: 2,
                want_h: 2
            }
        );
    }

    #[test]
    fn test_insert_position_and_names() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        stack.add_layer(Layer::new("a", solid(1, 1, RED))).unwrap();
        stack.add_layer(Layer::new("b", solid(1, 1, RED))).unwrap();
        stack.insert_layer(1, Layer::new("mid", solid(1, 1, RED))).unwrap();
        assert_eq!(stack.layer_names(), vec!["a", "mid", "b"]);
    }

    #[test]
    fn test_remove_and_get() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        stack.add_layer(Layer::new("a", solid(1, 1, RED))).unwrap();
        assert!(stack.get_layer("a").is_ok());
        let removed = stack.remove_layer("a").unwrap();
        assert_eq!(removed.name, "a");
        assert!(matches!(stack.get_layer("a"), Err(LayerError::NotFound(_))));
        assert!(matches!(stack.remove_layer("a"), Err(LayerError::NotFound(_))));
    }

    #[test]
    fn test_reorder() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        for name in ["a", "b", "c"] {
            stack.add_layer(Layer::new(name, solid(1, 1, RED))).unwrap();
        }
        stack.reorder(&["c", "a", "b"]).unwrap();
        assert_eq!(stack.layer_names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        stack.add_layer(Layer::new("a", solid(1, 1, RED))).unwrap();
        stack.add_layer(Layer::new("b", solid(1, 1, RED))).unwrap();
        assert_eq!(stack.reorder(&["a"]), Err(LayerError::BadReorder));
        assert_eq!(stack.reorder(&["a", "a"]), Err(LayerError::BadReorder));
        assert_eq!(stack.reorder(&["a", "x"]), Err(LayerError::BadReorder));
    }

    #[test]
    fn test_flatten_empty_stack_is_transparent() {
        let stack = LayerStack::new(2, 2).unwrap();
        let flat = stack.flatten();
        assert_eq!(flat.get_pixel(1, 1).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_flatten_half_opacity_black_over_white() {
        let stack = stack_1x1(&[
            ("bg", WHITE, 1.0, BlendMode::Normal),
            ("fg", BLACK, 0.5, BlendMode::Normal),
        ]);
        let px = stack.flatten().get_pixel(0, 0).unwrap();
        assert_eq!(px[3], 255);
        for c in 0..3 {
            assert!(px[c] == 127 || px[c] == 128, "channel {c} = {}", px[c]);
        }
    }

    #[test]
    fn test_multiply_identities() {
        // White multiplied over a color leaves it unchanged
        let color = Rgba([10, 200, 77, 255]);
        let stack = stack_1x1(&[
            ("base", color, 1.0, BlendMode::Normal),
            ("mul", WHITE, 1.0, BlendMode::Multiply),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), color);

        // Black multiplied over anything opaque is black
        let stack = stack_1x1(&[
            ("base", color, 1.0, BlendMode::Normal),
            ("mul", BLACK, 1.0, BlendMode::Multiply),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), BLACK);
    }

    #[test]
    fn test_screen_identities() {
        let color = Rgba([10, 200, 77, 255]);
        // Black screened over a color leaves it unchanged
        let stack = stack_1x1(&[
            ("base", color, 1.0, BlendMode::Normal),
            ("scr", BLACK, 1.0, BlendMode::Screen),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), color);

        // White screened over anything is white
        let stack = stack_1x1(&[
            ("base", color, 1.0, BlendMode::Normal),
            ("scr", WHITE, 1.0, BlendMode::Screen),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), WHITE);
    }

    #[test]
    fn test_add_and_subtract() {
        let stack = stack_1x1(&[
            ("base", Rgba([200, 200, 200, 255]), 1.0, BlendMode::Normal),
            ("add", Rgba([100, 100, 100, 255]), 1.0, BlendMode::Add),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), WHITE);

        let stack = stack_1x1(&[
            ("base", Rgba([100, 100, 100, 255]), 1.0, BlendMode::Normal),
            ("sub", Rgba([200, 200, 200, 255]), 1.0, BlendMode::Subtract),
        ]);
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), BLACK);
    }

    #[test]
    fn test_overlay_branches() {
        // Dark destination doubles the product
        let out = blend_pixel(
            Rgba([255, 255, 255, 255]),
            Rgba([64, 64, 64, 255]),
            BlendMode::Overlay,
            1.0,
        );
        // 2 * 1.0 * 0.251 = 0.502
        assert_eq!(out[0], 128);

        // Light destination uses the screen-like branch
        let out = blend_pixel(
            Rgba([0, 0, 0, 255]),
            Rgba([192, 192, 192, 255]),
            BlendMode::Overlay,
            1.0,
        );
        // 1 - 2 * (1-0) * (1-0.753) = 0.506
        assert_eq!(out[0], 129);
    }

    #[test]
    fn test_zero_opacity_layer_contributes_nothing() {
        let base = stack_1x1(&[("bg", RED, 1.0, BlendMode::Normal)]);
        let with_ghost = stack_1x1(&[
            ("bg", RED, 1.0, BlendMode::Normal),
            ("ghost", WHITE, 0.0, BlendMode::Normal),
        ]);
        assert_eq!(base.flatten(), with_ghost.flatten());
    }

    #[test]
    fn test_hidden_layer_skipped() {
        let mut stack = LayerStack::new(1, 1).unwrap();
        stack.add_layer(Layer::new("bg", solid(1, 1, RED))).unwrap();
        stack.add_layer(Layer::new("fg", solid(1, 1, WHITE)).hidden()).unwrap();
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), RED);

        stack.set_visibility("fg", true).unwrap();
        assert_eq!(stack.flatten().get_pixel(0, 0).unwrap(), WHITE);
    }

    #[test]
    fn test_blend_over_transparent_destination() {
        // NORMAL source over a transparent canvas keeps its own color
        let out = blend_pixel(Rgba([40, 50, 60, 200]), TRANSPARENT, BlendMode::Normal, 1.0);
        assert_eq!(out, Rgba([40, 50, 60, 200]));
    }

    #[test]
    fn test_blend_mode_deserializes_lowercase() {
        let mode: BlendMode = serde_yaml::from_str("multiply").unwrap();
        assert_eq!(mode, BlendMode::Multiply);
        assert!(serde_yaml::from_str::<BlendMode>("burn").is_err());
    }
}
