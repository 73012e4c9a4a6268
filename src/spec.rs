//! Batch spec system: render many named sprites from one YAML file.
//!
//! A spec names a palette (inline or preset) and a mapping of sprite
//! definitions. Definitions reference each other by name (strip frames,
//! grid cells, tile sets, layer stacks), forming a dependency DAG that
//! the evaluator resolves depth-first with memoization: each name is
//! computed at most once, and memoized results persist across
//! [`Spec::render`] calls. Circular references fail with an error
//! instead of recursing.
//!
//! ```yaml
//! palette:
//!   ".": transparent
//!   K: "#000000"
//!   r: "#FF0000"
//! sprites:
//!   gem:
//!     block: |
//!       .K.
//!       KrK
//!       .K.
//!     save: gem.png
//!     preview: gem_10x.png
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::canvas::{CanvasError, StringCanvas};
use crate::color::{parse_color, ColorError, BLACK};
use crate::layers::{BlendMode, Layer, LayerError, LayerStack};
use crate::output::{save_png, save_preview, OutputError, DEFAULT_PREVIEW_SCALE};
use crate::palette::Palette;
use crate::palettes::{get_preset, PresetError};
use crate::sheet::{GridSheet, SheetError, StripSheet};
use crate::sprite::Sprite;
use crate::style::{apply_outline, apply_shadow, OutlineStyle};
use crate::tiles::{TileError, TileMap, TileSet};

/// Error type for spec parsing and rendering.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Spec file could not be read
    #[error("cannot read spec file: {0}")]
    Io(#[from] std::io::Error),
    /// Spec file is not valid YAML
    #[error("invalid spec file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Neither a palette nor a preset section was present
    #[error("spec must have a 'palette' or 'preset' section")]
    MissingPalette,
    /// The sprites section was missing or empty
    #[error("spec must have a non-empty 'sprites' section")]
    MissingSprites,
    /// Palette keys map one character to one pixel
    #[error("palette key '{0}' must be exactly 1 character")]
    PaletteKeyLength(String),
    /// Tile set keys map one character to one tile
    #[error("tile key '{key}' in '{name}' must be exactly 1 character")]
    TileKeyLength { name: String, key: String },
    /// A mapping key or reference was not a string
    #[error("'{name}' has a non-string sprite reference")]
    InvalidReference { name: String },
    /// A color value could not be parsed
    #[error("invalid color '{value}': {source}")]
    BadColor {
        value: String,
        #[source]
        source: ColorError,
    },
    /// A palette color value was not a string
    #[error("color value for '{key}' must be a string")]
    NonStringColor { key: String },
    /// A sprite definition failed to deserialize
    #[error("invalid definition for sprite '{name}': {message}")]
    BadDefinition { name: String, message: String },
    /// A required field was absent for the definition's type
    #[error("sprite '{name}' missing '{field}' field")]
    MissingField { name: String, field: &'static str },
    /// A referenced name has no definition
    #[error("sprite '{0}' not defined in spec")]
    UndefinedSprite(String),
    /// The dependency graph contains a cycle
    #[error("circular reference while rendering sprite '{0}'")]
    CircularReference(String),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Tile(#[from] TileError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// The kind of a sprite definition; `block` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SpriteKind {
    #[default]
    Block,
    Strip,
    Grid,
    Tilemap,
    Layers,
}

/// A tile map grid: either one block string or explicit rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GridInput {
    Block(String),
    Rows(Vec<String>),
}

/// One entry of a `layers` list: a bare sprite name, or a configured
/// layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LayerDef {
    Name(String),
    Config(LayerConfig),
}

#[derive(Debug, Clone, Deserialize)]
struct LayerConfig {
    sprite: String,
    name: Option<String>,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    blend_mode: BlendMode,
}

fn default_opacity() -> f32 {
    1.0
}

/// A post-effect switch: `true`/`false`, or a configuration mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Toggle<T> {
    Flag(bool),
    Config(T),
}

#[derive(Debug, Clone, Deserialize)]
struct OutlineConfig {
    color: Option<String>,
    #[serde(default)]
    style: OutlineStyle,
}

#[derive(Debug, Clone, Deserialize)]
struct ShadowConfig {
    offset: Option<[i32; 2]>,
    opacity: Option<f32>,
    color: Option<String>,
}

/// One named sprite definition from the `sprites` section.
#[derive(Debug, Clone, Deserialize)]
struct SpriteDef {
    #[serde(rename = "type", default)]
    kind: SpriteKind,
    block: Option<String>,
    frames: Option<Vec<String>>,
    sprites: Option<serde_yaml::Mapping>,
    columns: Option<u32>,
    padding: Option<u32>,
    tileset: Option<serde_yaml::Mapping>,
    grid: Option<GridInput>,
    layers: Option<Vec<LayerDef>>,
    width: Option<u32>,
    height: Option<u32>,
    outline: Option<Toggle<OutlineConfig>>,
    shadow: Option<Toggle<ShadowConfig>>,
    save: Option<PathBuf>,
    preview: Option<PathBuf>,
}

/// Top-level spec document.
#[derive(Debug, Deserialize)]
struct SpecDoc {
    palette: Option<serde_yaml::Mapping>,
    preset: Option<String>,
    sprites: Option<serde_yaml::Mapping>,
}

/// A parsed batch spec. Call [`render`](Self::render) to produce
/// sprites and [`save_all`](Self::save_all) to write files.
#[derive(Debug)]
pub struct Spec {
    palette: Palette,
    defs: Vec<(String, SpriteDef)>,
    base_dir: PathBuf,
    rendered: HashMap<String, Sprite>,
}

impl Spec {
    /// Load and parse a YAML spec file. Output paths resolve relative
    /// to the file's directory.
    ///
    /// # Errors
    ///
    /// `Io` for unreadable files, `Yaml` for malformed documents, plus
    /// the section validation errors of [`parse_str`](Self::parse_str).
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let contents = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse_str(&contents, base_dir)
    }

    /// Parse a YAML spec document from a string.
    ///
    /// # Errors
    ///
    /// `Yaml` for malformed documents, `MissingPalette` /
    /// `MissingSprites` for absent sections, `PaletteKeyLength` and
    /// `BadColor` for bad palette entries, `BadDefinition` for sprite
    /// definitions that fail to deserialize.
    pub fn parse_str(contents: &str, base_dir: PathBuf) -> Result<Self, SpecError> {
        let doc: SpecDoc = serde_yaml::from_str(contents)?;

        let palette = match (doc.palette, doc.preset) {
            (Some(mapping), _) => build_palette(&mapping)?,
            (None, Some(preset)) => get_preset(&preset)?,
            (None, None) => return Err(SpecError::MissingPalette),
        };

        let sprites = doc.sprites.unwrap_or_default();
        if sprites.is_empty() {
            return Err(SpecError::MissingSprites);
        }

        let mut defs = Vec::with_capacity(sprites.len());
        for (key, value) in sprites {
            let name = key
                .as_str()
                .ok_or_else(|| SpecError::BadDefinition {
                    name: format!("{key:?}"),
                    message: "sprite name must be a string".to_string(),
                })?
                .to_string();
            let def: SpriteDef =
                serde_yaml::from_value(value).map_err(|e| SpecError::BadDefinition {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            defs.push((name, def));
        }

        Ok(Self { palette, defs, base_dir, rendered: HashMap::new() })
    }

    /// The spec's palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Defined sprite names, in document order.
    pub fn sprite_names(&self) -> Vec<&str> {
        self.defs.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Render all (or selected) sprites. The returned map holds every
    /// name resolved by this call, dependencies included.
    ///
    /// A failure aborts the whole call with no partial result, but
    /// names memoized by earlier successful calls stay valid for
    /// retries.
    pub fn render(
        &mut self,
        only: Option<&HashSet<String>>,
    ) -> Result<HashMap<String, Sprite>, SpecError> {
        let names: Vec<String> = self
            .defs
            .iter()
            .map(|(n, _)| n.clone())
            .filter(|n| only.map_or(true, |o| o.contains(n)))
            .collect();

        let mut touched = HashSet::new();
        let mut in_progress = HashSet::new();
        for name in names {
            self.ensure_rendered(&name, &mut in_progress, &mut touched)?;
        }

        Ok(touched
            .into_iter()
            .map(|name| {
                let sprite = self.rendered[&name].clone();
                (name, sprite)
            })
            .collect())
    }

    /// Render a sprite if not already memoized, resolving dependencies
    /// depth-first. `in_progress` guards against cycles.
    fn ensure_rendered(
        &mut self,
        name: &str,
        in_progress: &mut HashSet<String>,
        touched: &mut HashSet<String>,
    ) -> Result<Sprite, SpecError> {
        if let Some(sprite) = self.rendered.get(name) {
            touched.insert(name.to_string());
            return Ok(sprite.clone());
        }
        if in_progress.contains(name) {
            return Err(SpecError::CircularReference(name.to_string()));
        }

        let def = self
            .defs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.clone())
            .ok_or_else(|| SpecError::UndefinedSprite(name.to_string()))?;

        in_progress.insert(name.to_string());
        let sprite = match def.kind {
            SpriteKind::Block => self.render_block(name, &def)?,
            SpriteKind::Strip => self.render_strip(name, &def, in_progress, touched)?,
            SpriteKind::Grid => self.render_grid(name, &def, in_progress, touched)?,
            SpriteKind::Tilemap => self.render_tilemap(name, &def, in_progress, touched)?,
            SpriteKind::Layers => self.render_layers(name, &def, in_progress, touched)?,
        };
        in_progress.remove(name);

        let sprite = apply_effects(sprite, &def)?;
        self.rendered.insert(name.to_string(), sprite.clone());
        touched.insert(name.to_string());
        Ok(sprite)
    }

    fn render_block(&self, name: &str, def: &SpriteDef) -> Result<Sprite, SpecError> {
        let block = def
            .block
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "block" })?;
        Ok(StringCanvas::new(self.palette.clone()).render_block(block)?)
    }

    fn render_strip(
        &mut self,
        name: &str,
        def: &SpriteDef,
        in_progress: &mut HashSet<String>,
        touched: &mut HashSet<String>,
    ) -> Result<Sprite, SpecError> {
        let frame_names = def
            .frames
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "frames" })?;
        let mut frames = Vec::with_capacity(frame_names.len());
        for frame_name in frame_names {
            frames.push(self.ensure_rendered(frame_name, in_progress, touched)?);
        }
        Ok(StripSheet::new(frames)?.to_sprite())
    }

    fn render_grid(
        &mut self,
        name: &str,
        def: &SpriteDef,
        in_progress: &mut HashSet<String>,
        touched: &mut HashSet<String>,
    ) -> Result<Sprite, SpecError> {
        let refs = def
            .sprites
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "sprites" })?;
        let columns = def.columns.unwrap_or(4);
        let padding = def.padding.unwrap_or(0);

        let mut entries = Vec::with_capacity(refs.len());
        for (label, reference) in refs {
            let (Some(label), Some(reference)) = (label.as_str(), reference.as_str()) else {
                return Err(SpecError::InvalidReference { name: name.to_string() });
            };
            let sprite = self.ensure_rendered(reference, in_progress, touched)?;
            entries.push((label.to_string(), sprite));
        }
        Ok(GridSheet::new(entries, columns)?.with_padding(padding).to_sprite())
    }

    fn render_tilemap(
        &mut self,
        name: &str,
        def: &SpriteDef,
        in_progress: &mut HashSet<String>,
        touched: &mut HashSet<String>,
    ) -> Result<Sprite, SpecError> {
        let tile_refs = def
            .tileset
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "tileset" })?;
        let grid = def
            .grid
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "grid" })?;

        let mut tiles = Vec::with_capacity(tile_refs.len());
        for (key, reference) in tile_refs {
            let (Some(key), Some(reference)) = (key.as_str(), reference.as_str()) else {
                return Err(SpecError::InvalidReference { name: name.to_string() });
            };
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return Err(SpecError::TileKeyLength {
                    name: name.to_string(),
                    key: key.to_string(),
                });
            };
            let sprite = self.ensure_rendered(reference, in_progress, touched)?;
            tiles.push((ch, sprite));
        }

        let tileset = TileSet::new(tiles)?;
        let map = match grid {
            GridInput::Block(block) => TileMap::from_block(tileset, block)?,
            GridInput::Rows(rows) => TileMap::new(tileset, rows)?,
        };
        Ok(map.to_sprite())
    }

    fn render_layers(
        &mut self,
        name: &str,
        def: &SpriteDef,
        in_progress: &mut HashSet<String>,
        touched: &mut HashSet<String>,
    ) -> Result<Sprite, SpecError> {
        let layer_defs = def
            .layers
            .as_ref()
            .ok_or(SpecError::MissingField { name: name.to_string(), field: "layers" })?;
        if layer_defs.is_empty() {
            return Err(SpecError::MissingField { name: name.to_string(), field: "layers" });
        }

        // The first layer fixes the stack size unless given explicitly
        let first_ref = match &layer_defs[0] {
            LayerDef::Name(n) => n.clone(),
            LayerDef::Config(c) => c.sprite.clone(),
        };
        let first_sprite = self.ensure_rendered(&first_ref, in_progress, touched)?;
        let width = def.width.unwrap_or(first_sprite.width());
        let height = def.height.unwrap_or(first_sprite.height());

        let mut stack = LayerStack::new(width, height)?;
        for layer_def in layer_defs {
            match layer_def {
                LayerDef::Name(sprite_name) => {
                    let sprite = self.ensure_rendered(sprite_name, in_progress, touched)?;
                    stack.add_layer(Layer::new(sprite_name.clone(), sprite))?;
                }
                LayerDef::Config(config) => {
                    let sprite = self.ensure_rendered(&config.sprite, in_progress, touched)?;
                    let layer_name = config.name.clone().unwrap_or_else(|| config.sprite.clone());
                    stack.add_layer(
                        Layer::new(layer_name, sprite)
                            .with_opacity(config.opacity)
                            .with_blend_mode(config.blend_mode),
                    )?;
                }
            }
        }
        Ok(stack.flatten())
    }

    /// Save every rendered sprite that declares a `save` or `preview`
    /// path. Returns the written paths, in document order.
    ///
    /// # Errors
    ///
    /// Propagates the first write failure.
    pub fn save_all(
        &self,
        results: &HashMap<String, Sprite>,
    ) -> Result<Vec<PathBuf>, SpecError> {
        let mut saved = Vec::new();
        for (name, def) in &self.defs {
            let Some(sprite) = results.get(name) else {
                continue;
            };
            if let Some(save) = &def.save {
                let path = self.base_dir.join(save);
                save_png(sprite, &path)?;
                saved.push(path);
            }
            if let Some(preview) = &def.preview {
                let path = self.base_dir.join(preview);
                save_preview(sprite, &path, DEFAULT_PREVIEW_SCALE)?;
                saved.push(path);
            }
        }
        Ok(saved)
    }
}

/// Load, render, and (unless `dry_run`) save all sprites from a YAML
/// spec file.
///
/// # Errors
///
/// Any parse, render, or write failure aborts the whole call.
pub fn render_spec(
    path: &Path,
    only: Option<&HashSet<String>>,
    dry_run: bool,
) -> Result<HashMap<String, Sprite>, SpecError> {
    let mut spec = Spec::load(path)?;
    let results = spec.render(only)?;
    if !dry_run {
        spec.save_all(&results)?;
    }
    Ok(results)
}

/// Build a palette from the spec's `palette` section, preserving the
/// document's entry order.
fn build_palette(mapping: &serde_yaml::Mapping) -> Result<Palette, SpecError> {
    let mut palette = Palette::new();
    for (key, value) in mapping {
        let key_str = match key.as_str() {
            Some(s) => s.to_string(),
            None => return Err(SpecError::PaletteKeyLength(format!("{key:?}"))),
        };
        let mut chars = key_str.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return Err(SpecError::PaletteKeyLength(key_str));
        };
        let value_str = value
            .as_str()
            .ok_or_else(|| SpecError::NonStringColor { key: key_str.clone() })?;
        let color = parse_color(value_str).map_err(|source| SpecError::BadColor {
            value: value_str.to_string(),
            source,
        })?;
        palette.insert(ch, color);
    }
    Ok(palette)
}

/// Apply the definition's post effects: outline first, then shadow.
fn apply_effects(sprite: Sprite, def: &SpriteDef) -> Result<Sprite, SpecError> {
    let mut sprite = sprite;

    match &def.outline {
        Some(Toggle::Flag(true)) => {
            sprite = apply_outline(&sprite, BLACK, OutlineStyle::Thin);
        }
        Some(Toggle::Config(config)) => {
            let color = match &config.color {
                Some(value) => parse_color(value).map_err(|source| SpecError::BadColor {
                    value: value.clone(),
                    source,
                })?,
                None => BLACK,
            };
            sprite = apply_outline(&sprite, color, config.style);
        }
        Some(Toggle::Flag(false)) | None => {}
    }

    match &def.shadow {
        Some(Toggle::Flag(true)) => {
            sprite = apply_shadow(&sprite, (1, 1), None, 0.5);
        }
        Some(Toggle::Config(config)) => {
            let offset = config.offset.map_or((1, 1), |[dx, dy]| (dx, dy));
            let opacity = config.opacity.unwrap_or(0.5);
            let color = match &config.color {
                Some(value) => Some(parse_color(value).map_err(|source| SpecError::BadColor {
                    value: value.clone(),
                    source,
                })?),
                None => None,
            };
            sprite = apply_shadow(&sprite, offset, color, opacity);
        }
        Some(Toggle::Flag(false)) | None => {}
    }

    Ok(sprite)
}
