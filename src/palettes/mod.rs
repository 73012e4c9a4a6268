//! Built-in preset palettes.
//!
//! Classic pixel art palettes addressable by name from batch specs
//! (`preset: pico8`). Every preset maps `.` to transparent, then assigns
//! `0-9 a-z A-Z` to its colors in declaration order.

use image::Rgba;
use thiserror::Error;

use crate::color::TRANSPARENT;
use crate::palette::Palette;

/// List of all available preset palette names.
const PRESET_NAMES: &[&str] = &["gameboy", "nes", "pico8", "sweetie16", "endesga32"];

/// Characters assigned to preset colors, in order.
const PRESET_KEYS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Error type for preset lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// Preset name was not found
    #[error("unknown preset palette '{0}'. Available: gameboy, nes, pico8, sweetie16, endesga32")]
    Unknown(String),
}

/// Returns the names of all available preset palettes.
pub fn list_presets() -> Vec<&'static str> {
    PRESET_NAMES.to_vec()
}

/// Look up a preset palette by name (case-insensitive).
///
/// # Errors
///
/// Returns `PresetError::Unknown` listing the available presets.
pub fn get_preset(name: &str) -> Result<Palette, PresetError> {
    match name.to_ascii_lowercase().as_str() {
        "gameboy" => Ok(build(GAMEBOY)),
        "nes" => Ok(build(NES)),
        "pico8" => Ok(build(PICO8)),
        "sweetie16" => Ok(build(SWEETIE16)),
        "endesga32" => Ok(build(ENDESGA32)),
        _ => Err(PresetError::Unknown(name.to_string())),
    }
}

/// Assign keys to a preset's colors: '.' is transparent, then the
/// key alphabet in declaration order.
fn build(colors: &[(u8, u8, u8)]) -> Palette {
    let mut palette = Palette::new();
    palette.insert('.', TRANSPARENT);
    for (key, &(r, g, b)) in PRESET_KEYS.chars().zip(colors.iter()) {
        palette.insert(key, Rgba([r, g, b, 255]));
    }
    palette
}

/// Game Boy 4-shade green palette.
/// Reference: https://lospec.com/palette-list/nintendo-gameboy-bgb
const GAMEBOY: &[(u8, u8, u8)] = &[
    (155, 188, 15), // lightest
    (139, 172, 15), // light
    (48, 98, 48),   // dark
    (15, 56, 15),   // darkest
];

/// NES-inspired palette with key representative colors.
const NES: &[(u8, u8, u8)] = &[
    (0, 0, 0),       // black
    (255, 255, 255), // white
    (188, 0, 0),     // red
    (0, 188, 188),   // cyan
    (136, 0, 160),   // purple
    (0, 168, 0),     // green
    (0, 0, 188),     // blue
    (228, 228, 0),   // yellow
    (188, 108, 0),   // orange
    (100, 68, 0),    // brown
    (228, 92, 92),   // light red
    (80, 80, 80),    // dark grey
    (120, 120, 120), // grey
    (100, 228, 100), // light green
    (100, 100, 228), // light blue
    (168, 168, 168), // light grey
];

/// PICO-8 16-color palette.
/// Reference: https://lospec.com/palette-list/pico-8
const PICO8: &[(u8, u8, u8)] = &[
    (0, 0, 0),       // black
    (29, 43, 83),    // dark blue
    (126, 37, 83),   // dark purple
    (0, 135, 81),    // dark green
    (171, 82, 54),   // brown
    (95, 87, 79),    // dark grey
    (194, 195, 199), // light grey
    (255, 241, 232), // white
    (255, 0, 77),    // red
    (255, 163, 0),   // orange
    (255, 236, 39),  // yellow
    (0, 228, 54),    // green
    (41, 173, 255),  // blue
    (131, 118, 156), // lavender
    (255, 119, 168), // pink
    (255, 204, 170), // peach
];

/// Sweetie 16 palette.
/// Reference: https://lospec.com/palette-list/sweetie-16
const SWEETIE16: &[(u8, u8, u8)] = &[
    (26, 28, 44),    // black
    (93, 39, 93),    // purple
    (177, 62, 83),   // red
    (239, 125, 87),  // orange
    (255, 205, 117), // yellow
    (167, 240, 112), // light green
    (56, 183, 100),  // green
    (37, 113, 121),  // dark green
    (41, 54, 111),   // dark blue
    (59, 93, 201),   // blue
    (65, 166, 246),  // light blue
    (115, 239, 247), // cyan
    (244, 244, 244), // white
    (148, 176, 194), // light grey
    (86, 108, 134),  // grey
    (51, 60, 87),    // dark grey
];

/// Endesga 32 palette.
/// Reference: https://lospec.com/palette-list/endesga-32
const ENDESGA32: &[(u8, u8, u8)] = &[
    (19, 19, 19),    // void
    (43, 43, 43),    // ash
    (81, 81, 81),    // blind
    (139, 139, 139), // iron
    (198, 198, 198), // light
    (255, 255, 255), // white
    (67, 28, 11),    // cocoa
    (107, 46, 12),   // woody
    (168, 89, 26),   // sandy
    (224, 148, 80),  // skin
    (237, 195, 137), // salmon
    (133, 18, 18),   // blood
    (209, 42, 42),   // red
    (233, 114, 36),  // orange
    (239, 183, 51),  // gold
    (245, 232, 97),  // yellow
    (25, 31, 68),    // midnight
    (34, 60, 114),   // dark blue
    (50, 105, 172),  // blue
    (75, 160, 207),  // sea
    (143, 211, 234), // sky
    (18, 56, 18),    // swamp
    (26, 100, 26),   // forest
    (51, 161, 51),   // green
    (124, 209, 72),  // lime
    (183, 232, 123), // moss
    (64, 18, 82),    // grape
    (115, 30, 105),  // plum
    (174, 60, 134),  // mauve
    (232, 106, 164), // pink
    (237, 172, 192), // rose
    (42, 127, 116),  // teal
];
