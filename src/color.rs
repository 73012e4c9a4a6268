//! Color parsing, formatting, and manipulation utilities
//!
//! Parsing supports:
//! - Hex: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - Functional: `rgb()`, `rgba()`, `hsl()`, `hsla()`, etc.
//! - Named: `red`, `blue`, `transparent`, etc.
//!
//! Manipulation works in HSL space: [`lighten`], [`darken`], [`saturate`],
//! [`desaturate`], plus linear ramps and shade generation for building
//! palettes programmatically.

use image::Rgba;
use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use thiserror::Error;

/// Fully transparent black, the canvas default.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Opaque white.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// CSS parsing error from lightningcss
    #[error("CSS parse error: {0}")]
    CssParse(String),
}

/// Parse a color string into an RGBA color.
///
/// Hex colors (`#F00`, `#FF0000`, `#FF000080`, ...) take a fast path;
/// everything else (named colors, `rgb()`, `hsl()`, ...) is parsed as a
/// CSS color.
///
/// # Examples
///
/// ```
/// use pixelgrid::color::parse_color;
///
/// let red = parse_color("#F00").unwrap();
/// assert_eq!(red, image::Rgba([255, 0, 0, 255]));
///
/// let clear = parse_color("transparent").unwrap();
/// assert_eq!(clear[3], 0);
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the input is invalid or unparseable.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    parse_css_color(s)
}

/// Format an RGBA color as an uppercase hex string.
///
/// Opaque colors render as `#RRGGBB`; anything with alpha below 255
/// renders as `#RRGGBBAA`.
pub fn color_to_hex(color: Rgba<u8>) -> String {
    let Rgba([r, g, b, a]) = color;
    if a == 255 {
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    } else {
        format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
    }
}

/// Parse the hex digits after '#' (#RGB, #RGBA, #RRGGBB, #RRGGBBAA)
fn parse_hex(hex: &str) -> Result<Rgba<u8>, ColorError> {
    for c in hex.chars() {
        if !c.is_ascii_hexdigit() {
            return Err(ColorError::InvalidHex(c));
        }
    }

    match hex.len() {
        3 => {
            // #RGB -> #RRGGBB (doubled digits), alpha = 255
            let mut chars = hex.chars();
            let r = hex_digit(chars.next().unwrap())? * 17;
            let g = hex_digit(chars.next().unwrap())? * 17;
            let b = hex_digit(chars.next().unwrap())? * 17;
            Ok(Rgba([r, g, b, 255]))
        }
        4 => {
            // #RGBA -> #RRGGBBAA (doubled digits)
            let mut chars = hex.chars();
            let r = hex_digit(chars.next().unwrap())? * 17;
            let g = hex_digit(chars.next().unwrap())? * 17;
            let b = hex_digit(chars.next().unwrap())? * 17;
            let a = hex_digit(chars.next().unwrap())? * 17;
            Ok(Rgba([r, g, b, a]))
        }
        6 => {
            let r = hex_pair(&hex[0..2])?;
            let g = hex_pair(&hex[2..4])?;
            let b = hex_pair(&hex[4..6])?;
            Ok(Rgba([r, g, b, 255]))
        }
        8 => {
            let r = hex_pair(&hex[0..2])?;
            let g = hex_pair(&hex[2..4])?;
            let b = hex_pair(&hex[4..6])?;
            let a = hex_pair(&hex[6..8])?;
            Ok(Rgba([r, g, b, a]))
        }
        len => Err(ColorError::InvalidLength(len)),
    }
}

/// Parse a CSS color using lightningcss (rgb, hsl, named colors, ...)
fn parse_css_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    use lightningcss::values::color::FloatColor;

    let css_color =
        CssColor::parse_string(s).map_err(|e| ColorError::CssParse(e.to_string()))?;

    let rgb_color = css_color
        .to_rgb()
        .map_err(|_| ColorError::CssParse("cannot convert color to RGB".to_string()))?;

    match rgb_color {
        CssColor::RGBA(rgba) => Ok(Rgba([rgba.red, rgba.green, rgba.blue, rgba.alpha])),
        CssColor::Float(float_color) => match float_color.as_ref() {
            FloatColor::RGB(rgb) => {
                let r = (rgb.r * 255.0).round() as u8;
                let g = (rgb.g * 255.0).round() as u8;
                let b = (rgb.b * 255.0).round() as u8;
                let a = (rgb.alpha * 255.0).round() as u8;
                Ok(Rgba([r, g, b, a]))
            }
            _ => Err(ColorError::CssParse("unexpected float color format".to_string())),
        },
        _ => Err(ColorError::CssParse("color conversion did not produce RGB".to_string())),
    }
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn hex_pair(s: &str) -> Result<u8, ColorError> {
    let mut chars = s.chars();
    let high = hex_digit(chars.next().unwrap())?;
    let low = hex_digit(chars.next().unwrap())?;
    Ok(high * 16 + low)
}

/// Convert an RGBA color to HSL. Returns (h, s, l) with h in [0, 360),
/// s and l in [0, 1]. Alpha is ignored.
pub fn rgb_to_hsl(color: Rgba<u8>) -> (f32, f32, f32) {
    let rf = color[0] as f32 / 255.0;
    let gf = color[1] as f32 / 255.0;
    let bf = color[2] as f32 / 255.0;

    let cmax = rf.max(gf).max(bf);
    let cmin = rf.min(gf).min(bf);
    let delta = cmax - cmin;

    let l = (cmax + cmin) / 2.0;

    if delta == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = delta / (1.0 - (2.0 * l - 1.0).abs());

    let h = if cmax == rf {
        60.0 * ((gf - bf) / delta).rem_euclid(6.0)
    } else if cmax == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };

    (h.rem_euclid(360.0), s.min(1.0), l)
}

/// Convert HSL back to an RGBA color. h in degrees, s and l in [0, 1],
/// alpha passed through unchanged.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32, a: u8) -> Rgba<u8> {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (rf, gf, bf) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgba([channel(rf + m), channel(gf + m), channel(bf + m), a])
}

/// Increase lightness by `amount` (0-1). Preserves alpha.
pub fn lighten(color: Rgba<u8>, amount: f32) -> Rgba<u8> {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, s, (l + amount).min(1.0), color[3])
}

/// Decrease lightness by `amount` (0-1). Preserves alpha.
pub fn darken(color: Rgba<u8>, amount: f32) -> Rgba<u8> {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, s, (l - amount).max(0.0), color[3])
}

/// Increase saturation by `amount` (0-1). Preserves alpha.
pub fn saturate(color: Rgba<u8>, amount: f32) -> Rgba<u8> {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, (s + amount).min(1.0), l, color[3])
}

/// Decrease saturation by `amount` (0-1). Preserves alpha.
pub fn desaturate(color: Rgba<u8>, amount: f32) -> Rgba<u8> {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, (s - amount).max(0.0), l, color[3])
}

/// Linear interpolation between two colors across all four channels.
/// t=0 returns `c1`, t=1 returns `c2`; t is clamped to [0, 1].
pub fn color_lerp(c1: Rgba<u8>, c2: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| channel_f(a as f32 + (b as f32 - a as f32) * t);
    Rgba([
        lerp(c1[0], c2[0]),
        lerp(c1[1], c2[1]),
        lerp(c1[2], c2[2]),
        lerp(c1[3], c2[3]),
    ])
}

/// Generate a gradient of colors from `start` to `end`, inclusive.
/// `steps` must be at least 2.
pub fn color_ramp(start: Rgba<u8>, end: Rgba<u8>, steps: usize) -> Vec<Rgba<u8>> {
    assert!(steps >= 2, "color_ramp requires at least 2 steps");
    (0..steps)
        .map(|i| color_lerp(start, end, i as f32 / (steps - 1) as f32))
        .collect()
}

/// Generate highlight-to-shadow shades from a base color.
///
/// The first shade is the lightest, the last the darkest; the base hue
/// and saturation are preserved. `count` must be at least 2.
pub fn auto_shades(base: Rgba<u8>, count: usize) -> Vec<Rgba<u8>> {
    assert!(count >= 2, "auto_shades requires at least 2 colors");
    let (h, s, l) = rgb_to_hsl(base);
    let l_high = (l + 0.3).min(1.0);
    let l_low = (l - 0.3).max(0.0);
    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            hsl_to_rgb(h, s, l_high + (l_low - l_high) * t, base[3])
        })
        .collect()
}

/// Euclidean distance between two colors in RGBA space.
pub fn color_distance(c1: Rgba<u8>, c2: Rgba<u8>) -> f32 {
    let d = |a: u8, b: u8| {
        let diff = a as f32 - b as f32;
        diff * diff
    };
    (d(c1[0], c2[0]) + d(c1[1], c2[1]) + d(c1[2], c2[2]) + d(c1[3], c2[3])).sqrt()
}

/// A 2x2 boolean dithering pattern: `true` cells take the first color.
///
/// Supported patterns: `checker`, `horizontal`, `vertical`.
pub fn dither_pattern(pattern: &str) -> Option<[[bool; 2]; 2]> {
    match pattern {
        "checker" => Some([[true, false], [false, true]]),
        "horizontal" => Some([[true, true], [false, false]]),
        "vertical" => Some([[true, false], [true, false]]),
        _ => None,
    }
}

fn channel(v: f32) -> u8 {
    channel_f(v * 255.0)
}

fn channel_f(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_short() {
        assert_eq!(parse_color("#F00").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#F00F").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#0000").unwrap(), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_parse_hex_long() {
        assert_eq!(parse_color("#FF8800").unwrap(), Rgba([255, 136, 0, 255]));
        assert_eq!(parse_color("#FF880080").unwrap(), Rgba([255, 136, 0, 128]));
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(parse_color("black").unwrap(), BLACK);
        assert_eq!(parse_color("white").unwrap(), WHITE);
        assert_eq!(parse_color("transparent").unwrap()[3], 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_color(""), Err(ColorError::Empty));
        assert_eq!(parse_color("#F0"), Err(ColorError::InvalidLength(2)));
        assert_eq!(parse_color("#GGG"), Err(ColorError::InvalidHex('G')));
        assert!(matches!(parse_color("not-a-color"), Err(ColorError::CssParse(_))));
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(color_to_hex(Rgba([255, 136, 0, 255])), "#FF8800");
        assert_eq!(color_to_hex(Rgba([255, 136, 0, 128])), "#FF880080");
        assert_eq!(color_to_hex(TRANSPARENT), "#00000000");
    }

    #[test]
    fn test_hex_roundtrip() {
        for hex in ["#123456", "#ABCDEF12", "#00FF00"] {
            let color = parse_color(hex).unwrap();
            assert_eq!(color_to_hex(color), hex.to_string());
        }
    }

    #[test]
    fn test_hsl_roundtrip_primaries() {
        for color in [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
            Rgba([128, 128, 128, 255]),
        ] {
            let (h, s, l) = rgb_to_hsl(color);
            let back = hsl_to_rgb(h, s, l, color[3]);
            for i in 0..4 {
                assert!(
                    (back[i] as i16 - color[i] as i16).abs() <= 1,
                    "channel {} drifted: {:?} vs {:?}",
                    i,
                    back,
                    color
                );
            }
        }
    }

    #[test]
    fn test_lighten_darken() {
        let gray = Rgba([100, 100, 100, 255]);
        let lighter = lighten(gray, 0.2);
        let darker = darken(gray, 0.2);
        assert!(lighter[0] > gray[0]);
        assert!(darker[0] < gray[0]);
        assert_eq!(lighter[3], 255);
        assert_eq!(darker[3], 255);
    }

    #[test]
    fn test_color_lerp_endpoints() {
        let a = Rgba([0, 0, 0, 255]);
        let b = Rgba([255, 255, 255, 255]);
        assert_eq!(color_lerp(a, b, 0.0), a);
        assert_eq!(color_lerp(a, b, 1.0), b);
        assert_eq!(color_lerp(a, b, 0.5), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_color_ramp() {
        let ramp = color_ramp(BLACK, WHITE, 3);
        assert_eq!(ramp.len(), 3);
        assert_eq!(ramp[0], BLACK);
        assert_eq!(ramp[1], Rgba([128, 128, 128, 255]));
        assert_eq!(ramp[2], WHITE);
    }

    #[test]
    fn test_auto_shades_ordering() {
        let shades = auto_shades(Rgba([200, 60, 60, 255]), 5);
        assert_eq!(shades.len(), 5);
        let (_, _, l_first) = rgb_to_hsl(shades[0]);
        let (_, _, l_last) = rgb_to_hsl(shades[4]);
        assert!(l_first > l_last);
    }

    #[test]
    fn test_color_distance() {
        assert_eq!(color_distance(BLACK, BLACK), 0.0);
        let d = color_distance(Rgba([0, 0, 0, 0]), Rgba([3, 4, 0, 0]));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_dither_patterns() {
        assert!(dither_pattern("checker").is_some());
        assert!(dither_pattern("horizontal").is_some());
        assert!(dither_pattern("vertical").is_some());
        assert!(dither_pattern("diagonal").is_none());
    }
}
