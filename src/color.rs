use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Hex colours from configuration
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` / `#rgb` (leading `#` optional) into a plotters colour.
pub fn parse_hex(hex: &str) -> Option<RGBColor> {
    let rgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
    Some(RGBColor(rgb.red, rgb.green, rgb.blue))
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Resolve one colour per slot: the configured hex value where present and
/// valid, otherwise the matching entry of a generated palette.
pub fn resolve_colors(configured: &[Option<&str>]) -> Vec<RGBColor> {
    let fallback = generate_palette(configured.len());
    configured
        .iter()
        .zip(fallback)
        .map(|(hex, generated)| hex.and_then(parse_hex).unwrap_or(generated))
        .collect()
}
