use eframe::egui::Color32;
use palette::Srgb;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("unknown colour '{0}' (expected a CSS colour name or #rrggbb)")]
pub struct ColorError(pub String);

// ---------------------------------------------------------------------------
// Colour parsing: CSS name / hex → sRGB
// ---------------------------------------------------------------------------

/// Parse a stroke colour the way the SVG output will interpret it:
/// a CSS colour keyword (`green`, `steelblue`) or a hex triplet.
pub fn parse_color(spec: &str) -> Result<Srgb<u8>, ColorError> {
    let trimmed = spec.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(named) = palette::named::from_str(&lower) {
        return Ok(named);
    }
    if trimmed.starts_with('#') {
        if let Ok(rgb) = trimmed.parse::<Srgb<u8>>() {
            return Ok(rgb);
        }
    }
    Err(ColorError(spec.to_string()))
}

pub fn to_color32(rgb: Srgb<u8>) -> Color32 {
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// `#rrggbb` form of a colour.
pub fn to_hex(rgb: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// Parse for on-screen use; unknown colours fall back to grey.
pub fn color32_or_gray(spec: &str) -> Color32 {
    parse_color(spec)
        .map(to_color32)
        .unwrap_or(Color32::GRAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_names_follow_svg_keywords() {
        // SVG `green` is #008000, not pure green.
        assert_eq!(to_hex(parse_color("green").unwrap()), "#008000");
        assert_eq!(to_hex(parse_color("Red").unwrap()), "#ff0000");
    }

    #[test]
    fn hex_colours_parse() {
        assert_eq!(parse_color("#4682b4").unwrap(), Srgb::new(70u8, 130, 180));
        assert_eq!(to_color32(parse_color("#4682b4").unwrap()), Color32::from_rgb(70, 130, 180));
    }

    #[test]
    fn unknown_colour_is_rejected() {
        assert_eq!(parse_color("not-a-colour"), Err(ColorError("not-a-colour".into())));
        assert_eq!(color32_or_gray("??"), Color32::GRAY);
    }
}
