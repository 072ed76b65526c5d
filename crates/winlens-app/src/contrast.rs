// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::TextColor;

const DARK_TEXT_THRESHOLD: f64 = 150.0;

/// Picks a legible text colour for the given `#rrggbb` background.
///
/// Anything that is not a seven-character hex colour falls back to dark text.
pub fn resolve_text_color(background: &str) -> TextColor {
    match parse_hex_rgb(background) {
        Some((red, green, blue)) if luminance(red, green, blue) > DARK_TEXT_THRESHOLD => {
            TextColor::Dark
        }
        Some(_) => TextColor::Light,
        None => TextColor::Dark,
    }
}

pub fn luminance(red: u8, green: u8, blue: u8) -> f64 {
    0.299 * f64::from(red) + 0.587 * f64::from(green) + 0.114 * f64::from(blue)
}

pub fn parse_hex_rgb(value: &str) -> Option<(u8, u8, u8)> {
    let digits = value.strip_prefix('#')?;
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |start: usize| u8::from_str_radix(digits.get(start..start + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::{luminance, parse_hex_rgb, resolve_text_color};
    use crate::TextColor;

    #[test]
    fn bright_backgrounds_get_dark_text() {
        assert_eq!(resolve_text_color("#ffffff"), TextColor::Dark);
        assert_eq!(resolve_text_color("#FFFF00"), TextColor::Dark);
        assert_eq!(resolve_text_color("#9ca3af"), TextColor::Dark);
    }

    #[test]
    fn dark_backgrounds_get_light_text() {
        assert_eq!(resolve_text_color("#000000"), TextColor::Light);
        assert_eq!(resolve_text_color("#1f77b4"), TextColor::Light);
        assert_eq!(resolve_text_color("#ff0000"), TextColor::Light);
    }

    #[test]
    fn threshold_sits_at_mid_grey() {
        assert!((luminance(150, 150, 150) - 150.0).abs() < 1e-9);
        assert_eq!(resolve_text_color("#959595"), TextColor::Light);
        assert_eq!(resolve_text_color("#979797"), TextColor::Dark);
    }

    #[test]
    fn malformed_input_defaults_to_dark() {
        for input in [
            "",
            "#",
            "#fff",
            "ffffff",
            "#fffffff",
            "#gggggg",
            "#+f+f+f",
            "rgb(0,0,0)",
            "#00000é",
        ] {
            assert_eq!(resolve_text_color(input), TextColor::Dark, "input {input:?}");
        }
    }

    #[test]
    fn parse_hex_rgb_reads_each_channel() {
        assert_eq!(parse_hex_rgb("#1f77b4"), Some((0x1f, 0x77, 0xb4)));
        assert_eq!(parse_hex_rgb("#1F77B4"), Some((0x1f, 0x77, 0xb4)));
        assert_eq!(parse_hex_rgb("1f77b4"), None);
    }
}
