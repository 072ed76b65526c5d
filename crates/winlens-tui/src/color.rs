// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ratatui::style::Color;
use winlens_app::{FALLBACK_BACKGROUND, TextColor};

/// Parses the two colour forms the backend emits: `#rrggbb` (plus the
/// `#rgb` shorthand) and `rgb(r,g,b)`.
pub fn parse_css_color(value: &str) -> Option<(u8, u8, u8)> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    let inner = value
        .strip_prefix("rgb(")
        .or_else(|| value.strip_prefix("RGB("))?
        .strip_suffix(')')?;
    let mut channels = inner.split(',').map(|channel| channel.trim().parse::<u8>());
    let (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) = (
        channels.next(),
        channels.next(),
        channels.next(),
        channels.next(),
    ) else {
        return None;
    };
    Some((r, g, b))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let channel = |start: usize| {
                hex.get(start..start + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            };
            Some((channel(0)?, channel(2)?, channel(4)?))
        }
        3 => {
            let channel = |index: usize| {
                hex.get(index..=index)
                    .and_then(|digit| u8::from_str_radix(digit, 16).ok())
                    .map(|nibble| nibble * 17)
            };
            Some((channel(0)?, channel(1)?, channel(2)?))
        }
        _ => None,
    }
}

/// Terminal colour for a block background; unparseable values get the
/// neutral fallback grey.
pub fn css_color(value: &str) -> Color {
    parse_css_color(value)
        .or_else(|| parse_css_color(FALLBACK_BACKGROUND))
        .map_or(Color::Gray, |(r, g, b)| Color::Rgb(r, g, b))
}

pub(crate) fn text_color(text: TextColor) -> Color {
    css_color(text.as_hex())
}
