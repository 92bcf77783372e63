use egui::Color32;
use log::warn;

/// Used for markers whose color string cannot be read.
pub const DEFAULT_MARKER_COLOR: Color32 = Color32::from_rgb(0x33, 0x66, 0xcc);

/// Drawn for return legs of journeys that do not name their own return color.
pub const RETURN_LEG_FALLBACK: &str = "#FFA500";

/// Reads a CSS-like color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or a common name.
#[must_use]
pub fn parse_color(color: &str) -> Option<Color32> {
  let color = color.trim();

  if let Some(hex) = color.strip_prefix('#') {
    return parse_hex(hex);
  }

  if let Some(inner) = color
    .strip_prefix("rgb(")
    .and_then(|rest| rest.strip_suffix(')'))
  {
    let mut channels = inner.split(',').map(|c| c.trim().parse::<u8>());
    let (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) = (
      channels.next(),
      channels.next(),
      channels.next(),
      channels.next(),
    ) else {
      return None;
    };
    return Some(Color32::from_rgb(r, g, b));
  }

  match color.to_lowercase().as_str() {
    "red" => Some(Color32::RED),
    "green" => Some(Color32::GREEN),
    "blue" => Some(Color32::BLUE),
    "yellow" => Some(Color32::YELLOW),
    "orange" => Some(Color32::ORANGE),
    "gold" => Some(Color32::GOLD),
    "brown" => Some(Color32::BROWN),
    "purple" => Some(Color32::PURPLE),
    "black" => Some(Color32::BLACK),
    "white" => Some(Color32::WHITE),
    "gray" | "grey" => Some(Color32::GRAY),
    _ => None,
  }
}

fn parse_hex(hex: &str) -> Option<Color32> {
  if !hex.is_ascii() {
    return None;
  }
  let byte = |s: &str| u8::from_str_radix(s, 16).ok();
  match hex.len() {
    3 => {
      let nibble = |i: usize| byte(&hex[i..=i].repeat(2));
      Some(Color32::from_rgb(nibble(0)?, nibble(1)?, nibble(2)?))
    }
    6 => Some(Color32::from_rgb(
      byte(&hex[0..2])?,
      byte(&hex[2..4])?,
      byte(&hex[4..6])?,
    )),
    8 => Some(Color32::from_rgba_unmultiplied(
      byte(&hex[0..2])?,
      byte(&hex[2..4])?,
      byte(&hex[4..6])?,
      byte(&hex[6..8])?,
    )),
    _ => None,
  }
}

/// Like [`parse_color`], but never fails.
#[must_use]
pub fn color_or_default(color: &str) -> Color32 {
  parse_color(color).unwrap_or_else(|| {
    warn!("Unreadable color '{color}', using the default marker color.");
    DEFAULT_MARKER_COLOR
  })
}
