use crate::{atlas::LocationRecord, map::coordinates::WGS84Coordinate};

/// Identifies a marker placed since the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub usize);

/// Identifies a path drawn since the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathHandle(pub usize);

/// Which part of a journey a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
  /// Drawn solid.
  Outbound,
  /// Drawn dashed.
  Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
  pub leg: Leg,
  pub color: String,
}

impl PathStyle {
  #[must_use]
  pub fn outbound(color: &str) -> Self {
    Self {
      leg: Leg::Outbound,
      color: color.to_string(),
    }
  }

  #[must_use]
  pub fn return_leg(color: &str) -> Self {
    Self {
      leg: Leg::Return,
      color: color.to_string(),
    }
  }
}

/// Everything the selection pipeline needs from a map.
pub trait MapSurface {
  /// Places a marker with emoji, optional order badge and name label. Clicking it shows the
  /// record's popup.
  fn place_marker(&mut self, record: &LocationRecord, color: &str) -> MarkerHandle;

  /// Draws a polyline. Fewer than two coordinates draw nothing.
  fn draw_path(&mut self, coordinates: &[WGS84Coordinate], style: PathStyle)
  -> Option<PathHandle>;

  /// Removes all markers and paths and closes open popups. Calling it twice is harmless.
  fn clear_all(&mut self);

  /// Moves the viewport so that all coordinates are visible. Empty input is ignored.
  fn fit_to(&mut self, coordinates: &[WGS84Coordinate]);
}
