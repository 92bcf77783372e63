use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// The fixed canvas size for ``PixelCoordinate``s.
pub const CANVAS_SIZE: f32 = 1024. * 2.;
pub const TILE_SIZE: f32 = 512.;

const PI: f32 = std::f32::consts::PI;

pub trait XY:
  Default + Copy + Clone + AddAssign<Self> + Mul<f32, Output = Self> + Add<Self, Output = Self>
{
  fn x(&self) -> f32;
  fn y(&self) -> f32;
  #[must_use]
  fn with_x(self, x: f32) -> Self;
  #[must_use]
  fn with_y(self, y: f32) -> Self;
}

/// The standard WGS84 coordinate system.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WGS84Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f32,
  #[serde(alias = "longitude", alias = "lng")]
  pub lon: f32,
}

impl WGS84Coordinate {
  #[must_use]
  pub fn new(lat: f32, lon: f32) -> Self {
    Self { lat, lon }
  }

  /// Web mercator cuts off at about 85 degrees, everything beyond is clamped.
  #[must_use]
  pub fn clamped(self) -> Self {
    Self {
      lat: self.lat.clamp(-85.05, 85.05),
      lon: self.lon.clamp(-180., 180.),
    }
  }
}

/// A coordinate system used in this application to draw on an imaginary canvas.
/// Is equivalent to Web Mercator projection on a fixed zoom level.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct PixelCoordinate {
  pub x: f32,
  pub y: f32,
}

impl PixelCoordinate {
  #[must_use]
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

/// Meant for actual pixel in the UI. Handled equivalently to a ``egui::Pos2``.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct PixelPosition {
  pub x: f32,
  pub y: f32,
}

/// A helper coordinate format to position tiles.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TileCoordinate {
  pub x: f32,
  pub y: f32,
  pub zoom: u8,
}

impl TileCoordinate {
  #[must_use]
  pub fn from_coordinate(coord: WGS84Coordinate, zoom: u8) -> Self {
    let coord = coord.clamped();
    let lat = coord.lat * PI / 180.;
    let x = (coord.lon + 180.) / 360. * 2f32.powi(zoom.into());
    let y = (1. - (lat.tan() + 1. / lat.cos()).ln() / PI) * 2f32.powi(i32::from(zoom) - 1);
    Self { x, y, zoom }
  }

  #[must_use]
  pub fn from_pixel_position(pixel_pos: PixelCoordinate, zoom: u8) -> Self {
    TileCoordinate {
      x: pixel_pos.x / TILE_SIZE * 2f32.powi(i32::from(zoom) - 2),
      y: pixel_pos.y / TILE_SIZE * 2f32.powi(i32::from(zoom) - 2),
      zoom,
    }
  }
}

impl Coordinate for TileCoordinate {
  fn as_wgs84(&self) -> WGS84Coordinate {
    WGS84Coordinate::from(*self)
  }

  fn as_pixel_coordinate(&self) -> PixelCoordinate {
    PixelCoordinate::from(*self)
  }
}

impl Coordinate for PixelCoordinate {
  fn as_wgs84(&self) -> WGS84Coordinate {
    WGS84Coordinate::from(*self)
  }

  fn as_pixel_coordinate(&self) -> PixelCoordinate {
    *self
  }
}

impl From<TileCoordinate> for PixelCoordinate {
  fn from(tile_coord: TileCoordinate) -> Self {
    let scale = TILE_SIZE / 2f32.powi(i32::from(tile_coord.zoom) - 2);
    PixelCoordinate {
      x: tile_coord.x * scale,
      y: tile_coord.y * scale,
    }
  }
}

impl From<WGS84Coordinate> for PixelCoordinate {
  fn from(coord: WGS84Coordinate) -> Self {
    TileCoordinate::from_coordinate(coord, 2).into()
  }
}

impl From<PixelCoordinate> for WGS84Coordinate {
  fn from(pp: PixelCoordinate) -> Self {
    WGS84Coordinate::from(TileCoordinate::from_pixel_position(pp, 2))
  }
}

impl From<TileCoordinate> for WGS84Coordinate {
  fn from(tile_coord: TileCoordinate) -> Self {
    let n = 2f32.powi(tile_coord.zoom.into());
    WGS84Coordinate {
      lat: f32::atan(f32::sinh(PI - tile_coord.y / n * 2. * PI)) * 180. / PI,
      lon: tile_coord.x / n * 360. - 180.,
    }
  }
}

impl From<egui::Pos2> for PixelPosition {
  fn from(pos: egui::Pos2) -> Self {
    PixelPosition { x: pos.x, y: pos.y }
  }
}

impl From<PixelPosition> for egui::Pos2 {
  fn from(pp: PixelPosition) -> Self {
    egui::Pos2::new(pp.x, pp.y)
  }
}

impl XY for PixelCoordinate {
  fn x(&self) -> f32 {
    self.x
  }

  fn y(&self) -> f32 {
    self.y
  }

  fn with_x(mut self, x: f32) -> Self {
    self.x = x;
    self
  }

  fn with_y(mut self, y: f32) -> Self {
    self.y = y;
    self
  }
}

impl XY for PixelPosition {
  fn x(&self) -> f32 {
    self.x
  }

  fn y(&self) -> f32 {
    self.y
  }

  fn with_x(mut self, x: f32) -> Self {
    self.x = x;
    self
  }

  fn with_y(mut self, y: f32) -> Self {
    self.y = y;
    self
  }
}

impl AddAssign for PixelCoordinate {
  fn add_assign(&mut self, other: Self) {
    self.x += other.x;
    self.y += other.y;
  }
}

impl Add for PixelCoordinate {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
    }
  }
}

impl Mul<f32> for PixelCoordinate {
  type Output = Self;

  fn mul(self, rhs: f32) -> Self {
    Self {
      x: self.x * rhs,
      y: self.y * rhs,
    }
  }
}

impl AddAssign for PixelPosition {
  fn add_assign(&mut self, other: Self) {
    self.x += other.x;
    self.y += other.y;
  }
}

impl Add for PixelPosition {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
    }
  }
}

impl Mul<f32> for PixelPosition {
  type Output = Self;

  fn mul(self, rhs: f32) -> Self {
    Self {
      x: self.x * rhs,
      y: self.y * rhs,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn tile_coordinate_to_pixel() {
    let tc3 = TileCoordinate {
      x: 2.,
      y: 1.,
      zoom: 3,
    };
    let pp = PixelCoordinate { x: 512., y: 256. };
    assert_eq!(PixelCoordinate::from(tc3), pp);
    assert_eq!(TileCoordinate::from_pixel_position(pp, 3), tc3);
  }

  #[test]
  fn null_island_is_canvas_center() {
    let pp = PixelCoordinate::from(WGS84Coordinate::new(0., 0.));
    assert_approx_eq!(pp.x, CANVAS_SIZE / 2., 0.01);
    assert_approx_eq!(pp.y, CANVAS_SIZE / 2., 0.01);
  }

  #[test]
  fn jerusalem_round_trips_through_canvas() {
    let jerusalem = WGS84Coordinate::new(31.7683, 35.2137);
    let back = WGS84Coordinate::from(PixelCoordinate::from(jerusalem));
    assert_approx_eq!(back.lat, jerusalem.lat, 0.001);
    assert_approx_eq!(back.lon, jerusalem.lon, 0.001);
  }

  #[test]
  fn poles_are_clamped() {
    let pp = PixelCoordinate::from(WGS84Coordinate::new(90., 0.));
    assert!(pp.y.is_finite());
    assert!(pp.y >= -0.01);
  }
}
