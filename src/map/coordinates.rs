mod boxes;
mod coords;
mod transform;

pub use boxes::*;
pub use coords::*;
use transform::TTransform;

/// Maps the canvas onto the screen.
pub type Transform = TTransform<PixelCoordinate, PixelPosition>;

/// Anything that can be placed on the canvas.
pub trait Coordinate: Copy + Clone + std::fmt::Debug {
  fn as_wgs84(&self) -> WGS84Coordinate;
  fn as_pixel_coordinate(&self) -> PixelCoordinate;
}

impl Coordinate for WGS84Coordinate {
  fn as_wgs84(&self) -> WGS84Coordinate {
    *self
  }

  fn as_pixel_coordinate(&self) -> PixelCoordinate {
    PixelCoordinate::from(*self)
  }
}
