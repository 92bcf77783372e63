use serde::{Deserialize, Serialize};

use super::{CANVAS_SIZE, Coordinate, PixelCoordinate, TileCoordinate};

/// A tile in the Web Mercator projection.
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq, Serialize, Deserialize)]
pub struct Tile {
  pub x: u32,
  pub y: u32,
  pub zoom: u8,
}

impl Tile {
  /// Checks existence of the tile.
  #[must_use]
  pub fn exists(&self) -> bool {
    let max_tile = 2u32.pow(self.zoom.into()) - 1;
    self.x <= max_tile && self.y <= max_tile
  }

  /// The parent one zoom level lower.
  #[must_use]
  pub fn parent(&self) -> Option<Self> {
    (self.zoom > 0).then(|| Self {
      x: self.x >> 1,
      y: self.y >> 1,
      zoom: self.zoom - 1,
    })
  }

  /// North west and south east corner on the canvas.
  #[must_use]
  #[allow(clippy::cast_precision_loss)]
  pub fn position(&self) -> (PixelCoordinate, PixelCoordinate) {
    let corner = |x: u32, y: u32| {
      PixelCoordinate::from(TileCoordinate {
        x: x as f32,
        y: y as f32,
        zoom: self.zoom,
      })
    };
    (corner(self.x, self.y), corner(self.x + 1, self.y + 1))
  }
}

impl From<TileCoordinate> for Tile {
  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  fn from(tile_coord: TileCoordinate) -> Self {
    Self {
      x: tile_coord.x.max(0.).floor() as u32,
      y: tile_coord.y.max(0.).floor() as u32,
      zoom: tile_coord.zoom,
    }
  }
}

/// All existing tiles between the north west and the south east tile coordinate.
pub fn tiles_in_box(nw: TileCoordinate, se: TileCoordinate) -> impl Iterator<Item = Tile> {
  let nw_tile = Tile::from(nw);
  let se_tile = Tile::from(se);
  (nw_tile.x..=se_tile.x)
    .flat_map(move |x| {
      (nw_tile.y..=se_tile.y).map(move |y| Tile {
        x,
        y,
        zoom: nw_tile.zoom,
      })
    })
    .filter(Tile::exists)
}

/// An axis aligned box on the canvas.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
  max_x: f32,
  min_x: f32,
  max_y: f32,
  min_y: f32,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::get_invalid()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      max_x: f32::MIN,
      min_x: f32::MAX,
      max_y: f32::MIN,
      min_y: f32::MAX,
    }
  }

  pub fn from_iterator<C: Coordinate, I: IntoIterator<Item = C>>(positions: I) -> Self {
    let mut bb = Self::get_invalid();
    for pos in positions {
      bb.add_coordinate(pos.as_pixel_coordinate());
    }
    bb
  }

  #[must_use]
  pub fn center(&self) -> PixelCoordinate {
    PixelCoordinate {
      x: f32::midpoint(self.max_x, self.min_x),
      y: f32::midpoint(self.max_y, self.min_y),
    }
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_y <= self.max_y
      && self.min_x <= self.max_x
      && self.min_x.abs() <= CANVAS_SIZE
      && self.min_y.abs() <= CANVAS_SIZE
      && self.max_x.abs() <= CANVAS_SIZE
      && self.max_y.abs() <= CANVAS_SIZE
  }

  /// A valid box with a non-zero area, i.e. not a single point or a line.
  #[must_use]
  pub fn is_box(&self) -> bool {
    self.is_valid() && self.width() > 0. && self.height() > 0.
  }

  /// Grows the box by `frame` in every direction.
  pub fn frame(&mut self, frame: f32) {
    self.min_x -= frame;
    self.min_y -= frame;
    self.max_x += frame;
    self.max_y += frame;
  }

  pub fn add_coordinate(&mut self, pp: PixelCoordinate) {
    self.min_y = self.min_y.min(pp.y);
    self.min_x = self.min_x.min(pp.x);
    self.max_y = self.max_y.max(pp.y);
    self.max_x = self.max_x.max(pp.x);
  }

  #[must_use]
  pub fn width(&self) -> f32 {
    self.max_x - self.min_x
  }

  #[must_use]
  pub fn height(&self) -> f32 {
    self.max_y - self.min_y
  }
}

#[cfg(test)]
mod tests {
  use crate::map::coordinates::WGS84Coordinate;

  use super::*;

  #[test]
  fn berlin_tiles() {
    let coord = WGS84Coordinate {
      lat: 52.521_977,
      lon: 13.413_305,
    };

    let t13: Tile = TileCoordinate::from_coordinate(coord, 13).into();
    assert_eq!(
      t13,
      Tile {
        x: 4401,
        y: 2686,
        zoom: 13
      }
    );
  }

  #[test]
  fn tile_box() {
    let nw = TileCoordinate {
      x: 2.1,
      y: 1.1,
      zoom: 5,
    };
    let se = TileCoordinate {
      x: 11.1,
      y: 20.1,
      zoom: 5,
    };
    assert_eq!(tiles_in_box(nw, se).count(), 200);
  }

  #[test]
  fn tile_box_is_cut_at_world_border() {
    let nw = TileCoordinate {
      x: -3.,
      y: -3.,
      zoom: 1,
    };
    let se = TileCoordinate {
      x: 7.,
      y: 7.,
      zoom: 1,
    };
    assert_eq!(tiles_in_box(nw, se).count(), 4);
  }

  #[test]
  fn parent_of_root_is_none() {
    assert_eq!(Tile { x: 0, y: 0, zoom: 0 }.parent(), None);
    assert_eq!(
      Tile { x: 4, y: 6, zoom: 10 }.parent(),
      Some(Tile { x: 2, y: 3, zoom: 9 })
    );
  }

  #[test]
  fn single_point_is_no_box_until_framed() {
    let mut bb = BoundingBox::from_iterator([WGS84Coordinate::new(31.77, 35.21)]);
    assert!(bb.is_valid());
    assert!(!bb.is_box());
    bb.frame(0.02);
    assert!(bb.is_box());
  }

  #[test]
  fn empty_box_is_invalid() {
    let bb = BoundingBox::from_iterator(Vec::<WGS84Coordinate>::new());
    assert!(!bb.is_valid());
  }
}
