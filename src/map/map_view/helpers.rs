use egui::Rect;

use crate::map::coordinates::{BoundingBox, CANVAS_SIZE, PixelCoordinate, PixelPosition, Transform};

pub const MAX_ZOOM: f32 = 524_288.;
pub const MIN_ZOOM: f32 = 1.;

/// Screen pixels of one tile, as used by common web maps.
const WEB_TILE_SIZE: f32 = 256.;

/// Moves the map such that `coord` is drawn at `cursor`.
pub(crate) fn set_coordinate_to_pixel(
  coord: PixelCoordinate,
  cursor: PixelPosition,
  transform: &mut Transform,
) {
  let current_pos_in_gui = transform.apply(coord);
  transform.translate(current_pos_in_gui * (-1.) + cursor);
}

/// Converts a point, e.g. from a click, to a coordinate.
pub(crate) fn point_to_coordinate(point: PixelPosition, transform: &Transform) -> PixelCoordinate {
  transform.invert().apply(point)
}

/// The transform zoom at which the map looks like a web map at `level`.
#[must_use]
pub fn zoom_for_level(level: u8) -> f32 {
  (2f32.powi(level.into()) * WEB_TILE_SIZE / CANVAS_SIZE).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Keeps the zoom in range and the canvas on screen.
pub(crate) fn fit_to_screen(transform: &mut Transform, rect: &Rect) {
  transform.zoom = transform.zoom.clamp(MIN_ZOOM, MAX_ZOOM);

  let inv = transform.invert();
  let PixelCoordinate { x, y } = inv.apply(rect.min.into());
  if x < 0. || y < 0. {
    transform.translate(
      PixelPosition {
        x: x.min(0.),
        y: y.min(0.),
      } * transform.zoom,
    );
  }

  let inv = transform.invert();
  let PixelCoordinate { x, y } = inv.apply(rect.max.into());
  if x > CANVAS_SIZE || y > CANVAS_SIZE {
    transform.translate(
      PixelPosition {
        x: (x - CANVAS_SIZE).max(0.),
        y: (y - CANVAS_SIZE).max(0.),
      } * transform.zoom,
    );
  }
}

/// Shows `bb` inside `rect`, keeping `padding` pixels free on every side. The zoom never exceeds
/// `max_zoom`.
pub(crate) fn show_box(
  transform: &mut Transform,
  bb: &BoundingBox,
  rect: Rect,
  padding: f32,
  max_zoom: f32,
) {
  if !bb.is_valid() {
    return;
  }
  let inner = rect.shrink(padding);
  let inner = if inner.is_positive() { inner } else { rect };

  let fit = |screen: f32, side: f32| if side > 0. { screen / side } else { f32::INFINITY };
  let zoom = fit(inner.width(), bb.width()).min(fit(inner.height(), bb.height()));
  let zoom = if zoom.is_finite() { zoom } else { max_zoom };
  transform.zoom = zoom.clamp(MIN_ZOOM, max_zoom);
  set_coordinate_to_pixel(bb.center(), inner.center().into(), transform);
}
