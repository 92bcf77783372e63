use egui::{PointerButton, Rect, Response, Sense, Ui, Widget};
use helpers::{
  MAX_ZOOM, MIN_ZOOM, fit_to_screen, point_to_coordinate, set_coordinate_to_pixel, show_box,
  zoom_for_level,
};
use layer::Layer;
use log::{debug, info};

use super::coordinates::{BoundingBox, PixelPosition, Transform, WGS84Coordinate};
use crate::config::Config;

pub mod helpers;
mod layer;
mod selection_layer;
mod tile_layer;

pub use selection_layer::{DrawnPath, MarkerPopup, PlacedMarker, SelectionLayer};
pub use tile_layer::TileLayer;

/// Fitting a single location never zooms in closer than this level.
const MAX_FIT_LEVEL: u8 = 16;

/// A viewport change that is applied once the size of the map is known.
#[derive(Debug, Clone, Copy)]
enum ViewRequest {
  Center {
    coordinate: WGS84Coordinate,
    level: u8,
  },
  Fit(BoundingBox),
}

/// The map session: base tiles, the current selection and the viewport.
pub struct Map {
  transform: Transform,
  tile_layer: TileLayer,
  selection: SelectionLayer,
  view_request: Option<ViewRequest>,
  fit_padding: f32,
  initialized: bool,
}

impl Map {
  #[must_use]
  pub fn new(ctx: egui::Context, config: &Config) -> Self {
    let mut map = Self {
      transform: Transform::default(),
      tile_layer: TileLayer::from_config(ctx, config),
      selection: SelectionLayer::new(),
      view_request: None,
      fit_padding: config.fit_padding,
      initialized: false,
    };
    map.center_on(config.home_view.coordinate(), config.initial_zoom);
    map
  }

  /// The only way to write to the map content.
  pub fn surface_mut(&mut self) -> &mut SelectionLayer {
    &mut self.selection
  }

  #[must_use]
  pub fn selection(&self) -> &SelectionLayer {
    &self.selection
  }

  /// Centers the map on `coordinate` at the web map zoom `level` with the next frame.
  pub fn center_on(&mut self, coordinate: WGS84Coordinate, level: u8) {
    self.view_request = Some(ViewRequest::Center { coordinate, level });
  }

  fn apply_view_request(&mut self, rect: Rect) {
    if let Some(bb) = self.selection.take_fit_request() {
      self.view_request = Some(ViewRequest::Fit(bb));
    }
    match self.view_request.take() {
      Some(ViewRequest::Center { coordinate, level }) => {
        self.transform.zoom = zoom_for_level(level);
        set_coordinate_to_pixel(coordinate.into(), rect.center().into(), &mut self.transform);
        debug!(
          "Centered on {:.4}, {:.4} at level {level}",
          coordinate.lat, coordinate.lon
        );
      }
      Some(ViewRequest::Fit(bb)) => {
        show_box(
          &mut self.transform,
          &bb,
          rect,
          self.fit_padding,
          zoom_for_level(MAX_FIT_LEVEL),
        );
      }
      None => {}
    }
  }

  fn handle_keys(&mut self, ui: &Ui, rect: Rect) {
    if ui.ctx().wants_keyboard_input() {
      return;
    }
    let keys = ui.input(|i| {
      i.events
        .iter()
        .filter_map(|e| match e {
          egui::Event::Key {
            key, pressed: true, ..
          } => Some(*key),
          _ => None,
        })
        .collect::<Vec<_>>()
    });
    for key in keys {
      match key {
        egui::Key::ArrowDown => {
          self.transform.translate(PixelPosition { x: 0., y: -10. });
        }
        egui::Key::ArrowLeft => {
          self.transform.translate(PixelPosition { x: 10., y: 0. });
        }
        egui::Key::ArrowRight => {
          self.transform.translate(PixelPosition { x: -10., y: 0. });
        }
        egui::Key::ArrowUp => {
          self.transform.translate(PixelPosition { x: 0., y: 10. });
        }
        egui::Key::Minus => self.zoom_with_center(0.9, rect.center().into()),
        egui::Key::Plus | egui::Key::Equals => {
          self.zoom_with_center(1. / 0.9, rect.center().into());
        }
        egui::Key::F => {
          if let Some(mut bb) = self.selection.bounding_box() {
            if !bb.is_box() {
              bb.frame(0.02);
            }
            self.view_request = Some(ViewRequest::Fit(bb));
          }
        }
        _ => {}
      }
    }
  }

  fn handle_mouse_wheel(&mut self, ui: &Ui, response: &Response) {
    if !response.hovered() {
      return;
    }
    let delta = ui.input(|i| {
      i.events.iter().find_map(|e| match e {
        egui::Event::MouseWheel { delta, .. } => Some((delta.y + 1.).clamp(0.8, 1.4).sqrt()),
        _ => None,
      })
    });
    if let Some(delta) = delta {
      let cursor = response.hover_pos().unwrap_or_default().into();
      self.zoom_with_center(delta, cursor);
    }
  }

  fn zoom_with_center(&mut self, delta: f32, center: PixelPosition) {
    if self.transform.zoom * delta < MIN_ZOOM || self.transform.zoom * delta > MAX_ZOOM {
      return;
    }
    let hover_coord = point_to_coordinate(center, &self.transform);
    self.transform.zoom(delta);
    set_coordinate_to_pixel(hover_coord, center, &mut self.transform);
  }

  /// Tile provider selection and layer visibility.
  pub fn layer_ui(&mut self, ui: &mut Ui) {
    self.tile_layer.ui(ui);
    self.selection.ui(ui);
  }
}

impl Widget for &mut Map {
  fn ui(self, ui: &mut Ui) -> Response {
    let size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

    if !self.initialized {
      fit_to_screen(&mut self.transform, &rect);
      self.initialized = true;
    }
    self.apply_view_request(rect);

    self.handle_mouse_wheel(ui, &response);
    self.handle_keys(ui, rect);

    if response.clicked()
      && let Some(pos) = response.interact_pointer_pos()
      && self.selection.open_popup_at(pos, &self.transform)
    {
      info!("Opened popup at {pos:?}");
    }

    if response.dragged() && response.dragged_by(PointerButton::Primary) {
      self.transform.translate(PixelPosition {
        x: response.drag_delta().x,
        y: response.drag_delta().y,
      });
    }

    fit_to_screen(&mut self.transform, &rect);

    if ui.is_rect_visible(rect) {
      self.tile_layer.draw(ui, &self.transform, rect);
      self.selection.draw(ui, &self.transform, rect);
    }
    self.selection.show_popup(ui.ctx());

    response
  }
}
