use egui::{Align2, Color32, FontId, Pos2, Rect, Shape, Stroke, Ui, vec2};
use log::debug;

use super::layer::{Layer, LayerProperties};
use crate::{
  atlas::{LocationRecord, color::color_or_default},
  map::{
    coordinates::{BoundingBox, PixelCoordinate, Transform, WGS84Coordinate},
    surface::{Leg, MapSurface, MarkerHandle, PathHandle, PathStyle},
  },
};

const PATH_WIDTH: f32 = 3.0;
const PATH_OPACITY: f32 = 0.7;
const DASH_LENGTH: f32 = 10.0;
const GAP_LENGTH: f32 = 10.0;
const MARKER_RADIUS: f32 = 16.0;
const EMOJI_SIZE: f32 = 20.0;
const LABEL_SIZE: f32 = 12.0;
const BADGE_RADIUS: f32 = 8.0;

const NAME: &str = "Selection";

/// The content of a marker popup.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPopup {
  pub title: String,
  pub description: String,
  /// `None` if the record has no events, so the section is not shown at all.
  pub events: Option<Vec<String>>,
  pub position: WGS84Coordinate,
}

impl MarkerPopup {
  #[must_use]
  pub fn from_record(record: &LocationRecord) -> Self {
    let title = if record.emoji.is_empty() {
      record.name.clone()
    } else {
      format!("{} {}", record.emoji, record.name)
    };
    Self {
      title,
      description: record.description.clone(),
      events: (!record.events.is_empty()).then(|| record.events.clone()),
      position: record.coordinate(),
    }
  }

  fn show(&self, ctx: &egui::Context, open: &mut bool) {
    egui::Window::new(&self.title)
      .id(egui::Id::new("marker_popup"))
      .open(open)
      .collapsible(false)
      .resizable(false)
      .default_width(320.)
      .anchor(Align2::RIGHT_TOP, vec2(-10., 10.))
      .show(ctx, |ui| {
        ui.strong("Overview");
        ui.label(&self.description);
        if let Some(events) = &self.events {
          ui.separator();
          ui.strong("Events");
          for event in events {
            ui.label(format!("• {event}"));
          }
        }
        ui.separator();
        ui.weak(format!(
          "{:.4}, {:.4}",
          self.position.lat, self.position.lon
        ));
      });
  }
}

/// A marker as placed by the selection pipeline.
#[derive(Debug, Clone)]
pub struct PlacedMarker {
  pub record: LocationRecord,
  pub color: Color32,
  position: PixelCoordinate,
}

/// A path as drawn by the selection pipeline.
#[derive(Debug, Clone)]
pub struct DrawnPath {
  pub style: PathStyle,
  pub coordinates: Vec<WGS84Coordinate>,
  color: Color32,
  points: Vec<PixelCoordinate>,
}

/// Holds and draws the current selection: markers, journey paths and the open popup.
#[derive(Default)]
pub struct SelectionLayer {
  markers: Vec<PlacedMarker>,
  paths: Vec<DrawnPath>,
  fit_request: Option<BoundingBox>,
  popup: Option<MarkerPopup>,
  layer_properties: LayerProperties,
}

impl SelectionLayer {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn markers(&self) -> &[PlacedMarker] {
    &self.markers
  }

  #[must_use]
  pub fn paths(&self) -> &[DrawnPath] {
    &self.paths
  }

  #[must_use]
  pub fn popup(&self) -> Option<&MarkerPopup> {
    self.popup.as_ref()
  }

  /// The last requested viewport that was not yet applied.
  #[must_use]
  pub fn pending_fit(&self) -> Option<&BoundingBox> {
    self.fit_request.as_ref()
  }

  pub(crate) fn take_fit_request(&mut self) -> Option<BoundingBox> {
    self.fit_request.take()
  }

  /// The topmost marker under `pos`, if any.
  #[must_use]
  pub fn marker_at(&self, pos: Pos2, transform: &Transform) -> Option<&PlacedMarker> {
    self.markers.iter().rev().find(|m| {
      let center: Pos2 = transform.apply(m.position).into();
      center.distance(pos) <= MARKER_RADIUS
    })
  }

  /// Opens the popup of the marker under `pos`. Returns whether a marker was hit.
  pub fn open_popup_at(&mut self, pos: Pos2, transform: &Transform) -> bool {
    let popup = self
      .marker_at(pos, transform)
      .map(|m| MarkerPopup::from_record(&m.record));
    let hit = popup.is_some();
    if hit {
      self.popup = popup;
    }
    hit
  }

  pub fn open_popup(&mut self, handle: MarkerHandle) {
    if let Some(marker) = self.markers.get(handle.0) {
      self.popup = Some(MarkerPopup::from_record(&marker.record));
    }
  }

  pub(crate) fn show_popup(&mut self, ctx: &egui::Context) {
    let Some(popup) = &self.popup else {
      return;
    };
    let mut open = true;
    popup.show(ctx, &mut open);
    if !open {
      self.popup = None;
    }
  }

  fn paint_path(painter: &egui::Painter, path: &DrawnPath, transform: &Transform) {
    let points: Vec<Pos2> = path
      .points
      .iter()
      .map(|p| transform.apply(*p).into())
      .collect();
    let stroke = Stroke::new(PATH_WIDTH, path.color.gamma_multiply(PATH_OPACITY));
    match path.style.leg {
      Leg::Outbound => {
        painter.add(Shape::line(points, stroke));
      }
      Leg::Return => {
        painter.extend(Shape::dashed_line(
          &points,
          stroke,
          DASH_LENGTH,
          GAP_LENGTH,
        ));
      }
    }
  }

  fn paint_marker(painter: &egui::Painter, marker: &PlacedMarker, transform: &Transform) {
    let center: Pos2 = transform.apply(marker.position).into();
    painter.circle(
      center,
      MARKER_RADIUS,
      Color32::from_black_alpha(150),
      Stroke::new(2.0, marker.color),
    );
    painter.text(
      center,
      Align2::CENTER_CENTER,
      &marker.record.emoji,
      FontId::proportional(EMOJI_SIZE),
      Color32::WHITE,
    );

    if let Some(order) = marker.record.order {
      let badge = center + vec2(MARKER_RADIUS * 0.8, -MARKER_RADIUS * 0.8);
      painter.circle_filled(badge, BADGE_RADIUS, marker.color);
      painter.text(
        badge,
        Align2::CENTER_CENTER,
        order.to_string(),
        FontId::proportional(LABEL_SIZE - 2.),
        Color32::WHITE,
      );
    }

    let label_pos = center + vec2(0., MARKER_RADIUS + 2.);
    let galley = painter.layout_no_wrap(
      marker.record.name.clone(),
      FontId::proportional(LABEL_SIZE),
      Color32::WHITE,
    );
    let label_rect = Align2::CENTER_TOP.anchor_size(label_pos, galley.size());
    painter.rect_filled(
      label_rect.expand(2.),
      egui::CornerRadius::same(3),
      Color32::from_black_alpha(170),
    );
    painter.galley(label_rect.min, galley, Color32::WHITE);
  }
}

impl MapSurface for SelectionLayer {
  fn place_marker(&mut self, record: &LocationRecord, color: &str) -> MarkerHandle {
    self.markers.push(PlacedMarker {
      record: record.clone(),
      color: color_or_default(color),
      position: record.coordinate().into(),
    });
    MarkerHandle(self.markers.len() - 1)
  }

  fn draw_path(
    &mut self,
    coordinates: &[WGS84Coordinate],
    style: PathStyle,
  ) -> Option<PathHandle> {
    if coordinates.len() < 2 {
      return None;
    }
    self.paths.push(DrawnPath {
      color: color_or_default(&style.color),
      style,
      coordinates: coordinates.to_vec(),
      points: coordinates.iter().map(|&c| c.into()).collect(),
    });
    Some(PathHandle(self.paths.len() - 1))
  }

  fn clear_all(&mut self) {
    debug!(
      "Clearing {} markers and {} paths.",
      self.markers.len(),
      self.paths.len()
    );
    self.markers.clear();
    self.paths.clear();
    self.popup = None;
    self.fit_request = None;
  }

  fn fit_to(&mut self, coordinates: &[WGS84Coordinate]) {
    if coordinates.is_empty() {
      return;
    }
    self.fit_request = Some(BoundingBox::from_iterator(coordinates.iter().copied()));
  }
}

impl Layer for SelectionLayer {
  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect) {
    if !self.visible() {
      return;
    }
    let painter = ui.painter_at(rect);
    for path in &self.paths {
      Self::paint_path(&painter, path, transform);
    }
    for marker in &self.markers {
      Self::paint_marker(&painter, marker, transform);
    }
  }

  fn clear(&mut self) {
    self.clear_all();
  }

  fn name(&self) -> &str {
    NAME
  }

  fn visible(&self) -> bool {
    self.layer_properties.visible
  }

  fn visible_mut(&mut self) -> &mut bool {
    &mut self.layer_properties.visible
  }

  fn bounding_box(&self) -> Option<BoundingBox> {
    (!self.markers.is_empty())
      .then(|| BoundingBox::from_iterator(self.markers.iter().map(|m| m.position)))
  }

  fn ui_content(&mut self, ui: &mut Ui) {
    ui.label(format!("Markers: {}", self.markers.len()));
    ui.label(format!("Paths: {}", self.paths.len()));
  }
}
