use egui::{Pos2, Rect, Vec2, pos2};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

mod storage;

pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub const COLLAPSED_KEY: &str = "panelCollapsed";
pub const POSITION_KEY: &str = "controlPanelPosition";

/// Viewports up to this width start with a collapsed panel, unless the user decided otherwise.
pub const COMPACT_WIDTH: f32 = 768.;

/// Top left corner of the control panel in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPosition {
  pub top: f32,
  pub left: f32,
}

impl Default for PanelPosition {
  fn default() -> Self {
    Self {
      top: 20.,
      left: 20.,
    }
  }
}

impl PanelPosition {
  #[must_use]
  pub fn to_pos2(self) -> Pos2 {
    pos2(self.left, self.top)
  }
}

/// The persisted layout of the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UiState {
  pub panel_collapsed: bool,
  pub panel_position: Option<PanelPosition>,
}

/// Collapsing and dragging of the control panel. Toggles are written to the store right away,
/// positions when a drag ends.
pub struct PanelController {
  store: Box<dyn KeyValueStore>,
  state: UiState,
  collapse_stored: bool,
  drag_offset: Option<Vec2>,
  moved: bool,
}

impl PanelController {
  /// Reads the layout from `store`. Unreadable values fall back to defaults.
  #[must_use]
  pub fn restore(store: Box<dyn KeyValueStore>) -> Self {
    let collapsed = store.get(COLLAPSED_KEY);
    let panel_position = store.get(POSITION_KEY).and_then(|raw| {
      serde_json::from_str::<PanelPosition>(&raw)
        .inspect_err(|e| warn!("Ignoring stored panel position '{raw}': {e}"))
        .ok()
    });
    Self {
      state: UiState {
        panel_collapsed: collapsed.as_deref() == Some("true"),
        panel_position,
      },
      collapse_stored: collapsed.is_some(),
      store,
      drag_offset: None,
      moved: false,
    }
  }

  #[must_use]
  pub fn state(&self) -> UiState {
    self.state
  }

  #[must_use]
  pub fn collapsed(&self) -> bool {
    self.state.panel_collapsed
  }

  #[must_use]
  pub fn position(&self) -> PanelPosition {
    self.state.panel_position.unwrap_or_default()
  }

  #[must_use]
  pub fn is_dragging(&self) -> bool {
    self.drag_offset.is_some()
  }

  /// Collapses the panel on narrow viewports if the user never chose. Not persisted.
  pub fn apply_compact_default(&mut self, viewport_width: f32) {
    if viewport_width <= COMPACT_WIDTH && !self.collapse_stored {
      debug!("Narrow viewport ({viewport_width}px), starting collapsed.");
      self.state.panel_collapsed = true;
    }
  }

  pub fn toggle_collapsed(&mut self) {
    self.state.panel_collapsed = !self.state.panel_collapsed;
    self
      .store
      .set(COLLAPSED_KEY, self.state.panel_collapsed.to_string());
    self.collapse_stored = true;
  }

  pub fn begin_drag(&mut self, pointer: Pos2) {
    self.drag_offset = Some(pointer - self.position().to_pos2());
  }

  /// Moves the panel with the pointer, keeping it inside `viewport`. Nothing is stored until
  /// [`Self::end_drag`].
  pub fn update_drag(&mut self, pointer: Pos2, viewport: Rect, panel_size: Vec2) {
    let Some(offset) = self.drag_offset else {
      return;
    };
    let wanted = pointer - offset;
    let clamp = |v: f32, min: f32, max: f32| v.min(max).max(min);
    let position = PanelPosition {
      top: clamp(
        wanted.y,
        viewport.min.y,
        viewport.max.y - panel_size.y,
      ),
      left: clamp(
        wanted.x,
        viewport.min.x,
        viewport.max.x - panel_size.x,
      ),
    };
    self.state.panel_position = Some(position);
    self.moved = true;
  }

  /// Stores the position reached by the drag.
  pub fn end_drag(&mut self) {
    if self.drag_offset.take().is_none() || !std::mem::take(&mut self.moved) {
      return;
    }
    let position = self.position();
    match serde_json::to_string(&position) {
      Ok(json) => self.store.set(POSITION_KEY, json),
      Err(e) => warn!("Failed to store panel position: {e}"),
    }
  }

  /// Forgets the stored layout.
  pub fn reset(&mut self) {
    self.store.remove(COLLAPSED_KEY);
    self.store.remove(POSITION_KEY);
    self.state = UiState::default();
    self.collapse_stored = false;
    self.drag_offset = None;
    self.moved = false;
  }
}

#[cfg(test)]
mod tests {
  use egui::vec2;

  use super::*;

  fn viewport() -> Rect {
    Rect::from_min_size(Pos2::ZERO, vec2(1280., 800.))
  }

  fn controller_with(values: &[(&str, &str)]) -> PanelController {
    let mut store = MemoryStore::new();
    for (k, v) in values {
      store.set(k, (*v).to_string());
    }
    PanelController::restore(Box::new(store))
  }

  #[test]
  fn fresh_store_uses_defaults() {
    let panel = controller_with(&[]);
    assert!(!panel.collapsed());
    assert_eq!(panel.position(), PanelPosition { top: 20., left: 20. });
  }

  #[test]
  fn restores_stored_layout() {
    let panel = controller_with(&[
      (COLLAPSED_KEY, "true"),
      (POSITION_KEY, r#"{"top":120.0,"left":340.0}"#),
    ]);
    assert!(panel.collapsed());
    assert_eq!(panel.position(), PanelPosition { top: 120., left: 340. });
  }

  #[test]
  fn malformed_position_falls_back() {
    let panel = controller_with(&[(POSITION_KEY, "120px")]);
    assert_eq!(panel.position(), PanelPosition::default());
    assert_eq!(panel.state().panel_position, None);
  }

  #[test]
  fn compact_default_only_without_stored_choice() {
    let mut panel = controller_with(&[]);
    panel.apply_compact_default(1024.);
    assert!(!panel.collapsed());
    panel.apply_compact_default(768.);
    assert!(panel.collapsed());

    let mut panel = controller_with(&[(COLLAPSED_KEY, "false")]);
    panel.apply_compact_default(375.);
    assert!(!panel.collapsed());
  }

  #[test]
  fn drag_is_clamped_to_viewport() {
    let mut panel = controller_with(&[]);
    let size = vec2(300., 400.);
    panel.begin_drag(pos2(30., 25.));
    assert!(panel.is_dragging());

    panel.update_drag(pos2(130., 225.), viewport(), size);
    assert_eq!(panel.position(), PanelPosition { top: 220., left: 120. });

    panel.update_drag(pos2(5000., 5000.), viewport(), size);
    assert_eq!(panel.position(), PanelPosition { top: 400., left: 980. });

    panel.update_drag(pos2(-500., -500.), viewport(), size);
    assert_eq!(panel.position(), PanelPosition { top: 0., left: 0. });

    panel.end_drag();
    panel.update_drag(pos2(130., 225.), viewport(), size);
    assert_eq!(panel.position(), PanelPosition { top: 0., left: 0. });
  }

  #[test]
  fn changes_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ui_state.json");

    let mut panel = PanelController::restore(Box::new(FileStore::open(&path)));
    panel.toggle_collapsed();
    panel.begin_drag(pos2(20., 20.));
    panel.update_drag(pos2(50., 60.), viewport(), vec2(100., 100.));
    panel.update_drag(pos2(70., 90.), viewport(), vec2(100., 100.));
    assert_eq!(FileStore::open(&path).get(POSITION_KEY), None);

    panel.end_drag();
    let panel = PanelController::restore(Box::new(FileStore::open(&path)));
    assert!(panel.collapsed());
    assert_eq!(panel.position(), PanelPosition { top: 90., left: 70. });
  }

  #[test]
  fn click_without_move_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ui_state.json");

    let mut panel = PanelController::restore(Box::new(FileStore::open(&path)));
    panel.begin_drag(pos2(30., 30.));
    panel.end_drag();
    panel.end_drag();
    assert_eq!(FileStore::open(&path).get(POSITION_KEY), None);
  }

  #[test]
  fn reset_forgets_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ui_state.json");

    let mut panel = PanelController::restore(Box::new(FileStore::open(&path)));
    panel.toggle_collapsed();
    panel.reset();
    assert!(!panel.collapsed());

    let mut panel = PanelController::restore(Box::new(FileStore::open(&path)));
    assert!(!panel.collapsed());
    panel.apply_compact_default(500.);
    assert!(panel.collapsed());
  }
}
