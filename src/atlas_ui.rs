use std::{sync::Arc, time::Duration};

use egui::{Align2, Button, Color32, Id, RichText, Sense, Ui, Vec2, Widget as _};
use log::{error, info};

use crate::{
  atlas::{Atlas, AtlasError, color::color_or_default},
  chrome::{FileStore, KeyValueStore, MemoryStore, PanelController},
  config::Config,
  map::map_view::Map,
  search_input::{SearchAction, SearchInput},
  selection::{SectionOutcome, SelectionPipeline},
  summary::SummaryView,
};

const JOURNEYS_TAB: &str = "Journeys";

/// What the user asked for in the control panel this frame.
#[derive(Debug, Clone, PartialEq)]
enum PanelAction {
  Journey(String),
  Section(String),
  ShowAll,
  Recenter,
  Search(SearchAction),
  ToggleCollapsed,
}

/// The category button that is highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Active {
  Journey(String),
  Section(String),
  All,
}

/// Everything shown once the dataset is loaded.
struct Viewer {
  map: Map,
  pipeline: SelectionPipeline,
  summary: SummaryView,
  search: SearchInput,
  panel: PanelController,
  panel_size: Vec2,
  compact_checked: bool,
  tab: String,
  active: Option<Active>,
  notice: Option<String>,
}

impl Viewer {
  fn new(
    ctx: &egui::Context,
    config: &Config,
    atlas: Atlas,
    store: Box<dyn KeyValueStore>,
  ) -> Self {
    Self {
      map: Map::new(ctx.clone(), config),
      pipeline: SelectionPipeline::new(Arc::new(atlas)),
      summary: SummaryView::new(),
      search: SearchInput::new(Duration::from_millis(config.search_debounce_ms)),
      panel: PanelController::restore(store),
      panel_size: Vec2::ZERO,
      compact_checked: false,
      tab: JOURNEYS_TAB.to_string(),
      active: None,
      notice: None,
    }
  }

  fn apply(&mut self, action: PanelAction, config: &Config) {
    let surface = self.map.surface_mut();
    match action {
      PanelAction::Journey(key) => {
        self
          .pipeline
          .select_journey(&key, surface, &mut self.summary);
        self.active = Some(Active::Journey(key));
      }
      PanelAction::Section(key) => {
        let outcome = self
          .pipeline
          .select_document_section(&key, surface, &mut self.summary);
        match outcome {
          SectionOutcome::Shown => self.active = Some(Active::Section(key)),
          SectionOutcome::NotAvailable => {
            self.active = None;
            self.notice = Some(format!("{key} is not available yet."));
          }
        }
      }
      PanelAction::ShowAll => {
        self.pipeline.select_all(surface, &mut self.summary);
        self.active = Some(Active::All);
      }
      PanelAction::Recenter => {
        let home = config.home_view;
        self.map.center_on(home.coordinate(), home.zoom);
      }
      PanelAction::Search(SearchAction::Run(query)) => {
        self.pipeline.search(&query, surface, &mut self.summary);
        self.active = None;
      }
      PanelAction::Search(SearchAction::Clear) => {
        self.pipeline.clear(surface, &mut self.summary);
        self.active = None;
      }
      PanelAction::ToggleCollapsed => self.panel.toggle_collapsed(),
    }
  }

  fn category_button(ui: &mut Ui, label: &str, selected: bool, color: Option<Color32>) -> bool {
    let text = match color {
      Some(color) => RichText::new(format!("● {label}")).color(color),
      None => RichText::new(label),
    };
    Button::new(text).selected(selected).ui(ui).clicked()
  }

  fn tab_content(&self, ui: &mut Ui) -> Option<PanelAction> {
    let atlas = self.pipeline.atlas();
    let mut action = None;
    if self.tab == JOURNEYS_TAB {
      for journey in &atlas.journeys {
        let selected = self.active == Some(Active::Journey(journey.key.clone()));
        let color = color_or_default(&journey.color);
        if Self::category_button(ui, &journey.title, selected, Some(color)) {
          action = Some(PanelAction::Journey(journey.key.clone()));
        }
      }
    } else {
      ui.horizontal_wrapped(|ui| {
        for book in atlas.books_in(&self.tab) {
          let selected = self.active == Some(Active::Section(book.to_string()));
          let color = atlas
            .section(book)
            .map(|section| color_or_default(&section.color));
          if Self::category_button(ui, book, selected, color) {
            action = Some(PanelAction::Section(book.to_string()));
          }
        }
      });
    }
    action
  }

  fn panel_header(&mut self, ui: &mut Ui) -> Option<PanelAction> {
    let mut action = None;
    ui.horizontal(|ui| {
      let handle = ui.add(
        egui::Label::new(RichText::new("✥ Journey Atlas").strong()).sense(Sense::drag()),
      );
      if handle.drag_started()
        && let Some(pointer) = handle.interact_pointer_pos()
      {
        self.panel.begin_drag(pointer);
      }
      if handle.dragged()
        && let Some(pointer) = handle.interact_pointer_pos()
      {
        #[allow(deprecated)]
        let viewport = ui.ctx().screen_rect();
        self.panel.update_drag(pointer, viewport, self.panel_size);
      }
      if handle.drag_stopped() {
        self.panel.end_drag();
      }

      let toggle = if self.panel.collapsed() { "Expand" } else { "Collapse" };
      if ui.small_button(toggle).clicked() {
        action = Some(PanelAction::ToggleCollapsed);
      }
    });
    action
  }

  fn panel_body(&mut self, ui: &mut Ui) -> Option<PanelAction> {
    let mut action = self.search.ui(ui).map(PanelAction::Search);

    ui.horizontal(|ui| {
      if Button::new("Show all")
        .selected(self.active == Some(Active::All))
        .ui(ui)
        .clicked()
      {
        action = Some(PanelAction::ShowAll);
      }
      if ui.button("Recenter").clicked() {
        action = Some(PanelAction::Recenter);
      }
    });
    ui.separator();

    let groups: Vec<String> = self
      .pipeline
      .atlas()
      .groups()
      .into_iter()
      .map(str::to_string)
      .collect();
    ui.horizontal_wrapped(|ui| {
      ui.selectable_value(&mut self.tab, JOURNEYS_TAB.to_string(), JOURNEYS_TAB);
      for group in groups {
        ui.selectable_value(&mut self.tab, group.clone(), group);
      }
    });
    ui.separator();

    egui::ScrollArea::vertical()
      .max_height(360.)
      .show(ui, |ui| {
        if let Some(clicked) = self.tab_content(ui) {
          action = Some(clicked);
        }
      });

    ui.separator();
    egui::CollapsingHeader::new("Map Layers")
      .default_open(false)
      .show(ui, |ui| self.map.layer_ui(ui));
    action
  }

  fn control_panel(&mut self, ctx: &egui::Context) -> Option<PanelAction> {
    let response = egui::Area::new(Id::new("control_panel"))
      .current_pos(self.panel.position().to_pos2())
      .movable(false)
      .show(ctx, |ui| {
        egui::Frame::window(ui.style())
          .show(ui, |ui| {
            ui.set_max_width(320.);
            let mut action = self.panel_header(ui);
            if !self.panel.collapsed()
              && let Some(body) = self.panel_body(ui)
            {
              action = Some(body);
            }
            action
          })
          .inner
      });
    self.panel_size = response.response.rect.size();
    response.inner
  }

  fn summary_window(&self, ctx: &egui::Context) {
    if !self.summary.is_visible() {
      return;
    }
    egui::Window::new("Selection")
      .anchor(Align2::RIGHT_TOP, [-12., 12.])
      .title_bar(false)
      .resizable(false)
      .collapsible(false)
      .show(ctx, |ui| self.summary.ui(ui));
  }

  fn notice_window(&mut self, ctx: &egui::Context) {
    let Some(notice) = self.notice.clone() else {
      return;
    };
    let mut open = true;
    let mut dismissed = false;
    egui::Window::new("Not available")
      .anchor(Align2::CENTER_TOP, [0., 24.])
      .collapsible(false)
      .resizable(false)
      .open(&mut open)
      .show(ctx, |ui| {
        ui.label(notice);
        dismissed = ui.button("OK").clicked();
      });
    if !open || dismissed {
      self.notice = None;
    }
  }

  fn update(&mut self, ctx: &egui::Context, config: &Config) {
    if !self.compact_checked {
      #[allow(deprecated)]
      let width = ctx.screen_rect().width();
      self.panel.apply_compact_default(width);
      self.compact_checked = true;
    }

    egui::CentralPanel::default()
      .frame(egui::Frame::NONE)
      .show(ctx, |ui| {
        (&mut self.map).ui(ui);
      });

    if let Some(action) = self.control_panel(ctx) {
      info!("Control panel: {action:?}");
      self.apply(action, config);
    }
    self.summary_window(ctx);
    self.notice_window(ctx);
  }
}

enum Screen {
  Ready(Box<Viewer>),
  /// The dataset could not be loaded. Keeps the layout store for the next attempt.
  Failed {
    message: String,
    store: Option<Box<dyn KeyValueStore>>,
  },
}

/// Holds the UI data of journey-atlas.
pub struct AtlasApp {
  ctx: egui::Context,
  config: Config,
  screen: Screen,
}

impl AtlasApp {
  /// Loads the configured dataset and restores the panel layout from the config directory.
  #[must_use]
  pub fn new(ctx: egui::Context, config: Config) -> Self {
    let store: Box<dyn KeyValueStore> = match config.ui_state_path() {
      Some(path) => Box::new(FileStore::open(&path)),
      None => Box::new(MemoryStore::new()),
    };
    let atlas = Atlas::load(config.atlas_path.as_deref());
    Self::with_atlas(ctx, config, atlas, store)
  }

  #[must_use]
  pub fn with_atlas(
    ctx: egui::Context,
    config: Config,
    atlas: Result<Atlas, AtlasError>,
    store: Box<dyn KeyValueStore>,
  ) -> Self {
    let screen = Self::screen_for(&ctx, &config, atlas, store);
    Self { ctx, config, screen }
  }

  fn screen_for(
    ctx: &egui::Context,
    config: &Config,
    atlas: Result<Atlas, AtlasError>,
    store: Box<dyn KeyValueStore>,
  ) -> Screen {
    match atlas {
      Ok(atlas) => Screen::Ready(Box::new(Viewer::new(ctx, config, atlas, store))),
      Err(e) => {
        error!("Failed to start: {e}");
        Screen::Failed {
          message: e.to_string(),
          store: Some(store),
        }
      }
    }
  }

  #[must_use]
  pub fn is_ready(&self) -> bool {
    matches!(self.screen, Screen::Ready(_))
  }

  /// Loads the dataset again after a failed start.
  pub fn reload(&mut self) {
    let Screen::Failed { store, .. } = &mut self.screen else {
      return;
    };
    let Some(store) = store.take() else {
      return;
    };
    info!("Reloading dataset.");
    let atlas = Atlas::load(self.config.atlas_path.as_deref());
    self.screen = Self::screen_for(&self.ctx, &self.config, atlas, store);
  }

  fn error_screen(ui: &mut Ui, message: &str) -> bool {
    let mut reload = false;
    ui.vertical_centered(|ui| {
      ui.add_space(ui.available_height() / 3.);
      ui.heading("The map could not be started");
      ui.label(RichText::new(message).color(ui.visuals().error_fg_color));
      ui.add_space(12.);
      reload = ui.button("Reload").clicked();
    });
    reload
  }
}

impl eframe::App for AtlasApp {
  // Required by eframe; the frame is drawn in `update`, which eframe still calls.
  fn ui(&mut self, _ui: &mut Ui, _frame: &mut eframe::Frame) {}

  fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
    match &mut self.screen {
      Screen::Ready(viewer) => viewer.update(ctx, &self.config),
      Screen::Failed { message, .. } => {
        let message = message.clone();
        let reload = egui::CentralPanel::default()
          .show(ctx, |ui| Self::error_screen(ui, &message))
          .inner;
        if reload {
          self.reload();
        }
      }
    }
  }
}
