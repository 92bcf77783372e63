use std::time::Duration;

use egui::{Key, Response, TextEdit, Ui};

use crate::selection::{MIN_QUERY_CHARS, SearchQuery};

/// What the search field asks the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
  Run(String),
  Clear,
}

/// The search field with its pending debounce timer.
///
/// Time is passed in as seconds of the egui input clock, so the handler has no clock of its own.
#[derive(Debug)]
pub struct SearchInput {
  text: String,
  debounce: f64,
  /// When the scheduled search fires. `None` if nothing is scheduled.
  deadline: Option<f64>,
}

impl SearchInput {
  #[must_use]
  pub fn new(debounce: Duration) -> Self {
    Self {
      text: String::new(),
      debounce: debounce.as_secs_f64(),
      deadline: None,
    }
  }

  #[must_use]
  pub fn text(&self) -> &str {
    &self.text
  }

  #[must_use]
  pub fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  pub fn set_text(&mut self, text: impl Into<String>) {
    self.text = text.into();
  }

  /// The text changed at `now`. Cancels the pending search and schedules a new one if the query
  /// is long enough. An empty query asks for the map to be cleared right away.
  pub fn on_edit(&mut self, now: f64) -> Option<SearchAction> {
    self.deadline = None;
    match SearchQuery::parse(&self.text) {
      SearchQuery::Empty => Some(SearchAction::Clear),
      SearchQuery::TooShort => None,
      SearchQuery::Term(_) => {
        self.deadline = Some(now + self.debounce);
        None
      }
    }
  }

  /// Enter was pressed. Searches immediately if the query is long enough.
  pub fn on_confirm(&mut self) -> Option<SearchAction> {
    self.deadline = None;
    (self.text.trim().chars().count() >= MIN_QUERY_CHARS)
      .then(|| SearchAction::Run(self.text.clone()))
  }

  /// Fires the scheduled search once its deadline has passed.
  pub fn poll(&mut self, now: f64) -> Option<SearchAction> {
    let deadline = self.deadline?;
    if now < deadline {
      return None;
    }
    self.deadline = None;
    Some(SearchAction::Run(self.text.clone()))
  }

  /// Shows the field and returns what should happen this frame.
  pub fn ui(&mut self, ui: &mut Ui) -> Option<SearchAction> {
    let response: Response = ui.add(
      TextEdit::singleline(&mut self.text)
        .hint_text("Search places, journeys, books…")
        .desired_width(f32::INFINITY),
    );
    let now = ui.input(|i| i.time);

    let mut action = None;
    if response.changed() {
      action = self.on_edit(now);
    }
    if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
      action = self.on_confirm();
    }
    if action.is_none() {
      action = self.poll(now);
    }
    if let Some(deadline) = self.deadline {
      ui.ctx()
        .request_repaint_after(Duration::from_secs_f64((deadline - now).max(0.)));
    }
    action
  }
}
