use std::sync::Arc;

use log::{debug, info};

use crate::{
  atlas::Atlas,
  map::surface::{MapSurface, PathStyle},
  summary::SummaryView,
};

mod resolve;

pub use resolve::{
  ALL_LOCATIONS_SUBTITLE, ALL_LOCATIONS_TITLE, CoordinateKey, JourneyLegs, NO_RESULTS,
  SelectionEntry, SelectionResult, resolve_all, resolve_journey, resolve_search, resolve_section,
};

/// Queries shorter than this many characters are not searched.
pub const MIN_QUERY_CHARS: usize = 2;

/// What is currently on the map.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
  #[default]
  Idle,
  Rendered(SelectionResult),
}

/// The result of selecting a document section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOutcome {
  Shown,
  /// No section with this key exists. The map has been cleared.
  NotAvailable,
}

/// A raw search field value, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
  /// Nothing but whitespace.
  Empty,
  /// Too short to search for.
  TooShort,
  /// Trimmed and lowercased.
  Term(String),
}

impl SearchQuery {
  #[must_use]
  pub fn parse(raw: &str) -> Self {
    let term = raw.trim().to_lowercase();
    match term.chars().count() {
      0 => Self::Empty,
      n if n < MIN_QUERY_CHARS => Self::TooShort,
      _ => Self::Term(term),
    }
  }
}

/// Resolves user actions into map content. Every action replaces what was drawn before.
pub struct SelectionPipeline {
  atlas: Arc<Atlas>,
  current: Selection,
}

impl SelectionPipeline {
  #[must_use]
  pub fn new(atlas: Arc<Atlas>) -> Self {
    Self {
      atlas,
      current: Selection::Idle,
    }
  }

  #[must_use]
  pub fn atlas(&self) -> &Atlas {
    &self.atlas
  }

  #[must_use]
  pub fn current(&self) -> &Selection {
    &self.current
  }

  /// Shows a journey with its outbound and return paths. Unknown keys leave the map empty.
  pub fn select_journey(
    &mut self,
    key: &str,
    surface: &mut dyn MapSurface,
    summary: &mut SummaryView,
  ) {
    self.clear(surface, summary);
    let Some(journey) = self.atlas.journey(key) else {
      debug!("No journey '{key}'.");
      return;
    };
    let result = resolve_journey(journey);
    self.render(result, surface, summary);
  }

  pub fn select_document_section(
    &mut self,
    key: &str,
    surface: &mut dyn MapSurface,
    summary: &mut SummaryView,
  ) -> SectionOutcome {
    self.clear(surface, summary);
    let Some(section) = self.atlas.section(key) else {
      info!("Section '{key}' is not available yet.");
      return SectionOutcome::NotAvailable;
    };
    let result = resolve_section(section);
    self.render(result, surface, summary);
    SectionOutcome::Shown
  }

  pub fn select_all(&mut self, surface: &mut dyn MapSurface, summary: &mut SummaryView) {
    self.clear(surface, summary);
    let result = resolve_all(&self.atlas);
    self.render(result, surface, summary);
  }

  /// Searches all journeys and sections. An empty query clears the map, a too short one is
  /// ignored.
  pub fn search(&mut self, query: &str, surface: &mut dyn MapSurface, summary: &mut SummaryView) {
    match SearchQuery::parse(query) {
      SearchQuery::Empty => self.clear(surface, summary),
      SearchQuery::TooShort => debug!("Ignoring short query '{query}'."),
      SearchQuery::Term(term) => {
        self.clear(surface, summary);
        let result = resolve_search(&self.atlas, &term);
        debug!("'{term}' matched {} locations.", result.count());
        self.render(result, surface, summary);
      }
    }
  }

  pub fn clear(&mut self, surface: &mut dyn MapSurface, summary: &mut SummaryView) {
    surface.clear_all();
    summary.dismiss();
    self.current = Selection::Idle;
  }

  fn render(
    &mut self,
    result: SelectionResult,
    surface: &mut dyn MapSurface,
    summary: &mut SummaryView,
  ) {
    for entry in &result.entries {
      surface.place_marker(&entry.location, &entry.color);
    }
    if let Some(legs) = &result.legs {
      surface.draw_path(&legs.outbound, PathStyle::outbound(&legs.color));
      surface.draw_path(&legs.return_leg, PathStyle::return_leg(&legs.return_color));
    }
    summary.present(&result.title, result.subtitle.as_deref(), result.count());
    surface.fit_to(&result.viewport());
    self.current = Selection::Rendered(result);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case("", SearchQuery::Empty)]
  #[case("   ", SearchQuery::Empty)]
  #[case("a", SearchQuery::TooShort)]
  #[case(" é ", SearchQuery::TooShort)]
  #[case("éé", SearchQuery::Term("éé".to_string()))]
  #[case("  BethLehem ", SearchQuery::Term("bethlehem".to_string()))]
  fn queries_are_normalized(#[case] raw: &str, #[case] expected: SearchQuery) {
    assert_eq!(SearchQuery::parse(raw), expected);
  }
}
