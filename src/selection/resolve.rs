use std::collections::HashSet;

use crate::{
  atlas::{Atlas, DocumentSection, Journey, LocationRecord},
  map::coordinates::WGS84Coordinate,
};

pub const ALL_LOCATIONS_TITLE: &str = "All Locations";
pub const ALL_LOCATIONS_SUBTITLE: &str = "All eras";
pub const NO_RESULTS: &str = "No results found";
const SUBTITLE_NAMES: usize = 5;

/// A location together with the color it is drawn in.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
  pub location: LocationRecord,
  pub color: String,
}

/// The two polylines of a journey, split by [`LocationRecord::is_return_leg`].
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyLegs {
  pub outbound: Vec<WGS84Coordinate>,
  pub return_leg: Vec<WGS84Coordinate>,
  pub color: String,
  pub return_color: String,
}

/// Everything one user action puts on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
  pub title: String,
  pub subtitle: Option<String>,
  pub entries: Vec<SelectionEntry>,
  pub legs: Option<JourneyLegs>,
}

impl SelectionResult {
  #[must_use]
  pub fn count(&self) -> usize {
    self.entries.len()
  }

  /// The coordinates the viewport is fitted to.
  #[must_use]
  pub fn viewport(&self) -> Vec<WGS84Coordinate> {
    match &self.legs {
      Some(legs) => legs
        .outbound
        .iter()
        .chain(&legs.return_leg)
        .copied()
        .collect(),
      None => self.entries.iter().map(|e| e.location.coordinate()).collect(),
    }
  }
}

/// Exact identity of a position, independent of how it was formatted in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey(u64, u64);

impl CoordinateKey {
  #[must_use]
  pub fn of(location: &LocationRecord) -> Self {
    // -0.0 and 0.0 name the same position.
    let bits = |v: f64| (v + 0.0).to_bits();
    Self(bits(location.latitude), bits(location.longitude))
  }
}

fn non_empty(text: &str) -> Option<String> {
  (!text.is_empty()).then(|| text.to_string())
}

fn entries(locations: &[LocationRecord], color: &str) -> Vec<SelectionEntry> {
  locations
    .iter()
    .map(|location| SelectionEntry {
      location: location.clone(),
      color: color.to_string(),
    })
    .collect()
}

#[must_use]
pub fn resolve_journey(journey: &Journey) -> SelectionResult {
  let (ret, out): (Vec<_>, Vec<_>) = journey.locations.iter().partition(|l| l.is_return_leg);
  SelectionResult {
    title: journey.title.clone(),
    subtitle: non_empty(&journey.period),
    entries: entries(&journey.locations, &journey.color),
    legs: Some(JourneyLegs {
      outbound: out.into_iter().map(LocationRecord::coordinate).collect(),
      return_leg: ret.into_iter().map(LocationRecord::coordinate).collect(),
      color: journey.color.clone(),
      return_color: journey.return_color().to_string(),
    }),
  }
}

#[must_use]
pub fn resolve_section(section: &DocumentSection) -> SelectionResult {
  SelectionResult {
    title: section.key.clone(),
    subtitle: non_empty(&section.period),
    entries: entries(&section.locations, &section.color),
    legs: None,
  }
}

/// Every journey location, without removing shared waypoints.
#[must_use]
pub fn resolve_all(atlas: &Atlas) -> SelectionResult {
  SelectionResult {
    title: ALL_LOCATIONS_TITLE.to_string(),
    subtitle: Some(ALL_LOCATIONS_SUBTITLE.to_string()),
    entries: atlas
      .journeys
      .iter()
      .flat_map(|j| entries(&j.locations, &j.color))
      .collect(),
    legs: None,
  }
}

/// Collects matches in pass order, keeping the first color seen for each position.
#[derive(Default)]
struct Matches {
  seen: HashSet<CoordinateKey>,
  entries: Vec<SelectionEntry>,
}

impl Matches {
  fn add<'a>(&mut self, locations: impl IntoIterator<Item = &'a LocationRecord>, color: &str) {
    for location in locations {
      if self.seen.insert(CoordinateKey::of(location)) {
        self.entries.push(SelectionEntry {
          location: location.clone(),
          color: color.to_string(),
        });
      }
    }
  }
}

/// Finds all locations matching `term`, which must already be trimmed and lowercased.
///
/// Journeys are searched before sections. Within each, a matching title or key contributes all
/// its locations before single locations are matched by name or description.
#[must_use]
pub fn resolve_search(atlas: &Atlas, term: &str) -> SelectionResult {
  let mut matches = Matches::default();

  for journey in &atlas.journeys {
    if journey.title.to_lowercase().contains(term) {
      matches.add(&journey.locations, &journey.color);
    }
    matches.add(
      journey.locations.iter().filter(|l| l.mentions(term)),
      &journey.color,
    );
  }

  for section in &atlas.sections {
    if section.key.to_lowercase().contains(term) {
      matches.add(&section.locations, &section.color);
    }
    matches.add(
      section.locations.iter().filter(|l| l.mentions(term)),
      &section.color,
    );
  }

  let subtitle = if matches.entries.is_empty() {
    NO_RESULTS.to_string()
  } else {
    let names = matches
      .entries
      .iter()
      .take(SUBTITLE_NAMES)
      .map(|e| e.location.name.as_str())
      .collect::<Vec<_>>()
      .join(", ");
    if matches.entries.len() > SUBTITLE_NAMES {
      format!("{names}...")
    } else {
      names
    }
  };

  SelectionResult {
    title: format!("'{term}' search results"),
    subtitle: Some(subtitle),
    entries: matches.entries,
    legs: None,
  }
}
