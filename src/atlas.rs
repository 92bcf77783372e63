use std::{collections::HashSet, path::Path};

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::map::coordinates::WGS84Coordinate;

pub mod color;

/// The dataset compiled into the binary.
const EMBEDDED_ATLAS: &str = include_str!("../data/atlas.json");

#[derive(Debug, Error)]
pub enum AtlasError {
  #[error("Failed to read dataset {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("Malformed dataset: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("Journey '{0}' is declared twice.")]
  DuplicateJourney(String),
  #[error("Section '{0}' is declared twice.")]
  DuplicateSection(String),
  #[error("Location '{name}' in '{owner}' has invalid coordinates ({lat}, {lng}).")]
  InvalidCoordinate {
    owner: String,
    name: String,
    lat: f64,
    lng: f64,
  },
}

/// A place on the map together with the text shown in its popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
  pub name: String,
  #[serde(rename = "lat")]
  pub latitude: f64,
  #[serde(rename = "lng")]
  pub longitude: f64,
  #[serde(default)]
  pub emoji: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub events: Vec<String>,
  /// Position within a journey, shown as a badge on the marker.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order: Option<u32>,
  #[serde(default, rename = "isReturn")]
  pub is_return_leg: bool,
}

impl LocationRecord {
  #[must_use]
  pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
    Self {
      name: name.into(),
      latitude,
      longitude,
      emoji: String::new(),
      description: String::new(),
      events: Vec::new(),
      order: None,
      is_return_leg: false,
    }
  }

  #[must_use]
  pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
    self.emoji = emoji.into();
    self
  }

  #[must_use]
  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  #[must_use]
  pub fn with_events(mut self, events: Vec<String>) -> Self {
    self.events = events;
    self
  }

  #[must_use]
  pub fn with_order(mut self, order: u32) -> Self {
    self.order = Some(order);
    self
  }

  #[must_use]
  pub fn on_return_leg(mut self) -> Self {
    self.is_return_leg = true;
    self
  }

  /// The position on the map. Precision beyond `f32` is not visible on screen.
  #[must_use]
  #[allow(clippy::cast_possible_truncation)]
  pub fn coordinate(&self) -> WGS84Coordinate {
    WGS84Coordinate::new(self.latitude as f32, self.longitude as f32)
  }

  /// Case-insensitive containment in name or description. `needle` must be lowercase.
  #[must_use]
  pub fn mentions(&self, needle: &str) -> bool {
    self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
  }

  fn has_valid_coordinate(&self) -> bool {
    self.latitude.is_finite()
      && self.longitude.is_finite()
      && self.latitude.abs() <= 90.
      && self.longitude.abs() <= 180.
  }
}

/// An ordered route, optionally with a return leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
  pub key: String,
  pub title: String,
  #[serde(default)]
  pub period: String,
  pub color: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub return_color: Option<String>,
  pub locations: Vec<LocationRecord>,
}

impl Journey {
  /// The color of the dashed return leg.
  #[must_use]
  pub fn return_color(&self) -> &str {
    self
      .return_color
      .as_deref()
      .unwrap_or(color::RETURN_LEG_FALLBACK)
  }
}

fn default_group() -> String {
  "Other".to_string()
}

/// The places mentioned in one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
  pub key: String,
  pub color: String,
  #[serde(default)]
  pub period: String,
  /// The tab this section is listed under.
  #[serde(default = "default_group")]
  pub group: String,
  pub locations: Vec<LocationRecord>,
}

/// All journeys and sections, in declaration order. Read-only after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atlas {
  #[serde(default)]
  pub journeys: Vec<Journey>,
  #[serde(default)]
  pub sections: Vec<DocumentSection>,
  /// Books listed in the interface, including those without locations yet.
  #[serde(default)]
  pub shelves: Vec<Shelf>,
}

/// The books of one tab, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
  pub group: String,
  pub books: Vec<String>,
}

impl Atlas {
  /// Loads the dataset from `path`, or the embedded one if no path is given.
  ///
  /// # Errors
  /// Fails if the file cannot be read, is not valid JSON or does not validate.
  pub fn load(path: Option<&Path>) -> Result<Self, AtlasError> {
    let atlas = if let Some(path) = path {
      info!("Loading dataset from {}", path.display());
      let content = std::fs::read_to_string(path).map_err(|source| AtlasError::Io {
        path: path.display().to_string(),
        source,
      })?;
      Self::from_json(&content)?
    } else {
      Self::from_json(EMBEDDED_ATLAS)?
    };
    debug!(
      "Dataset has {} journeys and {} sections.",
      atlas.journeys.len(),
      atlas.sections.len()
    );
    Ok(atlas)
  }

  /// Parses and validates a dataset.
  ///
  /// # Errors
  /// See [`Atlas::load`].
  pub fn from_json(json: &str) -> Result<Self, AtlasError> {
    let atlas: Self = serde_json::from_str(json)?;
    atlas.validate()?;
    Ok(atlas)
  }

  fn validate(&self) -> Result<(), AtlasError> {
    let mut keys = HashSet::new();
    for journey in &self.journeys {
      if !keys.insert(journey.key.as_str()) {
        return Err(AtlasError::DuplicateJourney(journey.key.clone()));
      }
      check_coordinates(&journey.key, &journey.locations)?;
    }

    let mut keys = HashSet::new();
    for section in &self.sections {
      if !keys.insert(section.key.as_str()) {
        return Err(AtlasError::DuplicateSection(section.key.clone()));
      }
      check_coordinates(&section.key, &section.locations)?;
    }
    Ok(())
  }

  #[must_use]
  pub fn journey(&self, key: &str) -> Option<&Journey> {
    self.journeys.iter().find(|j| j.key == key)
  }

  #[must_use]
  pub fn section(&self, key: &str) -> Option<&DocumentSection> {
    self.sections.iter().find(|s| s.key == key)
  }

  /// Tabs in order of first appearance, shelves before sections.
  #[must_use]
  pub fn groups(&self) -> Vec<&str> {
    let mut groups: Vec<&str> = Vec::new();
    let declared = self.shelves.iter().map(|s| s.group.as_str());
    for group in declared.chain(self.sections.iter().map(|s| s.group.as_str())) {
      if !groups.contains(&group) {
        groups.push(group);
      }
    }
    groups
  }

  /// Book keys listed under `group`: shelved books first, then sections missing from the shelf.
  #[must_use]
  pub fn books_in<'a>(&'a self, group: &str) -> Vec<&'a str> {
    let mut books: Vec<&str> = self
      .shelves
      .iter()
      .filter(|s| s.group == group)
      .flat_map(|s| s.books.iter().map(String::as_str))
      .unique()
      .collect();
    for section in self.sections.iter().filter(|s| s.group == group) {
      if !books.contains(&section.key.as_str()) {
        books.push(&section.key);
      }
    }
    books
  }
}

fn check_coordinates(owner: &str, locations: &[LocationRecord]) -> Result<(), AtlasError> {
  match locations.iter().find(|l| !l.has_valid_coordinate()) {
    Some(bad) => Err(AtlasError::InvalidCoordinate {
      owner: owner.to_string(),
      name: bad.name.clone(),
      lat: bad.latitude,
      lng: bad.longitude,
    }),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_dataset_is_valid() {
    let atlas = Atlas::load(None).unwrap();
    assert!(!atlas.journeys.is_empty());
    assert!(!atlas.sections.is_empty());
    assert_eq!(
      atlas.groups(),
      vec!["Old Testament", "New Testament", "Revelation"]
    );
  }

  #[test]
  fn shelves_list_books_without_locations() {
    let atlas = Atlas::load(None).unwrap();
    let books = atlas.books_in("Old Testament");
    assert_eq!(books[0], "Genesis");
    assert!(books.contains(&"Leviticus"));
    assert!(atlas.section("Leviticus").is_none());
    assert!(atlas.books_in("Apocrypha").is_empty());
  }

  #[test]
  fn unshelved_sections_are_listed_after_shelved_books() {
    let json = r#"{ "sections": [
      { "key": "Ruth", "color": "gold", "group": "Writings", "locations": [] },
      { "key": "Job", "color": "gold", "group": "Writings", "locations": [] } ],
      "shelves": [ { "group": "Writings", "books": ["Job", "Psalms", "Job"] } ] }"#;
    let atlas = Atlas::from_json(json).unwrap();
    assert_eq!(atlas.groups(), vec!["Writings"]);
    assert_eq!(atlas.books_in("Writings"), vec!["Job", "Psalms", "Ruth"]);
  }

  #[test]
  fn record_defaults() {
    let json = r#"{ "journeys": [ { "key": "a", "title": "A", "color": "red",
      "locations": [ { "name": "X", "lat": 1.5, "lng": 2.5 } ] } ] }"#;
    let atlas = Atlas::from_json(json).unwrap();
    let journey = atlas.journey("a").unwrap();
    assert_eq!(journey.period, "");
    assert_eq!(journey.return_color(), "#FFA500");
    let record = &journey.locations[0];
    assert!(record.events.is_empty());
    assert_eq!(record.order, None);
    assert!(!record.is_return_leg);
    assert!(atlas.sections.is_empty());
  }

  #[test]
  fn section_group_defaults_to_other() {
    let json = r#"{ "sections": [ { "key": "Ruth", "color": "gold", "locations": [] } ] }"#;
    let atlas = Atlas::from_json(json).unwrap();
    assert_eq!(atlas.section("Ruth").unwrap().group, "Other");
    assert!(atlas.section("Esther").is_none());
  }

  #[test]
  fn duplicate_keys_are_rejected() {
    let json = r#"{ "journeys": [
      { "key": "a", "title": "A", "color": "red", "locations": [] },
      { "key": "a", "title": "B", "color": "red", "locations": [] } ] }"#;
    assert!(matches!(
      Atlas::from_json(json),
      Err(AtlasError::DuplicateJourney(k)) if k == "a"
    ));

    let json = r#"{ "sections": [
      { "key": "Acts", "color": "red", "locations": [] },
      { "key": "Acts", "color": "red", "locations": [] } ] }"#;
    assert!(matches!(
      Atlas::from_json(json),
      Err(AtlasError::DuplicateSection(k)) if k == "Acts"
    ));
  }

  #[test]
  fn out_of_range_coordinates_are_rejected() {
    let json = r#"{ "sections": [ { "key": "Acts", "color": "red",
      "locations": [ { "name": "Nowhere", "lat": 91.0, "lng": 0.0 } ] } ] }"#;
    let err = Atlas::from_json(json).unwrap_err();
    assert!(matches!(err, AtlasError::InvalidCoordinate { ref name, .. } if name == "Nowhere"));
  }

  #[test]
  fn malformed_json_is_a_parse_error() {
    assert!(matches!(
      Atlas::from_json("{ \"journeys\": [ }"),
      Err(AtlasError::Parse(_))
    ));
  }

  #[test]
  fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Atlas::load(Some(&dir.path().join("missing.json"))).unwrap_err();
    assert!(matches!(err, AtlasError::Io { .. }));
  }

  #[test]
  fn mentions_is_case_insensitive_on_lowercase_needle() {
    let record = LocationRecord::new("Bethlehem", 31.7054, 35.2024)
      .with_description("Birthplace of David");
    assert!(record.mentions("bethle"));
    assert!(record.mentions("david"));
    assert!(!record.mentions("nazareth"));
  }
}
