use std::{collections::HashSet, sync::Arc};

use journey_atlas::{
  atlas::{Atlas, DocumentSection, Journey, LocationRecord},
  map::{
    coordinates::WGS84Coordinate,
    map_view::SelectionLayer,
    surface::{Leg, MapSurface, MarkerHandle, PathHandle, PathStyle},
  },
  selection::{CoordinateKey, NO_RESULTS, SectionOutcome, Selection, SelectionPipeline},
  summary::SummaryView,
};
use rstest::rstest;

/// Everything the pipeline asked the map to do.
#[derive(Debug, Clone, PartialEq)]
enum Call {
  Marker { name: String, color: String },
  Path { points: usize, leg: Leg, color: String },
  Clear,
  Fit(usize),
}

#[derive(Default)]
struct RecordingSurface {
  calls: Vec<Call>,
  markers: usize,
  paths: usize,
}

impl RecordingSurface {
  fn markers(&self) -> Vec<(&str, &str)> {
    self
      .calls
      .iter()
      .filter_map(|c| match c {
        Call::Marker { name, color } => Some((name.as_str(), color.as_str())),
        _ => None,
      })
      .collect()
  }

  fn paths(&self) -> Vec<(usize, Leg, &str)> {
    self
      .calls
      .iter()
      .filter_map(|c| match c {
        Call::Path { points, leg, color } => Some((*points, *leg, color.as_str())),
        _ => None,
      })
      .collect()
  }
}

impl MapSurface for RecordingSurface {
  fn place_marker(&mut self, record: &LocationRecord, color: &str) -> MarkerHandle {
    self.calls.push(Call::Marker {
      name: record.name.clone(),
      color: color.to_string(),
    });
    self.markers += 1;
    MarkerHandle(self.markers - 1)
  }

  fn draw_path(&mut self, coordinates: &[WGS84Coordinate], style: PathStyle) -> Option<PathHandle> {
    if coordinates.len() < 2 {
      return None;
    }
    self.calls.push(Call::Path {
      points: coordinates.len(),
      leg: style.leg,
      color: style.color,
    });
    self.paths += 1;
    Some(PathHandle(self.paths - 1))
  }

  fn clear_all(&mut self) {
    self.calls.clear();
    self.calls.push(Call::Clear);
    self.markers = 0;
    self.paths = 0;
  }

  fn fit_to(&mut self, coordinates: &[WGS84Coordinate]) {
    if !coordinates.is_empty() {
      self.calls.push(Call::Fit(coordinates.len()));
    }
  }
}

fn embedded() -> Arc<Atlas> {
  Arc::new(Atlas::load(None).unwrap())
}

fn journey(key: &str, color: &str, locations: Vec<LocationRecord>) -> Journey {
  Journey {
    key: key.to_string(),
    title: format!("Journey {key}"),
    period: String::new(),
    color: color.to_string(),
    return_color: None,
    locations,
  }
}

fn section(key: &str, color: &str, locations: Vec<LocationRecord>) -> DocumentSection {
  DocumentSection {
    key: key.to_string(),
    color: color.to_string(),
    period: String::new(),
    group: "Other".to_string(),
    locations,
  }
}

fn bethlehem() -> LocationRecord {
  LocationRecord::new("Bethlehem", 31.7054, 35.2024)
}

/// Two journeys that both visit Bethlehem, and a section that does too.
fn shared_waypoint_atlas() -> Arc<Atlas> {
  Arc::new(Atlas {
    journeys: vec![
      journey(
        "a",
        "#aa0000",
        vec![LocationRecord::new("Hebron", 31.5326, 35.0998), bethlehem()],
      ),
      journey(
        "b",
        "#0000bb",
        vec![bethlehem(), LocationRecord::new("Jerusalem", 31.7683, 35.2137)],
      ),
    ],
    sections: vec![section("Micah", "#00cc00", vec![bethlehem()])],
    shelves: Vec::new(),
  })
}

fn pipeline(atlas: Arc<Atlas>) -> (SelectionPipeline, RecordingSurface, SummaryView) {
  (
    SelectionPipeline::new(atlas),
    RecordingSurface::default(),
    SummaryView::new(),
  )
}

#[rstest]
#[case("abraham")]
#[case("exodus")]
#[case("jesus")]
#[case("paul1")]
#[case("paul2")]
#[case("paul3")]
fn journey_shows_every_location(#[case] key: &str) {
  let atlas = embedded();
  let expected = atlas.journey(key).unwrap().locations.len();
  let (mut pipeline, mut surface, mut summary) = pipeline(atlas);

  pipeline.select_journey(key, &mut surface, &mut summary);

  assert_eq!(surface.calls.first(), Some(&Call::Clear));
  assert_eq!(surface.markers().len(), expected);
  let paths = surface.paths();
  assert!(paths.len() <= 2);
  assert!(paths.iter().all(|(points, ..)| *points >= 2));
  assert_eq!(summary.summary().unwrap().count, expected);
  assert!(matches!(pipeline.current(), Selection::Rendered(r) if r.count() == expected));
}

#[test]
fn return_leg_is_dashed_in_its_own_color() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.select_journey("paul1", &mut surface, &mut summary);

  let paths = surface.paths();
  assert_eq!(paths.len(), 2);
  assert_eq!(paths[0].1, Leg::Outbound);
  assert_eq!(paths[1], (4, Leg::Return, "#F39C12"));
  assert_eq!(surface.calls.last(), Some(&Call::Fit(13)));
  assert_eq!(
    summary.summary().unwrap().subtitle.as_deref(),
    Some("AD 46-48")
  );
}

#[test]
fn short_legs_draw_no_path() {
  let atlas = Arc::new(Atlas {
    journeys: vec![journey(
      "short",
      "red",
      vec![
        LocationRecord::new("A", 1., 1.),
        LocationRecord::new("B", 2., 2.),
        LocationRecord::new("C", 3., 3.).on_return_leg(),
      ],
    )],
    ..Atlas::default()
  });
  let (mut pipeline, mut surface, mut summary) = pipeline(atlas);
  pipeline.select_journey("short", &mut surface, &mut summary);

  assert_eq!(surface.paths(), vec![(2, Leg::Outbound, "red")]);
  assert_eq!(surface.markers().len(), 3);
}

#[test]
fn unknown_journey_leaves_map_empty() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.select_all(&mut surface, &mut summary);
  pipeline.select_journey("moses", &mut surface, &mut summary);

  assert_eq!(surface.calls, vec![Call::Clear]);
  assert!(!summary.is_visible());
  assert_eq!(pipeline.current(), &Selection::Idle);
}

#[rstest]
#[case("Leviticus")]
#[case("genesis")]
#[case("")]
fn unknown_section_is_not_available(#[case] key: &str) {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.select_journey("exodus", &mut surface, &mut summary);

  let outcome = pipeline.select_document_section(key, &mut surface, &mut summary);

  assert_eq!(outcome, SectionOutcome::NotAvailable);
  assert_eq!(surface.calls, vec![Call::Clear]);
  assert!(!summary.is_visible());
  assert_eq!(pipeline.current(), &Selection::Idle);
}

#[test]
fn section_uses_its_color_and_period() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  let outcome = pipeline.select_document_section("Acts", &mut surface, &mut summary);

  assert_eq!(outcome, SectionOutcome::Shown);
  let markers = surface.markers();
  assert_eq!(markers.len(), 4);
  assert!(markers.iter().all(|(_, color)| *color == markers[0].1));
  assert!(surface.paths().is_empty());
  let shown = summary.summary().unwrap();
  assert_eq!(shown.title, "Acts");
  assert_eq!(shown.subtitle.as_deref(), Some("AD 30-62"));
}

#[rstest]
#[case("jer")]
#[case("paul")]
#[case("mount")]
#[case("  Antioch ")]
#[case("zzz")]
fn search_is_idempotent(#[case] query: &str) {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());

  pipeline.search(query, &mut surface, &mut summary);
  let first = pipeline.current().clone();
  let first_calls = surface.calls.clone();
  pipeline.search(query, &mut surface, &mut summary);

  assert_eq!(pipeline.current(), &first);
  assert_eq!(surface.calls, first_calls);
}

#[rstest]
#[case("an")]
#[case("je")]
#[case("paul")]
#[case("journey")]
#[case("testament")]
fn search_never_repeats_a_coordinate(#[case] query: &str) {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.search(query, &mut surface, &mut summary);

  let Selection::Rendered(result) = pipeline.current() else {
    panic!("search for '{query}' rendered nothing");
  };
  let keys: HashSet<_> = result
    .entries
    .iter()
    .map(|e| CoordinateKey::of(&e.location))
    .collect();
  assert_eq!(keys.len(), result.count());
  assert_eq!(surface.markers().len(), result.count());
}

#[test]
fn more_than_five_matches_are_truncated() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.search("paul", &mut surface, &mut summary);

  let shown = summary.summary().unwrap();
  assert!(shown.count > 5);
  let subtitle = shown.subtitle.as_deref().unwrap();
  let names = subtitle.strip_suffix("...").unwrap();
  let expected: Vec<String> = match pipeline.current() {
    Selection::Rendered(r) => r.entries[..5]
      .iter()
      .map(|e| e.location.name.clone())
      .collect(),
    Selection::Idle => panic!("nothing rendered"),
  };
  assert_eq!(names, expected.join(", "));
}

#[test]
fn up_to_five_matches_are_listed_completely() {
  let (mut pipeline, mut surface, mut summary) = pipeline(shared_waypoint_atlas());
  pipeline.search("e", &mut surface, &mut summary);
  assert_eq!(summary.summary(), None);

  pipeline.search("journey", &mut surface, &mut summary);
  let shown = summary.summary().unwrap();
  assert_eq!(shown.count, 3);
  assert_eq!(
    shown.subtitle.as_deref(),
    Some("Hebron, Bethlehem, Jerusalem")
  );
  assert_eq!(shown.title, "'journey' search results");
}

#[test]
fn first_color_wins_for_shared_coordinates() {
  let (mut pipeline, mut surface, mut summary) = pipeline(shared_waypoint_atlas());
  pipeline.search("bethlehem", &mut surface, &mut summary);

  assert_eq!(surface.markers(), vec![("Bethlehem", "#aa0000")]);
  assert_eq!(summary.summary().unwrap().count, 1);
  assert_eq!(surface.calls.last(), Some(&Call::Fit(1)));
}

#[test]
fn section_matches_follow_journey_matches() {
  let (mut pipeline, mut surface, mut summary) = pipeline(shared_waypoint_atlas());
  pipeline.search("MICAH", &mut surface, &mut summary);

  assert_eq!(surface.markers(), vec![("Bethlehem", "#00cc00")]);
}

#[test]
fn show_all_keeps_shared_waypoints() {
  let (mut pipeline, mut surface, mut summary) = pipeline(shared_waypoint_atlas());
  pipeline.select_all(&mut surface, &mut summary);

  assert_eq!(
    surface.markers(),
    vec![
      ("Hebron", "#aa0000"),
      ("Bethlehem", "#aa0000"),
      ("Bethlehem", "#0000bb"),
      ("Jerusalem", "#0000bb"),
    ]
  );
  let shown = summary.summary().unwrap();
  assert_eq!(shown.count, 4);
  assert_eq!(shown.title, "All Locations");
  assert_eq!(shown.subtitle.as_deref(), Some("All eras"));
  assert!(surface.paths().is_empty());
}

#[test]
fn single_character_query_changes_nothing() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.select_journey("jesus", &mut surface, &mut summary);
  let calls = surface.calls.clone();
  let shown = summary.summary().cloned();
  let current = pipeline.current().clone();

  pipeline.search("a", &mut surface, &mut summary);
  pipeline.search(" b ", &mut surface, &mut summary);

  assert_eq!(surface.calls, calls);
  assert_eq!(summary.summary().cloned(), shown);
  assert_eq!(pipeline.current(), &current);
}

#[test]
fn empty_query_clears_everything() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.search("jerusalem", &mut surface, &mut summary);
  assert!(summary.is_visible());

  pipeline.search("   ", &mut surface, &mut summary);

  assert_eq!(surface.calls, vec![Call::Clear]);
  assert!(!summary.is_visible());
  assert_eq!(pipeline.current(), &Selection::Idle);
}

#[test]
fn no_matches_shows_zero_without_fitting() {
  let (mut pipeline, mut surface, mut summary) = pipeline(embedded());
  pipeline.search("atlantis", &mut surface, &mut summary);

  assert_eq!(surface.calls, vec![Call::Clear]);
  let shown = summary.summary().unwrap();
  assert_eq!(shown.count, 0);
  assert_eq!(shown.subtitle.as_deref(), Some(NO_RESULTS));
}

#[test]
fn selection_layer_holds_exactly_the_latest_selection() {
  let mut pipeline = SelectionPipeline::new(embedded());
  let mut layer = SelectionLayer::new();
  let mut summary = SummaryView::new();

  pipeline.select_journey("paul2", &mut layer, &mut summary);
  assert_eq!(layer.markers().len(), 12);
  assert_eq!(layer.paths().len(), 1);
  assert!(layer.pending_fit().is_some());

  pipeline.select_document_section("Jonah", &mut layer, &mut summary);
  assert_eq!(layer.markers().len(), 1);
  assert!(layer.paths().is_empty());
  assert_eq!(layer.markers()[0].record.name, "Nineveh");

  pipeline.clear(&mut layer, &mut summary);
  assert!(layer.markers().is_empty());
  assert!(layer.pending_fit().is_none());
}
