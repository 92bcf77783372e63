use std::path::PathBuf;

use dirs::home_dir;
use log::error;

use crate::map::coordinates::WGS84Coordinate;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TileProvider {
  pub name: String,
  pub url: String,
  #[serde(default = "default_max_zoom")]
  pub max_zoom: u8,
}

fn default_max_zoom() -> u8 {
  19
}

/// Where the map starts and where "Recenter" goes.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct HomeView {
  pub lat: f32,
  pub lon: f32,
  /// Web map zoom level used when recentering.
  pub zoom: u8,
}

impl HomeView {
  #[must_use]
  pub fn coordinate(&self) -> WGS84Coordinate {
    WGS84Coordinate::new(self.lat, self.lon)
  }
}

impl Default for HomeView {
  fn default() -> Self {
    Self {
      lat: 31.7683,
      lon: 35.2137,
      zoom: 8,
    }
  }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  pub tile_provider: Vec<TileProvider>,
  pub tile_cache_dir: Option<PathBuf>,
  /// A dataset to use instead of the built-in one.
  pub atlas_path: Option<PathBuf>,
  pub home_view: HomeView,
  /// Web map zoom level at startup.
  pub initial_zoom: u8,
  pub search_debounce_ms: u64,
  /// Free pixels around a selection when the map is fitted to it.
  pub fit_padding: f32,
}

const CONFIG_ENV: &str = "JOURNEY_ATLAS_CONFIG";
const TILE_URL_ENV: &str = "JOURNEY_ATLAS_TILE_URL";
const TILE_CACHE_ENV: &str = "JOURNEY_ATLAS_TILE_CACHE_DIR";
const DATA_ENV: &str = "JOURNEY_ATLAS_DATA";

const SATELLITE_TILE_URL: &str =
  "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{zoom}/{y}/{x}";
const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{zoom}/{x}/{y}.png";

impl Config {
  /// Environment first, then the config file, then defaults. Writes a config file on first run.
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::default();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  /// Only what is set in the environment, everything else empty.
  fn from_env() -> Self {
    let env_path = |name: &str| std::env::var(name).ok().map(PathBuf::from);
    let tile_provider = std::env::var(TILE_URL_ENV)
      .ok()
      .map_or_else(Vec::new, |url| {
        vec![TileProvider {
          name: "ENV".to_string(),
          url,
          max_zoom: default_max_zoom(),
        }]
      });

    Self {
      config_path: env_path(CONFIG_ENV),
      tile_provider,
      tile_cache_dir: env_path(TILE_CACHE_ENV),
      atlas_path: env_path(DATA_ENV),
      ..Self::unset()
    }
  }

  /// A config where every value defers to the next source in [`Config::merge`].
  fn unset() -> Self {
    let default = Self::default();
    Self {
      config_path: None,
      tile_provider: Vec::new(),
      tile_cache_dir: None,
      atlas_path: None,
      ..default
    }
  }

  /// Fills what `self` leaves open from `other`. Tile providers are collected from both.
  fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    for tile in &other.tile_provider {
      if !self.tile_provider.iter().any(|t| t == tile) {
        self.tile_provider.push(tile.clone());
      }
    }
    self.tile_cache_dir = self.tile_cache_dir.or(other.tile_cache_dir.clone());
    self.atlas_path = self.atlas_path.or(other.atlas_path.clone());

    let default = Self::default();
    if self.home_view == default.home_view {
      self.home_view = other.home_view;
    }
    if self.initial_zoom == default.initial_zoom {
      self.initial_zoom = other.initial_zoom;
    }
    if self.search_debounce_ms == default.search_debounce_ms {
      self.search_debounce_ms = other.search_debounce_ms;
    }
    if (self.fit_padding - default.fit_padding).abs() < f32::EPSILON {
      self.fit_padding = other.fit_padding;
    }
    self
  }

  fn config_dir() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV)
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("journey-atlas")))
  }

  fn from_file() -> Option<Self> {
    let config_path = Self::config_dir()?.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    let Some(path) = &self.config_path else {
      return;
    };
    if !path.exists() {
      let _ = std::fs::create_dir_all(path).inspect_err(|e| {
        error!("Failed to create config directory: {e}");
      });
    }

    if let Some(cache) = &self.tile_cache_dir
      && !cache.exists()
    {
      let _ = std::fs::create_dir_all(cache).inspect_err(|e| {
        error!("Failed to create tile cache directory: {e}");
      });
    }

    let path = path.join("config.json");
    if !path.exists() {
      match serde_json::to_string_pretty(self) {
        Ok(config) => {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        }
        Err(e) => error!("Failed to serialize config: {e}"),
      }
    }
  }

  /// The file the panel layout is persisted in.
  #[must_use]
  pub fn ui_state_path(&self) -> Option<PathBuf> {
    self.config_path.as_ref().map(|p| p.join("ui_state.json"))
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      config_path: Self::config_dir(),
      tile_provider: vec![
        TileProvider {
          name: "ESRI World Imagery".to_string(),
          url: SATELLITE_TILE_URL.to_string(),
          max_zoom: 19,
        },
        TileProvider {
          name: "OpenStreetMap".to_string(),
          url: OSM_TILE_URL.to_string(),
          max_zoom: 19,
        },
      ],
      tile_cache_dir: home_dir().map(|p| p.join(".journey_atlas_tile_cache")),
      atlas_path: None,
      home_view: HomeView::default(),
      initial_zoom: 6,
      search_debounce_ms: 300,
      fit_padding: 50.,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_holy_land_view() {
    let config = Config::default();
    assert_eq!(config.home_view.zoom, 8);
    assert_eq!(config.initial_zoom, 6);
    assert_eq!(config.search_debounce_ms, 300);
    assert_eq!(config.tile_provider[0].name, "ESRI World Imagery");
  }

  #[test]
  fn merge_keeps_own_values_and_collects_providers() {
    let mut first = Config::unset();
    first.atlas_path = Some(PathBuf::from("/data/atlas.json"));
    first.tile_provider.push(TileProvider {
      name: "ENV".to_string(),
      url: "https://example.org/{zoom}/{x}/{y}.png".to_string(),
      max_zoom: 12,
    });
    let mut second = Config::default();
    second.search_debounce_ms = 500;
    second.atlas_path = Some(PathBuf::from("/other.json"));

    let merged = first.merge(&second);
    assert_eq!(merged.atlas_path, Some(PathBuf::from("/data/atlas.json")));
    assert_eq!(merged.search_debounce_ms, 500);
    assert_eq!(merged.tile_provider.len(), 3);
    assert_eq!(merged.tile_provider[0].name, "ENV");
  }

  #[test]
  fn partial_config_file_uses_defaults() {
    let config: Config = serde_json::from_str(r#"{ "search_debounce_ms": 150 }"#).unwrap();
    assert_eq!(config.search_debounce_ms, 150);
    assert_eq!(config.home_view, HomeView::default());
    assert!((config.fit_padding - 50.).abs() < f32::EPSILON);
  }
}
