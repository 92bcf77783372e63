use std::collections::HashSet;
use std::fmt::Display;
use std::fs::{self, File};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{debug, error, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use surf::http::Method;
use surf::{Request, Url};
use surf_governor::GovernorMiddleware;
use thiserror::Error;

use crate::config::{Config, TileProvider};
use crate::map::coordinates::Tile;

/// Api keys must not end up in the name of the cache directory.
static API_KEY: Lazy<Option<Regex>> = Lazy::new(|| {
  Regex::new("[Kk]ey=([A-Za-z0-9-_]*)")
    .inspect_err(|e| error!("Api key pattern does not compile: {e}"))
    .ok()
});

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);
const REQUESTS_PER_SECOND: u32 = 10;

#[derive(Error, Debug)]
pub enum TileLoaderError {
  #[error("Tile {tile:?} not available.")]
  TileNotAvailable { tile: Tile },
  #[error("Download of {tile:?} already in progress.")]
  DownloadInProgress { tile: Tile },
}

/// The encoded image data of a tile.
pub type TileData = Vec<u8>;

/// Determines if a tile should be downloaded or loaded from the cache.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum TileSource {
  All,
  Download,
  Cache,
}

impl Display for TileSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TileSource::All => write!(f, "all"),
      TileSource::Download => write!(f, "download"),
      TileSource::Cache => write!(f, "cache"),
    }
  }
}

pub trait TileLoader {
  /// Fetches the encoded tile image.
  async fn tile_data(&self, tile: &Tile, source: TileSource) -> Result<TileData>;
}

#[derive(Debug, Clone)]
struct TileCache {
  base_path: Option<PathBuf>,
}

impl TileCache {
  fn path(&self, tile: &Tile) -> Option<PathBuf> {
    self
      .base_path
      .as_ref()
      .map(|b| b.join(format!("{}_{}_{}.png", tile.zoom, tile.x, tile.y)))
  }

  fn store(&self, tile: &Tile, data: &[u8]) {
    let Some(path) = self.path(tile) else {
      return;
    };
    if let Err(e) = File::create(&path).and_then(|mut f| f.write_all(data)) {
      debug!("Could not cache {tile:?} in {}: {e}", path.display());
    }
  }
}

impl TileLoader for TileCache {
  async fn tile_data(&self, tile: &Tile, source: TileSource) -> Result<TileData> {
    if source == TileSource::Download {
      return Err(TileLoaderError::TileNotAvailable { tile: *tile }.into());
    }
    match self.path(tile) {
      Some(p) if p.exists() => Ok(fs::read(p)?),
      _ => Err(TileLoaderError::TileNotAvailable { tile: *tile }.into()),
    }
  }
}

#[derive(Debug)]
struct TileDownloader {
  url_template: String,
  tiles_in_download: Arc<Mutex<HashSet<Tile>>>,
  client: surf::Client,
}

impl TileDownloader {
  fn from_url(url: &str) -> Result<Self> {
    let client: surf::Client = surf::Config::new()
      .set_timeout(Some(DOWNLOAD_TIMEOUT))
      .try_into()
      .map_err(|e| anyhow!("Failed to build http client: {e}"))?;
    let governor = GovernorMiddleware::per_second(REQUESTS_PER_SECOND)
      .map_err(|e| anyhow!("Failed to build rate limiter: {e}"))?;
    Ok(Self {
      url_template: url.to_string(),
      tiles_in_download: Arc::default(),
      client: client.with(governor),
    })
  }

  fn url_for(&self, tile: &Tile) -> String {
    tile_url(&self.url_template, tile)
  }

  fn in_download(&self) -> std::sync::MutexGuard<'_, HashSet<Tile>> {
    self
      .tiles_in_download
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  async fn fetch(&self, tile: &Tile) -> Result<TileData> {
    let url = Url::parse(&self.url_for(tile))?;
    let mut response = self
      .client
      .send(Request::new(Method::Get, url))
      .await
      .map_err(|e| anyhow!("Error when downloading {tile:?}: {e}"))?;
    if response.status() != 200 {
      warn!("Tile server answered {} for {tile:?}", response.status());
      return Err(TileLoaderError::TileNotAvailable { tile: *tile }.into());
    }
    response
      .body_bytes()
      .await
      .map_err(|e| anyhow!("Failed to read body of {tile:?}: {e}"))
  }
}

/// Fills the `{zoom}`/`{z}`, `{x}` and `{y}` placeholders of a tile url template.
#[must_use]
pub fn tile_url(template: &str, tile: &Tile) -> String {
  template
    .replace("{x}", &tile.x.to_string())
    .replace("{y}", &tile.y.to_string())
    .replace("{zoom}", &tile.zoom.to_string())
    .replace("{z}", &tile.zoom.to_string())
}

impl TileLoader for TileDownloader {
  async fn tile_data(&self, tile: &Tile, source: TileSource) -> Result<TileData> {
    if source == TileSource::Cache {
      return Err(TileLoaderError::TileNotAvailable { tile: *tile }.into());
    }

    if !self.in_download().insert(*tile) {
      return Err(TileLoaderError::DownloadInProgress { tile: *tile }.into());
    }

    let result = self.fetch(tile).await;
    self.in_download().remove(tile);
    debug!("Download of {tile:?} finished, success: {}", result.is_ok());
    result
  }
}

/// Loads tiles of one provider, first from disk and then from the network.
#[derive(Debug)]
pub struct CachedTileLoader {
  name: String,
  max_zoom: u8,
  tile_cache: TileCache,
  tile_loader: TileDownloader,
}

impl CachedTileLoader {
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[must_use]
  pub fn max_zoom(&self) -> u8 {
    self.max_zoom
  }

  /// One loader per configured provider. Providers whose loader cannot be built are skipped.
  pub fn from_config(config: &Config) -> impl Iterator<Item = Self> {
    config.tile_provider.iter().filter_map(|provider| {
      Self::from_provider(provider, config.tile_cache_dir.clone())
        .inspect_err(|e| error!("Skipping tile provider {}: {e}", provider.name))
        .ok()
    })
  }

  /// # Errors
  /// Fails if no http client can be built.
  pub fn from_provider(provider: &TileProvider, cache: Option<PathBuf>) -> Result<Self> {
    let tile_loader = TileDownloader::from_url(&provider.url)?;
    let base_path = cache.map(|p| p.join(cache_dir_name(&provider.url)));
    if let Some(path) = &base_path
      && !path.exists()
    {
      let _ = fs::create_dir_all(path).inspect_err(|e| {
        error!("Failed to create cache directory: {e}");
      });
    }

    Ok(Self {
      name: provider.name.clone(),
      max_zoom: provider.max_zoom,
      tile_cache: TileCache { base_path },
      tile_loader,
    })
  }

  async fn download(&self, tile: &Tile, source: TileSource) -> Result<TileData> {
    let data = self.tile_loader.tile_data(tile, source).await?;
    self.tile_cache.store(tile, &data);
    if data.len() <= 100 {
      return Err(TileLoaderError::TileNotAvailable { tile: *tile }.into());
    }
    Ok(data)
  }
}

/// Stable directory name for a tile url, with api keys masked.
fn cache_dir_name(url: &str) -> String {
  let masked = API_KEY
    .as_ref()
    .map_or_else(|| url.to_string(), |re| re.replace(url, "*").into_owned());
  let mut hasher = DefaultHasher::new();
  masked.hash(&mut hasher);
  hasher.finish().to_string()
}

impl TileLoader for CachedTileLoader {
  async fn tile_data(&self, tile: &Tile, source: TileSource) -> Result<TileData> {
    trace!("Loading {tile:?}");
    if let Ok(data) = self.tile_cache.tile_data(tile, source).await {
      debug!("cache_hit: {tile:?}");
      Ok(data)
    } else {
      debug!("cache_miss: {tile:?}");
      self.download(tile, source).await
    }
  }
}
