use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    mpsc::{Receiver, Sender},
  },
};

use egui::{ColorImage, Rect, Ui};
use log::{debug, error, info};

use super::layer::{Layer, LayerProperties};
use crate::{
  config::Config,
  map::{
    coordinates::{TILE_SIZE, Tile, TileCoordinate, Transform, tiles_in_box},
    tile_loader::{CachedTileLoader, TileLoader, TileSource},
    tile_renderer::{RasterTileRenderer, TileRenderer},
  },
};

const NAME: &str = "Tiles";

/// Loads the base map tiles in the background and draws them.
pub struct TileLayer {
  receiver: Receiver<(Tile, ColorImage)>,
  sender: Sender<(Tile, ColorImage)>,
  tile_loader_index: usize,
  tile_loader_old_index: usize,
  all_tile_loader: Vec<Arc<CachedTileLoader>>,
  loaded_tiles: HashMap<Tile, egui::TextureHandle>,
  in_flight_tiles: Arc<Mutex<HashSet<Tile>>>,
  renderer: Arc<dyn TileRenderer>,
  ctx: egui::Context,
  layer_properties: LayerProperties,
  tile_source: TileSource,
}

impl TileLayer {
  #[must_use]
  pub fn from_config(ctx: egui::Context, config: &Config) -> TileLayer {
    let (sender, receiver) = std::sync::mpsc::channel();
    let all_tile_loader: Vec<_> = CachedTileLoader::from_config(config)
      .map(Arc::new)
      .collect();
    if all_tile_loader.is_empty() {
      error!("No usable tile provider configured, the map stays blank.");
    }
    TileLayer {
      receiver,
      sender,
      tile_loader_index: 0,
      tile_loader_old_index: 0,
      all_tile_loader,
      loaded_tiles: HashMap::new(),
      in_flight_tiles: Arc::default(),
      renderer: Arc::new(RasterTileRenderer::new()),
      ctx,
      layer_properties: LayerProperties::default(),
      tile_source: TileSource::All,
    }
  }

  fn tile_loader(&self) -> Option<Arc<CachedTileLoader>> {
    self.all_tile_loader.get(self.tile_loader_index).cloned()
  }

  fn in_flight(&self) -> MutexGuard<'_, HashSet<Tile>> {
    self
      .in_flight_tiles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn draw_tile(&self, ui: &Ui, rect: Rect, tile: &Tile, transform: &Transform) {
    if let Some(texture) = self.loaded_tiles.get(tile) {
      let (nw, se) = tile.position();
      let tile_rect = Rect::from_min_max(transform.apply(nw).into(), transform.apply(se).into());
      ui.painter_at(rect).image(
        texture.id(),
        tile_rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
      );
    }
  }

  /// Starts a background download unless the tile is loaded or already on its way.
  fn get_tile(&self, tile: Tile) {
    let Some(tile_loader) = self.tile_loader() else {
      return;
    };
    if tile.zoom > tile_loader.max_zoom() || self.loaded_tiles.contains_key(&tile) {
      return;
    }
    if !self.in_flight().insert(tile) {
      return;
    }

    let sender = self.sender.clone();
    let ctx = self.ctx.clone();
    let tile_source = self.tile_source;
    let renderer = self.renderer.clone();
    let in_flight_tiles = self.in_flight_tiles.clone();

    tokio::spawn(async move {
      let image = match tile_loader.tile_data(&tile, tile_source).await {
        Ok(data) => renderer.render(&tile, &data).map_err(anyhow::Error::from),
        Err(e) => Err(e),
      };
      match image {
        Ok(image) => {
          if let Err(e) = sender.send((tile, image)) {
            error!("Failed to hand over {tile:?}: {e}");
          }
          ctx.request_repaint();
        }
        Err(e) => debug!("{tile:?} not loaded: {e}"),
      }
      in_flight_tiles
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&tile);
    });
  }

  fn collect_new_tile_data(&mut self, ui: &Ui) {
    for (tile, image) in self.receiver.try_iter() {
      let handle = ui.ctx().load_texture(
        format!("{}-{}-{}", tile.zoom, tile.x, tile.y),
        image,
        egui::TextureOptions::default(),
      );
      self.loaded_tiles.insert(tile, handle);
    }
  }
}

/// The zoom level whose tiles best match the current scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tile_zoom(transform: &Transform, rect: Rect) -> u8 {
  let level = (transform.zoom * (rect.width().max(rect.height()) / TILE_SIZE)).log2() + 2.;
  level.clamp(0., 24.) as u8
}

impl Layer for TileLayer {
  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect) {
    self.collect_new_tile_data(ui);
    if self.tile_loader_index != self.tile_loader_old_index {
      info!(
        "Tile provider switched, dropping {} tiles.",
        self.loaded_tiles.len()
      );
      self.loaded_tiles.clear();
      self.in_flight().clear();
      self.tile_loader_old_index = self.tile_loader_index;
    }

    if !self.visible() {
      return;
    }
    let Some(tile_loader) = self.tile_loader() else {
      return;
    };

    let zoom = tile_zoom(transform, rect).min(tile_loader.max_zoom());
    let inv = transform.invert();
    let min_pos = TileCoordinate::from_pixel_position(inv.apply(rect.min.into()), zoom);
    let max_pos = TileCoordinate::from_pixel_position(inv.apply(rect.max.into()), zoom);

    for tile in tiles_in_box(min_pos, max_pos) {
      self.get_tile(tile);
    }

    // Coarser parents stand in for missing tiles and are drawn first.
    let mut tiles_to_draw = tiles_in_box(min_pos, max_pos)
      .filter_map(|mut tile| {
        while !self.loaded_tiles.contains_key(&tile) {
          tile = tile.parent()?;
        }
        Some(tile)
      })
      .collect::<Vec<_>>();
    tiles_to_draw.sort_unstable_by_key(|tile| tile.zoom);
    tiles_to_draw.dedup();

    for tile in tiles_to_draw {
      self.draw_tile(ui, rect, &tile, transform);
    }
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

  fn ui_content(&mut self, ui: &mut Ui) {
    let selected = self
      .tile_loader()
      .map_or_else(|| "none".to_string(), |l| l.name().to_string());
    egui::ComboBox::from_label("tile provider")
      .selected_text(selected)
      .show_ui(ui, |ui| {
        for (i, tile_loader) in self.all_tile_loader.iter().enumerate() {
          ui.selectable_value(&mut self.tile_loader_index, i, tile_loader.name());
        }
      });
    egui::ComboBox::from_label("tile source")
      .selected_text(self.tile_source.to_string())
      .show_ui(ui, |ui| {
        for s in [TileSource::All, TileSource::Cache, TileSource::Download] {
          ui.selectable_value(&mut self.tile_source, s, s.to_string());
        }
      });
    ui.label(format!("Tiles loaded: {}", self.loaded_tiles.len()));
  }
}
