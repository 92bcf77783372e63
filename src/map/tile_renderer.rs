use egui::ColorImage;
use thiserror::Error;

use super::coordinates::Tile;

#[derive(Error, Debug)]
pub enum TileRenderError {
  #[error("Failed to decode {tile:?}: {reason}")]
  ImageDecode { tile: Tile, reason: String },
}

/// Turns downloaded tile bytes into an image egui can upload as a texture.
pub trait TileRenderer: Send + Sync {
  /// # Errors
  /// Fails if `data` is not a decodable image.
  fn render(&self, tile: &Tile, data: &[u8]) -> Result<ColorImage, TileRenderError>;

  fn name(&self) -> &'static str;
}

/// Decodes PNG and JPEG tiles, e.g. satellite imagery.
#[derive(Debug, Clone, Default)]
pub struct RasterTileRenderer;

impl RasterTileRenderer {
  #[must_use]
  pub fn new() -> Self {
    Self
  }
}

impl TileRenderer for RasterTileRenderer {
  fn render(&self, tile: &Tile, data: &[u8]) -> Result<ColorImage, TileRenderError> {
    let decode_error = |e: &dyn std::fmt::Display| TileRenderError::ImageDecode {
      tile: *tile,
      reason: e.to_string(),
    };

    let img = image::ImageReader::new(std::io::Cursor::new(data))
      .with_guessed_format()
      .map_err(|e| decode_error(&e))?
      .decode()
      .map_err(|e| decode_error(&e))?;

    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    log::trace!("Decoded {tile:?} with size {size:?}");
    Ok(ColorImage::from_rgba_unmultiplied(
      size,
      rgba.as_flat_samples().as_slice(),
    ))
  }

  fn name(&self) -> &'static str {
    "Raster"
  }
}
