/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// The map widget.
pub mod map_view;
/// What the selection pipeline draws on.
pub mod surface;
/// Downloading and caching of map tiles.
pub mod tile_loader;
/// Decoding of map tiles.
pub mod tile_renderer;
