pub mod atlas;
pub mod atlas_ui;
pub mod chrome;
pub mod config;
pub mod map;
pub mod search_input;
pub mod selection;
pub mod summary;
