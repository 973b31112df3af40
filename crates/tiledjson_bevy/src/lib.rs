//! # tiledjson_bevy
//!
//! Loads Tiled JSON maps (`.tmj`) as Bevy assets, with tileset and image
//! layer images resolved to `Handle<Image>`.

pub mod asset;
pub mod loader;
pub mod plugin;

pub use plugin::TiledJsonPlugin;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::asset::TiledJsonMap;
    pub use crate::loader::{TiledJsonLoaderError, TiledJsonMapLoader};
    pub use crate::plugin::TiledJsonPlugin;
    pub use tiledjson_assets::prelude::*;
}
