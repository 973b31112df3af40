//! # tiledjson_assets
//!
//! Decoder for maps exported by the [Tiled](https://www.mapeditor.org) editor
//! in its JSON format.
//!
//! A map decodes into an owned tree: a [`TileMap`] holds its tilesets and an
//! ordered list of [`Layer`]s, and group layers hold further layers. Reading
//! files and loading images go through two collaborator traits,
//! [`DocumentReader`] and [`ImageLoader`], so the decoder runs equally well
//! against the filesystem, an in-memory fixture, or a game engine's asset
//! system.
//!
//! ```no_run
//! use glam::IVec2;
//!
//! let map = tiledjson_assets::load_map("assets/maps/level1.json")?;
//! if let Some(ground) = map.find_layer("ground") {
//!     let hp = map.property_int(ground, IVec2::new(3, 4), "hp");
//!     println!("tile hp: {hp}");
//! }
//! # Ok::<(), tiledjson_assets::DecodeError>(())
//! ```

pub mod assets;
pub mod config;
pub mod document;
pub mod error;
pub mod images;
pub mod lifecycle;
pub mod loaders;
pub mod paths;

use std::path::{Path, PathBuf};

pub use assets::grid::{GridPosition, TileRect};
pub use assets::layer::{Layer, LayerKind, LayerType, MapObject};
pub use assets::map::{TileMap, TileRef};
pub use assets::properties::{Properties, PropertyValue};
pub use assets::tileset::{Tile, TileSet};
pub use config::DecodeConfig;
pub use document::{DocumentReader, FsDocumentReader, MemoryDocuments};
pub use error::{DecodeError, DecodeResult, ImageError, ReadError, SetTileError};
pub use images::{ImageLoader, ImagePaths, ImageSize};
pub use loaders::MapLoader;

/// Decode the map at `path` from the filesystem with default settings.
///
/// Images are checked for existence and represented by their resolved paths.
pub fn load_map(path: impl AsRef<Path>) -> DecodeResult<TileMap<PathBuf>> {
    MapLoader::new(FsDocumentReader, ImagePaths).load_map(path)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assets::grid::{EMPTY_TILE, GridPosition, grid_to_pixel, pixel_to_grid};
    pub use crate::assets::layer::{
        GroupLayer, ImageLayer, Layer, LayerKind, LayerType, MapObject, ObjectLayer, TileLayer,
    };
    pub use crate::assets::map::{TileMap, TileRef};
    pub use crate::assets::properties::{FromProperty, Properties, PropertyValue};
    pub use crate::assets::tileset::{Tile, TileSet};
    pub use crate::config::DecodeConfig;
    pub use crate::document::{DocumentReader, FsDocumentReader};
    pub use crate::error::{DecodeError, SetTileError};
    pub use crate::images::{ImageLoader, ImagePaths, ImageSize};
    pub use crate::loaders::MapLoader;
}
