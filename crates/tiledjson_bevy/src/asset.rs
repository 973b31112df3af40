use std::ops::Deref;

use bevy::prelude::*;
use tiledjson_assets::TileMap;

/// A decoded Tiled JSON map whose images are Bevy asset handles.
///
/// The image handles are registered as load dependencies, so
/// `AssetServer::is_loaded_with_dependencies` waits for every tileset and
/// image layer image. Dropping the asset drops the handles.
#[derive(TypePath, Asset, Debug)]
pub struct TiledJsonMap {
    pub map: TileMap<Handle<Image>>,
}

impl Deref for TiledJsonMap {
    type Target = TileMap<Handle<Image>>;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}
