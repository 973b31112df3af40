use std::fs;
use std::path::{Path, PathBuf};

use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    prelude::*,
    tasks::ConditionalSendFuture,
};
use serde_json::Value;
use thiserror::Error;
use tiledjson_assets::{
    DecodeConfig, DecodeError, DocumentReader, ImageError, ImageLoader, MapLoader, ReadError,
};
use tracing::debug;

use crate::asset::TiledJsonMap;

/// Directory Bevy's default file source reads assets from.
pub const ASSET_ROOT: &str = "assets";

/// Asset loader for Tiled JSON maps (`.tmj` files)
///
/// The map itself is read through Bevy's asset reader. External tilesets
/// are read from the filesystem under [`ASSET_ROOT`], and every image is
/// requested through the load context so it arrives as a `Handle<Image>`.
#[derive(Default)]
pub struct TiledJsonMapLoader;

#[derive(Debug, Error)]
pub enum TiledJsonLoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode map: {0}")]
    Decode(#[from] DecodeError),
}

impl AssetLoader for TiledJsonMapLoader {
    type Asset = TiledJsonMap;
    type Settings = DecodeConfig;
    type Error = TiledJsonLoaderError;

    fn load(
        &self,
        reader: &mut dyn Reader,
        settings: &Self::Settings,
        load_context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;

            let map_path = load_context.asset_path().path().to_path_buf();
            let documents = AssetDocuments {
                root: PathBuf::from(ASSET_ROOT),
                map_path: map_path.clone(),
                map_bytes: Some(bytes),
            };
            let images = ContextImages { load_context };

            let mut loader = MapLoader::new(documents, images).with_config(settings.clone());
            let map = loader.load_map(&map_path)?;
            debug!(
                "Loaded Tiled map {} ({} layers, {} tilesets)",
                map_path.display(),
                map.layers.len(),
                map.tilesets.len()
            );

            Ok(TiledJsonMap { map })
        }
    }

    fn extensions(&self) -> &[&str] {
        &["tmj"]
    }
}

/// Serves the map from the bytes Bevy already read, and any other document
/// from the asset directory.
struct AssetDocuments {
    root: PathBuf,
    map_path: PathBuf,
    map_bytes: Option<Vec<u8>>,
}

impl DocumentReader for AssetDocuments {
    fn read_document(&mut self, path: &Path) -> Result<Value, ReadError> {
        let bytes = match self.map_bytes.take_if(|_| path == self.map_path) {
            Some(bytes) => bytes,
            None => fs::read(self.root.join(path))?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turns image paths into handles requested from the load context.
struct ContextImages<'a, 'ctx> {
    load_context: &'a mut LoadContext<'ctx>,
}

impl ImageLoader for ContextImages<'_, '_> {
    type Image = Handle<Image>;

    fn load_image(&mut self, path: &Path) -> Result<Handle<Image>, ImageError> {
        let asset_path = to_asset_path(path)?;
        Ok(self.load_context.load(asset_path))
    }

    // Handles are reference counted; dropping the last one frees the image.
    fn release_image(&mut self, _image: Handle<Image>) {}
}

/// Convert a resolved image path into a Bevy asset path.
///
/// Decoded paths are already relative to the asset root; a leading
/// `assets/` (from maps that reference images through the asset directory)
/// is stripped and separators become forward slashes.
fn to_asset_path(path: &Path) -> Result<String, ImageError> {
    let text = path
        .to_str()
        .ok_or_else(|| ImageError::Other(format!("Invalid UTF-8 in path: {path:?}")))?
        .replace('\\', "/");
    let prefix = format!("{ASSET_ROOT}/");
    Ok(match text.strip_prefix(&prefix) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}
