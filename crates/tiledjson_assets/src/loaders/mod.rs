//! Decoders that turn parsed Tiled documents into the owned model in
//! [`assets`](crate::assets).

mod fields;
pub mod layer;
pub mod map;
pub mod properties;
pub mod tileset;

use std::path::Path;

use tracing::trace;

use crate::assets::map::TileMap;
use crate::config::DecodeConfig;
use crate::document::DocumentReader;
use crate::error::{DecodeError, DecodeResult};
use crate::images::ImageLoader;

pub(crate) use fields::Scope;

/// Decodes maps and tilesets through a document reader and an image loader.
///
/// The loader owns both collaborators for the duration of a decode so that a
/// failing decode can hand back every image it already loaded.
///
/// ```no_run
/// use tiledjson_assets::{DecodeConfig, FsDocumentReader, ImagePaths, MapLoader};
///
/// let mut loader = MapLoader::new(FsDocumentReader, ImagePaths)
///     .with_config(DecodeConfig::default().strict_properties(true));
/// let map = loader.load_map("assets/maps/level1.json")?;
/// println!("{} layers", map.layers.len());
/// loader.release(map);
/// # Ok::<(), tiledjson_assets::DecodeError>(())
/// ```
#[derive(Debug, Default)]
pub struct MapLoader<R, L> {
    reader: R,
    images: L,
    config: DecodeConfig,
}

impl<R, L> MapLoader<R, L> {
    pub fn new(reader: R, images: L) -> Self {
        Self {
            reader,
            images,
            config: DecodeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn images(&self) -> &L {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut L {
        &mut self.images
    }

    pub fn into_parts(self) -> (R, L) {
        (self.reader, self.images)
    }
}

impl<R: DocumentReader, L: ImageLoader> MapLoader<R, L> {
    /// Tear down a map decoded by this loader. Returns the number of image
    /// handles released.
    pub fn release(&mut self, map: TileMap<L::Image>) -> usize {
        map.release(&mut self.images)
    }

    fn load_image(&mut self, path: &Path) -> DecodeResult<L::Image> {
        trace!("Loading image {}", path.display());
        self.images
            .load_image(path)
            .map_err(|source| DecodeError::ImageUnavailable {
                path: path.to_path_buf(),
                source,
            })
    }
}
