//! Map decoding: the entry point that ties layers and tilesets together.

use std::path::Path;

use glam::IVec2;
use serde_json::Value;
use tracing::{debug, warn};

use crate::assets::map::TileMap;
use crate::assets::tileset::TileSet;
use crate::document::DocumentReader;
use crate::error::{DecodeError, DecodeResult, ReadError};
use crate::images::ImageLoader;
use crate::lifecycle::release_layers;
use crate::loaders::fields::{
    optional_bool, require_array, require_non_negative_i32, require_u32,
};
use crate::loaders::properties::decode_properties_of;
use crate::loaders::{MapLoader, Scope};
use crate::paths::directory_of;

impl<R: DocumentReader, L: ImageLoader> MapLoader<R, L> {
    /// Read and decode the map at `path`.
    ///
    /// Either the whole map decodes, or nothing is returned and every image
    /// loaded along the way has been released again.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> DecodeResult<TileMap<L::Image>> {
        let path = path.as_ref();
        debug!("Loading map {}", path.display());

        let doc = self.reader.read_document(path).map_err(|err| match err {
            ReadError::Io(source) => DecodeError::MapUnreadable {
                path: path.to_path_buf(),
                source,
            },
            ReadError::Parse(source) => DecodeError::Malformed {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let mut map = self.decode_map(&doc, &directory_of(path), &Scope::file(path))?;
        map.path = Some(path.to_path_buf());
        Ok(map)
    }

    /// Decode an already parsed map document. Relative references resolve
    /// against `base_dir`.
    pub fn decode_map_document(
        &mut self,
        doc: &Value,
        base_dir: impl AsRef<Path>,
    ) -> DecodeResult<TileMap<L::Image>> {
        let base_dir = base_dir.as_ref();
        self.decode_map(doc, base_dir, &Scope::document(base_dir))
    }

    fn decode_map(
        &mut self,
        doc: &Value,
        base_dir: &Path,
        scope: &Scope<'_>,
    ) -> DecodeResult<TileMap<L::Image>> {
        // 1. Header fields. Nothing is loaded yet, so failures need no cleanup.
        if optional_bool(doc, "infinite", scope)? == Some(true) {
            return Err(scope.invalid("infinite", "infinite (chunked) maps are not supported"));
        }
        let size = IVec2::new(
            require_non_negative_i32(doc, "width", scope)?,
            require_non_negative_i32(doc, "height", scope)?,
        );
        let tile_size = IVec2::new(
            require_non_negative_i32(doc, "tilewidth", scope)?,
            require_non_negative_i32(doc, "tileheight", scope)?,
        );
        let layer_values = require_array(doc, "layers", scope)?;
        let tileset_values = require_array(doc, "tilesets", scope)?;
        let properties = decode_properties_of(doc, scope, &self.config)?;

        // 2. Layers, in document order.
        let layers = self.layers_from_values(layer_values, scope, base_dir)?;

        // 3. Tilesets. From here on a failure must hand back the layers too.
        let tilesets = match self.tilesets_from_values(tileset_values, scope, base_dir) {
            Ok(tilesets) => tilesets,
            Err(err) => {
                release_layers(layers, &mut self.images);
                return Err(err);
            }
        };

        let map = TileMap {
            path: None,
            size,
            tile_size,
            properties,
            tilesets,
            layers,
        };

        // 4. Gid ranges.
        if let Err(err) = self.check_tileset_ranges(&map.tilesets) {
            map.release(&mut self.images);
            return Err(err);
        }

        debug!(
            "Decoded {}x{} map with {} layers and {} tilesets",
            size.x,
            size.y,
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }

    fn tilesets_from_values(
        &mut self,
        values: &[Value],
        scope: &Scope<'_>,
        base_dir: &Path,
    ) -> DecodeResult<Vec<TileSet<L::Image>>> {
        let mut tilesets = Vec::with_capacity(values.len());

        for (index, entry) in values.iter().enumerate() {
            let entry_scope = scope.index("tilesets", index);
            let decoded = require_u32(entry, "firstgid", &entry_scope).and_then(|first_gid| {
                if first_gid == 0 {
                    return Err(entry_scope.invalid("firstgid", "global ids start at 1"));
                }
                self.tileset_from_value(entry, &entry_scope, base_dir, first_gid, &mut Vec::new())
            });

            match decoded {
                Ok(tileset) => tilesets.push(tileset),
                Err(err) => {
                    for tileset in tilesets {
                        tileset.release(&mut self.images);
                    }
                    return Err(err);
                }
            }
        }

        Ok(tilesets)
    }

    /// Tileset ranges must be increasing and disjoint, or a global id could
    /// belong to two tilesets.
    fn check_tileset_ranges(&self, tilesets: &[TileSet<L::Image>]) -> DecodeResult<()> {
        for pair in tilesets.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.first_gid >= previous.gid_end() {
                continue;
            }
            let err = DecodeError::OverlappingTilesets {
                previous_first: previous.first_gid,
                previous_end: previous.gid_end(),
                next: next.first_gid,
            };
            if self.config.validate_tileset_ranges {
                return Err(err);
            }
            warn!("{err}");
        }
        Ok(())
    }
}
