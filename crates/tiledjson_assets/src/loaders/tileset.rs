//! Tileset decoding, including `source` references to external tileset files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::IVec2;
use serde_json::Value;
use tracing::{debug, warn};

use crate::assets::tileset::{Tile, TileSet};
use crate::document::DocumentReader;
use crate::error::{DecodeError, DecodeResult, ReadError};
use crate::images::ImageLoader;
use crate::loaders::fields::{
    optional_array, optional_non_negative_i32, optional_str, require_str, require_u32,
};
use crate::loaders::properties::decode_properties_of;
use crate::loaders::{MapLoader, Scope};
use crate::paths::{directory_of, resolve_in_dir};

impl<R: DocumentReader, L: ImageLoader> MapLoader<R, L> {
    /// Read and decode a standalone tileset file, numbering its tiles from
    /// `first_gid`.
    pub fn load_tileset(
        &mut self,
        path: impl AsRef<Path>,
        first_gid: u32,
    ) -> DecodeResult<TileSet<L::Image>> {
        let path = path.as_ref();
        let scope = Scope::file(path);
        self.follow_reference(path.to_path_buf(), &scope, first_gid, &mut Vec::new())
    }

    /// Decode a tileset entry. Relative paths inside it (its `source` or
    /// its `image`) resolve against `base_dir`.
    ///
    /// An entry with a `source` field is replaced by the referenced file;
    /// `first_gid` always comes from the caller, since an external file
    /// does not know where the map places it.
    pub fn decode_tileset(
        &mut self,
        doc: &Value,
        base_dir: impl AsRef<Path>,
        first_gid: u32,
    ) -> DecodeResult<TileSet<L::Image>> {
        let base_dir = base_dir.as_ref();
        let scope = Scope::document(base_dir);
        self.tileset_from_value(doc, &scope, base_dir, first_gid, &mut Vec::new())
    }

    pub(crate) fn tileset_from_value(
        &mut self,
        doc: &Value,
        scope: &Scope<'_>,
        base_dir: &Path,
        first_gid: u32,
        chain: &mut Vec<PathBuf>,
    ) -> DecodeResult<TileSet<L::Image>> {
        if let Some(source) = optional_str(doc, "source", scope)? {
            let path = resolve_in_dir(base_dir, source);
            return self.follow_reference(path, scope, first_gid, chain);
        }
        self.inline_tileset(doc, scope, base_dir, first_gid)
    }

    /// Decode the tileset stored at `path`. `chain` holds the files already
    /// being followed, to catch reference cycles.
    fn follow_reference(
        &mut self,
        path: PathBuf,
        scope: &Scope<'_>,
        first_gid: u32,
        chain: &mut Vec<PathBuf>,
    ) -> DecodeResult<TileSet<L::Image>> {
        if chain.contains(&path) {
            return Err(DecodeError::CyclicReference { path });
        }
        if chain.len() >= self.config.max_reference_depth {
            return Err(scope.invalid(
                "source",
                format!(
                    "more than {} nested tileset references",
                    self.config.max_reference_depth
                ),
            ));
        }

        debug!("Loading tileset {}", path.display());
        let doc = match self.reader.read_document(&path) {
            Ok(doc) => doc,
            Err(ReadError::Io(source)) => {
                return Err(DecodeError::ReferenceUnreadable { path, source });
            }
            Err(ReadError::Parse(source)) => return Err(DecodeError::Malformed { path, source }),
        };

        chain.push(path.clone());
        let result = {
            let scope = Scope::file(&path);
            self.tileset_from_value(&doc, &scope, &directory_of(&path), first_gid, chain)
        };
        chain.pop();

        let mut tileset = result?;
        // Innermost file wins when references are chained.
        tileset.source.get_or_insert(path);
        Ok(tileset)
    }

    fn inline_tileset(
        &mut self,
        doc: &Value,
        scope: &Scope<'_>,
        base_dir: &Path,
        first_gid: u32,
    ) -> DecodeResult<TileSet<L::Image>> {
        let columns = require_u32(doc, "columns", scope)?;
        if columns == 0 {
            return Err(scope.invalid("columns", "must be positive"));
        }
        let tile_count = require_u32(doc, "tilecount", scope)?;
        let image_ref = require_str(doc, "image", scope)?;

        let name = optional_str(doc, "name", scope)?.unwrap_or_default().to_string();
        let tile_size = match (
            optional_non_negative_i32(doc, "tilewidth", scope)?,
            optional_non_negative_i32(doc, "tileheight", scope)?,
        ) {
            (Some(width), Some(height)) => Some(IVec2::new(width, height)),
            _ => None,
        };
        let margin = optional_non_negative_i32(doc, "margin", scope)?.unwrap_or(0);
        let spacing = optional_non_negative_i32(doc, "spacing", scope)?.unwrap_or(0);

        // Tiles carry no image handles, so decoding them before the image
        // leaves nothing to release if they fail.
        let tiles = self.decode_tiles(doc, scope, tile_count)?;

        let image_path = resolve_in_dir(base_dir, image_ref);
        let image = self.load_image(&image_path)?;

        debug!(
            "Decoded tileset '{}' (gids {}..{}, {} tiles with data)",
            name,
            first_gid,
            first_gid.saturating_add(tile_count),
            tiles.len()
        );

        Ok(TileSet {
            name,
            first_gid,
            columns,
            rows: tile_count.div_ceil(columns),
            tile_count,
            tile_size,
            margin,
            spacing,
            image,
            image_path,
            source: None,
            tiles,
        })
    }

    fn decode_tiles(
        &self,
        doc: &Value,
        scope: &Scope<'_>,
        tile_count: u32,
    ) -> DecodeResult<HashMap<u32, Tile>> {
        let mut tiles = HashMap::new();

        for (index, entry) in optional_array(doc, "tiles", scope)?.iter().enumerate() {
            let scope = scope.index("tiles", index);
            let local_id = require_u32(entry, "id", &scope)?;
            if local_id >= tile_count {
                return Err(scope.invalid(
                    "id",
                    format!("tile {local_id} is outside a tileset of {tile_count} tiles"),
                ));
            }

            // Tiled 1.9 renamed `type` to `class`.
            let class = [
                optional_str(entry, "class", &scope)?,
                optional_str(entry, "type", &scope)?,
            ]
            .into_iter()
            .flatten()
            .find(|class| !class.is_empty())
            .map(str::to_string);

            let properties = decode_properties_of(entry, &scope, &self.config)?;

            if tiles.contains_key(&local_id) {
                warn!("Tile {local_id} is declared twice in {scope}; keeping the later entry");
            }
            tiles.insert(
                local_id,
                Tile {
                    local_id,
                    class,
                    properties,
                },
            );
        }

        Ok(tiles)
    }
}
