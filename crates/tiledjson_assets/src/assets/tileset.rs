use std::collections::HashMap;
use std::path::PathBuf;

use glam::IVec2;

use crate::assets::grid::{GridPosition, TileRect, strip_flags};
use crate::assets::properties::Properties;
use crate::images::ImageSize;

/// Per-tile data declared in a tileset's `tiles` array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    /// Position of the tile within its tileset (0-based, NOT a global id).
    pub local_id: u32,

    /// User-defined class (`type` or `class` in the document).
    pub class: Option<String>,

    pub properties: Properties,
}

/// A decoded tileset: one image cut into a grid of same-sized tiles.
#[derive(Debug, Clone)]
pub struct TileSet<I> {
    pub name: String,

    /// Global id of this tileset's tile 0 in the owning map.
    pub first_gid: u32,

    pub columns: u32,

    /// `ceil(tile_count / columns)`
    pub rows: u32,

    pub tile_count: u32,

    /// Tile size declared by the tileset, if any.
    pub tile_size: Option<GridPosition>,

    /// Pixels around the tile grid in the image.
    pub margin: i32,

    /// Pixels between neighbouring tiles in the image.
    pub spacing: i32,

    /// Handle from the image collaborator. Owned by this tileset.
    pub image: I,

    /// Resolved path the image was loaded from.
    pub image_path: PathBuf,

    /// File this tileset was read from, for tilesets referenced by `source`.
    pub source: Option<PathBuf>,

    /// Tiles that carry data, keyed by local id. Tiles absent here have no
    /// properties.
    pub tiles: HashMap<u32, Tile>,
}

impl<I> TileSet<I> {
    /// One past the last global id owned by this tileset.
    pub fn gid_end(&self) -> u32 {
        self.first_gid.saturating_add(self.tile_count)
    }

    /// Whether `global_id` (flags ignored) addresses a tile of this tileset.
    pub fn contains_gid(&self, global_id: u32) -> bool {
        self.local_id(global_id).is_some()
    }

    /// Local id for `global_id`, if it lies in `[first_gid, first_gid + tile_count)`.
    pub fn local_id(&self, global_id: u32) -> Option<u32> {
        let gid = strip_flags(global_id);
        if gid == 0 || gid < self.first_gid {
            return None;
        }
        let local = gid - self.first_gid;
        (local < self.tile_count).then_some(local)
    }

    pub fn tile(&self, local_id: u32) -> Option<&Tile> {
        self.tiles.get(&local_id)
    }

    /// Column and row of a tile inside the tileset image.
    pub fn tile_grid_position(&self, local_id: u32) -> Option<IVec2> {
        if self.columns == 0 || local_id >= self.tile_count {
            return None;
        }
        Some(IVec2::new(
            (local_id % self.columns) as i32,
            (local_id / self.columns) as i32,
        ))
    }

    /// Source rectangle of a tile, using the tileset's own tile size when it
    /// declares one and `fallback_tile_size` otherwise.
    ///
    /// `None` when the tile is out of range or its position does not fit in
    /// an `i32`.
    pub fn tile_rect(&self, local_id: u32, fallback_tile_size: GridPosition) -> Option<TileRect> {
        let cell = self.tile_grid_position(local_id)?;
        let size = self.tile_size.unwrap_or(fallback_tile_size);
        let offset = |cell: i32, size: i32| -> Option<i32> {
            size.checked_add(self.spacing)?
                .checked_mul(cell)?
                .checked_add(self.margin)
        };
        Some(TileRect {
            x: offset(cell.x, size.x)?,
            y: offset(cell.y, size.y)?,
            width: size.x,
            height: size.y,
        })
    }
}

impl<I: ImageSize> TileSet<I> {
    /// Pixel size of the tileset image.
    pub fn image_size(&self) -> IVec2 {
        IVec2::new(self.image.width() as i32, self.image.height() as i32)
    }
}
