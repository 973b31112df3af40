//! Layer tree types.
//!
//! A map's layers form a tree: groups own their children, every other kind
//! of layer is a leaf. Order is document order, which Tiled writes
//! bottom-to-top, so index 0 is drawn first.

use std::path::PathBuf;

use glam::IVec2;

use crate::assets::grid::{EMPTY_TILE, GridPosition};
use crate::assets::properties::Properties;
use crate::error::SetTileError;
use crate::images::ImageSize;

/// One layer of a map, with the metadata shared by every layer kind.
#[derive(Debug, Clone)]
pub struct Layer<I> {
    pub name: String,
    pub visible: bool,
    pub properties: Properties,
    pub kind: LayerKind<I>,
}

/// Layer payload, selected by the document's `type` field.
#[derive(Debug, Clone)]
pub enum LayerKind<I> {
    Tiles(TileLayer),
    Objects(ObjectLayer),
    Image(ImageLayer<I>),
    Group(GroupLayer<I>),
}

/// Discriminant of [`LayerKind`], for matching without borrowing the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tiles,
    Objects,
    Image,
    Group,
}

impl LayerType {
    /// Name used for this layer type in the `type` field.
    pub fn document_name(self) -> &'static str {
        match self {
            LayerType::Tiles => "tilelayer",
            LayerType::Objects => "objectgroup",
            LayerType::Image => "imagelayer",
            LayerType::Group => "group",
        }
    }

    pub fn from_document_name(name: &str) -> Option<Self> {
        match name {
            "tilelayer" => Some(LayerType::Tiles),
            "objectgroup" => Some(LayerType::Objects),
            "imagelayer" => Some(LayerType::Image),
            "group" => Some(LayerType::Group),
            _ => None,
        }
    }
}

impl<I> Layer<I> {
    /// Visible layer with no name or properties.
    pub fn new(kind: LayerKind<I>) -> Self {
        Self {
            name: String::new(),
            visible: true,
            properties: Properties::default(),
            kind,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn layer_type(&self) -> LayerType {
        match &self.kind {
            LayerKind::Tiles(_) => LayerType::Tiles,
            LayerKind::Objects(_) => LayerType::Objects,
            LayerKind::Image(_) => LayerType::Image,
            LayerKind::Group(_) => LayerType::Group,
        }
    }

    pub fn as_tiles(&self) -> Option<&TileLayer> {
        match &self.kind {
            LayerKind::Tiles(tiles) => Some(tiles),
            _ => None,
        }
    }

    pub fn as_tiles_mut(&mut self) -> Option<&mut TileLayer> {
        match &mut self.kind {
            LayerKind::Tiles(tiles) => Some(tiles),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&ObjectLayer> {
        match &self.kind {
            LayerKind::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer<I>> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupLayer<I>> {
        match &self.kind {
            LayerKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Child layers of a group; empty for every other kind.
    pub fn children(&self) -> &[Layer<I>] {
        match &self.kind {
            LayerKind::Group(group) => &group.layers,
            _ => &[],
        }
    }

    pub fn child(&self, index: usize) -> Option<&Layer<I>> {
        self.children().get(index)
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut Layer<I>> {
        match &mut self.kind {
            LayerKind::Group(group) => group.layers.get_mut(index),
            _ => None,
        }
    }

    /// Global id at `pos`, or [`EMPTY_TILE`] for non-tile layers and
    /// positions outside the grid.
    pub fn tile_at(&self, pos: GridPosition) -> u32 {
        self.as_tiles().map_or(EMPTY_TILE, |tiles| tiles.tile_at(pos))
    }

    /// Overwrite one cell of a tile layer.
    pub fn set_tile(&mut self, pos: GridPosition, global_id: u32) -> Result<(), SetTileError> {
        self.as_tiles_mut()
            .ok_or(SetTileError::NotATileLayer)?
            .set_tile(pos, global_id)
    }
}

/// Grid of global tile ids, stored as rows so `rows[y][x]` is the cell at
/// `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    size: GridPosition,
    rows: Vec<Vec<u32>>,
}

impl TileLayer {
    /// Empty grid of the given size. Negative dimensions are clamped to 0.
    pub fn new(size: GridPosition) -> Self {
        let size = size.max(IVec2::ZERO);
        Self {
            size,
            rows: vec![vec![EMPTY_TILE; size.x as usize]; size.y as usize],
        }
    }

    /// Rebuild a grid from row-major flat data (`data[y * width + x]`).
    ///
    /// Returns `None` when `data` does not hold exactly `width * height` cells.
    pub fn from_flat(size: GridPosition, data: &[u32]) -> Option<Self> {
        if size.x < 0 || size.y < 0 {
            return None;
        }
        let width = size.x as usize;
        let height = size.y as usize;
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        let rows = if width == 0 {
            vec![Vec::new(); height]
        } else {
            data.chunks(width).map(<[u32]>::to_vec).collect()
        };
        Some(Self { size, rows })
    }

    pub fn size(&self) -> GridPosition {
        self.size
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size.x && pos.y < self.size.y
    }

    /// Global id at `pos`; [`EMPTY_TILE`] when `pos` is outside the grid.
    pub fn tile_at(&self, pos: GridPosition) -> u32 {
        if !self.contains(pos) {
            return EMPTY_TILE;
        }
        self.rows[pos.y as usize][pos.x as usize]
    }

    pub fn set_tile(&mut self, pos: GridPosition, global_id: u32) -> Result<(), SetTileError> {
        if !self.contains(pos) {
            return Err(SetTileError::OutOfBounds {
                position: pos,
                size: self.size,
            });
        }
        self.rows[pos.y as usize][pos.x as usize] = global_id;
        Ok(())
    }

    /// Non-empty cells in row-major order.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (GridPosition, u32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, gid)| **gid != EMPTY_TILE)
                .map(move |(x, gid)| (IVec2::new(x as i32, y as i32), *gid))
        })
    }
}

/// A free-form placed entity from an object group.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: Option<u32>,
    pub name: String,

    /// User-defined type; `"none"` when the document gives none.
    pub kind: String,

    /// Pixel position.
    pub position: GridPosition,

    /// Pixel size.
    pub size: GridPosition,

    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectLayer {
    pub objects: Vec<MapObject>,
}

impl ObjectLayer {
    /// Objects whose `kind` equals `kind`, in document order.
    pub fn objects_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a MapObject> {
        self.objects.iter().filter(move |o| o.kind == kind)
    }
}

/// A single image drawn at a pixel position.
#[derive(Debug, Clone)]
pub struct ImageLayer<I> {
    /// Handle from the image collaborator; `None` for an image layer saved
    /// without an image. Owned by this layer.
    pub image: Option<I>,

    pub image_path: Option<PathBuf>,

    pub position: GridPosition,
}

impl<I: ImageSize> ImageLayer<I> {
    /// Pixel size of the image, or zero without one.
    pub fn pixel_size(&self) -> IVec2 {
        self.image.as_ref().map_or(IVec2::ZERO, |image| {
            IVec2::new(image.width() as i32, image.height() as i32)
        })
    }
}

/// Ordered children of a group layer.
#[derive(Debug, Clone)]
pub struct GroupLayer<I> {
    pub layers: Vec<Layer<I>>,
}

impl<I> Default for GroupLayer<I> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_rehydrates_row_major() {
        let layer = TileLayer::from_flat(IVec2::new(2, 2), &[0, 1, 2, 3]).unwrap();
        assert_eq!(layer.tile_at(IVec2::new(0, 0)), 0);
        assert_eq!(layer.tile_at(IVec2::new(1, 0)), 1);
        assert_eq!(layer.tile_at(IVec2::new(0, 1)), 2);
        assert_eq!(layer.tile_at(IVec2::new(1, 1)), 3);
        assert_eq!(layer.rows()[1], vec![2, 3]);
    }

    #[test]
    fn from_flat_rejects_wrong_length() {
        assert!(TileLayer::from_flat(IVec2::new(2, 2), &[1, 2, 3]).is_none());
        assert!(TileLayer::from_flat(IVec2::new(-1, 2), &[]).is_none());
    }

    #[test]
    fn tile_at_outside_grid_is_empty() {
        let layer = TileLayer::from_flat(IVec2::new(2, 1), &[4, 5]).unwrap();
        for pos in [
            IVec2::new(-1, 0),
            IVec2::new(0, -1),
            IVec2::new(2, 0),
            IVec2::new(0, 1),
            IVec2::new(i32::MIN, i32::MAX),
        ] {
            assert_eq!(layer.tile_at(pos), EMPTY_TILE);
        }

        let empty = TileLayer::new(IVec2::ZERO);
        assert_eq!(empty.tile_at(IVec2::ZERO), EMPTY_TILE);
    }

    #[test]
    fn set_tile_in_bounds_and_out() {
        let mut layer = TileLayer::new(IVec2::new(3, 2));
        layer.set_tile(IVec2::new(2, 1), 9).unwrap();
        assert_eq!(layer.tile_at(IVec2::new(2, 1)), 9);

        let err = layer.set_tile(IVec2::new(3, 0), 1).unwrap_err();
        assert_eq!(
            err,
            SetTileError::OutOfBounds {
                position: IVec2::new(3, 0),
                size: IVec2::new(3, 2),
            }
        );
    }

    #[test]
    fn set_tile_on_other_layers_fails() {
        let mut layer: Layer<()> = Layer::new(LayerKind::Objects(ObjectLayer::default()));
        assert_eq!(
            layer.set_tile(IVec2::ZERO, 1),
            Err(SetTileError::NotATileLayer)
        );
        assert_eq!(layer.tile_at(IVec2::ZERO), EMPTY_TILE);
    }

    #[test]
    fn iter_tiles_skips_empty_cells() {
        let layer = TileLayer::from_flat(IVec2::new(3, 2), &[0, 7, 0, 0, 0, 8]).unwrap();
        let tiles: Vec<_> = layer.iter_tiles().collect();
        assert_eq!(tiles, vec![(IVec2::new(1, 0), 7), (IVec2::new(2, 1), 8)]);
    }

    #[test]
    fn layer_type_names_round_trip() {
        for ty in [
            LayerType::Tiles,
            LayerType::Objects,
            LayerType::Image,
            LayerType::Group,
        ] {
            assert_eq!(LayerType::from_document_name(ty.document_name()), Some(ty));
        }
        assert_eq!(LayerType::from_document_name("TileLayer"), None);
    }
}
