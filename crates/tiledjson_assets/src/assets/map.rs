use std::path::PathBuf;
use std::slice;

use glam::{IVec2, Vec2};

use crate::assets::grid::{
    self, EMPTY_TILE, FLIPPED_DIAGONALLY, FLIPPED_HORIZONTALLY, FLIPPED_VERTICALLY, GridPosition,
    TileRect, strip_flags,
};
use crate::assets::layer::{Layer, LayerKind};
use crate::assets::properties::{FromProperty, Properties};
use crate::assets::tileset::{Tile, TileSet};
use crate::error::SetTileError;

/// A decoded Tiled map: the root of the layer tree.
///
/// `I` is the handle type of the image collaborator used to decode it. The
/// map owns its tilesets and layers exclusively; hand it back to
/// [`TileMap::release`] to return every image handle to the loader.
#[derive(Debug, Clone)]
pub struct TileMap<I> {
    /// File the map was decoded from.
    pub path: Option<PathBuf>,

    /// Map size in tiles.
    pub size: GridPosition,

    /// Size of one grid cell in pixels.
    pub tile_size: GridPosition,

    pub properties: Properties,

    /// Tilesets in declaration order, with increasing gid ranges.
    pub tilesets: Vec<TileSet<I>>,

    /// Top-level layers in document order (bottom-most first).
    pub layers: Vec<Layer<I>>,
}

/// A global tile id resolved against a map's tilesets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRef {
    /// Global id with the transform flags removed.
    pub global_id: u32,
    pub tileset_index: usize,
    pub local_id: u32,
    pub flipped_h: bool,
    pub flipped_v: bool,
    pub flipped_d: bool,
}

impl<I> TileMap<I> {
    /// The first tileset, for the common single-tileset map.
    pub fn tileset(&self) -> Option<&TileSet<I>> {
        self.tilesets.first()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer<I>> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer<I>> {
        self.layers.get_mut(index)
    }

    /// Nested layer lookup: `[2, 0]` is the first child of the third
    /// top-level layer.
    pub fn layer_at(&self, path: &[usize]) -> Option<&Layer<I>> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.layers.get(*first)?, |layer, &index| layer.child(index))
    }

    pub fn layer_at_mut(&mut self, path: &[usize]) -> Option<&mut Layer<I>> {
        let (first, rest) = path.split_first()?;
        let mut layer = self.layers.get_mut(*first)?;
        for &index in rest {
            layer = layer.child_mut(index)?;
        }
        Some(layer)
    }

    /// Every layer with its nesting depth, depth-first in draw order.
    pub fn iter_layers(&self) -> LayerIter<'_, I> {
        LayerIter {
            stack: vec![(0, self.layers.iter())],
        }
    }

    /// First layer named `name`, searching groups depth-first.
    pub fn find_layer(&self, name: &str) -> Option<&Layer<I>> {
        self.iter_layers()
            .map(|(_, layer)| layer)
            .find(|layer| layer.name == name)
    }

    /// Index of the tileset owning `global_id`: the last tileset whose
    /// first gid does not exceed the id, provided the id is in its range.
    pub fn tileset_index_for(&self, global_id: u32) -> Option<usize> {
        let gid = strip_flags(global_id);
        if gid == EMPTY_TILE {
            return None;
        }
        let index = self.tilesets.iter().rposition(|set| set.first_gid <= gid)?;
        self.tilesets[index].contains_gid(gid).then_some(index)
    }

    pub fn tileset_for(&self, global_id: u32) -> Option<&TileSet<I>> {
        self.tilesets.get(self.tileset_index_for(global_id)?)
    }

    pub fn resolve(&self, global_id: u32) -> Option<TileRef> {
        let tileset_index = self.tileset_index_for(global_id)?;
        let gid = strip_flags(global_id);
        Some(TileRef {
            global_id: gid,
            tileset_index,
            local_id: gid - self.tilesets[tileset_index].first_gid,
            flipped_h: global_id & FLIPPED_HORIZONTALLY != 0,
            flipped_v: global_id & FLIPPED_VERTICALLY != 0,
            flipped_d: global_id & FLIPPED_DIAGONALLY != 0,
        })
    }

    /// Global id at `pos` in `layer`; 0 for misses.
    pub fn tile_at(&self, layer: &Layer<I>, pos: GridPosition) -> u32 {
        layer.tile_at(pos)
    }

    /// Tile data for `global_id`. `None` for the empty id, ids outside every
    /// tileset, and tiles that declare no data.
    pub fn tile_definition_for(&self, global_id: u32) -> Option<&Tile> {
        let tile = self.resolve(global_id)?;
        self.tilesets[tile.tileset_index].tile(tile.local_id)
    }

    pub fn tile_definition_at(&self, layer: &Layer<I>, pos: GridPosition) -> Option<&Tile> {
        self.tile_definition_for(layer.tile_at(pos))
    }

    /// Typed property of the tile at `pos`, `None` on any miss.
    pub fn tile_property<T: FromProperty>(
        &self,
        layer: &Layer<I>,
        pos: GridPosition,
        key: &str,
    ) -> Option<T> {
        self.tile_definition_at(layer, pos)?.properties.get_as(key)
    }

    /// Integer property of the tile at `pos`; 0 when the tile, the key, or
    /// the type does not match.
    pub fn property_int(&self, layer: &Layer<I>, pos: GridPosition, key: &str) -> i32 {
        self.tile_property(layer, pos, key).unwrap_or(0)
    }

    /// Float property of the tile at `pos`; 0.0 on a miss.
    pub fn property_float(&self, layer: &Layer<I>, pos: GridPosition, key: &str) -> f32 {
        self.tile_property(layer, pos, key).unwrap_or(0.0)
    }

    /// Boolean property of the tile at `pos`; false on a miss.
    pub fn property_bool(&self, layer: &Layer<I>, pos: GridPosition, key: &str) -> bool {
        self.tile_property(layer, pos, key).unwrap_or(false)
    }

    /// Text property of the tile at `pos`; the empty string on a miss.
    pub fn property_text(&self, layer: &Layer<I>, pos: GridPosition, key: &str) -> &str {
        self.tile_definition_at(layer, pos)
            .and_then(|tile| tile.properties.text(key))
            .unwrap_or("")
    }

    /// Rectangle of `global_id` inside its tileset image.
    pub fn source_rect(&self, global_id: u32) -> Option<TileRect> {
        let tile = self.resolve(global_id)?;
        self.tilesets[tile.tileset_index].tile_rect(tile.local_id, self.tile_size)
    }

    pub fn grid_to_pixel(&self, pos: GridPosition) -> Vec2 {
        grid::grid_to_pixel(pos, self.tile_size)
    }

    pub fn pixel_to_grid(&self, pos: Vec2) -> GridPosition {
        grid::pixel_to_grid(pos, self.tile_size)
    }

    /// Map size in pixels, saturating at `i32::MAX`.
    pub fn pixel_size(&self) -> IVec2 {
        IVec2::new(
            self.size.x.saturating_mul(self.tile_size.x),
            self.size.y.saturating_mul(self.tile_size.y),
        )
    }

    /// Overwrite one cell of the tile layer at `layer_path`.
    pub fn set_tile(
        &mut self,
        layer_path: &[usize],
        pos: GridPosition,
        global_id: u32,
    ) -> Result<(), SetTileError> {
        self.layer_at_mut(layer_path)
            .ok_or_else(|| SetTileError::NoSuchLayer(layer_path.to_vec()))?
            .set_tile(pos, global_id)
    }
}

/// Depth-first iterator over a layer tree; see [`TileMap::iter_layers`].
pub struct LayerIter<'a, I> {
    stack: Vec<(usize, slice::Iter<'a, Layer<I>>)>,
}

impl<'a, I> LayerIter<'a, I> {
    /// Iterate `layers` and their descendants, starting at depth 0.
    pub fn new(layers: &'a [Layer<I>]) -> Self {
        Self {
            stack: vec![(0, layers.iter())],
        }
    }
}

impl<'a, I> Iterator for LayerIter<'a, I> {
    type Item = (usize, &'a Layer<I>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, siblings) = self.stack.last_mut()?;
            let depth = *depth;
            let Some(layer) = siblings.next() else {
                self.stack.pop();
                continue;
            };
            if let LayerKind::Group(group) = &layer.kind {
                self.stack.push((depth + 1, group.layers.iter()));
            }
            return Some((depth, layer));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::assets::layer::{GroupLayer, ObjectLayer, TileLayer};
    use crate::assets::properties::PropertyValue;

    fn tileset(first_gid: u32, tile_count: u32) -> TileSet<()> {
        TileSet {
            name: String::new(),
            first_gid,
            columns: 4,
            rows: tile_count.div_ceil(4),
            tile_count,
            tile_size: None,
            margin: 0,
            spacing: 0,
            image: (),
            image_path: PathBuf::from("tiles.png"),
            source: None,
            tiles: HashMap::new(),
        }
    }

    fn tile(local_id: u32, props: &[(&str, PropertyValue)]) -> Tile {
        Tile {
            local_id,
            class: None,
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn sample_map() -> TileMap<()> {
        let mut first = tileset(1, 8);
        first
            .tiles
            .insert(1, tile(1, &[("hp", PropertyValue::Int(5))]));
        first
            .tiles
            .insert(2, tile(2, &[("hp", PropertyValue::Float(5.0))]));
        let mut second = tileset(9, 4);
        second.tiles.insert(
            0,
            tile(
                0,
                &[
                    ("name", PropertyValue::Text("water".into())),
                    ("wet", PropertyValue::Bool(true)),
                ],
            ),
        );

        let ground = Layer::new(LayerKind::Tiles(
            TileLayer::from_flat(IVec2::new(2, 2), &[0, 2, 3, 9]).unwrap(),
        ))
        .named("ground");
        let nested = Layer::new(LayerKind::Objects(ObjectLayer::default())).named("spawns");
        let group = Layer::new(LayerKind::Group(GroupLayer {
            layers: vec![nested],
        }))
        .named("meta");

        TileMap {
            path: None,
            size: IVec2::new(2, 2),
            tile_size: IVec2::new(16, 16),
            properties: Properties::default(),
            tilesets: vec![first, second],
            layers: vec![ground, group],
        }
    }

    #[test]
    fn empty_id_never_resolves() {
        let map = sample_map();
        assert!(map.tile_definition_for(0).is_none());
        assert!(map.resolve(0).is_none());
        assert!(map.resolve(FLIPPED_HORIZONTALLY).is_none());
    }

    #[test]
    fn resolves_against_owning_tileset() {
        let map = sample_map();
        let first = map.resolve(5).unwrap();
        assert_eq!((first.tileset_index, first.local_id), (0, 4));

        let second = map.resolve(10 | FLIPPED_VERTICALLY).unwrap();
        assert_eq!((second.tileset_index, second.local_id), (1, 1));
        assert!(second.flipped_v && !second.flipped_h);

        assert!(map.resolve(13).is_none());
    }

    #[test]
    fn property_lookups_use_defaults_on_miss() {
        let map = sample_map();
        let ground = map.layer(0).unwrap();

        // gid 2 -> local 1 has hp:int=5
        assert_eq!(map.property_int(ground, IVec2::new(1, 0), "hp"), 5);
        // gid 3 -> local 2 has hp:float=5.0
        assert_eq!(map.property_int(ground, IVec2::new(0, 1), "hp"), 0);
        assert_eq!(map.property_float(ground, IVec2::new(0, 1), "hp"), 5.0);
        // empty cell, missing key, out of bounds
        assert_eq!(map.property_int(ground, IVec2::new(0, 0), "hp"), 0);
        assert_eq!(map.property_int(ground, IVec2::new(1, 0), "armor"), 0);
        assert_eq!(map.property_int(ground, IVec2::new(5, 5), "hp"), 0);

        // gid 9 -> second tileset, local 0
        assert_eq!(map.property_text(ground, IVec2::new(1, 1), "name"), "water");
        assert!(map.property_bool(ground, IVec2::new(1, 1), "wet"));
        assert_eq!(map.property_text(ground, IVec2::new(1, 0), "name"), "");
        assert!(!map.property_bool(ground, IVec2::new(1, 0), "wet"));
    }

    #[test]
    fn nested_layers_are_addressable() {
        let map = sample_map();
        assert_eq!(map.layer_at(&[1, 0]).unwrap().name, "spawns");
        assert!(map.layer_at(&[1, 1]).is_none());
        assert!(map.layer_at(&[0, 0]).is_none());
        assert!(map.layer_at(&[]).is_none());
        assert_eq!(map.find_layer("spawns").unwrap().name, "spawns");

        let order: Vec<_> = map
            .iter_layers()
            .map(|(depth, layer)| (depth, layer.name.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "ground"), (0, "meta"), (1, "spawns")]);
    }

    #[test]
    fn set_tile_through_map() {
        let mut map = sample_map();
        map.set_tile(&[0], IVec2::new(0, 0), 4).unwrap();
        assert_eq!(map.tile_at(map.layer(0).unwrap(), IVec2::new(0, 0)), 4);

        assert_eq!(
            map.set_tile(&[1, 0], IVec2::ZERO, 1),
            Err(SetTileError::NotATileLayer)
        );
        assert_eq!(
            map.set_tile(&[7], IVec2::ZERO, 1),
            Err(SetTileError::NoSuchLayer(vec![7]))
        );
        assert!(matches!(
            map.set_tile(&[0], IVec2::new(-1, 0), 1),
            Err(SetTileError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn source_rect_uses_map_tile_size() {
        let map = sample_map();
        let rect = map.source_rect(5).unwrap();
        assert_eq!(rect, TileRect { x: 0, y: 16, width: 16, height: 16 });
        assert!(map.source_rect(0).is_none());
    }

    #[test]
    fn coordinate_conversions_use_tile_size() {
        let map = sample_map();
        assert_eq!(map.grid_to_pixel(IVec2::new(1, 2)), Vec2::new(16.0, 32.0));
        assert_eq!(map.pixel_to_grid(Vec2::new(31.0, 33.0)), IVec2::new(1, 2));
        assert_eq!(map.pixel_size(), IVec2::new(32, 32));
    }

    #[test]
    fn huge_maps_saturate_instead_of_overflowing() {
        let mut map = sample_map();
        map.size = IVec2::new(200_000, 3);
        map.tile_size = IVec2::new(20_000, 16);
        assert_eq!(map.pixel_size(), IVec2::new(i32::MAX, 48));
        assert_eq!(
            map.grid_to_pixel(IVec2::new(200_000, 1)),
            Vec2::new(4.0e9, 16.0)
        );
    }
}
