//! Teardown of decoded trees.
//!
//! Release mirrors decode: the same recursive shape, visited post-order, so
//! a group's children are released before the group itself and a map's
//! layers before its tilesets. Every image handle goes back to the image
//! collaborator exactly once. The rest of the tree is plain owned memory and
//! is freed when the consumed values drop.

use tracing::{debug, trace};

use crate::assets::layer::{Layer, LayerKind};
use crate::assets::map::TileMap;
use crate::assets::tileset::TileSet;
use crate::images::ImageLoader;

impl<I> Layer<I> {
    /// Release this layer and everything below it. Returns the number of
    /// image handles handed back.
    pub fn release<L: ImageLoader<Image = I> + ?Sized>(self, images: &mut L) -> usize {
        match self.kind {
            LayerKind::Group(group) => release_layers(group.layers, images),
            LayerKind::Image(layer) => match layer.image {
                Some(image) => {
                    trace!("Releasing image layer '{}'", self.name);
                    images.release_image(image);
                    1
                }
                None => 0,
            },
            LayerKind::Tiles(_) | LayerKind::Objects(_) => 0,
        }
    }
}

/// Release a sequence of sibling layers in order.
pub fn release_layers<I, L: ImageLoader<Image = I> + ?Sized>(
    layers: Vec<Layer<I>>,
    images: &mut L,
) -> usize {
    layers.into_iter().map(|layer| layer.release(images)).sum()
}

impl<I> TileSet<I> {
    /// Hand the tileset image back to the loader.
    pub fn release<L: ImageLoader<Image = I> + ?Sized>(self, images: &mut L) -> usize {
        trace!("Releasing tileset image {}", self.image_path.display());
        images.release_image(self.image);
        1
    }
}

impl<I> TileMap<I> {
    /// Tear the map down, returning every image handle to `images`.
    ///
    /// Layers are released first (depth-first, children before parents),
    /// then tilesets in declaration order.
    pub fn release<L: ImageLoader<Image = I> + ?Sized>(self, images: &mut L) -> usize {
        let mut released = release_layers(self.layers, images);
        released += self
            .tilesets
            .into_iter()
            .map(|tileset| tileset.release(images))
            .sum::<usize>();
        debug!("Released map with {released} image handles");
        released
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use glam::IVec2;

    use super::*;
    use crate::assets::layer::{GroupLayer, ImageLayer, ObjectLayer, TileLayer};
    use crate::assets::properties::Properties;
    use crate::images::testing::{CountingImages, FakeImage};

    fn image_layer(images: &mut CountingImages, path: &str) -> Layer<FakeImage> {
        Layer::new(LayerKind::Image(ImageLayer {
            image: Some(images.load_image(Path::new(path)).unwrap()),
            image_path: Some(PathBuf::from(path)),
            position: IVec2::ZERO,
        }))
    }

    #[test]
    fn release_visits_every_image_once() {
        let mut images = CountingImages::default();
        let tileset_image = images.load_image(Path::new("tiles.png")).unwrap();

        let deep = image_layer(&mut images, "deep.png");
        let inner = Layer::new(LayerKind::Group(GroupLayer { layers: vec![deep] }));
        let sky = image_layer(&mut images, "sky.png");
        let empty_image = Layer::new(LayerKind::Image(ImageLayer {
            image: None,
            image_path: None,
            position: IVec2::ZERO,
        }));
        let outer = Layer::new(LayerKind::Group(GroupLayer {
            layers: vec![inner, sky, empty_image],
        }));

        let map = TileMap {
            path: None,
            size: IVec2::new(1, 1),
            tile_size: IVec2::new(8, 8),
            properties: Properties::default(),
            tilesets: vec![TileSet {
                name: String::new(),
                first_gid: 1,
                columns: 1,
                rows: 1,
                tile_count: 1,
                tile_size: None,
                margin: 0,
                spacing: 0,
                image: tileset_image,
                image_path: PathBuf::from("tiles.png"),
                source: None,
                tiles: HashMap::new(),
            }],
            layers: vec![
                Layer::new(LayerKind::Tiles(TileLayer::new(IVec2::new(1, 1)))),
                outer,
                Layer::new(LayerKind::Objects(ObjectLayer::default())),
            ],
        };

        assert_eq!(images.outstanding(), 3);
        assert_eq!(map.release(&mut images), 3);
        assert_eq!(images.outstanding(), 0);
        assert_eq!(images.double_released, 0);
        // Children before parents, layers before tilesets.
        assert_eq!(
            images.released,
            vec![
                PathBuf::from("deep.png"),
                PathBuf::from("sky.png"),
                PathBuf::from("tiles.png"),
            ]
        );
    }
}
