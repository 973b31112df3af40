//! Layer decoding. The `type` field selects the layer kind; groups recurse.

use std::path::Path;

use glam::IVec2;
use serde_json::Value;
use tracing::{debug, trace};

use crate::assets::grid::EMPTY_TILE;
use crate::assets::layer::{
    GroupLayer, ImageLayer, Layer, LayerKind, LayerType, MapObject, ObjectLayer, TileLayer,
};
use crate::document::DocumentReader;
use crate::error::{DecodeError, DecodeResult};
use crate::images::ImageLoader;
use crate::lifecycle::release_layers;
use crate::loaders::fields::{
    field, optional_bool, optional_str, optional_u32, require, require_array, require_i32,
    require_non_negative_i32,
};
use crate::loaders::properties::decode_properties_of;
use crate::loaders::{MapLoader, Scope};
use crate::paths::resolve_in_dir;

/// Object `kind` when neither `type` nor `class` is given.
pub const NO_OBJECT_KIND: &str = "none";

impl<R: DocumentReader, L: ImageLoader> MapLoader<R, L> {
    /// Decode one layer (and, for groups, its whole subtree). Image paths
    /// resolve against `base_dir`.
    pub fn decode_layer(
        &mut self,
        doc: &Value,
        base_dir: impl AsRef<Path>,
    ) -> DecodeResult<Layer<L::Image>> {
        let base_dir = base_dir.as_ref();
        self.layer_from_value(doc, &Scope::document(base_dir), base_dir)
    }

    /// Decode the sibling layers in `values`, stopping at the first failure.
    /// Layers decoded before the failure are released before it is returned.
    pub(crate) fn layers_from_values(
        &mut self,
        values: &[Value],
        scope: &Scope<'_>,
        base_dir: &Path,
    ) -> DecodeResult<Vec<Layer<L::Image>>> {
        let mut layers = Vec::with_capacity(values.len());

        for (index, value) in values.iter().enumerate() {
            match self.layer_from_value(value, &scope.index("layers", index), base_dir) {
                Ok(layer) => layers.push(layer),
                Err(err) => {
                    let released = release_layers(layers, &mut self.images);
                    if released > 0 {
                        debug!("Released {released} images from partially decoded layers");
                    }
                    return Err(err);
                }
            }
        }

        Ok(layers)
    }

    fn layer_from_value(
        &mut self,
        doc: &Value,
        scope: &Scope<'_>,
        base_dir: &Path,
    ) -> DecodeResult<Layer<L::Image>> {
        let layer_type = match field(doc, "type") {
            Some(Value::String(name)) => LayerType::from_document_name(name).ok_or_else(|| {
                DecodeError::UnknownLayerType {
                    found: Some(name.clone()),
                    scope: scope.describe(),
                }
            })?,
            Some(other) => {
                return Err(DecodeError::UnknownLayerType {
                    found: Some(other.to_string()),
                    scope: scope.describe(),
                });
            }
            None => {
                return Err(DecodeError::UnknownLayerType {
                    found: None,
                    scope: scope.describe(),
                });
            }
        };

        let name = optional_str(doc, "name", scope)?.unwrap_or_default().to_string();
        let visible = optional_bool(doc, "visible", scope)?.unwrap_or(true);
        // Properties go first: they hold no images, so a failure here needs
        // no cleanup.
        let properties = decode_properties_of(doc, scope, &self.config)?;

        trace!("Decoding {} '{}' at {}", layer_type.document_name(), name, scope);
        let kind = match layer_type {
            LayerType::Tiles => LayerKind::Tiles(decode_tile_layer(doc, scope)?),
            LayerType::Objects => LayerKind::Objects(self.decode_object_layer(doc, scope)?),
            LayerType::Image => LayerKind::Image(self.decode_image_layer(doc, scope, base_dir)?),
            LayerType::Group => {
                let children = require_array(doc, "layers", scope)?;
                LayerKind::Group(GroupLayer {
                    layers: self.layers_from_values(children, scope, base_dir)?,
                })
            }
        };

        Ok(Layer {
            name,
            visible,
            properties,
            kind,
        })
    }

    fn decode_object_layer(&self, doc: &Value, scope: &Scope<'_>) -> DecodeResult<ObjectLayer> {
        let objects = require_array(doc, "objects", scope)?
            .iter()
            .enumerate()
            .map(|(index, object)| self.decode_object(object, &scope.index("objects", index)))
            .collect::<DecodeResult<Vec<_>>>()?;
        Ok(ObjectLayer { objects })
    }

    fn decode_object(&self, doc: &Value, scope: &Scope<'_>) -> DecodeResult<MapObject> {
        // `class` replaced `type` in Tiled 1.9; both are written as "" when unset.
        let kind = [
            optional_str(doc, "type", scope)?,
            optional_str(doc, "class", scope)?,
        ]
        .into_iter()
        .flatten()
        .find(|kind| !kind.is_empty())
        .unwrap_or(NO_OBJECT_KIND)
        .to_string();

        Ok(MapObject {
            id: optional_u32(doc, "id", scope)?,
            name: optional_str(doc, "name", scope)?.unwrap_or_default().to_string(),
            kind,
            position: IVec2::new(require_i32(doc, "x", scope)?, require_i32(doc, "y", scope)?),
            size: IVec2::new(
                require_i32(doc, "width", scope)?,
                require_i32(doc, "height", scope)?,
            ),
            properties: decode_properties_of(doc, scope, &self.config)?,
        })
    }

    fn decode_image_layer(
        &mut self,
        doc: &Value,
        scope: &Scope<'_>,
        base_dir: &Path,
    ) -> DecodeResult<ImageLayer<L::Image>> {
        let position = IVec2::new(require_i32(doc, "x", scope)?, require_i32(doc, "y", scope)?);
        let image_ref = require(doc, "image", scope)?;
        let image_ref = image_ref
            .as_str()
            .ok_or_else(|| scope.invalid("image", format!("expected a string, found {image_ref}")))?;

        // Tiled saves an image layer without an image as `"image": ""`.
        if image_ref.is_empty() {
            return Ok(ImageLayer {
                image: None,
                image_path: None,
                position,
            });
        }

        let image_path = resolve_in_dir(base_dir, image_ref);
        let image = self.load_image(&image_path)?;
        Ok(ImageLayer {
            image: Some(image),
            image_path: Some(image_path),
            position,
        })
    }
}

fn decode_tile_layer(doc: &Value, scope: &Scope<'_>) -> DecodeResult<TileLayer> {
    let width = require_non_negative_i32(doc, "width", scope)?;
    let height = require_non_negative_i32(doc, "height", scope)?;

    match optional_str(doc, "encoding", scope)? {
        None | Some("csv") => {}
        Some(encoding) => {
            return Err(scope.invalid("data", format!("{encoding} tile data is not supported")));
        }
    }

    let data = require(doc, "data", scope)?;
    let Some(cells) = data.as_array() else {
        return Err(scope.invalid("data", "expected an array of tile ids"));
    };

    let expected = width as usize * height as usize;
    if cells.len() != expected {
        return Err(scope.invalid(
            "data",
            format!(
                "{} tile ids for a {width}x{height} layer (expected {expected})",
                cells.len()
            ),
        ));
    }

    let gids = cells
        .iter()
        .map(|cell| {
            cell.as_u64()
                .and_then(|gid| u32::try_from(gid).ok())
                .ok_or_else(|| scope.invalid("data", format!("{cell} is not a tile id")))
        })
        .collect::<DecodeResult<Vec<u32>>>()?;

    let layer = TileLayer::from_flat(IVec2::new(width, height), &gids)
        .ok_or_else(|| scope.invalid("data", "tile data does not match the layer size"))?;
    trace!(
        "Tile layer {width}x{height} with {} non-empty cells",
        gids.iter().filter(|gid| **gid != EMPTY_TILE).count()
    );
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::document::MemoryDocuments;
    use crate::images::testing::CountingImages;

    fn loader() -> MapLoader<MemoryDocuments, CountingImages> {
        MapLoader::new(MemoryDocuments::new(), CountingImages::default())
    }

    #[test]
    fn tile_layer_data_is_row_major() {
        let layer = loader()
            .decode_layer(
                &json!({
                    "type": "tilelayer", "name": "ground",
                    "width": 3, "height": 2,
                    "data": [1, 2, 3, 4, 5, 6]
                }),
                "",
            )
            .unwrap();

        assert_eq!(layer.name, "ground");
        assert!(layer.visible);
        let tiles = layer.as_tiles().unwrap();
        assert_eq!(tiles.size(), IVec2::new(3, 2));
        assert_eq!(tiles.tile_at(IVec2::new(2, 0)), 3);
        assert_eq!(tiles.tile_at(IVec2::new(0, 1)), 4);
    }

    #[test]
    fn short_tile_data_is_invalid() {
        let err = loader()
            .decode_layer(
                &json!({"type": "tilelayer", "width": 2, "height": 2, "data": [1, 2, 3]}),
                "",
            )
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "data", .. }));
    }

    #[test]
    fn encoded_tile_data_is_rejected() {
        let err = loader()
            .decode_layer(
                &json!({
                    "type": "tilelayer", "width": 1, "height": 1,
                    "encoding": "base64", "data": "AQAAAA=="
                }),
                "",
            )
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "data", .. }));
    }

    #[test]
    fn unknown_and_missing_types_are_rejected() {
        let err = loader()
            .decode_layer(&json!({"type": "TileLayer"}), "")
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownLayerType { found: Some(ref found), .. } if found == "TileLayer"
        ));

        let err = loader().decode_layer(&json!({"name": "x"}), "").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownLayerType { found: None, .. }));
    }

    #[test]
    fn objects_fall_back_to_none_kind() {
        let layer = loader()
            .decode_layer(
                &json!({
                    "type": "objectgroup",
                    "objects": [
                        {"id": 1, "name": "spawn", "type": "player", "x": 32, "y": 48.9, "width": 16, "height": 16},
                        {"id": 2, "x": 0, "y": 0, "width": 0, "height": 0, "type": ""},
                        {"id": 3, "class": "chest", "x": 1, "y": 2, "width": 3, "height": 4,
                         "properties": [{"name": "gold", "type": "int", "value": 10}]}
                    ]
                }),
                "",
            )
            .unwrap();

        let objects = &layer.as_objects().unwrap().objects;
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].kind, "player");
        assert_eq!(objects[0].name, "spawn");
        assert_eq!(objects[0].position, IVec2::new(32, 48));
        assert_eq!(objects[1].kind, NO_OBJECT_KIND);
        assert_eq!(objects[2].kind, "chest");
        assert_eq!(objects[2].properties.int("gold"), Some(10));
        assert_eq!(objects[2].id, Some(3));
    }

    #[test]
    fn object_missing_position_is_reported_with_scope() {
        let err = loader()
            .decode_layer(
                &json!({"type": "objectgroup", "objects": [{"x": 1, "width": 1, "height": 1}]}),
                "maps",
            )
            .unwrap_err();
        match err {
            DecodeError::MissingField { field, scope } => {
                assert_eq!(field, "y");
                assert_eq!(scope, "<document in maps>: objects[0]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn image_layer_loads_relative_to_base_dir() {
        let mut loader = loader();
        let layer = loader
            .decode_layer(
                &json!({"type": "imagelayer", "image": "../bg/sky.png", "x": 4, "y": 8}),
                "assets/maps",
            )
            .unwrap();

        let image = layer.as_image().unwrap();
        assert_eq!(image.image_path, Some(PathBuf::from("assets/bg/sky.png")));
        assert_eq!(image.position, IVec2::new(4, 8));
        assert_eq!(image.pixel_size(), IVec2::new(64, 32));
        assert_eq!(loader.images().outstanding(), 1);
    }

    #[test]
    fn image_layer_without_image() {
        let mut loader = loader();
        let layer = loader
            .decode_layer(&json!({"type": "imagelayer", "image": "", "x": 0, "y": 0}), "")
            .unwrap();
        assert!(layer.as_image().unwrap().image.is_none());
        assert!(loader.images().loaded.is_empty());
    }

    #[test]
    fn group_preserves_child_order() {
        let layer = loader()
            .decode_layer(
                &json!({
                    "type": "group", "name": "outer", "visible": false,
                    "layers": [
                        {"type": "tilelayer", "name": "a", "width": 0, "height": 0, "data": []},
                        {"type": "group", "name": "b", "layers": [
                            {"type": "objectgroup", "name": "c", "objects": []}
                        ]},
                        {"type": "objectgroup", "name": "d", "objects": []}
                    ]
                }),
                "",
            )
            .unwrap();

        assert!(!layer.visible);
        let names: Vec<_> = layer.children().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "d"]);
        assert_eq!(layer.child(1).and_then(|b| b.child(0)).map(|c| c.name.as_str()), Some("c"));
    }

    #[test]
    fn failing_sibling_releases_earlier_images() {
        let mut loader = MapLoader::new(MemoryDocuments::new(), CountingImages::failing_on("c.png"));
        let err = loader
            .decode_layer(
                &json!({
                    "type": "group",
                    "layers": [
                        {"type": "imagelayer", "image": "a.png", "x": 0, "y": 0},
                        {"type": "group", "layers": [
                            {"type": "imagelayer", "image": "b.png", "x": 0, "y": 0}
                        ]},
                        {"type": "imagelayer", "image": "c.png", "x": 0, "y": 0}
                    ]
                }),
                "",
            )
            .unwrap_err();

        assert!(matches!(err, DecodeError::ImageUnavailable { .. }));
        assert_eq!(loader.images().loaded.len(), 2);
        assert_eq!(loader.images().outstanding(), 0);
        assert_eq!(loader.images().double_released, 0);
    }
}
