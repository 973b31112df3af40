//! Error types for decoding and editing Tiled JSON maps.

use std::io;
use std::path::PathBuf;

use glam::IVec2;
use thiserror::Error;

/// Failure while decoding a map, a tileset, or one of their layers.
///
/// Every variant except [`DecodeError::UnrecognizedPropertyType`] aborts the
/// enclosing decode. Anything already loaded through the image collaborator
/// is released before the error reaches the caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read map {}: {source}", path.display())]
    MapUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed document {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field `{field}` in {scope}")]
    MissingField { field: &'static str, scope: String },

    #[error("Invalid field `{field}` in {scope}: {reason}")]
    InvalidField {
        field: &'static str,
        scope: String,
        reason: String,
    },

    #[error("Unknown layer type {found:?} in {scope}")]
    UnknownLayerType {
        found: Option<String>,
        scope: String,
    },

    #[error("Unrecognized type `{type_name}` for property `{name}` in {scope}")]
    UnrecognizedPropertyType {
        name: String,
        type_name: String,
        scope: String,
    },

    #[error("Tileset reference {} could not be read: {source}", path.display())]
    ReferenceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tileset reference cycle through {}", path.display())]
    CyclicReference { path: PathBuf },

    #[error("Image {} could not be loaded: {source}", path.display())]
    ImageUnavailable {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error(
        "Tileset starting at gid {next} overlaps the previous tileset (gids {previous_first}..{previous_end})"
    )]
    OverlappingTilesets {
        previous_first: u32,
        previous_end: u32,
        next: u32,
    },
}

/// Failure reported by a [`DocumentReader`](crate::document::DocumentReader).
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure reported by an [`ImageLoader`](crate::images::ImageLoader).
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Other(String),
}

/// Failure of a caller-directed tile grid edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetTileError {
    #[error("Position {position} is outside the {size} tile grid")]
    OutOfBounds { position: IVec2, size: IVec2 },

    #[error("Layer is not a tile layer")]
    NotATileLayer,

    #[error("No layer at index path {0:?}")]
    NoSuchLayer(Vec<usize>),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
