//! # tiledjson
//!
//! Decoder for Tiled JSON maps, with an optional Bevy asset loader.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiledjson::prelude::*;
//!
//! let map = tiledjson::load_map("assets/maps/level1.json")?;
//! for (depth, layer) in map.iter_layers() {
//!     println!("{:indent$}{} ({:?})", "", layer.name, layer.layer_type(), indent = depth * 2);
//! }
//! # Ok::<(), DecodeError>(())
//! ```
//!
//! ## Features
//!
//! - **bevy**: `TiledJsonPlugin`, which loads `.tmj` maps as Bevy assets
//!
//! ## Crates
//!
//! - [`assets`]: the decoder and the decoded map model
//! - `bevy` (feature-gated): Bevy asset loader built on [`assets`]

pub use tiledjson_assets as assets;
pub use tiledjson_assets::load_map;

#[cfg(feature = "bevy")]
pub use tiledjson_bevy as bevy;

/// Unified prelude for tiledjson
pub mod prelude {
    pub use tiledjson_assets::prelude::*;

    #[cfg(feature = "bevy")]
    pub use tiledjson_bevy::prelude::{TiledJsonMap, TiledJsonMapLoader, TiledJsonPlugin};
}
