//! Decoded map model: the owned tree produced by the loaders.

pub mod grid;
pub mod layer;
pub mod map;
pub mod properties;
pub mod tileset;
