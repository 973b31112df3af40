//! Grid coordinates, pixel conversions, and global tile id bits.

use glam::{IVec2, Vec2};

/// Integer grid coordinate, also used for pixel sizes.
pub type GridPosition = IVec2;

/// Global id value of an empty cell.
pub const EMPTY_TILE: u32 = 0;

pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
pub const ROTATED_HEXAGONAL_120: u32 = 0x1000_0000;

/// Bits of a global id that address a tile; the rest are transform flags.
pub const GID_MASK: u32 =
    !(FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL_120);

/// Strip Tiled's transform flags from a cell value.
#[inline]
pub fn strip_flags(global_id: u32) -> u32 {
    global_id & GID_MASK
}

/// Top-left pixel of grid cell `pos`.
///
/// Computed in floating point, so coordinates far outside any real map lose
/// precision instead of overflowing.
pub fn grid_to_pixel(pos: GridPosition, tile_size: GridPosition) -> Vec2 {
    pos.as_vec2() * tile_size.as_vec2()
}

/// Grid cell containing pixel `pos`, rounding toward negative infinity.
///
/// A zero tile dimension maps that axis to 0.
pub fn pixel_to_grid(pos: Vec2, tile_size: GridPosition) -> GridPosition {
    let axis = |p: f32, size: i32| {
        if size == 0 {
            0
        } else {
            (p / size as f32).floor() as i32
        }
    };
    IVec2::new(axis(pos.x, tile_size.x), axis(pos.y, tile_size.y))
}

/// Pixel rectangle of a tile inside its tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRect {
    pub fn min(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }
}
