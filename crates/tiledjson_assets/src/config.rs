//! Decoder configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`MapLoader`](crate::loaders::MapLoader).
///
/// Serializable so engine integrations can carry it as loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Fail on property entries whose type is not `int`, `float`, `bool` or
    /// `string` instead of skipping them with a warning (default: false).
    pub strict_properties: bool,

    /// Reject maps whose tileset gid ranges overlap or are not increasing
    /// (default: true).
    pub validate_tileset_ranges: bool,

    /// Longest chain of tileset `source` references that is followed
    /// (default: 8).
    pub max_reference_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            strict_properties: false,
            validate_tileset_ranges: true,
            max_reference_depth: 8,
        }
    }
}

impl DecodeConfig {
    pub fn strict_properties(mut self, strict: bool) -> Self {
        self.strict_properties = strict;
        self
    }

    pub fn validate_tileset_ranges(mut self, validate: bool) -> Self {
        self.validate_tileset_ranges = validate;
        self
    }

    pub fn max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }
}
