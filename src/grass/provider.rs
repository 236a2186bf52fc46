//! Terrain queries the grass needs.
//!
//! Coordinates are the global terrain parameterisation, `x, y` in `[0, 1]`.
//! Edge patches may ask slightly outside that range; implementations clamp.

use crate::core::types::Vec3;

/// World-space terrain height at a normalized position
pub trait HeightProvider: Sync {
    fn height(&self, x: f32, y: f32) -> f32;
}

/// Unit surface normal at a normalized position
pub trait NormalProvider: Sync {
    fn normal(&self, x: f32, y: f32) -> Vec3;
}

/// Terrain extent in world units
pub trait DimensionsProvider {
    fn width(&self) -> f32;
    fn depth(&self) -> f32;
    /// Maximum terrain height; heights are normalized by this
    fn height(&self) -> f32;
}

/// A flat plane at constant height
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTerrain {
    pub width: f32,
    pub depth: f32,
    /// Height of the plane above the terrain origin
    pub level: f32,
    /// Maximum terrain height used for normalization
    pub max_height: f32,
}

impl FlatTerrain {
    pub fn new(width: f32, depth: f32, level: f32, max_height: f32) -> Self {
        Self { width, depth, level, max_height }
    }
}

impl HeightProvider for FlatTerrain {
    fn height(&self, _x: f32, _y: f32) -> f32 {
        self.level
    }
}

impl NormalProvider for FlatTerrain {
    fn normal(&self, _x: f32, _y: f32) -> Vec3 {
        Vec3::Y
    }
}

impl DimensionsProvider for FlatTerrain {
    fn width(&self) -> f32 {
        self.width
    }

    fn depth(&self) -> f32 {
        self.depth
    }

    fn height(&self) -> f32 {
        self.max_height
    }
}
