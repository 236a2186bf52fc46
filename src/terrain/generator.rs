//! Noise-based procedural terrain

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::core::types::Vec3;
use crate::grass::provider::{DimensionsProvider, HeightProvider, NormalProvider};

/// Parameters controlling terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub width: f32,        // World extent along x
    pub depth: f32,        // World extent along z
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            width: 256.0,
            depth: 256.0,
            scale: 120.0,
            height_scale: 12.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Rolling fBm terrain, queried in normalized `[0, 1]` coordinates
pub struct NoiseTerrain {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl NoiseTerrain {
    /// Horizontal step for normal estimation, in world units
    const NORMAL_EPSILON: f32 = 0.5;

    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Height at world position (x, z), in `[0, height_scale]`
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // Noise is roughly [-1, 1]
        let normalized = ((self.noise.get([nx, nz]) + 1.0) / 2.0).clamp(0.0, 1.0);
        (normalized * self.params.height_scale as f64) as f32
    }

    fn to_world(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(0.0, 1.0) * self.params.width, y.clamp(0.0, 1.0) * self.params.depth)
    }
}

impl HeightProvider for NoiseTerrain {
    fn height(&self, x: f32, y: f32) -> f32 {
        let (wx, wz) = self.to_world(x, y);
        self.height_at(wx, wz)
    }
}

impl NormalProvider for NoiseTerrain {
    /// Central differences in world units
    fn normal(&self, x: f32, y: f32) -> Vec3 {
        let (wx, wz) = self.to_world(x, y);
        let e = Self::NORMAL_EPSILON;
        let dx = self.height_at(wx - e, wz) - self.height_at(wx + e, wz);
        let dz = self.height_at(wx, wz - e) - self.height_at(wx, wz + e);
        Vec3::new(dx, 2.0 * e, dz).normalize()
    }
}

impl DimensionsProvider for NoiseTerrain {
    fn width(&self) -> f32 {
        self.params.width
    }

    fn depth(&self) -> f32 {
        self.params.depth
    }

    fn height(&self) -> f32 {
        self.params.height_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_params_default() {
        let params = TerrainParams::default();
        assert_eq!(params.octaves, 4);
        assert!(params.height_scale > 0.0);
        assert!(params.width > 0.0 && params.depth > 0.0);
    }

    #[test]
    fn test_height_in_range() {
        let terrain = NoiseTerrain::new(TerrainParams::default());
        for i in 0..=20 {
            for j in 0..=20 {
                let h = HeightProvider::height(&terrain, i as f32 / 20.0, j as f32 / 20.0);
                assert!((0.0..=terrain.params().height_scale).contains(&h));
            }
        }
    }

    #[test]
    fn test_height_consistency() {
        let a = NoiseTerrain::new(TerrainParams::default());
        let b = NoiseTerrain::new(TerrainParams::default());
        assert_eq!(a.height_at(37.0, 91.0), b.height_at(37.0, 91.0));

        let other = NoiseTerrain::new(TerrainParams { seed: 7, ..Default::default() });
        let differs = (0..16).any(|i| {
            let p = i as f32 * 13.7;
            a.height_at(p, p) != other.height_at(p, p)
        });
        assert!(differs);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let terrain = NoiseTerrain::new(TerrainParams::default());
        assert_eq!(
            HeightProvider::height(&terrain, -0.5, 1.5),
            HeightProvider::height(&terrain, 0.0, 1.0)
        );
        assert_eq!(terrain.normal(1.2, 0.3), terrain.normal(1.0, 0.3));
    }

    #[test]
    fn test_normals_point_up() {
        let terrain = NoiseTerrain::new(TerrainParams::default());
        for i in 0..10 {
            let n = terrain.normal(i as f32 / 10.0, 0.5);
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn test_nearly_flat_terrain_normal() {
        let terrain = NoiseTerrain::new(TerrainParams { height_scale: 1e-4, ..Default::default() });
        let n = terrain.normal(0.4, 0.6);
        assert!(n.dot(Vec3::Y) > 0.9999);
    }
}
