//! GPU-ready grass uniforms and per-blade records.
//!
//! Layouts must match the structs in grass_simulation.wgsl and
//! grass_render.wgsl byte for byte.

use bytemuck::{Pod, Zeroable};

use crate::core::types::Mat4;
use super::settings::GrassSettings;

/// Per-patch uniform (112 bytes), visible to compute and vertex stages
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PatchUniform {
    /// Patch-local unit square to world (64 bytes, offset 0)
    pub model: [[f32; 4]; 4],
    /// Animation phase offset in [0, 1) (8 bytes, offset 64)
    pub parameter_offset: [f32; 2],
    /// First record of this patch in the shared blade buffer (offset 72)
    pub start_index: u32,
    /// Non-zero when the height transition is enabled (offset 76)
    pub apply_transition: u32,
    // -- 16 bytes --
    pub grass_data_resolution: u32,
    /// Simulation layer written most recently (offset 84)
    pub sim_layer: u32,
    pub time: f32,
    pub delta_time: f32,
    // -- 16 bytes --
    /// Continuous instance counts per tier (12 bytes, offset 96)
    pub lod_instances: [f32; 3],
    /// Mip level the vertex stage samples the normal/height texture at (offset 108)
    pub normal_height_lod: f32,
    // Total: 112 bytes
}

impl PatchUniform {
    pub fn new(model: Mat4, parameter_offset: [f32; 2], start_index: u32, settings: &GrassSettings) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            parameter_offset,
            start_index,
            apply_transition: settings.enable_height_transition as u32,
            grass_data_resolution: settings.grass_data_resolution,
            sim_layer: 0,
            time: 0.0,
            delta_time: 0.0,
            lod_instances: [0.0; 3],
            normal_height_lod: 0.0,
        }
    }
}

/// Field-wide uniform (48 bytes), shared by every draw
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GrassGlobals {
    pub blades_per_instance: u32,
    pub billboards_per_instance: u32,
    pub shared_buffer_length: u32,
    pub time: f32,
    // -- 16 bytes --
    pub wind_direction: [f32; 2],
    pub wind_strength: f32,
    pub billboard_size: f32,
    // -- 16 bytes --
    /// Distance where the geometry tier reaches zero instances
    pub geometry_lod_end: f32,
    pub _pad: [f32; 3],
    // Total: 48 bytes
}

impl GrassGlobals {
    pub fn from_settings(settings: &GrassSettings, time: f32) -> Self {
        Self {
            blades_per_instance: settings.min_blades_per_patch,
            billboards_per_instance: settings.min_billboards_per_patch,
            shared_buffer_length: settings.shared_buffer_length,
            time,
            wind_direction: settings.wind_direction,
            wind_strength: settings.wind_strength,
            billboard_size: settings.billboard_size,
            geometry_lod_end: settings.lod.geometry.end,
            _pad: [0.0; 3],
        }
    }
}

/// One record of the shared blade buffer (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuBladeParams {
    /// Position inside the patch, [0, 1)^2
    pub uv: [f32; 2],
    pub height: f32,
    pub width: f32,
    /// Rotation around the up axis, radians
    pub facing: f32,
    /// Spring stiffness multiplier
    pub stiffness: f32,
    pub _pad: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_patch_uniform_layout() {
        assert_eq!(size_of::<PatchUniform>(), 112);
        assert_eq!(offset_of!(PatchUniform, parameter_offset), 64);
        assert_eq!(offset_of!(PatchUniform, grass_data_resolution), 80);
        assert_eq!(offset_of!(PatchUniform, sim_layer), 84);
        assert_eq!(offset_of!(PatchUniform, lod_instances), 96);
        assert_eq!(offset_of!(PatchUniform, normal_height_lod), 108);
    }

    #[test]
    fn test_globals_layout() {
        assert_eq!(size_of::<GrassGlobals>(), 48);
        assert_eq!(offset_of!(GrassGlobals, wind_direction), 16);
        assert_eq!(offset_of!(GrassGlobals, geometry_lod_end), 32);
    }

    #[test]
    fn test_blade_params_stride() {
        assert_eq!(size_of::<GpuBladeParams>(), 32);
        assert_eq!(size_of::<GpuBladeParams>() % 16, 0);
    }

    #[test]
    fn test_patch_uniform_from_settings() {
        let settings = GrassSettings { enable_height_transition: false, ..Default::default() };
        let u = PatchUniform::new(Mat4::IDENTITY, [0.25, 0.5], 42, &settings);
        assert_eq!(u.apply_transition, 0);
        assert_eq!(u.start_index, 42);
        assert_eq!(u.grass_data_resolution, settings.grass_data_resolution);
        assert_eq!(bytemuck::bytes_of(&u).len(), 112);
    }

    #[test]
    fn test_globals_from_settings() {
        let settings = GrassSettings::default();
        let g = GrassGlobals::from_settings(&settings, 3.5);
        assert_eq!(g.blades_per_instance, settings.min_blades_per_patch);
        assert_eq!(g.geometry_lod_end, settings.lod.geometry.end);
        assert_eq!(g.time, 3.5);
    }
}
