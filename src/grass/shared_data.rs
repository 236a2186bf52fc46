//! Shared per-blade parameter buffer.
//!
//! One read-only storage buffer for the whole field. Each patch reads a
//! contiguous window starting at its `start_index`, so neighbouring patches
//! look different without per-patch blade data.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wgpu::util::DeviceExt;

use crate::core::Result;
use crate::render::limits;
use super::params::GpuBladeParams;
use super::settings::GrassSettings;

/// Generate `settings.shared_buffer_length` blade records from `settings.seed`
pub fn generate_blade_params(settings: &GrassSettings) -> Vec<GpuBladeParams> {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let [h_min, h_max] = settings.blade_height;
    let [w_min, w_max] = settings.blade_width;

    (0..settings.shared_buffer_length)
        .map(|_| GpuBladeParams {
            uv: [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)],
            height: rng.gen_range(h_min..=h_max),
            width: rng.gen_range(w_min..=w_max),
            facing: rng.gen_range(0.0..TAU),
            stiffness: rng.gen_range(0.6..1.4),
            _pad: [0.0; 2],
        })
        .collect()
}

/// GPU storage buffer holding the shared blade records
pub struct SharedBladeBuffer {
    buffer: wgpu::Buffer,
    len: u32,
}

impl SharedBladeBuffer {
    pub fn new(device: &wgpu::Device, settings: &GrassSettings) -> Result<Self> {
        let size = settings.shared_buffer_length as u64 * std::mem::size_of::<GpuBladeParams>() as u64;
        limits::check_storage_binding(&device.limits(), "grass_blade_params", size)?;

        let params = generate_blade_params(settings);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_blade_params"),
            contents: bytemuck::cast_slice(&params),
            usage: wgpu::BufferUsages::STORAGE,
        });

        log::info!(
            "Shared blade buffer: {} records ({:.1} KB)",
            params.len(),
            size as f64 / 1024.0
        );

        Ok(Self { buffer, len: settings.shared_buffer_length })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings(seed: u64) -> GrassSettings {
        GrassSettings {
            seed,
            shared_buffer_length: 2048,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_blades() {
        let a = generate_blade_params(&small_settings(9));
        let b = generate_blade_params(&small_settings(9));
        assert_eq!(a, b);
        assert_eq!(a.len(), 2048);
    }

    #[test]
    fn test_different_seed_different_blades() {
        let a = generate_blade_params(&small_settings(1));
        let b = generate_blade_params(&small_settings(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_blades_within_ranges() {
        let settings = small_settings(3);
        for blade in generate_blade_params(&settings) {
            assert!(blade.uv.iter().all(|c| (0.0..1.0).contains(c)));
            assert!(blade.height >= settings.blade_height[0] && blade.height <= settings.blade_height[1]);
            assert!(blade.width >= settings.blade_width[0] && blade.width <= settings.blade_width[1]);
            assert!((0.0..TAU).contains(&blade.facing));
            assert!((0.6..1.4).contains(&blade.stiffness));
        }
    }

    #[test]
    fn test_fixed_size_range() {
        let settings = GrassSettings {
            blade_height: [0.5, 0.5],
            blade_width: [0.04, 0.04],
            ..small_settings(4)
        };
        assert!(settings.validate().is_ok());
        for blade in generate_blade_params(&settings) {
            assert_eq!(blade.height, 0.5);
            assert_eq!(blade.width, 0.04);
        }
    }
}
