//! A terrain-sized grid of grass patches sharing one set of pipelines.

use std::fmt;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wgpu::util::DeviceExt;

use crate::core::camera::Camera;
use crate::core::time::FrameClock;
use crate::core::types::Vec3;
use crate::core::{ConfigError, Result};
use crate::math::{Aabb, Frustum};
use crate::render::buffer::CameraBuffer;
use crate::render::pipeline::{GrassRenderPipeline, GrassSimulationPipeline, SharedBindings};
use super::params::GrassGlobals;
use super::patch::{GrassPatch, PatchDescriptor, PatchFrame, PatchResources, UvRect};
use super::provider::{DimensionsProvider, HeightProvider, NormalProvider};
use super::settings::GrassSettings;
use super::shared_data::SharedBladeBuffer;
use super::tier::RenderTier;

/// Split a `width` x `depth` terrain at `origin` into square patches.
///
/// Patches are row-major (rows along z). Edge patches keep the full
/// `patch_size` and may reach past the terrain; their uv rect then reaches
/// past 1 as well.
pub fn partition_terrain(
    origin: Vec3,
    width: f32,
    depth: f32,
    terrain_height: f32,
    patch_size: f32,
) -> std::result::Result<Vec<PatchDescriptor>, ConfigError> {
    for (name, value) in [
        ("terrain_width", width),
        ("terrain_depth", depth),
        ("terrain_height", terrain_height),
        ("patch_size", patch_size),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::NonPositive { name, value });
        }
    }

    let cols = (width / patch_size).ceil() as u32;
    let rows = (depth / patch_size).ceil() as u32;
    let uv_size = (patch_size / width, patch_size / depth);

    let mut patches = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let min = origin + Vec3::new(col as f32 * patch_size, 0.0, row as f32 * patch_size);
            let max = min + Vec3::new(patch_size, terrain_height, patch_size);
            patches.push(PatchDescriptor {
                bounds: Aabb::new(min, max),
                uv: UvRect::new(col as f32 * uv_size.0, row as f32 * uv_size.1, uv_size.0, uv_size.1),
            });
        }
    }
    Ok(patches)
}

/// What the last `render` call drew
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub patches: usize,
    pub visible: usize,
    pub draw_calls: u32,
    /// Instances drawn per tier, in draw order
    pub instances: [u32; 3],
}

impl FieldStats {
    /// Blades and billboards drawn
    pub fn primitives(&self, settings: &GrassSettings) -> u64 {
        RenderTier::ALL
            .iter()
            .map(|&tier| self.instances[tier.index()] as u64 * settings.primitives_per_instance(tier) as u64)
            .sum()
    }
}

impl fmt::Display for FieldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} patches, {} draws, instances geo/cross/screen {}/{}/{}",
            self.visible,
            self.patches,
            self.draw_calls,
            self.instances[0],
            self.instances[1],
            self.instances[2]
        )
    }
}

/// All grass on one terrain
pub struct GrassField {
    settings: GrassSettings,
    simulation_pipeline: GrassSimulationPipeline,
    render_pipeline: GrassRenderPipeline,
    camera_buffer: CameraBuffer,
    globals_buffer: wgpu::Buffer,
    // Kept alive for the shared bind group
    #[allow(dead_code)]
    blades: SharedBladeBuffer,
    shared_bind_group: wgpu::BindGroup,
    patches: Vec<GrassPatch>,
}

impl GrassField {
    /// Build every patch over `terrain` and submit their setup dispatches
    pub fn new<T>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        settings: GrassSettings,
        terrain: &T,
        origin: Vec3,
    ) -> Result<Self>
    where
        T: HeightProvider + NormalProvider + DimensionsProvider,
    {
        let start = Instant::now();
        settings.validate()?;

        let terrain_height = DimensionsProvider::height(terrain);
        let descriptors = partition_terrain(origin, terrain.width(), terrain.depth(), terrain_height, settings.patch_size)?;

        let simulation_pipeline = GrassSimulationPipeline::new(device);
        let render_pipeline = GrassRenderPipeline::new(device, surface_format);
        let camera_buffer = CameraBuffer::new(device);
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_globals"),
            contents: bytemuck::bytes_of(&GrassGlobals::from_settings(&settings, 0.0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blades = SharedBladeBuffer::new(device, &settings)?;
        let shared_bind_group = render_pipeline.create_shared_bind_group(
            device,
            &SharedBindings {
                camera: camera_buffer.buffer(),
                globals: &globals_buffer,
                blade_params: blades.buffer(),
            },
        );

        // Separate stream from the blade parameters
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        rng.set_stream(1);

        let resources = PatchResources {
            device,
            queue,
            settings: &settings,
            simulation: &simulation_pipeline,
            render: &render_pipeline,
            globals: &globals_buffer,
            heights: terrain,
            normals: terrain,
            terrain_height,
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grass_setup_encoder"),
        });
        let mut patches = Vec::with_capacity(descriptors.len());
        for desc in &descriptors {
            let mut patch = GrassPatch::new(&resources, desc, &mut rng)?;
            patch.setup(&mut encoder, &simulation_pipeline)?;
            patches.push(patch);
        }
        queue.submit(std::iter::once(encoder.finish()));

        log::info!(
            "Grass field: {} patches ({}x{} texels each) built in {:.1}ms",
            patches.len(),
            settings.grass_data_resolution,
            settings.grass_data_resolution,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            settings,
            simulation_pipeline,
            render_pipeline,
            camera_buffer,
            globals_buffer,
            blades,
            shared_bind_group,
            patches,
        })
    }

    /// Per-frame update of every patch, in order: LOD, argument upload,
    /// physics dispatch, uniform write
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        camera: &Camera,
        clock: &FrameClock,
    ) -> Result<()> {
        self.camera_buffer.update(queue, camera);

        let globals = GrassGlobals::from_settings(&self.settings, clock.elapsed_secs());
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let frame = PatchFrame {
            camera_position: camera.position,
            time: clock.elapsed_secs(),
            delta_time: clock.simulation_step(),
        };
        for patch in &mut self.patches {
            patch.update(queue, encoder, &self.simulation_pipeline, &self.settings, &frame)?;
        }
        Ok(())
    }

    /// Draw every patch whose bounds intersect `frustum`
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, frustum: &Frustum) -> FieldStats {
        let mut stats = FieldStats {
            patches: self.patches.len(),
            ..Default::default()
        };

        for patch in &self.patches {
            if !frustum.intersects_aabb(patch.bounds()) {
                continue;
            }
            stats.visible += 1;
            stats.draw_calls += patch.draw(pass, &self.render_pipeline, &self.shared_bind_group);
            for (total, count) in stats.instances.iter_mut().zip(patch.args().instance_counts()) {
                *total += count;
            }
        }
        stats
    }

    pub fn settings(&self) -> &GrassSettings {
        &self.settings
    }

    pub fn patches(&self) -> &[GrassPatch] {
        &self.patches
    }

    /// Free every patch's GPU resources now
    pub fn destroy(self) {
        let count = self.patches.len();
        for patch in self.patches {
            patch.destroy();
        }
        log::debug!("Destroyed {} grass patches", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_exact_fit() {
        let patches = partition_terrain(Vec3::ZERO, 32.0, 16.0, 10.0, 8.0).unwrap();
        assert_eq!(patches.len(), 4 * 2);

        let first = &patches[0];
        assert_eq!(first.bounds, Aabb::new(Vec3::ZERO, Vec3::new(8.0, 10.0, 8.0)));
        assert_eq!(first.uv, UvRect::new(0.0, 0.0, 0.25, 0.5));

        // Row-major: index 5 is row 1, column 1
        let p = &patches[5];
        assert_eq!(p.bounds.min, Vec3::new(8.0, 0.0, 8.0));
        assert_eq!(p.uv, UvRect::new(0.25, 0.5, 0.25, 0.5));
    }

    #[test]
    fn test_partition_rounds_up() {
        let origin = Vec3::new(-50.0, 3.0, 10.0);
        let patches = partition_terrain(origin, 20.0, 9.0, 5.0, 8.0).unwrap();
        assert_eq!(patches.len(), 3 * 2);

        // Edge patch keeps the full size and reaches past the terrain
        let last = patches.last().unwrap();
        assert_eq!(last.bounds.max, Vec3::new(-50.0 + 24.0, 8.0, 10.0 + 16.0));
        assert!(last.uv.x + last.uv.width > 1.0);
    }

    #[test]
    fn test_partition_covers_terrain_without_overlap() {
        let patches = partition_terrain(Vec3::ZERO, 40.0, 40.0, 4.0, 8.0).unwrap();
        let total: f32 = patches.iter().map(|p| p.uv.width * p.uv.height).sum();
        assert!((total - 1.0).abs() < 1e-5);
        for (i, a) in patches.iter().enumerate() {
            for b in &patches[i + 1..] {
                let overlap = a.bounds.min.x < b.bounds.max.x
                    && b.bounds.min.x < a.bounds.max.x
                    && a.bounds.min.z < b.bounds.max.z
                    && b.bounds.min.z < a.bounds.max.z;
                assert!(!overlap);
            }
        }
    }

    #[test]
    fn test_partition_rejects_bad_dimensions() {
        assert_eq!(
            partition_terrain(Vec3::ZERO, 0.0, 10.0, 1.0, 8.0).unwrap_err(),
            ConfigError::NonPositive { name: "terrain_width", value: 0.0 }
        );
        assert!(matches!(
            partition_terrain(Vec3::ZERO, 10.0, 10.0, f32::NAN, 8.0),
            Err(ConfigError::NonPositive { name: "terrain_height", .. })
        ));
    }

    #[test]
    fn test_stats_primitives() {
        let settings = GrassSettings::default();
        let stats = FieldStats {
            patches: 4,
            visible: 2,
            draw_calls: 3,
            instances: [2, 1, 0],
        };
        let expected = 2 * settings.min_blades_per_patch as u64 + settings.min_billboards_per_patch as u64;
        assert_eq!(stats.primitives(&settings), expected);
        assert_eq!(stats.to_string(), "2/4 patches, 3 draws, instances geo/cross/screen 2/1/0");
    }
}
