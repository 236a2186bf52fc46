//! A square grass patch and every GPU resource it owns.
//!
//! A patch covers `patch_size` x `patch_size` world units. It bakes its own
//! normal/height texture, owns its simulation state, uniform and indirect
//! argument buffers, and draws from a window of the shared blade buffer that
//! starts at a random `start_index`.

use rand::Rng;
use wgpu::util::DeviceExt;

use crate::core::types::{Mat4, Quat, Vec3};
use crate::core::Result;
use crate::math::Aabb;
use crate::render::limits;
use crate::render::pipeline::{GrassRenderPipeline, GrassSimulationPipeline, PatchBindings};
use super::data_texture::{normal_height_lod, NormalHeightData, NormalHeightTexture};
use super::indirect::{IndirectDrawController, TierArgs};
use super::params::PatchUniform;
use super::provider::{HeightProvider, NormalProvider};
use super::settings::GrassSettings;
use super::simulation::{SimulationDispatcher, SimulationPhase};

/// Rectangle in the global terrain parameterisation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Map a patch-local `(u, v)` to global terrain coordinates
    pub fn global(&self, u: f32, v: f32) -> (f32, f32) {
        (self.x + self.width * u, self.y + self.height * v)
    }
}

/// Where a patch sits, in world space and in terrain uv space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchDescriptor {
    pub bounds: Aabb,
    pub uv: UvRect,
}

/// Uniform start index in `[0, shared_buffer_length - max_blades_per_patch)`
pub fn draw_start_index<R: Rng>(rng: &mut R, settings: &GrassSettings) -> u32 {
    rng.gen_range(0..settings.start_index_range())
}

/// Per-patch animation phase, each component in `[0, 1)`
pub fn draw_parameter_offset<R: Rng>(rng: &mut R) -> [f32; 2] {
    [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)]
}

/// Unit-square patch space to world space.
///
/// Translation is the patch's min corner at the terrain base; the y scale is
/// the terrain height so normalized heights land on the surface.
pub fn patch_model_matrix(bounds: &Aabb, patch_size: f32, terrain_height: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::new(patch_size, terrain_height, patch_size),
        Quat::IDENTITY,
        bounds.min,
    )
}

/// Distance up to which the full-resolution normal/height level is sampled
fn detail_distance(settings: &GrassSettings) -> f32 {
    if settings.lod.geometry.peak > 0.0 {
        settings.lod.geometry.peak
    } else {
        settings.patch_size
    }
}

/// Shared state every patch needs while it is built
pub struct PatchResources<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub settings: &'a GrassSettings,
    pub simulation: &'a GrassSimulationPipeline,
    pub render: &'a GrassRenderPipeline,
    pub globals: &'a wgpu::Buffer,
    pub heights: &'a dyn HeightProvider,
    pub normals: &'a dyn NormalProvider,
    pub terrain_height: f32,
}

/// Per-frame inputs to `GrassPatch::update`
#[derive(Clone, Copy, Debug)]
pub struct PatchFrame {
    pub camera_position: Vec3,
    pub time: f32,
    pub delta_time: f32,
}

/// One grass patch.
///
/// GPU resources are released when the patch is dropped; `destroy` frees them
/// immediately.
pub struct GrassPatch {
    bounds: Aabb,
    uv: UvRect,
    uniform: PatchUniform,
    uniform_buffer: wgpu::Buffer,
    normal_height: NormalHeightTexture,
    simulation: SimulationDispatcher,
    indirect: IndirectDrawController,
    bind_group: wgpu::BindGroup,
    distance: f32,
}

impl GrassPatch {
    pub fn new<R: Rng>(res: &PatchResources<'_>, desc: &PatchDescriptor, rng: &mut R) -> Result<Self> {
        let settings = res.settings;

        let data = NormalHeightData::bake(
            desc.uv,
            settings.per_patch_texture_resolution(),
            res.heights,
            res.normals,
            res.terrain_height,
        );
        let normal_height = NormalHeightTexture::new(res.device, res.queue, &data, settings.trilinear_filtering)?;

        let model = patch_model_matrix(&desc.bounds, settings.patch_size, res.terrain_height);
        let start_index = draw_start_index(rng, settings);
        let uniform = PatchUniform::new(model, draw_parameter_offset(rng), start_index, settings);

        limits::check_buffer(&res.device.limits(), "grass_patch_uniform", std::mem::size_of::<PatchUniform>() as u64)?;
        let uniform_buffer = res.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_patch_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let simulation = SimulationDispatcher::new(
            res.device,
            res.simulation,
            settings,
            &uniform_buffer,
            res.globals,
            &normal_height,
        )?;
        let indirect = IndirectDrawController::new(res.device, settings)?;

        let bind_group = res.render.create_patch_bind_group(
            res.device,
            &PatchBindings {
                patch_uniform: &uniform_buffer,
                simulation: simulation.array_view(),
                normal_height: normal_height.view(),
                sampler: normal_height.sampler(),
            },
        );

        log::trace!(
            "Patch at ({:.1}, {:.1}) start_index={}",
            desc.bounds.min.x,
            desc.bounds.min.z,
            start_index
        );

        Ok(Self {
            bounds: desc.bounds,
            uv: desc.uv,
            uniform,
            uniform_buffer,
            normal_height,
            simulation,
            indirect,
            bind_group,
            distance: f32::INFINITY,
        })
    }

    /// Record the one-time setup dispatch
    pub fn setup(&mut self, encoder: &mut wgpu::CommandEncoder, pipeline: &GrassSimulationPipeline) -> Result<()> {
        self.simulation.setup_once(encoder, pipeline)?;
        self.uniform.sim_layer = self.simulation.current_layer();
        Ok(())
    }

    /// Per-frame update: LOD, argument upload, physics step, uniform write
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &GrassSimulationPipeline,
        settings: &GrassSettings,
        frame: &PatchFrame,
    ) -> Result<()> {
        self.distance = self.bounds.distance_to_point(frame.camera_position);
        self.indirect.recompute_instance_counts(queue, self.distance, &settings.lod);

        self.simulation.step_physics(encoder, pipeline)?;

        self.uniform.sim_layer = self.simulation.current_layer();
        self.uniform.time = frame.time;
        self.uniform.delta_time = frame.delta_time;
        self.uniform.lod_instances = settings.lod.instance_counts_exact(self.distance);
        self.uniform.normal_height_lod = normal_height_lod(
            self.distance,
            detail_distance(settings),
            self.normal_height.mip_level_count(),
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
        Ok(())
    }

    /// Issue this patch's indirect draws. Returns the number of draw calls.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &GrassRenderPipeline,
        shared_bind_group: &wgpu::BindGroup,
    ) -> u32 {
        self.indirect.draw(pass, pipeline, shared_bind_group, &self.bind_group)
    }

    /// Patches never subdivide
    pub fn is_leaf(&self) -> bool {
        true
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn uv(&self) -> &UvRect {
        &self.uv
    }

    pub fn start_index(&self) -> u32 {
        self.uniform.start_index
    }

    /// Camera distance from the last update
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn args(&self) -> &TierArgs {
        self.indirect.args()
    }

    pub fn simulation_phase(&self) -> SimulationPhase {
        self.simulation.phase()
    }

    pub fn normal_height_mip_levels(&self) -> u32 {
        self.normal_height.mip_level_count()
    }

    /// Free all GPU resources now
    pub fn destroy(self) {
        self.indirect.destroy();
        self.simulation.destroy();
        self.normal_height.destroy();
        self.uniform_buffer.destroy();
    }
}
