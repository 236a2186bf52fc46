//! Per-patch blade simulation state and its compute dispatches.
//!
//! The state lives in a two-layer `Rgba32Float` array texture. Each dispatch
//! reads one layer and writes the other; draws sample the layer written last.

use crate::core::{Error, Result};
use crate::render::limits;
use crate::render::pipeline::{GrassSimulationPipeline, SimulationBindings, SimulationKernel};
use super::data_texture::NormalHeightTexture;
use super::settings::GrassSettings;

/// Threads per workgroup side; must match `@workgroup_size` in grass_simulation.wgsl
pub const SIMULATION_WORKGROUP_SIZE: u32 = 8;

/// Workgroups per side for a `resolution` x `resolution` grid.
///
/// Integer division: cells past the last full workgroup are not simulated.
pub fn workgroup_count(resolution: u32) -> u32 {
    resolution / SIMULATION_WORKGROUP_SIZE
}

/// Which simulation layer is read and which is written next
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerCursor {
    read: u32,
}

impl LayerCursor {
    pub fn read_layer(&self) -> u32 {
        self.read
    }

    pub fn write_layer(&self) -> u32 {
        1 - self.read
    }

    /// Flip after a dispatch; the layer just written becomes the read layer
    pub fn advance(&mut self) {
        self.read = self.write_layer();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Textures exist, setup not yet dispatched
    Pending,
    /// Setup dispatched; physics may run
    Running,
}

/// Host-side dispatch ordering: setup exactly once, physics only afterwards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationState {
    phase: SimulationPhase,
    cursor: LayerCursor,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            phase: SimulationPhase::Pending,
            cursor: LayerCursor::default(),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Layer holding the most recent state
    pub fn current_layer(&self) -> u32 {
        self.cursor.read_layer()
    }

    /// Claim the setup dispatch. Returns the layer to read.
    pub fn begin_setup(&mut self) -> Result<u32> {
        if self.phase != SimulationPhase::Pending {
            return Err(Error::Simulation("setup already dispatched for this patch".into()));
        }
        let read = self.cursor.read_layer();
        self.cursor.advance();
        self.phase = SimulationPhase::Running;
        Ok(read)
    }

    /// Claim one physics dispatch. Returns the layer to read.
    pub fn begin_physics(&mut self) -> Result<u32> {
        if self.phase != SimulationPhase::Running {
            return Err(Error::Simulation("physics dispatched before setup".into()));
        }
        let read = self.cursor.read_layer();
        self.cursor.advance();
        Ok(read)
    }
}

/// A patch's simulation texture, bind groups and dispatch state
pub struct SimulationDispatcher {
    texture: wgpu::Texture,
    array_view: wgpu::TextureView,
    /// Indexed by the layer read
    bind_groups: [wgpu::BindGroup; 2],
    state: SimulationState,
    workgroups: u32,
}

impl SimulationDispatcher {
    pub fn new(
        device: &wgpu::Device,
        pipeline: &GrassSimulationPipeline,
        settings: &GrassSettings,
        patch_uniform: &wgpu::Buffer,
        globals: &wgpu::Buffer,
        normal_height: &NormalHeightTexture,
    ) -> Result<Self> {
        let res = settings.per_patch_texture_resolution();
        let device_limits = device.limits();
        limits::check_texture_2d(&device_limits, "grass_simulation_state", res, res)?;
        limits::check_texture_layers(&device_limits, "grass_simulation_state", 2)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("grass_simulation_state"),
            size: wgpu::Extent3d {
                width: res,
                height: res,
                depth_or_array_layers: 2,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layer_view = |layer: u32| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("grass_simulation_layer"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        };
        let layers = [layer_view(0), layer_view(1)];

        let bind_groups = [0usize, 1].map(|read| {
            pipeline.create_bind_group(
                device,
                &SimulationBindings {
                    patch_uniform,
                    globals,
                    normal_height: normal_height.view(),
                    state_read: &layers[read],
                    state_write: &layers[1 - read],
                },
            )
        });

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("grass_simulation_array"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        Ok(Self {
            texture,
            array_view,
            bind_groups,
            state: SimulationState::new(),
            workgroups: workgroup_count(res),
        })
    }

    /// Record the setup kernel. A second call fails.
    pub fn setup_once(&mut self, encoder: &mut wgpu::CommandEncoder, pipeline: &GrassSimulationPipeline) -> Result<()> {
        let read = self.state.begin_setup()?;
        pipeline.dispatch(encoder, SimulationKernel::Setup, &self.bind_groups[read as usize], self.workgroups);
        Ok(())
    }

    /// Record one physics step. Fails before setup.
    pub fn step_physics(&mut self, encoder: &mut wgpu::CommandEncoder, pipeline: &GrassSimulationPipeline) -> Result<()> {
        let read = self.state.begin_physics()?;
        pipeline.dispatch(encoder, SimulationKernel::Physics, &self.bind_groups[read as usize], self.workgroups);
        Ok(())
    }

    /// Layer draws should sample
    pub fn current_layer(&self) -> u32 {
        self.state.current_layer()
    }

    pub fn phase(&self) -> SimulationPhase {
        self.state.phase()
    }

    /// Both layers, for sampling in the vertex shader
    pub fn array_view(&self) -> &wgpu::TextureView {
        &self.array_view
    }

    pub fn workgroups(&self) -> u32 {
        self.workgroups
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count() {
        assert_eq!(workgroup_count(64), 8);
        assert_eq!(workgroup_count(32), 4);
        // Remainder is dropped
        assert_eq!(workgroup_count(30), 3);
        assert_eq!(workgroup_count(7), 0);
    }

    #[test]
    fn test_layer_cursor_ping_pong() {
        let mut cursor = LayerCursor::default();
        assert_eq!((cursor.read_layer(), cursor.write_layer()), (0, 1));
        cursor.advance();
        assert_eq!((cursor.read_layer(), cursor.write_layer()), (1, 0));
        cursor.advance();
        assert_eq!((cursor.read_layer(), cursor.write_layer()), (0, 1));
    }

    #[test]
    fn test_setup_then_physics_alternates() {
        let mut state = SimulationState::new();
        assert_eq!(state.phase(), SimulationPhase::Pending);

        // Setup reads the zeroed layer 0 and writes layer 1
        assert_eq!(state.begin_setup().unwrap(), 0);
        assert_eq!(state.current_layer(), 1);

        let reads: Vec<u32> = (0..4).map(|_| state.begin_physics().unwrap()).collect();
        assert_eq!(reads, vec![1, 0, 1, 0]);
        assert_eq!(state.current_layer(), 1);
    }

    #[test]
    fn test_setup_runs_once() {
        let mut state = SimulationState::new();
        state.begin_setup().unwrap();
        let before = state;
        assert!(matches!(state.begin_setup(), Err(Error::Simulation(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_physics_requires_setup() {
        let mut state = SimulationState::new();
        assert!(matches!(state.begin_physics(), Err(Error::Simulation(_))));
        assert_eq!(state.current_layer(), 0);
    }
}
