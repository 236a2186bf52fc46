//! Grass blade simulation compute pipelines
//!
//! One shader module, three entry points sharing a single bind group layout:
//! `setup` seeds the simulation state, `physics` advances it by one frame and
//! `culling` is compiled but never dispatched.

/// Compute kernels in grass_simulation.wgsl
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationKernel {
    Setup,
    Physics,
    /// Reserved for GPU-side instance culling
    Culling,
}

impl SimulationKernel {
    pub const ALL: [SimulationKernel; 3] = [
        SimulationKernel::Setup,
        SimulationKernel::Physics,
        SimulationKernel::Culling,
    ];

    pub const fn entry_point(self) -> &'static str {
        match self {
            SimulationKernel::Setup => "setup",
            SimulationKernel::Physics => "physics",
            SimulationKernel::Culling => "culling",
        }
    }

    const fn index(self) -> usize {
        match self {
            SimulationKernel::Setup => 0,
            SimulationKernel::Physics => 1,
            SimulationKernel::Culling => 2,
        }
    }
}

/// Resources one simulation dispatch binds
pub struct SimulationBindings<'a> {
    pub patch_uniform: &'a wgpu::Buffer,
    pub globals: &'a wgpu::Buffer,
    pub normal_height: &'a wgpu::TextureView,
    /// Single-layer view of the state to read
    pub state_read: &'a wgpu::TextureView,
    /// Single-layer view of the state to write
    pub state_write: &'a wgpu::TextureView,
}

/// Compute pipelines for the grass simulation
pub struct GrassSimulationPipeline {
    pipelines: [wgpu::ComputePipeline; 3],
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GrassSimulationPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_simulation_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/grass_simulation.wgsl").into()),
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        // Read with textureLoad, so no filtering needed
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_simulation_layout"),
            entries: &[
                // Patch uniform
                uniform_entry(0),
                // Grass globals (wind)
                uniform_entry(1),
                // Normal/height texture
                texture_entry(2),
                // Previous simulation state
                texture_entry(3),
                // Next simulation state
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_simulation_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipelines = SimulationKernel::ALL.map(|kernel| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.entry_point()),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(kernel.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        });

        log::debug!("Grass simulation pipelines created");

        Self {
            pipelines,
            bind_group_layout,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn pipeline(&self, kernel: SimulationKernel) -> &wgpu::ComputePipeline {
        &self.pipelines[kernel.index()]
    }

    /// Create a bind group reading one state layer and writing another
    pub fn create_bind_group(&self, device: &wgpu::Device, bindings: &SimulationBindings<'_>) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_simulation_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bindings.patch_uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bindings.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(bindings.normal_height),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bindings.state_read),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(bindings.state_write),
                },
            ],
        })
    }

    /// Record one kernel dispatch over `workgroups x workgroups` groups
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kernel: SimulationKernel,
        bind_group: &wgpu::BindGroup,
        workgroups: u32,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("grass_simulation_pass"),
            timestamp_writes: None,
        });

        pass.set_pipeline(self.pipeline(kernel));
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups, workgroups, 1);
    }
}
