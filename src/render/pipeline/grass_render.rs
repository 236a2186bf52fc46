//! Grass render pipelines, one per tier
//!
//! All tiers share one shader module and one pipeline layout; only the vertex
//! entry point differs. There are no vertex buffers: blades and billboards are
//! expanded from `vertex_index` / `instance_index`.

use crate::grass::RenderTier;
use crate::render::texture::DEPTH_FORMAT;

/// Resources bound once for every grass draw (group 0)
pub struct SharedBindings<'a> {
    pub camera: &'a wgpu::Buffer,
    pub globals: &'a wgpu::Buffer,
    pub blade_params: &'a wgpu::Buffer,
}

/// Resources bound per patch (group 1)
pub struct PatchBindings<'a> {
    pub patch_uniform: &'a wgpu::Buffer,
    /// Both simulation layers as a 2D array view
    pub simulation: &'a wgpu::TextureView,
    pub normal_height: &'a wgpu::TextureView,
    pub sampler: &'a wgpu::Sampler,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Render pipelines for the three grass tiers
pub struct GrassRenderPipeline {
    pipelines: [wgpu::RenderPipeline; 3],
    shared_layout: wgpu::BindGroupLayout,
    patch_layout: wgpu::BindGroupLayout,
}

impl GrassRenderPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_render_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/grass_render.wgsl").into()),
        });

        // Bind group 0: camera + globals + blade params
        let shared_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_shared_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // Bind group 1: patch uniform + simulation state + normal/height
        let patch_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_patch_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                // Rgba32Float is not filterable; read with textureLoad
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_render_pipeline_layout"),
            bind_group_layouts: &[&shared_layout, &patch_layout],
            immediate_size: 0,
        });

        let pipelines = RenderTier::ALL.map(|tier| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(tier.label()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(tier.vertex_entry_point()),
                    buffers: &[], // Expanded in the vertex shader
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // Blades and billboards are seen from both sides
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        });

        log::debug!("Grass render pipelines created for {:?}", surface_format);

        Self {
            pipelines,
            shared_layout,
            patch_layout,
        }
    }

    pub fn pipeline(&self, tier: RenderTier) -> &wgpu::RenderPipeline {
        &self.pipelines[tier.index()]
    }

    /// Create the group 0 bind group shared by every patch
    pub fn create_shared_bind_group(&self, device: &wgpu::Device, bindings: &SharedBindings<'_>) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_shared_bind_group"),
            layout: &self.shared_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bindings.camera.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bindings.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bindings.blade_params.as_entire_binding(),
                },
            ],
        })
    }

    /// Create the group 1 bind group of one patch
    pub fn create_patch_bind_group(&self, device: &wgpu::Device, bindings: &PatchBindings<'_>) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_patch_bind_group"),
            layout: &self.patch_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bindings.patch_uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bindings.simulation),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(bindings.normal_height),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(bindings.sampler),
                },
            ],
        })
    }
}
