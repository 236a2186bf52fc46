//! Per-patch indirect draw arguments.
//!
//! Every patch owns one argument record per tier. Only the instance count
//! changes at runtime: it is recomputed from the camera distance each frame and
//! uploaded before the patch is drawn.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::core::Result;
use crate::render::limits;
use crate::render::pipeline::GrassRenderPipeline;
use super::lod::LodSettings;
use super::settings::GrassSettings;
use super::tier::RenderTier;

/// Indirect draw record (20 bytes).
///
/// The first 16 bytes are wgpu's non-indexed `draw_indirect` layout.
/// `base_vertex` only keeps the record the same shape as an indexed one and is
/// ignored by non-indexed draws.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
    pub base_vertex: u32,
}

/// Size of one argument buffer in bytes
pub const INDIRECT_ARGS_SIZE: u64 = std::mem::size_of::<IndirectArgs>() as u64;

/// CPU mirror of a patch's three argument records, in tier draw order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierArgs {
    args: [IndirectArgs; 3],
}

impl TierArgs {
    /// Fixed vertex counts, zero instances
    pub fn new(settings: &GrassSettings) -> Self {
        let args = RenderTier::ALL.map(|tier| IndirectArgs {
            vertex_count: settings.tier_vertex_count(tier),
            ..Default::default()
        });
        Self { args }
    }

    /// Set every tier's instance count for `distance`
    pub fn recompute(&mut self, distance: f32, lod: &LodSettings) {
        let counts = lod.instance_counts(distance);
        for (args, count) in self.args.iter_mut().zip(counts) {
            args.instance_count = count;
        }
    }

    pub fn get(&self, tier: RenderTier) -> &IndirectArgs {
        &self.args[tier.index()]
    }

    pub fn instance_count(&self, tier: RenderTier) -> u32 {
        self.get(tier).instance_count
    }

    /// Tiers that would issue a draw, in draw order
    pub fn active_tiers(&self) -> impl Iterator<Item = RenderTier> + '_ {
        RenderTier::ALL
            .into_iter()
            .filter(|tier| self.instance_count(*tier) > 0)
    }

    pub fn instance_counts(&self) -> [u32; 3] {
        self.args.map(|a| a.instance_count)
    }
}

/// A patch's indirect argument buffers and their CPU mirror
pub struct IndirectDrawController {
    args: TierArgs,
    buffers: [wgpu::Buffer; 3],
}

impl IndirectDrawController {
    pub fn new(device: &wgpu::Device, settings: &GrassSettings) -> Result<Self> {
        limits::check_buffer(&device.limits(), "grass_indirect_args", INDIRECT_ARGS_SIZE)?;

        let args = TierArgs::new(settings);
        let buffers = RenderTier::ALL.map(|tier| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(tier.label()),
                contents: bytemuck::bytes_of(args.get(tier)),
                usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            })
        });

        Ok(Self { args, buffers })
    }

    /// Recompute instance counts for `distance` and upload all three records.
    ///
    /// The writes land before any draw recorded later in the same frame.
    pub fn recompute_instance_counts(&mut self, queue: &wgpu::Queue, distance: f32, lod: &LodSettings) {
        self.args.recompute(distance, lod);
        for tier in RenderTier::ALL {
            queue.write_buffer(&self.buffers[tier.index()], 0, bytemuck::bytes_of(self.args.get(tier)));
        }
    }

    /// Draw every tier with a non-zero instance count, in draw order.
    ///
    /// Returns the number of draw calls issued.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &GrassRenderPipeline,
        shared_bind_group: &wgpu::BindGroup,
        patch_bind_group: &wgpu::BindGroup,
    ) -> u32 {
        let mut draws = 0;
        for tier in self.args.active_tiers() {
            pass.set_pipeline(pipeline.pipeline(tier));
            pass.set_bind_group(0, shared_bind_group, &[]);
            pass.set_bind_group(1, patch_bind_group, &[]);
            pass.draw_indirect(&self.buffers[tier.index()], 0);
            draws += 1;
        }
        draws
    }

    pub fn args(&self) -> &TierArgs {
        &self.args
    }

    pub fn destroy(&self) {
        for buffer in &self.buffers {
            buffer.destroy();
        }
    }
}
