//! Process-wide grass settings.
//!
//! One immutable `GrassSettings` is built at startup (defaults or a JSON file),
//! validated once, and passed by reference to every patch.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, Result};
use super::lod::LodSettings;
use super::simulation::SIMULATION_WORKGROUP_SIZE;
use super::tier::RenderTier;

/// Shared grass configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassSettings {
    /// Seed for blade parameters, patch start indices and phase offsets
    pub seed: u64,
    /// Patch edge length in world units
    pub patch_size: f32,
    /// Blade cells per patch side; also the per-patch texture resolution
    pub grass_data_resolution: u32,
    /// Blades drawn per geometry instance
    pub min_blades_per_patch: u32,
    /// Billboards drawn per billboard instance
    pub min_billboards_per_patch: u32,
    /// Upper bound of blade-parameter slots a single patch may touch
    pub max_blades_per_patch: u32,
    /// Number of records in the shared per-blade parameter buffer
    pub shared_buffer_length: u32,
    pub lod: LodSettings,
    /// Mip-mapped normal/height textures with linear mip filtering
    pub trilinear_filtering: bool,
    /// Grow the last partially-earned geometry instance in smoothly
    pub enable_height_transition: bool,
    /// Blade height range in world units
    pub blade_height: [f32; 2],
    /// Blade width range in world units
    pub blade_width: [f32; 2],
    /// Billboard quad edge length in world units
    pub billboard_size: f32,
    /// Wind direction in the XZ plane (normalized in the shader)
    pub wind_direction: [f32; 2],
    pub wind_strength: f32,
}

impl Default for GrassSettings {
    fn default() -> Self {
        Self {
            seed: 12345,
            patch_size: 8.0,
            grass_data_resolution: 32,
            min_blades_per_patch: 64,
            min_billboards_per_patch: 16,
            max_blades_per_patch: 1024,
            shared_buffer_length: 1 << 16,
            lod: LodSettings::default(),
            trilinear_filtering: true,
            enable_height_transition: true,
            blade_height: [0.35, 0.8],
            blade_width: [0.025, 0.05],
            billboard_size: 0.9,
            wind_direction: [1.0, 0.35],
            wind_strength: 1.0,
        }
    }
}

fn check_positive(name: &'static str, value: f32) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

impl GrassSettings {
    /// Parse settings from JSON. Missing fields fall back to defaults.
    /// The result is validated.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded grass settings from {}", path.display());
        Ok(settings)
    }

    /// Texels per side of the per-patch textures
    pub fn per_patch_texture_resolution(&self) -> u32 {
        self.grass_data_resolution
    }

    /// Texels in one layer of a per-patch texture
    pub fn per_patch_texture_length(&self) -> usize {
        let res = self.per_patch_texture_resolution() as usize;
        res * res
    }

    /// Blades or billboards drawn per instance of a tier
    pub fn primitives_per_instance(&self, tier: RenderTier) -> u32 {
        match tier {
            RenderTier::Geometry => self.min_blades_per_patch,
            RenderTier::BillboardCrossed | RenderTier::BillboardScreen => self.min_billboards_per_patch,
        }
    }

    /// Fixed vertex count of a tier's indirect draw
    pub fn tier_vertex_count(&self, tier: RenderTier) -> u32 {
        self.primitives_per_instance(tier) * tier.vertices_per_primitive()
    }

    /// Exclusive upper bound for a patch start index
    pub fn start_index_range(&self) -> u32 {
        self.shared_buffer_length.saturating_sub(self.max_blades_per_patch)
    }

    /// Check every invariant the patches rely on
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_positive("patch_size", self.patch_size)?;
        check_positive("billboard_size", self.billboard_size)?;

        let res = self.grass_data_resolution;
        if res == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if res < SIMULATION_WORKGROUP_SIZE {
            return Err(ConfigError::ResolutionBelowWorkgroup {
                resolution: res,
                workgroup: SIMULATION_WORKGROUP_SIZE,
            });
        }

        if self.min_blades_per_patch == 0 {
            return Err(ConfigError::ZeroCount { name: "min_blades_per_patch" });
        }
        if self.min_billboards_per_patch == 0 {
            return Err(ConfigError::ZeroCount { name: "min_billboards_per_patch" });
        }
        if self.min_blades_per_patch > self.max_blades_per_patch {
            return Err(ConfigError::BladeRange {
                min: self.min_blades_per_patch,
                max: self.max_blades_per_patch,
            });
        }

        self.lod.validate()?;

        // Every blade a tier can draw reads one slot after start_index
        for tier in RenderTier::ALL {
            let blades = self.lod.peak_instances(tier) as u64 * self.primitives_per_instance(tier) as u64;
            if blades > self.max_blades_per_patch as u64 {
                return Err(ConfigError::TierExceedsMaxBlades {
                    tier: tier.label(),
                    blades,
                    max: self.max_blades_per_patch,
                });
            }
        }

        if self.shared_buffer_length <= self.max_blades_per_patch {
            return Err(ConfigError::SharedBufferTooSmall {
                length: self.shared_buffer_length,
                max: self.max_blades_per_patch,
            });
        }

        for (name, [lo, hi]) in [("blade_height", self.blade_height), ("blade_width", self.blade_width)] {
            check_positive(name, lo)?;
            check_positive(name, hi)?;
            if lo > hi {
                return Err(ConfigError::InvertedRange { name, min: lo, max: hi });
            }
        }

        if res % SIMULATION_WORKGROUP_SIZE != 0 {
            log::warn!(
                "grass_data_resolution {} is not a multiple of {}; the last {} cells per row are never simulated",
                res,
                SIMULATION_WORKGROUP_SIZE,
                res % SIMULATION_WORKGROUP_SIZE
            );
        }

        Ok(())
    }
}
