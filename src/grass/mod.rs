//! Patch-based GPU grass.
//!
//! The terrain is split into square patches. Each frame every patch picks how
//! many instances of each render tier to draw from its camera distance,
//! uploads those counts into its indirect argument buffers, and advances its
//! blade simulation on the GPU. Drawing is one indirect call per active tier.

pub mod tier;
pub mod lod;
pub mod settings;
pub mod provider;
pub mod params;
pub mod data_texture;
pub mod shared_data;
pub mod indirect;
pub mod simulation;
pub mod patch;
pub mod field;

pub use tier::RenderTier;
pub use lod::{LodSettings, GeometryLod, BillboardLod, single_lerp, double_lerp};
pub use settings::GrassSettings;
pub use provider::{HeightProvider, NormalProvider, DimensionsProvider, FlatTerrain};
pub use params::{PatchUniform, GrassGlobals, GpuBladeParams};
pub use data_texture::{NormalHeightData, NormalHeightTexture};
pub use shared_data::{SharedBladeBuffer, generate_blade_params};
pub use indirect::{IndirectArgs, IndirectDrawController, TierArgs};
pub use simulation::{SimulationDispatcher, SimulationPhase, SimulationState, LayerCursor, SIMULATION_WORKGROUP_SIZE};
pub use patch::{GrassPatch, PatchDescriptor, PatchFrame, PatchResources, UvRect};
pub use field::{GrassField, FieldStats, partition_terrain};
