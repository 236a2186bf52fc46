//! Meadow - GPU-instanced grass fields with per-patch LOD

pub mod core;
pub mod math;
pub mod render;
pub mod grass;
pub mod terrain;
