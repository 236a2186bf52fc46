//! Procedural terrain for the grass to grow on

pub mod generator;
pub use generator::{NoiseTerrain, TerrainParams};
