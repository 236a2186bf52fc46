//! Render and compute pipelines

pub mod grass_render;
pub mod grass_simulation;

pub use grass_render::{GrassRenderPipeline, PatchBindings, SharedBindings};
pub use grass_simulation::{GrassSimulationPipeline, SimulationBindings, SimulationKernel};
