//! Rendering system and GPU interfaces

pub mod context;
pub mod limits;
pub mod buffer;
pub mod pipeline;
pub mod texture;

pub use context::GpuContext;
