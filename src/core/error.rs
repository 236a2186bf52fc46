//! Error types for the meadow grass renderer

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Resource exhausted: {0}")]
    Resource(String),

    #[error("Simulation error: {0}")]
    Simulation(String),
}

/// Invalid grass settings or terrain dimensions.
///
/// Raised at construction time; nothing is ever silently clamped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{tier}: breakpoints must satisfy 0 <= start <= peak <= end (got start={start}, peak={peak}, end={end})")]
    BreakpointOrder {
        tier: &'static str,
        start: f32,
        peak: f32,
        end: f32,
    },

    #[error("grass data resolution must be non-zero")]
    ZeroResolution,

    #[error("grass data resolution {resolution} is below the simulation workgroup size {workgroup}")]
    ResolutionBelowWorkgroup { resolution: u32, workgroup: u32 },

    #[error("{name} must be positive and finite (got {value})")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must be non-zero")]
    ZeroCount { name: &'static str },

    #[error("min blades per patch ({min}) exceeds max blades per patch ({max})")]
    BladeRange { min: u32, max: u32 },

    #[error("{tier}: peak usage of {blades} blade slots exceeds max blades per patch ({max})")]
    TierExceedsMaxBlades {
        tier: &'static str,
        blades: u64,
        max: u32,
    },

    #[error("{name} range is inverted (min={min}, max={max})")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    #[error("shared buffer length {length} leaves no start index range for {max} blades per patch")]
    SharedBufferTooSmall { length: u32, max: u32 },
}
