//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`; wgpu's own chatter is
/// held at `warn`. Override with the RUST_LOG environment variable.
///
/// # Example
/// ```no_run
/// meadow::core::logging::init();
/// log::info!("Grass field starting");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn")
    ).init();
}
