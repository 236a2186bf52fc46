//! Allocation checks against device limits.
//!
//! wgpu reports oversized allocations through the device error callback and
//! hands back an invalid object. Checking sizes up front turns that into a
//! regular `Error::Resource` at construction time.

use crate::core::{Error, Result};

/// Reject 2D textures whose edge exceeds `max_texture_dimension_2d`
pub fn check_texture_2d(limits: &wgpu::Limits, label: &str, width: u32, height: u32) -> Result<()> {
    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(Error::Resource(format!(
            "{}: {}x{} texture exceeds max dimension {}",
            label, width, height, max
        )));
    }
    Ok(())
}

/// Reject array textures with more layers than the device supports
pub fn check_texture_layers(limits: &wgpu::Limits, label: &str, layers: u32) -> Result<()> {
    if layers > limits.max_texture_array_layers {
        return Err(Error::Resource(format!(
            "{}: {} array layers exceeds max {}",
            label, layers, limits.max_texture_array_layers
        )));
    }
    Ok(())
}

/// Reject buffers larger than `max_buffer_size`
pub fn check_buffer(limits: &wgpu::Limits, label: &str, size: u64) -> Result<()> {
    if size > limits.max_buffer_size {
        return Err(Error::Resource(format!(
            "{}: {} byte buffer exceeds max buffer size {}",
            label, size, limits.max_buffer_size
        )));
    }
    Ok(())
}

/// Reject storage buffers that cannot be bound in one binding
pub fn check_storage_binding(limits: &wgpu::Limits, label: &str, size: u64) -> Result<()> {
    check_buffer(limits, label, size)?;
    if size > limits.max_storage_buffer_binding_size as u64 {
        return Err(Error::Resource(format!(
            "{}: {} byte storage binding exceeds max {}",
            label, size, limits.max_storage_buffer_binding_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert!(check_texture_2d(&limits, "ok", 64, 64).is_ok());
        let too_big = limits.max_texture_dimension_2d + 1;
        assert!(matches!(
            check_texture_2d(&limits, "big", too_big, 1),
            Err(Error::Resource(_))
        ));
        assert!(check_texture_layers(&limits, "sim", 2).is_ok());
    }

    #[test]
    fn test_storage_binding_limit() {
        let limits = wgpu::Limits::downlevel_defaults();
        let max = limits.max_storage_buffer_binding_size as u64;
        assert!(check_storage_binding(&limits, "blades", max).is_ok());
        assert!(matches!(
            check_storage_binding(&limits, "blades", max + 1),
            Err(Error::Resource(_))
        ));
    }
}
