//! Distance-based LOD blending between the three grass tiers.
//!
//! Each tier maps the camera-to-patch distance to an instance count:
//!
//! - Geometry uses a single ramp: full count up to `peak`, linearly down to
//!   zero at `end`.
//! - Both billboard tiers use a double ramp: zero below `start`, rising to the
//!   full count at `peak`, falling back to zero at `end`.
//!
//! Counts are rounded up, so a tier that is only slightly visible still draws
//! one instance.

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;
use super::tier::RenderTier;

/// Normalized position of `cur` on the ramp `from -> to`, clamped to [0, 1].
///
/// A zero-width ramp is a step that is fully taken once `cur >= to`.
fn ramp(cur: f32, from: f32, to: f32) -> f32 {
    let width = to - from;
    if width <= f32::EPSILON {
        return if cur >= to { 1.0 } else { 0.0 };
    }
    ((cur - from) / width).clamp(0.0, 1.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Continuous single-ramp instance count, in `[0, value]`.
pub fn single_lerp_exact(value: u32, cur: f32, peak: f32, end: f32) -> f32 {
    let v = value as f32;
    let t = ramp(cur, peak, end);
    (v - lerp(0.0, v, t)).clamp(0.0, v)
}

/// Continuous double-ramp instance count, in `[0, value]`.
pub fn double_lerp_exact(value: u32, cur: f32, start: f32, peak: f32, end: f32) -> f32 {
    let v = value as f32;
    let t0 = ramp(cur, start, peak);
    let t1 = ramp(cur, peak, end);
    (v - (lerp(v, 0.0, t0) + lerp(0.0, v, t1))).clamp(0.0, v)
}

/// Instance count for the single-ramp (geometry) tier.
///
/// # Examples
/// ```
/// use meadow::grass::lod::single_lerp;
///
/// assert_eq!(single_lerp(256, 0.0, 5.0, 20.0), 256);  // closer than peak
/// assert_eq!(single_lerp(256, 12.5, 5.0, 20.0), 128); // halfway down the ramp
/// assert_eq!(single_lerp(256, 40.0, 5.0, 20.0), 0);   // past the end
/// ```
pub fn single_lerp(value: u32, cur: f32, peak: f32, end: f32) -> u32 {
    single_lerp_exact(value, cur, peak, end).ceil() as u32
}

/// Instance count for a double-ramp (billboard) tier.
///
/// # Examples
/// ```
/// use meadow::grass::lod::double_lerp;
///
/// assert_eq!(double_lerp(64, 5.0, 10.0, 20.0, 30.0), 0);  // before start
/// assert_eq!(double_lerp(64, 20.0, 10.0, 20.0, 30.0), 64); // at peak
/// assert_eq!(double_lerp(64, 25.0, 10.0, 20.0, 30.0), 32); // falling off
/// assert_eq!(double_lerp(64, 30.0, 10.0, 20.0, 30.0), 0);  // at end
/// ```
pub fn double_lerp(value: u32, cur: f32, start: f32, peak: f32, end: f32) -> u32 {
    double_lerp_exact(value, cur, start, peak, end).ceil() as u32
}

fn check_breakpoints(tier: RenderTier, start: f32, peak: f32, end: f32) -> Result<(), ConfigError> {
    let ordered = start.is_finite()
        && peak.is_finite()
        && end.is_finite()
        && 0.0 <= start
        && start <= peak
        && peak <= end;
    if ordered {
        Ok(())
    } else {
        Err(ConfigError::BreakpointOrder { tier: tier.label(), start, peak, end })
    }
}

/// Geometry tier: full count until `peak`, zero from `end` on
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryLod {
    /// Instances drawn at full detail
    pub instances: u32,
    pub peak: f32,
    pub end: f32,
}

impl GeometryLod {
    pub fn instance_count(&self, distance: f32) -> u32 {
        single_lerp(self.instances, distance, self.peak, self.end)
    }

    pub fn instance_count_exact(&self, distance: f32) -> f32 {
        single_lerp_exact(self.instances, distance, self.peak, self.end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_breakpoints(RenderTier::Geometry, 0.0, self.peak, self.end)
    }
}

/// Billboard tier: zero below `start`, full at `peak`, zero again from `end`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillboardLod {
    pub instances: u32,
    pub start: f32,
    pub peak: f32,
    pub end: f32,
}

impl BillboardLod {
    pub fn instance_count(&self, distance: f32) -> u32 {
        double_lerp(self.instances, distance, self.start, self.peak, self.end)
    }

    pub fn instance_count_exact(&self, distance: f32) -> f32 {
        double_lerp_exact(self.instances, distance, self.start, self.peak, self.end)
    }

    fn validate(&self, tier: RenderTier) -> Result<(), ConfigError> {
        check_breakpoints(tier, self.start, self.peak, self.end)
    }
}

/// Process-wide LOD configuration, shared by every patch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodSettings {
    pub geometry: GeometryLod,
    pub billboard_crossed: BillboardLod,
    pub billboard_screen: BillboardLod,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            geometry: GeometryLod { instances: 16, peak: 15.0, end: 45.0 },
            billboard_crossed: BillboardLod { instances: 8, start: 30.0, peak: 50.0, end: 90.0 },
            billboard_screen: BillboardLod { instances: 4, start: 75.0, peak: 100.0, end: 160.0 },
        }
    }
}

impl LodSettings {
    /// Peak instance count of a tier
    pub fn peak_instances(&self, tier: RenderTier) -> u32 {
        match tier {
            RenderTier::Geometry => self.geometry.instances,
            RenderTier::BillboardCrossed => self.billboard_crossed.instances,
            RenderTier::BillboardScreen => self.billboard_screen.instances,
        }
    }

    /// Rounded-up instance counts in tier draw order
    pub fn instance_counts(&self, distance: f32) -> [u32; 3] {
        [
            self.geometry.instance_count(distance),
            self.billboard_crossed.instance_count(distance),
            self.billboard_screen.instance_count(distance),
        ]
    }

    /// Continuous instance counts in tier draw order.
    ///
    /// The fractional part of each entry is how much of the last instance is
    /// "earned"; the vertex shader uses it to grow blades in smoothly.
    pub fn instance_counts_exact(&self, distance: f32) -> [f32; 3] {
        [
            self.geometry.instance_count_exact(distance),
            self.billboard_crossed.instance_count_exact(distance),
            self.billboard_screen.instance_count_exact(distance),
        ]
    }

    /// Distance beyond which no tier draws anything
    pub fn max_distance(&self) -> f32 {
        self.geometry.end
            .max(self.billboard_crossed.end)
            .max(self.billboard_screen.end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        self.billboard_crossed.validate(RenderTier::BillboardCrossed)?;
        self.billboard_screen.validate(RenderTier::BillboardScreen)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Distances from 0 to `max` in `steps` increments
    fn sweep(max: f32, steps: u32) -> impl Iterator<Item = f32> {
        (0..=steps).map(move |i| max * i as f32 / steps as f32)
    }

    #[test]
    fn test_single_lerp_full_until_peak() {
        for d in sweep(5.0, 200) {
            assert_eq!(single_lerp(256, d, 5.0, 20.0), 256, "d={d}");
        }
    }

    #[test]
    fn test_single_lerp_zero_from_end() {
        for d in sweep(100.0, 400).filter(|d| *d >= 20.0) {
            assert_eq!(single_lerp(256, d, 5.0, 20.0), 0, "d={d}");
        }
    }

    #[test]
    fn test_single_lerp_monotonic_on_ramp() {
        let mut prev = u32::MAX;
        for i in 0..=1000 {
            let d = 5.0 + 15.0 * i as f32 / 1000.0;
            let count = single_lerp(256, d, 5.0, 20.0);
            assert!(count <= prev, "count rose at d={d}: {prev} -> {count}");
            prev = count;
        }
    }

    #[test]
    fn test_single_lerp_scenario_halfway() {
        // t = (12.5 - 5) / (20 - 5) = 0.5
        assert_eq!(single_lerp(256, 12.5, 5.0, 20.0), 128);
    }

    #[test]
    fn test_single_lerp_rounds_up() {
        // 256 * (1 - 14/15) = 17.07 -> 18
        assert_eq!(single_lerp(256, 19.0, 5.0, 20.0), 18);
    }

    #[test]
    fn test_double_lerp_zero_outside_range() {
        for d in sweep(100.0, 500) {
            if d <= 10.0 || d >= 30.0 {
                assert_eq!(double_lerp(64, d, 10.0, 20.0, 30.0), 0, "d={d}");
            }
        }
    }

    #[test]
    fn test_double_lerp_scenario_at_peak() {
        // t0 = 1, t1 = 0 -> 64 - (0 + 0)
        assert_eq!(double_lerp(64, 20.0, 10.0, 20.0, 30.0), 64);
    }

    #[test]
    fn test_double_lerp_bounded() {
        for d in sweep(60.0, 1200) {
            let exact = double_lerp_exact(64, d, 10.0, 20.0, 30.0);
            assert!((0.0..=64.0).contains(&exact), "d={d} gave {exact}");
            assert!(double_lerp(64, d, 10.0, 20.0, 30.0) <= 64);
        }
    }

    #[test]
    fn test_double_lerp_rising_edge() {
        // t0 = 0.25 -> 64 - 48 = 16
        assert_eq!(double_lerp(64, 12.5, 10.0, 20.0, 30.0), 16);
    }

    #[test]
    fn test_degenerate_single_step() {
        assert_eq!(single_lerp(10, 4.9, 5.0, 5.0), 10);
        assert_eq!(single_lerp(10, 5.0, 5.0, 5.0), 0);
        assert_eq!(single_lerp(10, 6.0, 5.0, 5.0), 0);
    }

    #[test]
    fn test_degenerate_start_equals_peak() {
        assert_eq!(double_lerp(32, 9.0, 10.0, 10.0, 30.0), 0);
        assert_eq!(double_lerp(32, 10.0, 10.0, 10.0, 30.0), 32);
        assert_eq!(double_lerp(32, 20.0, 10.0, 10.0, 30.0), 16);
    }

    #[test]
    fn test_degenerate_all_breakpoints_equal() {
        for d in [0.0, 9.999, 10.0, 10.001, 50.0] {
            let exact = double_lerp_exact(32, d, 10.0, 10.0, 10.0);
            assert!((0.0..=32.0).contains(&exact), "d={d} gave {exact}");
            assert!(exact.is_finite());
        }
        assert_eq!(double_lerp(32, 10.0, 10.0, 10.0, 10.0), 0);
    }

    #[test]
    fn test_settings_counts_in_draw_order() {
        let lod = LodSettings::default();
        let near = lod.instance_counts(0.0);
        assert_eq!(near, [lod.geometry.instances, 0, 0]);

        let crossed_peak = lod.instance_counts(lod.billboard_crossed.peak);
        assert_eq!(crossed_peak[1], lod.billboard_crossed.instances);
        assert_eq!(crossed_peak[0], 0);

        assert_eq!(lod.instance_counts(lod.max_distance()), [0, 0, 0]);
    }

    #[test]
    fn test_exact_counts_round_up_to_counts() {
        let lod = LodSettings::default();
        for d in sweep(200.0, 400) {
            let exact = lod.instance_counts_exact(d);
            let counts = lod.instance_counts(d);
            for i in 0..3 {
                assert_eq!(exact[i].ceil() as u32, counts[i]);
            }
        }
    }

    #[test]
    fn test_validate_rejects_misordered_breakpoints() {
        let mut lod = LodSettings::default();
        assert!(lod.validate().is_ok());

        lod.billboard_screen.end = lod.billboard_screen.peak - 1.0;
        assert!(matches!(
            lod.validate(),
            Err(ConfigError::BreakpointOrder { tier: "billboard_screen", .. })
        ));

        let mut lod = LodSettings::default();
        lod.geometry.peak = f32::NAN;
        assert!(lod.validate().is_err());
    }
}
