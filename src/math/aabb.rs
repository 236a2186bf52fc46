//! Axis-aligned bounding box

use crate::core::types::Vec3;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// The 8 corner vertices.
    ///
    /// Index bits select the max side per axis (bit 0 = x, bit 1 = y, bit 2 = z),
    /// so index 0 is `min` and index 7 is `max`.
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Closest point on or inside the box to `p`
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Distance from `p` to the box surface; zero when `p` is inside
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        p.distance(self.closest_point(p))
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.center(), Vec3::splat(0.5));
        assert_eq!(aabb.size(), Vec3::ONE);
        assert_eq!(aabb.half_extent(), Vec3::splat(0.5));
    }

    #[test]
    fn test_corners() {
        let aabb = Aabb::from_center_half_extent(Vec3::new(5.0, 1.0, 5.0), Vec3::new(5.0, 1.0, 5.0));
        let corners = aabb.corners();
        assert_eq!(corners[0], aabb.min);
        assert_eq!(corners[7], aabb.max);
        assert_eq!(corners[1], Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(corners[6], Vec3::new(0.0, 2.0, 10.0));

        // All distinct and all on the box
        for (i, a) in corners.iter().enumerate() {
            assert!(aabb.contains_point(*a));
            for b in &corners[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_closest_point_and_distance() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        // Inside: distance is zero
        assert_eq!(aabb.distance_to_point(Vec3::splat(3.0)), 0.0);
        // Straight above the top face
        let above = Vec3::new(5.0, 14.0, 5.0);
        assert_eq!(aabb.closest_point(above), Vec3::new(5.0, 10.0, 5.0));
        assert_eq!(aabb.distance_to_point(above), 4.0);
        // Diagonal from a corner
        let d = aabb.distance_to_point(Vec3::new(13.0, 14.0, 10.0));
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
