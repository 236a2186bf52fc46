//! The three grass representations, in draw order.

/// One of the three grass representations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTier {
    /// Full blade geometry
    Geometry,
    /// Two crossed quads per billboard
    BillboardCrossed,
    /// One camera-facing quad per billboard
    BillboardScreen,
}

impl RenderTier {
    /// All tiers in their fixed draw order
    pub const ALL: [RenderTier; 3] = [
        RenderTier::Geometry,
        RenderTier::BillboardCrossed,
        RenderTier::BillboardScreen,
    ];

    /// Slot in per-tier arrays
    pub const fn index(self) -> usize {
        match self {
            RenderTier::Geometry => 0,
            RenderTier::BillboardCrossed => 1,
            RenderTier::BillboardScreen => 2,
        }
    }

    /// Vertices the vertex shader expands per blade / billboard.
    /// Must match the corner tables in grass_render.wgsl.
    pub const fn vertices_per_primitive(self) -> u32 {
        match self {
            // Two stacked quads plus a tip triangle
            RenderTier::Geometry => 15,
            RenderTier::BillboardCrossed => 12,
            RenderTier::BillboardScreen => 6,
        }
    }

    /// Vertex shader entry point in grass_render.wgsl
    pub const fn vertex_entry_point(self) -> &'static str {
        match self {
            RenderTier::Geometry => "vs_geometry",
            RenderTier::BillboardCrossed => "vs_billboard_crossed",
            RenderTier::BillboardScreen => "vs_billboard_screen",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RenderTier::Geometry => "geometry",
            RenderTier::BillboardCrossed => "billboard_crossed",
            RenderTier::BillboardScreen => "billboard_screen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_draw_order() {
        for (i, tier) in RenderTier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn test_vertex_counts_are_whole_triangles() {
        for tier in RenderTier::ALL {
            assert_eq!(tier.vertices_per_primitive() % 3, 0, "{}", tier.label());
        }
    }
}
