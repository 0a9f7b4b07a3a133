/// Tunables for surface extrusion, support placement and chain adjacency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    /// Clearance around the track that support legs must keep.
    pub cart_radius: f32,
    /// Height of the ground plane supports are extended to.
    pub min_floor_height: f32,
    /// Spacing between support sample points.
    pub max_support_distance: f32,
    /// Maximum gap between two chain ends that still counts as connected.
    pub adjacency_tolerance: f32,
    /// Target along-track length of one extruded profile copy.
    pub surface_step: f32,
    /// Distance within which a cached frame is reused during extrusion.
    pub frame_cache_margin: f32,
    /// Frame reuse distance for the low-poly extrusion.
    pub low_poly_cache_margin: f32,
}

impl GeneratorConfig {
    pub fn new(
        cart_radius: f32,
        min_floor_height: f32,
        max_support_distance: f32,
        adjacency_tolerance: f32,
    ) -> Self {
        Self {
            cart_radius,
            min_floor_height,
            max_support_distance,
            adjacency_tolerance,
            ..Self::default()
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cart_radius: 0.5,
            min_floor_height: 0.0,
            max_support_distance: 4.0,
            adjacency_tolerance: 0.25,
            surface_step: 1.0,
            frame_cache_margin: 0.0005,
            low_poly_cache_margin: 0.005,
        }
    }
}
