use super::math::{Float3, Quaternion};

/// Orthonormal coordinate frame for track orientation.
///
/// Represents a right-handed coordinate system with three orthogonal unit vectors:
/// - `direction`: Forward direction along track (tangent)
/// - `normal`: Banked up direction perpendicular to the track
/// - `lateral`: Banked sideways direction (`direction x up` before banking)
///
/// Profile cross-sections map their width onto `lateral` and their height onto `normal`.
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub direction: Float3,
    pub normal: Float3,
    pub lateral: Float3,
}

impl Frame {
    pub const fn new(direction: Float3, normal: Float3, lateral: Float3) -> Self {
        Self {
            direction,
            normal,
            lateral,
        }
    }

    /// Builds the banked frame for a tangent, an up hint and a banking angle in degrees.
    ///
    /// The unbanked lateral axis is `tangent x up_hint`; the unbanked normal is
    /// `lateral x tangent`. Both are then rolled about the tangent by `banking`.
    pub fn from_tangent(tangent: Float3, up_hint: Float3, banking: f32) -> Self {
        let direction = tangent.normalize();
        let lateral = direction.cross(up_hint).normalize();
        let normal = lateral.cross(direction).normalize();

        let roll = Quaternion::from_axis_degrees(direction, banking);
        Self::new(direction, roll.mul_vec(normal), roll.mul_vec(lateral))
    }

    /// The same frame facing the other way along the track.
    pub fn reversed(self) -> Self {
        Self::new(-self.direction, self.normal, -self.lateral)
    }

    /// Cross-section binormal (`direction x normal`).
    pub fn binormal(&self) -> Float3 {
        self.direction.cross(self.normal)
    }

    /// Maps a profile point (x = width, y = height, z = along track) to world space.
    pub fn transform_point(&self, origin: Float3, local: Float3) -> Float3 {
        origin + self.lateral * local.x + self.normal * local.y + self.direction * local.z
    }

    /// Maps a profile normal (x = along track, y = height, z = width) through
    /// the tangent/normal/binormal basis and normalizes it.
    pub fn transform_normal(&self, local: Float3) -> Float3 {
        (self.binormal() * local.z + self.normal * local.y + self.direction * local.x).normalize()
    }

    /// Look rotation of this frame: +Z along `direction`, +Y along `normal`.
    pub fn rotation(&self) -> Quaternion {
        Quaternion::look_rotation(self.direction, self.normal)
    }

    pub const DEFAULT: Self = Self::new(Float3::FORWARD, Float3::UP, Float3::LEFT);
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(frame: Frame) {
        assert_relative_eq!(frame.direction.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.normal.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.lateral.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.direction.dot(frame.normal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(frame.direction.dot(frame.lateral), 0.0, epsilon = 1e-5);
        assert_relative_eq!(frame.normal.dot(frame.lateral), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_default_matches_from_tangent() {
        let built = Frame::from_tangent(Float3::FORWARD, Float3::UP, 0.0);
        assert_relative_eq!(built.lateral.x, Frame::DEFAULT.lateral.x, epsilon = 1e-6);
        assert_relative_eq!(built.normal.y, Frame::DEFAULT.normal.y, epsilon = 1e-6);
        assert_orthonormal(built);
    }

    #[test]
    fn test_from_tangent_flat_track() {
        let frame = Frame::from_tangent(Float3::new(3.0, 0.0, 0.0), Float3::UP, 0.0);
        assert_relative_eq!(frame.direction.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(frame.normal.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(frame.lateral.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_banking_rolls_normal() {
        let frame = Frame::from_tangent(Float3::RIGHT, Float3::UP, 90.0);
        assert_relative_eq!(frame.normal.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(frame.normal.z.abs(), 1.0, epsilon = 1e-5);
        assert_orthonormal(frame);
    }

    #[test]
    fn test_transform_point_and_normal() {
        let frame = Frame::from_tangent(Float3::RIGHT, Float3::UP, 0.0);
        let p = frame.transform_point(Float3::new(0.0, 2.0, 0.0), Float3::new(0.5, 0.25, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.25, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.5, epsilon = 1e-6);

        let n = frame.transform_normal(Float3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_faces_direction() {
        let frame = Frame::from_tangent(Float3::new(1.0, 0.5, 0.0), Float3::UP, 20.0);
        let q = frame.rotation();
        let forward = q.mul_vec(Float3::FORWARD);
        assert_relative_eq!(forward.dot(frame.direction), 1.0, epsilon = 1e-5);
        let up = q.mul_vec(Float3::UP);
        assert_relative_eq!(up.dot(frame.normal), 1.0, epsilon = 1e-5);
    }
}
