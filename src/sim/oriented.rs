use super::frame::Frame;
use super::math::{Float3, Quaternion};

/// A point on a curve with its unnormalized tangent, banking and up hint.
///
/// `banking` already includes `banking_correction`, the extra roll blended in
/// while an anchor carries an explicit up vector. Frames are derived per query
/// and never cached across edits.
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrientedFrame {
    pub position: Float3,
    pub tangent: Float3,
    pub banking: f32,
    pub up: Float3,
    pub banking_correction: f32,
}

impl OrientedFrame {
    pub const fn new(
        position: Float3,
        tangent: Float3,
        banking: f32,
        up: Float3,
        banking_correction: f32,
    ) -> Self {
        Self {
            position,
            tangent,
            banking,
            up,
            banking_correction,
        }
    }

    pub const DEFAULT: Self = Self::new(Float3::ZERO, Float3::FORWARD, 0.0, Float3::UP, 0.0);

    pub fn direction(&self) -> Float3 {
        self.tangent.normalize()
    }

    pub fn has_custom_up(&self) -> bool {
        self.up.is_custom_up()
    }

    /// Banking with the up-override correction removed.
    pub fn base_banking(&self) -> f32 {
        if self.has_custom_up() {
            self.banking - self.banking_correction
        } else {
            self.banking
        }
    }

    /// Banked basis for this point, built against `closest_up`.
    pub fn basis(&self, closest_up: Float3) -> Frame {
        Frame::from_tangent(self.tangent, closest_up, self.banking)
    }

    /// Maps a cross-section point (x = width, y = height, z = along track) to world space.
    pub fn local_to_world(&self, local: Float3, closest_up: Float3) -> Float3 {
        self.basis(closest_up).transform_point(self.position, local)
    }

    pub fn translated(self, offset: Float3) -> Self {
        Self {
            position: self.position + offset,
            ..self
        }
    }
}

impl Default for OrientedFrame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// World placement of a body riding or snapped onto the track.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pose {
    pub position: Float3,
    pub frame: Frame,
}

impl Pose {
    pub const fn new(position: Float3, frame: Frame) -> Self {
        Self { position, frame }
    }

    /// Rotation facing along the track with +Y on the banked up vector.
    pub fn rotation(&self) -> Quaternion {
        self.frame.rotation()
    }

    pub fn forward(&self) -> Float3 {
        self.frame.direction
    }

    pub fn up(&self) -> Float3 {
        self.frame.normal
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Float3::ZERO, Frame::DEFAULT)
    }
}
