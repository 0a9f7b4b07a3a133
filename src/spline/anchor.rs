use crate::sim::{Float3, OrientedFrame};

/// Authored control point of a chain.
///
/// The two inner Bezier control points of a segment are `start.position + start.handle`
/// and `end.position - end.handle`, so both handles point along the direction of travel.
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Anchor {
    pub position: Float3,
    pub handle: Float3,
    /// Roll of the cross-section about the tangent, in degrees.
    pub banking: f32,
    /// World up unless the anchor marks a vertical transition.
    pub up: Float3,
}

impl Anchor {
    pub const fn new(position: Float3, handle: Float3, banking: f32) -> Self {
        Self {
            position,
            handle,
            banking,
            up: Float3::UP,
        }
    }

    pub const fn with_up(self, up: Float3) -> Self {
        Self { up, ..self }
    }

    /// Stand-in for a missing neighbour: origin, zero handle, world up.
    pub const DEFAULT: Self = Self::new(Float3::ZERO, Float3::ZERO, 0.0);

    pub fn has_custom_up(&self) -> bool {
        self.up.is_custom_up()
    }

    /// The anchor itself as a frame, facing along its handle.
    pub fn to_oriented_frame(&self) -> OrientedFrame {
        OrientedFrame::new(
            self.position,
            self.handle.normalize(),
            self.banking,
            self.up,
            0.0,
        )
    }

    /// True when position, handle and banking match. Up vectors are derived by
    /// the chain and do not count as an edit.
    pub fn same_shape(&self, other: &Anchor) -> bool {
        self.position == other.position
            && self.handle == other.handle
            && self.banking == other.banking
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::DEFAULT
    }
}
