//! Cubic Bezier evaluation, banking interpolation and ray-vs-curve tests.
//!
//! All functions are pure. Parameters outside [0, 1] are clamped by the
//! position and derivative evaluators.

use super::anchor::Anchor;
use crate::sim::{Float3, OrientedFrame};

/// Parametric step of the brute-force closest point search.
pub const COLLISION_STEP: f32 = 0.001;
const COLLISION_SAMPLES: usize = 1000;

/// Banking correction applied across a segment that touches an up override.
const UP_CORRECTION: f32 = 90.0;

pub fn evaluate(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// First derivative with respect to `t`, used as the unnormalized tangent.
pub fn derivative(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t)
}

/// Catmull-Rom interpolation between `b1` and `b2`.
pub fn smooth_banking(b0: f32, b1: f32, b2: f32, b3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * b1)
        + (-b0 + b2) * t
        + (2.0 * b0 - 5.0 * b1 + 4.0 * b2 - b3) * t2
        + (-b0 + 3.0 * b1 - 3.0 * b2 + b3) * t3)
}

/// Banking across a segment. Each end is used as its own outer neighbour, which
/// gives an ease curve through both values rather than a linear blend.
pub fn banking_at(start: f32, end: f32, t: f32) -> f32 {
    smooth_banking(start, start, end, end, t)
}

/// The four Bezier control points of the segment `start -> end`.
pub fn segment_controls(start: &Anchor, end: &Anchor) -> [Float3; 4] {
    [
        start.position,
        start.position + start.handle,
        end.position - end.handle,
        end.position,
    ]
}

pub fn position_at(start: &Anchor, end: &Anchor, t: f32) -> Float3 {
    let [p0, p1, p2, p3] = segment_controls(start, end);
    evaluate(p0, p1, p2, p3, t)
}

/// Oriented point at `t` on the segment between two anchors.
///
/// When either anchor carries an explicit up vector, that vector becomes the
/// frame's up hint and a quarter-turn correction is blended into the banking.
/// The sign of the correction follows the vertical component of that anchor's
/// handle. The start anchor takes precedence. Missing anchors behave like
/// [`Anchor::DEFAULT`].
pub fn oriented_point_at(start: Option<&Anchor>, end: Option<&Anchor>, t: f32) -> OrientedFrame {
    let start = start.unwrap_or(&Anchor::DEFAULT);
    let end = end.unwrap_or(&Anchor::DEFAULT);

    let [p0, p1, p2, p3] = segment_controls(start, end);
    let position = evaluate(p0, p1, p2, p3, t);
    let tangent = derivative(p0, p1, p2, p3, t);
    let mut banking = banking_at(start.banking, end.banking, t);

    let blend = t.clamp(0.0, 1.0);
    let (up, correction) = if start.has_custom_up() {
        let correction = if start.handle.y > 0.0 {
            UP_CORRECTION * blend
        } else {
            -UP_CORRECTION * blend
        };
        (start.up, correction)
    } else if end.has_custom_up() {
        let correction = if end.handle.y > 0.0 {
            -UP_CORRECTION * (1.0 - blend)
        } else {
            UP_CORRECTION * (1.0 - blend)
        };
        (end.up, correction)
    } else {
        (Float3::UP, 0.0)
    };
    banking += correction;

    OrientedFrame::new(position, tangent, banking, up, correction)
}

/// Half-line with a unit direction.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Float3,
    pub direction: Float3,
}

impl Ray {
    pub fn new(origin: Float3, direction: Float3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Float3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray and perpendicular distance to `point`.
    fn project(&self, point: Float3) -> (f32, f32) {
        let to_point = point - self.origin;
        let along = self.direction.dot(to_point);
        let perpendicular = to_point - self.direction * along;
        (along, perpendicular.magnitude())
    }
}

/// Sampled point of the segment closest to the ray, considering only points
/// ahead of the origin. `None` when the whole segment lies behind it.
pub fn closest_point_on_segment(ray: &Ray, start: &Anchor, end: &Anchor) -> Option<Float3> {
    let [p0, p1, p2, p3] = segment_controls(start, end);
    let mut closest = None;
    let mut closest_distance = f32::MAX;

    for i in 0..=COLLISION_SAMPLES {
        let t = i as f32 * COLLISION_STEP;
        let point = evaluate(p0, p1, p2, p3, t);
        let (along, distance) = ray.project(point);
        if along < 0.0 {
            continue;
        }
        if distance < closest_distance {
            closest_distance = distance;
            closest = Some(point);
        }
    }

    closest
}

/// True when the segment passes within `radius` of the ray, ahead of its origin.
pub fn check_collision(ray: &Ray, radius: f32, start: &Anchor, end: &Anchor) -> bool {
    let Some(closest) = closest_point_on_segment(ray, start, end) else {
        return false;
    };
    let (along, distance) = ray.project(closest);
    along >= 0.0 && distance <= radius
}
