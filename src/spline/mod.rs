//! Bezier curve math and anchor chains.

pub mod bezier;

mod anchor;
mod chain;

pub use anchor::Anchor;
pub use bezier::{check_collision, closest_point_on_segment, oriented_point_at, Ray};
pub use chain::{
    find_t_for_distance, length_step, segment_length, Color, SplineChain, LENGTH_STEP,
    LENGTH_STEP_FINE, LENGTH_WORKERS, T_STEP, T_STEP_PRECISE, VERTICAL_DOT,
};
