//! Math and physics primitives shared by the curve, track and ride layers.
//!
//! This module contains zero-dependency value types and ride constants.

mod energy;
mod frame;
mod math;
mod oriented;

// Ride constants and angle helpers, addressed as `sim::physics::*`
pub mod physics;

pub use energy::{EnergyMeter, EnergyParams, EnergyReading};
pub use frame::Frame;
pub use math::{Float3, Matrix3, Quaternion};
pub use oriented::{OrientedFrame, Pose};
pub use physics::{delta_angle, EPSILON, G};
