//! coasterkit - procedural coaster track from Bezier anchor chains.
//!
//! # Architecture
//!
//! Layered modules with strict inward-only dependencies:
//!
//! - **sim**: Math primitives (Float3, Quaternion, Frame, OrientedFrame) and ride constants
//! - **spline**: Bezier evaluation, anchors and chains with cached arc length
//! - **track**: Generator, surface extrusion, supports, rebuild scheduling
//! - **ride**: Actuators, sensors, carts and trains
//! - **ffi**: C FFI bindings
//!
//! # Usage
//!
//! ```ignore
//! use coasterkit::{spline::{Anchor, SplineChain}, track::TrackGenerator};
//! ```
//!
//! For C/C#/Unity, link the cdylib with the `ffi` feature and use the
//! `coaster_*` functions.

pub mod error;
pub mod ride;
pub mod sim;
pub mod spline;
pub mod track;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types at crate root
pub use error::{TrackError, TrackResult};
pub use ride::{Train, TrainConfig, Zones};
pub use sim::{Float3, Frame, OrientedFrame, Pose, Quaternion};
pub use spline::{Anchor, SplineChain};
pub use track::{GeneratorConfig, TrackGenerator, TrackMeshBuilder};
