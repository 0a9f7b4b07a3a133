//! Track generation: surfaces, supports, rebuild scheduling and height bindings.
//!
//! The [`TrackGenerator`] owns every chain and answers proximity queries across
//! them. Geometry is produced per chain and cached on the chain until the next
//! rebuild pass.

mod binding;
mod builder;
mod config;
mod generator;
mod mesh;
mod support;

pub use binding::{HeightBinding, DEFAULT_MAX_OFFSET, DEFAULT_MIN_OFFSET};
pub use builder::{RebuildReport, Rebuildable, TrackMeshBuilder};
pub use config::GeneratorConfig;
pub use generator::{TrackGenerator, TrackPosition, NEAREST_SAMPLE_SPACING};
pub use mesh::{
    extrude, extrude_low_poly, DistanceCache, ProfileMesh, SurfaceMesh, MAX_SURFACE_VERTICES,
};
pub use support::{Leg, LegPrefab, Plane, Support, SupportPrefab, SUPPORT_RADIUS};
