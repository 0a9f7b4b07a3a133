//! Single-call FFI for coasterkit.
//!
//! Functions:
//! - `coaster_chain_sample` - anchors in, evenly spaced oriented points out
//! - `coaster_surface_extrude` - anchors and a profile in, a surface mesh out
//!
//! # Error Codes
//! - `0`: Success
//! - `-1`: Null pointer
//! - `-2`: Too few anchors or zero-length chain
//! - `-3`: Buffer overflow (resize and retry; counts hold the required sizes)
//! - `-4`: Empty or malformed profile
//! - `-5`: Invalid argument

use crate::error::TrackError;
use crate::sim::{Float3, OrientedFrame};
use crate::spline::{Anchor, SplineChain};
use crate::track::{extrude, extrude_low_poly, GeneratorConfig, ProfileMesh, SurfaceMesh};

/// Profile cross-section passed in by the host.
#[repr(C)]
pub struct CoasterProfile {
    pub vertices: *const Float3,
    pub normals: *const Float3,
    pub uvs: *const [f32; 2],
    pub vertex_count: usize,
    pub triangles: *const u32,
    pub triangle_index_count: usize,
}

/// Output buffers for an extruded surface.
#[repr(C)]
pub struct CoasterSurfaceOutput {
    pub vertices: *mut Float3,
    pub normals: *mut Float3,
    pub uvs: *mut [f32; 2],
    pub vertex_capacity: usize,
    pub triangles: *mut u32,
    pub triangle_index_capacity: usize,

    // Written by coaster_surface_extrude
    pub vertex_count: *mut usize,
    pub triangle_index_count: *mut usize,
}

fn error_code(err: &TrackError) -> i32 {
    match err {
        TrackError::TooFewAnchors { .. } | TrackError::DegenerateChain { .. } => -2,
        TrackError::EmptyProfile
        | TrackError::InvalidProfile { .. }
        | TrackError::MissingProfile => -4,
        _ => -5,
    }
}

unsafe fn chain_from_raw(anchors: *const Anchor, anchor_count: usize, offset: Float3) -> SplineChain {
    let mut chain = SplineChain::new(to_vec(anchors, anchor_count));
    chain.set_offset(offset);
    chain
}

fn check_chain(chain: &SplineChain) -> Result<(), TrackError> {
    if chain.anchor_count() < 2 {
        return Err(TrackError::TooFewAnchors {
            found: chain.anchor_count(),
        });
    }
    if chain.length() <= 0.0 {
        return Err(TrackError::DegenerateChain { chain: 0 });
    }
    Ok(())
}

/// Samples a chain every `spacing` units from its start, ending with its
/// snapped end point.
///
/// # Safety
///
/// - `anchors` must be valid for `anchor_count` reads
/// - `out_points` must be valid for `capacity` writes
/// - `out_count` and `out_length` must be valid pointers
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn coaster_chain_sample(
    anchors: *const Anchor,
    anchor_count: usize,
    offset: Float3,
    spacing: f32,
    out_points: *mut OrientedFrame,
    capacity: usize,
    out_count: *mut usize,
    out_length: *mut f32,
) -> i32 {
    if anchors.is_null() || out_points.is_null() || out_count.is_null() || out_length.is_null() {
        return -1;
    }
    if spacing.is_nan() || spacing <= 0.0 {
        return -5;
    }
    let chain = chain_from_raw(anchors, anchor_count, offset);
    if let Err(err) = check_chain(&chain) {
        return error_code(&err);
    }

    let length = chain.length();
    let interior = (length / spacing).ceil() as usize;
    let count = interior + 1;
    *out_count = count;
    *out_length = length;
    if count > capacity {
        return -3;
    }

    for i in 0..interior {
        *out_points.add(i) = chain.point_at(i as f32 * spacing, true, false);
    }
    *out_points.add(interior) = chain.point_at(length, true, false);
    0
}

/// Extrudes a profile along a chain. With `low_poly_threshold > 0`, vertices
/// closer than the threshold to their predecessor are merged.
///
/// # Safety
///
/// - `anchors` must be valid for `anchor_count` reads
/// - `profile` must point to a `CoasterProfile` whose arrays are valid for
///   their counts (`normals` and `uvs` may be null)
/// - `output` must point to a `CoasterSurfaceOutput` whose buffers are valid
///   for their capacities
#[no_mangle]
pub unsafe extern "C" fn coaster_surface_extrude(
    anchors: *const Anchor,
    anchor_count: usize,
    offset: Float3,
    profile: *const CoasterProfile,
    step: f32,
    low_poly_threshold: f32,
    output: *mut CoasterSurfaceOutput,
) -> i32 {
    if anchors.is_null() || profile.is_null() || output.is_null() {
        return -1;
    }
    let profile = &*profile;
    let output = &mut *output;
    if output.vertex_count.is_null() || output.triangle_index_count.is_null() {
        return -1;
    }
    if step.is_nan() || step <= 0.0 {
        return -5;
    }

    let chain = chain_from_raw(anchors, anchor_count, offset);
    if let Err(err) = check_chain(&chain) {
        return error_code(&err);
    }
    let mesh = ProfileMesh::new(
        to_vec(profile.vertices, profile.vertex_count),
        to_vec(profile.normals, profile.vertex_count),
        to_vec(profile.uvs, profile.vertex_count),
        to_vec(profile.triangles, profile.triangle_index_count),
    );

    let config = GeneratorConfig::default();
    let surface = if low_poly_threshold > 0.0 {
        extrude_low_poly(&chain, &mesh, low_poly_threshold, step, config.low_poly_cache_margin)
    } else {
        extrude(&chain, &mesh, step, config.frame_cache_margin)
    };
    let surface = match surface {
        Ok(surface) => surface,
        Err(err) => return error_code(&err),
    };

    write_surface(&surface, output)
}

unsafe fn write_surface(surface: &SurfaceMesh, output: &mut CoasterSurfaceOutput) -> i32 {
    *output.vertex_count = surface.vertex_count();
    *output.triangle_index_count = surface.triangles.len();
    if surface.vertex_count() > output.vertex_capacity
        || surface.triangles.len() > output.triangle_index_capacity
    {
        return -3;
    }
    if output.vertices.is_null() || output.triangles.is_null() {
        return -1;
    }

    for (i, vertex) in surface.vertices.iter().enumerate() {
        *output.vertices.add(i) = *vertex;
    }
    if !output.normals.is_null() {
        for (i, normal) in surface.normals.iter().enumerate() {
            *output.normals.add(i) = *normal;
        }
    }
    if !output.uvs.is_null() {
        for (i, uv) in surface.uvs.iter().enumerate() {
            *output.uvs.add(i) = *uv;
        }
    }
    for (i, &index) in surface.triangles.iter().enumerate() {
        *output.triangles.add(i) = index;
    }
    0
}

// --- Helpers ---

unsafe fn to_vec<T: Copy>(ptr: *const T, len: usize) -> Vec<T> {
    if len == 0 || ptr.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr, len).to_vec()
    }
}
