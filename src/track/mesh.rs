//! Profile extrusion along a chain.
//!
//! A profile is a short slice of track in its own space: x runs along the
//! track as a fraction of one copy's length, y is height and z is width.
//! Copies are laid end to end until the chain is covered.

use crate::error::{TrackError, TrackResult};
use crate::sim::{Float3, OrientedFrame};
use crate::spline::SplineChain;

/// Generated surfaces at or above this vertex count no longer fit 16-bit indices.
pub const MAX_SURFACE_VERTICES: usize = 65534;

/// Cross-section mesh extruded along every chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMesh {
    pub vertices: Vec<Float3>,
    pub normals: Vec<Float3>,
    pub uvs: Vec<[f32; 2]>,
    pub triangles: Vec<u32>,
}

impl ProfileMesh {
    pub fn new(
        vertices: Vec<Float3>,
        normals: Vec<Float3>,
        uvs: Vec<[f32; 2]>,
        triangles: Vec<u32>,
    ) -> Self {
        Self {
            vertices,
            normals,
            uvs,
            triangles,
        }
    }

    /// Flat upward-facing strip of the given width spanning one copy length.
    pub fn strip(width: f32) -> Self {
        let half = width * 0.5;
        Self::new(
            vec![
                Float3::new(0.0, 0.0, -half),
                Float3::new(0.0, 0.0, half),
                Float3::new(1.0, 0.0, -half),
                Float3::new(1.0, 0.0, half),
            ],
            vec![Float3::UP; 4],
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            vec![0, 2, 1, 1, 2, 3],
        )
    }

    /// Checks that triangles come in threes and reference existing vertices.
    pub fn validate(&self) -> TrackResult<()> {
        if self.vertices.is_empty() {
            return Err(TrackError::EmptyProfile);
        }
        if self.triangles.len() % 3 != 0 {
            return Err(TrackError::InvalidProfile {
                reason: format!("{} indices is not a multiple of 3", self.triangles.len()),
            });
        }
        let count = self.vertices.len();
        if let Some(&index) = self.triangles.iter().find(|&&i| i as usize >= count) {
            return Err(TrackError::InvalidProfile {
                reason: format!("index {index} out of range ({count} vertices)"),
            });
        }
        Ok(())
    }

    /// Smallest and largest along-track coordinate.
    fn extent(&self) -> (f32, f32) {
        self.vertices
            .iter()
            .fold((0.0f32, 0.0f32), |(min, max), v| (min.min(v.x), max.max(v.x)))
    }
}

/// Triangulated world-space surface of one chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<Float3>,
    pub normals: Vec<Float3>,
    pub uvs: Vec<[f32; 2]>,
    pub triangles: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the mesh no longer fits 16-bit indices.
    pub fn exceeds_index_limit(&self) -> bool {
        self.vertices.len() >= MAX_SURFACE_VERTICES
    }
}

/// Frames keyed by chain distance, reused when a request falls within `margin`
/// of a cached key.
#[derive(Debug, Clone)]
pub struct DistanceCache {
    margin: f32,
    entries: Vec<(f32, OrientedFrame)>,
}

impl DistanceCache {
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_or_insert_with<F>(&mut self, distance: f32, compute: F) -> OrientedFrame
    where
        F: FnOnce() -> OrientedFrame,
    {
        // Requests arrive roughly in increasing order, newest keys are the likeliest hit.
        if let Some((_, frame)) = self
            .entries
            .iter()
            .rev()
            .find(|(key, _)| (key - distance).abs() <= self.margin)
        {
            return *frame;
        }
        let frame = compute();
        self.entries.push((distance, frame));
        frame
    }
}

/// Copy layout shared by both extrusion variants.
struct Layout {
    copies: usize,
    copy_length: f32,
    stride: f32,
    inverted: bool,
    length: f32,
}

impl Layout {
    fn new(chain: &SplineChain, profile: &ProfileMesh, step: f32) -> TrackResult<Self> {
        profile.validate()?;
        let length = chain.length();
        let copies = ((length / step.max(f32::EPSILON)).ceil() as usize).max(1);
        let copy_length = length / copies as f32;

        let (min, max) = profile.extent();
        let (min, max) = (min * copy_length, max * copy_length);
        let inverted = min.abs() > max.abs();
        let stride = if inverted { min.abs() } else { max };

        Ok(Self {
            copies,
            copy_length,
            stride,
            inverted,
            length,
        })
    }

    fn distance(&self, copy: usize, vertex: Float3) -> f32 {
        (copy as f32 * self.stride + vertex.x.abs() * self.copy_length).clamp(0.0, self.length)
    }

    fn push_triangles(&self, triangles: &[u32], base: u32, out: &mut Vec<u32>) {
        for tri in triangles.chunks_exact(3) {
            if self.inverted {
                out.extend_from_slice(&[tri[2] + base, tri[1] + base, tri[0] + base]);
            } else {
                out.extend_from_slice(&[tri[0] + base, tri[1] + base, tri[2] + base]);
            }
        }
    }
}

fn profile_normal(profile: &ProfileMesh, index: usize) -> Float3 {
    profile.normals.get(index).copied().unwrap_or(Float3::UP)
}

fn profile_uv(profile: &ProfileMesh, index: usize) -> [f32; 2] {
    profile.uvs.get(index).copied().unwrap_or([0.0, 0.0])
}

/// Full-resolution extrusion of `profile` along `chain`.
///
/// The caller is responsible for rejecting chains with fewer than two anchors
/// or zero length.
pub fn extrude(
    chain: &SplineChain,
    profile: &ProfileMesh,
    step: f32,
    cache_margin: f32,
) -> TrackResult<SurfaceMesh> {
    let layout = Layout::new(chain, profile, step)?;
    let per_copy = profile.vertices.len();
    let mut cache = DistanceCache::new(cache_margin);
    let mut mesh = SurfaceMesh {
        vertices: Vec::with_capacity(layout.copies * per_copy),
        normals: Vec::with_capacity(layout.copies * per_copy),
        uvs: Vec::with_capacity(layout.copies * per_copy),
        triangles: Vec::with_capacity(layout.copies * profile.triangles.len()),
    };

    for copy in 0..layout.copies {
        for (i, &vertex) in profile.vertices.iter().enumerate() {
            let distance = layout.distance(copy, vertex);
            let point = cache.get_or_insert_with(distance, || chain.point_at(distance, false, false));
            let frame = point.basis(chain.local_up_at(distance));

            mesh.vertices.push(
                frame.transform_point(point.position, Float3::new(vertex.z, vertex.y, 0.0)),
            );
            mesh.normals
                .push(frame.transform_normal(profile_normal(profile, i)));
            mesh.uvs.push(profile_uv(profile, i));
        }
        layout.push_triangles(&profile.triangles, (copy * per_copy) as u32, &mut mesh.triangles);
    }

    if mesh.exceeds_index_limit() {
        log::warn!(
            "surface has {} vertices, which does not fit 16-bit indices; split the chain",
            mesh.vertex_count()
        );
    }
    Ok(mesh)
}

/// Reduced extrusion that skips any vertex closer than `threshold` to the
/// previously emitted one. Triangles referencing a skipped vertex are
/// redirected to that emitted vertex, and triangles that collapse are dropped.
pub fn extrude_low_poly(
    chain: &SplineChain,
    profile: &ProfileMesh,
    threshold: f32,
    step: f32,
    cache_margin: f32,
) -> TrackResult<SurfaceMesh> {
    let layout = Layout::new(chain, profile, step)?;
    let per_copy = profile.vertices.len();
    let mut cache = DistanceCache::new(cache_margin);
    let mut mesh = SurfaceMesh::default();
    let mut remap: Vec<u32> = Vec::with_capacity(layout.copies * per_copy);
    let mut source_triangles = Vec::with_capacity(layout.copies * profile.triangles.len());

    for copy in 0..layout.copies {
        for (i, &vertex) in profile.vertices.iter().enumerate() {
            let distance = layout.distance(copy, vertex);
            let point = cache.get_or_insert_with(distance, || chain.point_at(distance, false, false));
            let frame = point.basis(chain.local_up_at(distance));
            let world = frame.transform_point(point.position, Float3::new(vertex.z, vertex.y, 0.0));

            let keep = match mesh.vertices.last() {
                None => true,
                Some(last) => world.distance(*last) >= threshold,
            };
            if keep {
                mesh.vertices.push(world);
                mesh.normals
                    .push(frame.transform_normal(profile_normal(profile, i)));
                mesh.uvs.push(profile_uv(profile, i));
            }
            remap.push((mesh.vertices.len() - 1) as u32);
        }
        layout.push_triangles(&profile.triangles, (copy * per_copy) as u32, &mut source_triangles);
    }

    for tri in source_triangles.chunks_exact(3) {
        let (a, b, c) = (
            remap[tri[0] as usize],
            remap[tri[1] as usize],
            remap[tri[2] as usize],
        );
        if a != b && b != c && a != c {
            mesh.triangles.extend_from_slice(&[a, b, c]);
        }
    }

    log::debug!(
        "low-poly surface: {} vertices, {} cached frames",
        mesh.vertex_count(),
        cache.len()
    );
    Ok(mesh)
}
