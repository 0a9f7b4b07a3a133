//! Ordered anchor chains with a lazily rebuilt arc-length cache.
//!
//! The cache holds the segment lengths, their total, and a snapshot of the
//! anchors with derived up vectors. It is built on first query and dropped on
//! every write, so a stale length can never be observed.

use std::sync::{Arc, OnceLock};

use rayon::prelude::*;

use super::anchor::Anchor;
use super::bezier::{oriented_point_at, position_at};
use crate::error::{TrackError, TrackResult};
use crate::sim::{Float3, OrientedFrame, Pose};

/// Worker tasks per segment length integration.
pub const LENGTH_WORKERS: usize = 10;
pub const LENGTH_STEP: f32 = 1e-4;
/// Used when either end of a segment carries an up override.
pub const LENGTH_STEP_FINE: f32 = 1e-5;
pub const T_STEP: f32 = 0.005;
pub const T_STEP_PRECISE: f32 = 0.0004;
/// |tangent . up| above which an anchor counts as vertical.
pub const VERTICAL_DOT: f32 = 0.99;

/// RGBA display color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Opaque color from hue, saturation and value, all in [0, 1].
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match sector as u32 {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };
        Self::new(r, g, b, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Debug, Clone)]
struct ChainCache {
    anchors: Arc<[Anchor]>,
    segment_lengths: Vec<f32>,
    total: f32,
}

impl ChainCache {
    fn build(authored: &[Anchor]) -> Self {
        let anchors: Arc<[Anchor]> = derive_ups(authored).into();
        let segment_lengths: Vec<f32> = anchors
            .windows(2)
            .map(|pair| segment_length(&pair[0], &pair[1]))
            .collect();
        let total: f32 = segment_lengths.iter().sum();
        Self {
            anchors,
            segment_lengths,
            total,
        }
    }

    /// Segment owning `distance` and the chain distance at its start.
    /// Distances at or past the end resolve to the last segment.
    fn segment_at(&self, distance: f32) -> (usize, f32) {
        let mut start = 0.0;
        let last = self.segment_lengths.len().saturating_sub(1);
        for (i, &length) in self.segment_lengths.iter().enumerate() {
            if start + length > distance || i == last {
                return (i, start);
            }
            start += length;
        }
        (0, 0.0)
    }
}

/// Copies `authored` with up vectors re-derived for every anchor but the last.
///
/// A nearly vertical anchor gets the axis-snapped normal of the plane through
/// its neighbours; every other anchor gets world up.
fn derive_ups(authored: &[Anchor]) -> Vec<Anchor> {
    let mut anchors = authored.to_vec();
    let count = anchors.len();
    for i in 0..count.saturating_sub(1) {
        let tangent = authored[i].handle.normalize();
        anchors[i].up = if tangent.dot(Float3::UP).abs() > VERTICAL_DOT {
            let position = authored[i].position;
            let prev = authored[i.saturating_sub(1)].position;
            let next = authored[(i + 1).min(count - 1)].position;

            let mut prev_dir = (position - prev).normalize();
            let mut next_dir = (next - position).normalize();
            // Chain ends have no neighbour on one side.
            if prev_dir == Float3::ZERO {
                prev_dir = tangent;
            }
            if next_dir == Float3::ZERO {
                next_dir = tangent;
            }

            let right = prev_dir.cross(next_dir).normalize().snap_to_axis();
            if right == Float3::ZERO {
                Float3::UP
            } else {
                right
            }
        } else {
            Float3::UP
        };
    }
    anchors
}

/// Parametric integration step for the segment between two anchors.
pub fn length_step(start: &Anchor, end: &Anchor) -> f32 {
    if start.has_custom_up() || end.has_custom_up() {
        LENGTH_STEP_FINE
    } else {
        LENGTH_STEP
    }
}

/// Arc length of one segment by polyline integration, split across
/// [`LENGTH_WORKERS`] disjoint parameter ranges that run in parallel.
pub fn segment_length(start: &Anchor, end: &Anchor) -> f32 {
    let step = length_step(start, end);
    let per_worker = ((1.0 / LENGTH_WORKERS as f32) / step).round().max(1.0) as usize;
    let total_steps = (per_worker * LENGTH_WORKERS) as f32;

    // Partial lengths are summed in worker order so the total is reproducible.
    let partials: Vec<f32> = (0..LENGTH_WORKERS)
        .into_par_iter()
        .map(|worker| {
            let first = worker * per_worker;
            let mut previous = position_at(start, end, first as f32 / total_steps);
            let mut length = 0.0;
            for k in 1..=per_worker {
                let point = position_at(start, end, (first + k) as f32 / total_steps);
                length += point.distance(previous);
                previous = point;
            }
            length
        })
        .collect();
    partials.iter().sum()
}

/// Parameter at which the segment has covered `distance`, found by marching
/// at a fixed parametric step. Returns 1 when the distance exceeds the segment.
pub fn find_t_for_distance(start: &Anchor, end: &Anchor, distance: f32, precise: bool) -> f32 {
    let step = if precise { T_STEP_PRECISE } else { T_STEP };
    let steps = (1.0 / step).round() as usize;

    let mut accumulated = 0.0;
    let mut previous = start.position;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = position_at(start, end, t);
        accumulated += point.distance(previous);
        if accumulated >= distance {
            return t;
        }
        previous = point;
    }
    1.0
}

/// One continuous run of Bezier segments.
///
/// Segment `i` spans anchors `i` and `i + 1`. Chains with fewer than two
/// anchors can be built but have zero length and are rejected by generation.
#[derive(Debug, Clone, Default)]
pub struct SplineChain {
    anchors: Vec<Anchor>,
    offset: Float3,
    color: Color,
    cache: OnceLock<ChainCache>,
    generation: u64,
}

impl SplineChain {
    pub fn new(anchors: Vec<Anchor>) -> Self {
        Self {
            anchors,
            ..Self::default()
        }
    }

    /// Anchors as authored.
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Anchors with derived up vectors, as used by every curve query.
    pub fn resolved_anchors(&self) -> Arc<[Anchor]> {
        Arc::clone(&self.cache().anchors)
    }

    /// Mutable access to one anchor. The cache is invalidated up front.
    pub fn anchor_mut(&mut self, index: usize) -> TrackResult<&mut Anchor> {
        let count = self.anchors.len();
        if index >= count {
            return Err(TrackError::AnchorOutOfRange { index, count });
        }
        self.set_dirty();
        Ok(&mut self.anchors[index])
    }

    pub fn insert_anchor(&mut self, index: usize, anchor: Anchor) -> TrackResult<()> {
        let count = self.anchors.len();
        if index > count {
            return Err(TrackError::AnchorOutOfRange { index, count });
        }
        self.anchors.insert(index, anchor);
        self.set_dirty();
        Ok(())
    }

    pub fn push_anchor(&mut self, anchor: Anchor) {
        self.anchors.push(anchor);
        self.set_dirty();
    }

    /// Removes an anchor. Refuses to leave fewer than two.
    pub fn remove_anchor(&mut self, index: usize) -> TrackResult<Anchor> {
        let count = self.anchors.len();
        if index >= count {
            return Err(TrackError::AnchorOutOfRange { index, count });
        }
        if count <= 2 {
            return Err(TrackError::TooFewAnchors { found: count - 1 });
        }
        let removed = self.anchors.remove(index);
        self.set_dirty();
        Ok(removed)
    }

    /// Moves every anchor vertically by `delta`.
    pub fn shift_height(&mut self, delta: f32) {
        for anchor in &mut self.anchors {
            anchor.position.y += delta;
        }
        self.set_dirty();
    }

    /// Drops the length cache. Must follow any anchor edit made without
    /// going through the chain's own mutators.
    pub fn set_dirty(&mut self) {
        self.cache.take();
        self.generation += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.get().is_none()
    }

    /// Counter bumped on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn offset(&self) -> Float3 {
        self.offset
    }

    /// World translation applied to every queried point. Lengths are unaffected.
    pub fn set_offset(&mut self, offset: Float3) {
        self.offset = offset;
        self.generation += 1;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn cache(&self) -> &ChainCache {
        self.cache.get_or_init(|| ChainCache::build(&self.anchors))
    }

    /// Total arc length. Zero for chains with fewer than two anchors.
    pub fn length(&self) -> f32 {
        self.cache().total
    }

    pub fn segment_lengths(&self) -> &[f32] {
        &self.cache().segment_lengths
    }

    /// Segment index owning `distance` and the distance at its start.
    pub fn segment_at(&self, distance: f32) -> (usize, f32) {
        self.cache().segment_at(distance)
    }

    /// Oriented point `distance` along the chain, in world space.
    ///
    /// `distance` is clamped to `[0, length]`. With `snapped`, the exact ends
    /// return the anchors themselves. `precise` uses a finer parameter search.
    pub fn point_at(&self, distance: f32, snapped: bool, precise: bool) -> OrientedFrame {
        let cache = self.cache();
        let anchors = &cache.anchors;
        match anchors.len() {
            0 => return OrientedFrame::DEFAULT.translated(self.offset),
            1 => return anchors[0].to_oriented_frame().translated(self.offset),
            _ => {}
        }

        let distance = distance.clamp(0.0, cache.total);
        if snapped && distance == cache.total {
            return anchors[anchors.len() - 1]
                .to_oriented_frame()
                .translated(self.offset);
        }
        if snapped && distance == 0.0 {
            return anchors[0].to_oriented_frame().translated(self.offset);
        }

        let (index, start) = cache.segment_at(distance);
        let (a, b) = (&anchors[index], &anchors[index + 1]);
        let t = find_t_for_distance(a, b, distance - start, precise);
        oriented_point_at(Some(a), Some(b), t).translated(self.offset)
    }

    /// Up hint for the segment at `distance`: its start anchor's override,
    /// else its end anchor's, else world up.
    pub fn local_up_at(&self, distance: f32) -> Float3 {
        let cache = self.cache();
        if cache.anchors.len() < 2 {
            return Float3::UP;
        }
        let (index, _) = cache.segment_at(distance);
        let (a, b) = (&cache.anchors[index], &cache.anchors[index + 1]);
        if a.has_custom_up() {
            a.up
        } else if b.has_custom_up() {
            b.up
        } else {
            Float3::UP
        }
    }

    /// Banked placement `distance` along the chain, raised by `lift` along the
    /// banked up vector.
    pub fn pose_at(&self, distance: f32, lift: f32, precise: bool) -> Pose {
        let point = self.point_at(distance, false, precise);
        let frame = point.basis(self.local_up_at(distance));
        Pose::new(point.position + frame.normal * lift, frame)
    }

    /// Anchor positions including the chain offset.
    pub fn endpoints(&self) -> Option<(Float3, Float3)> {
        let first = self.anchors.first()?;
        let last = self.anchors.last()?;
        Some((first.position + self.offset, last.position + self.offset))
    }
}
