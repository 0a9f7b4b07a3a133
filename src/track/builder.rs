//! Debounced surface rebuilding.
//!
//! The builder is polled once per frame. It rebuilds only after the track has
//! changed since the last build and then held still for one full frame, so a
//! drag in progress does not regenerate geometry on every frame.

use crate::error::TrackError;
use crate::sim::Float3;
use crate::spline::{Anchor, SplineChain};

/// Outcome of one rebuild pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    /// Chains that received a new surface.
    pub surfaces: usize,
    /// Total vertices across the new surfaces.
    pub vertices: usize,
    /// Supports kept after rejection.
    pub supports: usize,
    /// Per-chain failures, keyed by chain index.
    pub errors: Vec<(usize, TrackError)>,
}

impl RebuildReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Something that owns chains and can regenerate geometry from them.
pub trait Rebuildable {
    fn chains(&self) -> &[SplineChain];
    fn rebuild(&mut self) -> RebuildReport;
}

#[derive(Debug, Clone, PartialEq)]
struct ChainShape {
    anchors: Vec<Anchor>,
    offset: Float3,
}

/// Shape of every chain at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
struct TrackSnapshot {
    chains: Vec<ChainShape>,
}

impl TrackSnapshot {
    fn capture(chains: &[SplineChain]) -> Self {
        Self {
            chains: chains
                .iter()
                .map(|chain| ChainShape {
                    anchors: chain.anchors().to_vec(),
                    offset: chain.offset(),
                })
                .collect(),
        }
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.chains.len() == other.chains.len()
            && self.chains.iter().zip(&other.chains).all(|(a, b)| {
                a.offset == b.offset
                    && a.anchors.len() == b.anchors.len()
                    && a.anchors
                        .iter()
                        .zip(&b.anchors)
                        .all(|(x, y)| x.same_shape(y))
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackMeshBuilder {
    built: Option<TrackSnapshot>,
    last_frame: Option<TrackSnapshot>,
}

impl TrackMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds immediately and records the result as the built state.
    pub fn build_now(&mut self, target: &mut dyn Rebuildable) -> RebuildReport {
        let snapshot = TrackSnapshot::capture(target.chains());
        let report = target.rebuild();
        self.last_frame = Some(snapshot.clone());
        self.built = Some(snapshot);
        report
    }

    /// Per-frame poll. Returns a report when a rebuild ran.
    pub fn update(&mut self, target: &mut dyn Rebuildable) -> Option<RebuildReport> {
        let current = TrackSnapshot::capture(target.chains());
        let changed = self
            .built
            .as_ref()
            .map_or(true, |built| !built.same_shape(&current));
        let settled = self
            .last_frame
            .as_ref()
            .is_some_and(|last| last.same_shape(&current));
        self.last_frame = Some(current);

        if !(changed && settled) {
            return None;
        }
        let report = target.rebuild();
        self.built = self.last_frame.clone();
        log::debug!("track settled, rebuilt {} surfaces", report.surfaces);
        Some(report)
    }

    /// True when the track differs from the last built state.
    pub fn is_stale(&self, chains: &[SplineChain]) -> bool {
        self.built
            .as_ref()
            .map_or(true, |built| !built.same_shape(&TrackSnapshot::capture(chains)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        chains: Vec<SplineChain>,
        rebuilds: usize,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                chains: vec![SplineChain::new(vec![
                    Anchor::new(Float3::ZERO, Float3::RIGHT, 0.0),
                    Anchor::new(Float3::new(4.0, 0.0, 0.0), Float3::RIGHT, 0.0),
                ])],
                rebuilds: 0,
            }
        }

        fn nudge(&mut self, x: f32) {
            self.chains[0].anchor_mut(1).expect("anchor").position.x = x;
        }
    }

    impl Rebuildable for Counting {
        fn chains(&self) -> &[SplineChain] {
            &self.chains
        }

        fn rebuild(&mut self) -> RebuildReport {
            self.rebuilds += 1;
            RebuildReport::default()
        }
    }

    #[test]
    fn no_rebuild_without_change() {
        let mut target = Counting::new();
        let mut builder = TrackMeshBuilder::new();
        builder.build_now(&mut target);
        assert_eq!(target.rebuilds, 1);

        for _ in 0..5 {
            assert!(builder.update(&mut target).is_none());
        }
        assert_eq!(target.rebuilds, 1);
    }

    #[test]
    fn rebuild_waits_for_a_still_frame() {
        let mut target = Counting::new();
        let mut builder = TrackMeshBuilder::new();
        builder.build_now(&mut target);

        // Dragging: the shape differs every frame.
        for x in [5.0, 6.0, 7.0] {
            target.nudge(x);
            assert!(builder.update(&mut target).is_none());
        }
        assert_eq!(target.rebuilds, 1);
        assert!(builder.is_stale(&target.chains));

        // Released: one identical frame triggers exactly one rebuild.
        assert!(builder.update(&mut target).is_some());
        assert!(builder.update(&mut target).is_none());
        assert_eq!(target.rebuilds, 2);
        assert!(!builder.is_stale(&target.chains));
    }

    #[test]
    fn offset_change_counts_as_change() {
        let mut target = Counting::new();
        let mut builder = TrackMeshBuilder::new();
        builder.build_now(&mut target);

        target.chains[0].set_offset(Float3::new(0.0, 1.0, 0.0));
        assert!(builder.update(&mut target).is_none());
        assert!(builder.update(&mut target).is_some());
    }

    #[test]
    fn chain_count_change_counts_as_change() {
        let mut target = Counting::new();
        let mut builder = TrackMeshBuilder::new();
        builder.build_now(&mut target);

        target.chains.push(SplineChain::default());
        assert!(builder.update(&mut target).is_none());
        assert!(builder.update(&mut target).is_some());
        assert_eq!(target.rebuilds, 2);
    }

    #[test]
    fn first_build_happens_after_settling() {
        let mut target = Counting::new();
        let mut builder = TrackMeshBuilder::new();
        assert!(builder.update(&mut target).is_none());
        assert!(builder.update(&mut target).is_some());
    }
}
