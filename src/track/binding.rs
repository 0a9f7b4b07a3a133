//! Normalized height control for a run of anchors.

use super::builder::RebuildReport;
use super::generator::TrackGenerator;
use crate::error::{TrackError, TrackResult};

pub const DEFAULT_MIN_OFFSET: f32 = -3.0;
pub const DEFAULT_MAX_OFFSET: f32 = 6.0;

/// Drives the height of anchors `[start, start + count)` of one chain from a
/// value in [0, 1].
///
/// Offsets are applied to the heights captured at construction, so repeated
/// calls with the same value leave the track where it was.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightBinding {
    chain: usize,
    start: usize,
    original_heights: Vec<f32>,
    min_offset: f32,
    max_offset: f32,
    rebuild: bool,
    height01: f32,
}

impl HeightBinding {
    /// Captures the current heights of the bound anchors. `count` is clipped
    /// to the end of the chain.
    pub fn new(
        generator: &TrackGenerator,
        chain: usize,
        start: usize,
        count: usize,
        min_offset: f32,
        max_offset: f32,
    ) -> TrackResult<Self> {
        let anchors = generator.chain(chain)?.anchors();
        if start >= anchors.len() {
            return Err(TrackError::AnchorOutOfRange {
                index: start,
                count: anchors.len(),
            });
        }
        let end = start.saturating_add(count).min(anchors.len());
        Ok(Self {
            chain,
            start,
            original_heights: anchors[start..end].iter().map(|a| a.position.y).collect(),
            min_offset,
            max_offset,
            rebuild: false,
            height01: 0.5,
        })
    }

    /// Rebuild every surface after each height change.
    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn chain(&self) -> usize {
        self.chain
    }

    pub fn bound_count(&self) -> usize {
        self.original_heights.len()
    }

    pub fn height01(&self) -> f32 {
        self.height01
    }

    /// Vertical offset for a normalized height, clamped to [0, 1].
    pub fn offset_for(&self, t01: f32) -> f32 {
        let t = t01.clamp(0.0, 1.0);
        self.min_offset + (self.max_offset - self.min_offset) * t
    }

    /// Moves the bound anchors and, if configured, rebuilds the track.
    pub fn set_height01(
        &mut self,
        t01: f32,
        generator: &mut TrackGenerator,
    ) -> TrackResult<Option<RebuildReport>> {
        self.height01 = t01.clamp(0.0, 1.0);
        let offset = self.offset_for(t01);

        let chain = generator.chain_mut(self.chain)?;
        for (i, &height) in self.original_heights.iter().enumerate() {
            chain.anchor_mut(self.start + i)?.position.y = height + offset;
        }

        if self.rebuild {
            Ok(Some(generator.rebuild_all()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Float3;
    use crate::spline::{Anchor, SplineChain};
    use crate::track::GeneratorConfig;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    fn generator() -> TrackGenerator {
        let mut generator = TrackGenerator::new(GeneratorConfig::default());
        generator.add_chain(SplineChain::new(
            (0..4)
                .map(|i| Anchor::new(Float3::new(i as f32 * 3.0, 2.0, 0.0), Float3::RIGHT, 0.0))
                .collect(),
        ));
        generator
    }

    fn heights(generator: &TrackGenerator) -> Vec<f32> {
        generator.chains()[0]
            .anchors()
            .iter()
            .map(|a| a.position.y)
            .collect()
    }

    #[test]
    fn offset_interpolates_and_clamps() {
        let generator = generator();
        let binding =
            HeightBinding::new(&generator, 0, 0, 2, DEFAULT_MIN_OFFSET, DEFAULT_MAX_OFFSET)
                .expect("binding");
        assert_relative_eq!(binding.offset_for(0.0), -3.0, epsilon = TOLERANCE);
        assert_relative_eq!(binding.offset_for(0.5), 1.5, epsilon = TOLERANCE);
        assert_relative_eq!(binding.offset_for(1.0), 6.0, epsilon = TOLERANCE);
        assert_relative_eq!(binding.offset_for(2.0), 6.0, epsilon = TOLERANCE);
        assert_relative_eq!(binding.offset_for(-1.0), -3.0, epsilon = TOLERANCE);
    }

    #[test]
    fn moves_only_bound_anchors() {
        let mut generator = generator();
        let mut binding =
            HeightBinding::new(&generator, 0, 1, 2, DEFAULT_MIN_OFFSET, DEFAULT_MAX_OFFSET)
                .expect("binding");
        let report = binding.set_height01(1.0, &mut generator).expect("set");
        assert!(report.is_none());
        assert_eq!(heights(&generator), vec![2.0, 8.0, 8.0, 2.0]);
    }

    #[test]
    fn repeated_calls_do_not_accumulate() {
        let mut generator = generator();
        let mut binding =
            HeightBinding::new(&generator, 0, 0, 1, DEFAULT_MIN_OFFSET, DEFAULT_MAX_OFFSET)
                .expect("binding");
        binding.set_height01(0.0, &mut generator).expect("set");
        binding.set_height01(0.0, &mut generator).expect("set");
        assert_relative_eq!(heights(&generator)[0], -1.0, epsilon = TOLERANCE);
        assert_relative_eq!(binding.height01(), 0.0, epsilon = TOLERANCE);
    }

    #[test]
    fn count_is_clipped_to_chain() {
        let generator = generator();
        let binding = HeightBinding::new(&generator, 0, 2, 10, -1.0, 1.0).expect("binding");
        assert_eq!(binding.bound_count(), 2);
        assert_eq!(
            HeightBinding::new(&generator, 0, 4, 1, -1.0, 1.0),
            Err(TrackError::AnchorOutOfRange { index: 4, count: 4 })
        );
        assert_eq!(
            HeightBinding::new(&generator, 3, 0, 1, -1.0, 1.0),
            Err(TrackError::ChainOutOfRange { index: 3, count: 1 })
        );
    }

    #[test]
    fn rebuild_when_configured() {
        let mut generator = generator();
        generator.set_profile(crate::track::ProfileMesh::strip(1.0));
        let mut binding = HeightBinding::new(&generator, 0, 0, 4, -1.0, 1.0)
            .expect("binding")
            .with_rebuild(true);
        let report = binding
            .set_height01(0.75, &mut generator)
            .expect("set")
            .expect("report");
        assert_eq!(report.surfaces, 1);
        let surface = generator.surface(0).expect("surface");
        assert_relative_eq!(surface.vertices[0].y, 2.5, epsilon = 1e-3);
    }
}
