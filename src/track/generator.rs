//! Chain ownership, proximity queries and the rebuild pass.
//!
//! Chains carry no links to each other. Two chains are connected when an end
//! of one lies within `adjacency_tolerance` of an end of the other, which is
//! resolved at query time.

use super::builder::{RebuildReport, Rebuildable};
use super::config::GeneratorConfig;
use super::mesh::{extrude, extrude_low_poly, ProfileMesh, SurfaceMesh};
use super::support::{Support, SupportPrefab};
use crate::error::{TrackError, TrackResult};
use crate::sim::{delta_angle, Float3, OrientedFrame, Pose, Quaternion, EPSILON};
use crate::spline::{Color, SplineChain};

/// Spacing of the samples scanned by a full nearest-point query.
pub const NEAREST_SAMPLE_SPACING: f32 = 0.1;
/// Supports are skipped where an up override is active and |direction.y| exceeds this.
const SUPPORT_VERTICAL_LIMIT: f32 = 0.9;
/// Hue increment between successive chains.
const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// Chain index and distance along it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackPosition {
    pub chain: usize,
    pub distance: f32,
}

impl TrackPosition {
    pub const fn new(chain: usize, distance: f32) -> Self {
        Self { chain, distance }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackGenerator {
    config: GeneratorConfig,
    chains: Vec<SplineChain>,
    /// Surface of each chain from the last rebuild pass, parallel to `chains`.
    surfaces: Vec<Option<SurfaceMesh>>,
    profile: Option<ProfileMesh>,
    support_prefabs: Vec<SupportPrefab>,
    supports: Vec<Support>,
}

impl TrackGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    pub fn chains(&self) -> &[SplineChain] {
        &self.chains
    }

    pub fn chain(&self, index: usize) -> TrackResult<&SplineChain> {
        let count = self.chains.len();
        self.chains
            .get(index)
            .ok_or(TrackError::ChainOutOfRange { index, count })
    }

    pub fn chain_mut(&mut self, index: usize) -> TrackResult<&mut SplineChain> {
        let count = self.chains.len();
        self.chains
            .get_mut(index)
            .ok_or(TrackError::ChainOutOfRange { index, count })
    }

    /// Adds a chain and gives it a display color distinct from its neighbours.
    pub fn add_chain(&mut self, mut chain: SplineChain) -> usize {
        let index = self.chains.len();
        let hue = (index as f32 * GOLDEN_RATIO_CONJUGATE).fract();
        chain.set_color(Color::from_hsv(hue, 0.6, 0.95));
        self.chains.push(chain);
        self.surfaces.push(None);
        index
    }

    pub fn remove_chain(&mut self, index: usize) -> TrackResult<SplineChain> {
        let count = self.chains.len();
        if index >= count {
            return Err(TrackError::ChainOutOfRange { index, count });
        }
        self.surfaces.remove(index);
        Ok(self.chains.remove(index))
    }

    /// Surface generated for `chain` by the last rebuild pass.
    pub fn surface(&self, chain: usize) -> Option<&SurfaceMesh> {
        self.surfaces.get(chain).and_then(Option::as_ref)
    }

    pub fn profile(&self) -> Option<&ProfileMesh> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: ProfileMesh) {
        self.profile = Some(profile);
    }

    pub fn support_prefabs(&self) -> &[SupportPrefab] {
        &self.support_prefabs
    }

    pub fn set_support_prefabs(&mut self, prefabs: Vec<SupportPrefab>) {
        self.support_prefabs = prefabs;
    }

    /// Supports kept by the last rebuild pass.
    pub fn supports(&self) -> &[Support] {
        &self.supports
    }

    /// A chain that can be sampled: at least two anchors and a positive length.
    pub fn usable_chain(&self, index: usize) -> TrackResult<&SplineChain> {
        let chain = self.chain(index)?;
        if chain.anchor_count() < 2 {
            return Err(TrackError::TooFewAnchors {
                found: chain.anchor_count(),
            });
        }
        if chain.length() <= 0.0 {
            return Err(TrackError::DegenerateChain { chain: index });
        }
        Ok(chain)
    }

    /// Closest point on any chain except `ignore`.
    ///
    /// With `endpoints_only`, only chain ends are considered and the result is
    /// either 0 or the chain length. Otherwise every chain is scanned every
    /// [`NEAREST_SAMPLE_SPACING`] units.
    pub fn nearest_point(
        &self,
        position: Float3,
        ignore: Option<usize>,
        endpoints_only: bool,
    ) -> Option<TrackPosition> {
        let mut best: Option<TrackPosition> = None;
        let mut best_distance = f32::MAX;
        let mut consider = |candidate: TrackPosition, point: Float3| {
            let d = point.distance(position);
            if d < best_distance {
                best_distance = d;
                best = Some(candidate);
            }
        };

        for (i, chain) in self.chains.iter().enumerate() {
            if Some(i) == ignore || chain.anchor_count() < 2 {
                continue;
            }
            let length = chain.length();
            if endpoints_only {
                if let Some((start, end)) = chain.endpoints() {
                    consider(TrackPosition::new(i, 0.0), start);
                    consider(TrackPosition::new(i, length), end);
                }
            } else {
                let samples = (length / NEAREST_SAMPLE_SPACING).ceil() as usize;
                for k in 0..samples {
                    let distance = k as f32 * NEAREST_SAMPLE_SPACING;
                    let point = chain.point_at(distance, false, false).position;
                    consider(TrackPosition::new(i, distance), point);
                }
            }
        }
        best
    }

    /// Nearest chain end to `position` within the adjacency tolerance, ignoring `chain`.
    pub fn connected_end(&self, position: Float3, chain: usize) -> Option<TrackPosition> {
        let found = self.nearest_point(position, Some(chain), true)?;
        let end = self.chains[found.chain].point_at(found.distance, true, false);
        self.within_adjacency(end.position, position).then_some(found)
    }

    /// Chain ends strictly closer than the adjacency tolerance are joined.
    fn within_adjacency(&self, a: Float3, b: Float3) -> bool {
        a.distance(b) < self.config.adjacency_tolerance
    }

    /// Another chain with an end within the adjacency tolerance of the snapped
    /// point `distance` along `chain`.
    pub fn adjacent_chain(&self, chain: usize, distance: f32) -> TrackResult<Option<usize>> {
        let current = self.chain(chain)?.point_at(distance, true, false).position;
        Ok(self
            .chains
            .iter()
            .enumerate()
            .filter(|(i, other)| *i != chain && other.anchor_count() >= 2)
            .find(|(_, other)| {
                let start = other.point_at(0.0, true, false).position;
                let end = other.point_at(other.length(), true, false).position;
                self.within_adjacency(current, start) || self.within_adjacency(current, end)
            })
            .map(|(i, _)| i))
    }

    /// Evenly spaced support sample points, `max_support_distance` apart from the start.
    pub fn support_locations(&self, chain: usize) -> TrackResult<Vec<OrientedFrame>> {
        let chain = self.usable_chain(chain)?;
        let spacing = self.config.max_support_distance;
        let count = (chain.length() / spacing).ceil() as usize;
        Ok((0..count)
            .map(|i| chain.point_at(i as f32 * spacing, false, false))
            .collect())
    }

    /// Full-resolution surface of one chain.
    pub fn generate_surface(&self, chain: usize, profile: &ProfileMesh) -> TrackResult<SurfaceMesh> {
        let spline = self.usable_chain(chain)?;
        extrude(
            spline,
            profile,
            self.config.surface_step,
            self.config.frame_cache_margin,
        )
    }

    /// Surface with vertices closer than `threshold` to their predecessor merged away.
    pub fn generate_low_poly_surface(
        &self,
        chain: usize,
        profile: &ProfileMesh,
        threshold: f32,
    ) -> TrackResult<SurfaceMesh> {
        let spline = self.usable_chain(chain)?;
        extrude_low_poly(
            spline,
            profile,
            threshold,
            self.config.surface_step,
            self.config.low_poly_cache_margin,
        )
    }

    /// Prefab whose rotation is closest to `banking`.
    fn best_prefab(&self, banking: f32) -> Option<usize> {
        self.support_prefabs
            .iter()
            .enumerate()
            .map(|(i, prefab)| (i, delta_angle(banking, prefab.rotation).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Supports for one chain, with legs that would cross any chain rejected
    /// and the rest extended to the floor.
    pub fn place_supports(&self, chain: usize) -> TrackResult<Vec<Support>> {
        if self.support_prefabs.is_empty() {
            return Err(TrackError::MissingSupportPrefabs);
        }
        let locations = self.support_locations(chain)?;
        let mut placed = Vec::with_capacity(locations.len());

        for location in locations {
            let direction = location.direction();
            if location.has_custom_up() && direction.y.abs() > SUPPORT_VERTICAL_LIMIT {
                continue;
            }
            let Some(prefab_index) = self.best_prefab(location.base_banking()) else {
                continue;
            };

            let heading = direction.flattened();
            if heading.sqr_magnitude() < EPSILON {
                log::warn!(
                    "support on chain {chain} at {:?} has a vertical tangent, skipped",
                    location.position
                );
                continue;
            }
            let rotation = Quaternion::look_rotation(heading, Float3::UP);

            let mut support = Support::instantiate(
                prefab_index,
                &self.support_prefabs[prefab_index],
                location.position,
                rotation,
            );
            if self
                .chains
                .iter()
                .any(|other| support.intersects(self.config.cart_radius, other))
            {
                continue;
            }
            support.extend_legs(self.config.min_floor_height);
            placed.push(support);
        }
        Ok(placed)
    }

    /// Pose at the nearest point of any chain, raised by `lift`.
    pub fn snap_pose(&self, position: Float3, lift: f32) -> TrackResult<Pose> {
        let nearest = self
            .nearest_point(position, None, false)
            .ok_or(TrackError::NoTrackNearPosition)?;
        Ok(self.chains[nearest.chain].pose_at(nearest.distance, lift, false))
    }

    /// Regenerates every chain's surface and replaces all supports.
    ///
    /// Failures are logged and reported per chain; the pass always runs to the end.
    pub fn rebuild_all(&mut self) -> RebuildReport {
        let mut report = RebuildReport::default();

        let surfaces: Vec<TrackResult<SurfaceMesh>> = match &self.profile {
            Some(profile) => (0..self.chains.len())
                .map(|i| self.generate_surface(i, profile))
                .collect(),
            None => (0..self.chains.len())
                .map(|_| Err(TrackError::MissingProfile))
                .collect(),
        };
        for (i, surface) in surfaces.into_iter().enumerate() {
            match surface {
                Ok(mesh) => {
                    report.surfaces += 1;
                    report.vertices += mesh.vertex_count();
                    self.surfaces[i] = Some(mesh);
                }
                Err(err) => {
                    log::error!("surface for chain {i} not generated: {err}");
                    self.surfaces[i] = None;
                    report.errors.push((i, err));
                }
            }
        }

        let mut supports = Vec::new();
        for i in 0..self.chains.len() {
            match self.place_supports(i) {
                Ok(mut placed) => supports.append(&mut placed),
                Err(err) => {
                    log::error!("supports for chain {i} not placed: {err}");
                    report.errors.push((i, err));
                }
            }
        }
        report.supports = supports.len();
        self.supports = supports;

        log::debug!(
            "rebuilt {} surfaces ({} vertices), {} supports, {} errors",
            report.surfaces,
            report.vertices,
            report.supports,
            report.errors.len()
        );
        report
    }
}

impl Rebuildable for TrackGenerator {
    fn chains(&self) -> &[SplineChain] {
        &self.chains
    }

    fn rebuild(&mut self) -> RebuildReport {
        self.rebuild_all()
    }
}
