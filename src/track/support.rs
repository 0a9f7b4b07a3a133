use crate::sim::{Float3, Quaternion};
use crate::spline::{check_collision, Ray, SplineChain};

/// Default clearance between a leg and the track it must not cross.
pub const SUPPORT_RADIUS: f32 = 0.5;

/// Infinite plane `normal . p + distance = 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: Float3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Float3, point: Float3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Horizontal ground plane at `height`.
    pub fn ground(height: f32) -> Self {
        Self::new(Float3::UP, Float3::new(0.0, height, 0.0))
    }

    /// Distance along `ray` to the plane, if hit in front of the origin.
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let enter = -(ray.origin.dot(self.normal) + self.distance) / denom;
        (enter > 0.0).then_some(enter)
    }
}

/// Leg attachment in support space; the leg extends along `-up`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LegPrefab {
    pub position: Float3,
    pub up: Float3,
}

impl LegPrefab {
    pub const fn new(position: Float3, up: Float3) -> Self {
        Self { position, up }
    }
}

/// Template a support is instantiated from.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportPrefab {
    /// Banking in degrees this shape is built for.
    pub rotation: f32,
    pub legs: Vec<LegPrefab>,
    /// Mesh vertices in support space.
    pub vertices: Vec<Float3>,
    pub support_radius: f32,
}

impl SupportPrefab {
    pub fn new(rotation: f32, legs: Vec<LegPrefab>, vertices: Vec<Float3>) -> Self {
        Self {
            rotation,
            legs,
            vertices,
            support_radius: SUPPORT_RADIUS,
        }
    }

    /// One straight leg hanging from the origin, with a vertex ring at its foot.
    pub fn single_leg(rotation: f32) -> Self {
        let ring = (0..4)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::FRAC_PI_2;
                Float3::new(0.1 * angle.cos(), -0.2, 0.1 * angle.sin())
            })
            .collect();
        Self::new(rotation, vec![LegPrefab::new(Float3::ZERO, Float3::UP)], ring)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Leg {
    pub position: Float3,
    pub up: Float3,
}

impl Leg {
    pub fn down(&self) -> Float3 {
        -self.up
    }
}

/// A placed support in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Support {
    pub prefab: usize,
    pub position: Float3,
    pub rotation: Quaternion,
    pub legs: Vec<Leg>,
    pub vertices: Vec<Float3>,
    /// Ground contact points, one per leg that reached the floor.
    pub footers: Vec<Float3>,
    pub support_radius: f32,
}

impl Support {
    pub fn instantiate(
        prefab_index: usize,
        prefab: &SupportPrefab,
        position: Float3,
        rotation: Quaternion,
    ) -> Self {
        let to_world = |local: Float3| rotation.mul_vec(local) + position;
        Self {
            prefab: prefab_index,
            position,
            rotation,
            legs: prefab
                .legs
                .iter()
                .map(|leg| Leg {
                    position: to_world(leg.position),
                    up: rotation.mul_vec(leg.up).normalize(),
                })
                .collect(),
            vertices: prefab.vertices.iter().map(|&v| to_world(v)).collect(),
            footers: Vec::new(),
            support_radius: prefab.support_radius,
        }
    }

    /// True when any leg, cast downward from just below its base, passes
    /// within `support_radius + cart_radius` of a segment of `chain`.
    pub fn intersects(&self, cart_radius: f32, chain: &SplineChain) -> bool {
        let clearance = self.support_radius + cart_radius;
        self.legs.iter().any(|leg| {
            let origin = leg.position - leg.up * clearance - chain.offset();
            let ray = Ray::new(origin, leg.down());
            chain
                .anchors()
                .windows(2)
                .any(|pair| check_collision(&ray, clearance, &pair[0], &pair[1]))
        })
    }

    /// Stretches every vertex near a leg down to the ground plane and records a
    /// footer where the leg meets it.
    pub fn extend_legs(&mut self, min_height: f32) {
        let ground = Plane::ground(min_height);
        for leg in &self.legs {
            let ray = Ray::new(leg.position, leg.down());
            let Some(distance) = ground.raycast(&ray) else {
                continue;
            };
            let shift = ray.direction * distance;
            for vertex in &mut self.vertices {
                if vertex.distance(leg.position) < self.support_radius {
                    *vertex += shift;
                }
            }
            self.footers.push(ray.point_at(distance));
        }
    }
}
