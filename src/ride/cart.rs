use super::zones::{SensorId, Zones};
use crate::sim::{Float3, Pose, G};
use crate::spline::SplineChain;

/// Which end of a chain a cart left or joined through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChainEnd {
    Start,
    End,
}

/// One riding body.
///
/// `direction` is +1 when positive train speed moves the cart toward the end
/// of its chain and -1 when it moves toward the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub chain: usize,
    pub distance: f32,
    pub direction: f32,
    pose: Pose,
    sensors: Vec<SensorId>,
}

impl Cart {
    pub fn new(chain: usize, distance: f32) -> Self {
        Self {
            chain,
            distance,
            direction: 1.0,
            pose: Pose::default(),
            sensors: Vec::new(),
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Facing along the direction of travel for positive speed.
    pub fn forward(&self) -> Float3 {
        self.pose.forward()
    }

    /// Sensors containing the cart, in the order they were entered.
    pub fn sensors_in_range(&self) -> &[SensorId] {
        &self.sensors
    }

    /// Re-poses the cart on `chain`, raised by `ride_height`.
    pub fn update_pose(&mut self, chain: &SplineChain, ride_height: f32) {
        let pose = chain.pose_at(self.distance, ride_height, true);
        self.pose = if self.direction < 0.0 {
            Pose::new(pose.position, pose.frame.reversed())
        } else {
            pose
        };
    }

    /// Distance after moving `delta` along the direction of travel.
    pub fn advanced(&self, delta: f32) -> f32 {
        self.distance + delta * self.direction
    }

    fn refresh_sensors(&mut self, zones: &Zones) {
        let position = self.pose.position;
        for (id, sensor) in zones.sensors() {
            let inside = sensor.in_range(position);
            let listed = self.sensors.contains(&id);
            if inside && !listed {
                self.sensors.push(id);
            } else if !inside && listed {
                self.sensors.retain(|s| *s != id);
            }
        }
    }

    pub(crate) fn clear_sensors(&mut self) {
        self.sensors.clear();
    }

    /// Net force along the cart's forward axis for one step of `dt` at `speed`.
    ///
    /// Gravity contributes its projection on the forward axis. Every actuator in
    /// range pushes while under its speed limit and brakes in proportion to the
    /// speed. Also refreshes the cart's in-range sensor list.
    pub fn compute_force(&mut self, zones: &Zones, speed: f32, dt: f32) -> f32 {
        self.refresh_sensors(zones);

        let forward = self.forward();
        let position = self.pose.position;
        let mut force = Float3::DOWN * G * dt;
        for (_, actuator) in zones.actuators() {
            if actuator.in_range(position) {
                force += forward * (actuator.force_if_under_speed_limit(speed) * dt);
                force -= forward * (speed * actuator.brake_force * dt);
            }
        }
        force.dot(forward)
    }
}
