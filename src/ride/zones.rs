//! Force emitters and trigger zones placed along the track.

use crate::sim::Float3;

pub const DEFAULT_ACTUATOR_RADIUS: f32 = 1.0;
pub const DEFAULT_SENSOR_RADIUS: f32 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub usize);

/// Radius-bounded source of push force and braking.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Actuator {
    pub position: Float3,
    /// Push along the cart's forward axis. Negative values push backward.
    pub force: f32,
    /// Speed magnitude above which the push cuts out.
    pub max_speed: f32,
    /// Braking coefficient applied against the current speed.
    pub brake_force: f32,
    pub radius: f32,
}

impl Actuator {
    pub const fn new(position: Float3) -> Self {
        Self {
            position,
            force: 1.0,
            max_speed: 10.0,
            brake_force: 0.0,
            radius: DEFAULT_ACTUATOR_RADIUS,
        }
    }

    /// Push for a cart moving at `speed`, zero once `|speed|` exceeds the limit.
    pub fn force_if_under_speed_limit(&self, speed: f32) -> f32 {
        let over = if speed > 0.0 {
            speed > self.max_speed
        } else {
            speed < -self.max_speed
        };
        if over {
            0.0
        } else {
            self.force
        }
    }

    pub fn in_range(&self, point: Float3) -> bool {
        point.distance(self.position) < self.radius
    }

    pub fn set_force(&mut self, force: f32) {
        self.force = force;
    }

    pub fn set_brake(&mut self, brake_force: f32) {
        self.brake_force = brake_force;
    }

    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.max_speed = max_speed;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sensor {
    pub position: Float3,
    pub radius: f32,
}

impl Sensor {
    pub const fn new(position: Float3) -> Self {
        Self {
            position,
            radius: DEFAULT_SENSOR_RADIUS,
        }
    }

    pub fn in_range(&self, point: Float3) -> bool {
        point.distance(self.position) < self.radius
    }
}

/// Every actuator and sensor in the scene, addressed by id.
#[derive(Debug, Clone, Default)]
pub struct Zones {
    actuators: Vec<Actuator>,
    sensors: Vec<Sensor>,
}

impl Zones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_actuator(&mut self, actuator: Actuator) -> ActuatorId {
        self.actuators.push(actuator);
        ActuatorId(self.actuators.len() - 1)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> SensorId {
        self.sensors.push(sensor);
        SensorId(self.sensors.len() - 1)
    }

    pub fn actuator(&self, id: ActuatorId) -> Option<&Actuator> {
        self.actuators.get(id.0)
    }

    pub fn actuator_mut(&mut self, id: ActuatorId) -> Option<&mut Actuator> {
        self.actuators.get_mut(id.0)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.get(id.0)
    }

    pub fn actuators(&self) -> impl Iterator<Item = (ActuatorId, &Actuator)> {
        self.actuators
            .iter()
            .enumerate()
            .map(|(i, a)| (ActuatorId(i), a))
    }

    pub fn sensors(&self) -> impl Iterator<Item = (SensorId, &Sensor)> {
        self.sensors.iter().enumerate().map(|(i, s)| (SensorId(i), s))
    }

    /// Sensors whose zone contains `point`, in id order.
    pub fn sensors_at(&self, point: Float3) -> Vec<SensorId> {
        self.sensors()
            .filter(|(_, sensor)| sensor.in_range(point))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Which way an actuator group pushes relative to the cart's forward axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PushDirection {
    #[default]
    Forward,
    Reverse,
}

impl PushDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// A set of actuators switched together, e.g. a launch or a station brake.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorGroup {
    pub actuators: Vec<ActuatorId>,
    pub force: f32,
    pub max_speed: f32,
    pub brake_force: f32,
    pub direction: PushDirection,
}

impl ActuatorGroup {
    pub fn new(actuators: Vec<ActuatorId>) -> Self {
        Self {
            actuators,
            force: 50.0,
            max_speed: 2.0,
            brake_force: 0.0,
            direction: PushDirection::Forward,
        }
    }

    fn for_each(&self, zones: &mut Zones, mut f: impl FnMut(&mut Actuator)) {
        for &id in &self.actuators {
            if let Some(actuator) = zones.actuator_mut(id) {
                f(actuator);
            }
        }
    }

    /// Pushes the group settings into its actuators. Inactive groups keep the
    /// speed limit but exert neither force nor brake.
    pub fn apply(&self, zones: &mut Zones, active: bool) {
        let force = self.direction.sign() * self.force.abs();
        self.for_each(zones, |actuator| {
            actuator.set_max_speed(self.max_speed);
            if active {
                actuator.set_force(force);
                actuator.set_brake(self.brake_force);
            } else {
                actuator.set_force(0.0);
                actuator.set_brake(0.0);
            }
        });
    }

    pub fn switch_off(&self, zones: &mut Zones) {
        self.apply(zones, false);
    }

    /// Removes any push and brakes with `brake_force`.
    pub fn set_brake_only(&self, zones: &mut Zones, brake_force: f32) {
        self.for_each(zones, |actuator| {
            actuator.set_force(0.0);
            actuator.set_brake(brake_force);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_strict() {
        let actuator = Actuator::new(Float3::ZERO);
        assert_eq!(actuator.force_if_under_speed_limit(10.0), 1.0);
        assert_eq!(actuator.force_if_under_speed_limit(10.001), 0.0);
        assert_eq!(actuator.force_if_under_speed_limit(-10.0), 1.0);
        assert_eq!(actuator.force_if_under_speed_limit(-10.001), 0.0);
        assert_eq!(actuator.force_if_under_speed_limit(0.0), 1.0);
    }

    #[test]
    fn ranges_are_exclusive() {
        let sensor = Sensor::new(Float3::ZERO);
        assert!(sensor.in_range(Float3::new(0.49, 0.0, 0.0)));
        assert!(!sensor.in_range(Float3::new(0.5, 0.0, 0.0)));

        let actuator = Actuator::new(Float3::ZERO);
        assert!(actuator.in_range(Float3::new(0.0, 0.99, 0.0)));
        assert!(!actuator.in_range(Float3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn sensors_at_in_id_order() {
        let mut zones = Zones::new();
        let a = zones.add_sensor(Sensor::new(Float3::ZERO));
        zones.add_sensor(Sensor::new(Float3::new(5.0, 0.0, 0.0)));
        let c = zones.add_sensor(Sensor::new(Float3::new(0.2, 0.0, 0.0)));
        assert_eq!(zones.sensors_at(Float3::new(0.1, 0.0, 0.0)), vec![a, c]);
    }

    #[test]
    fn group_apply_and_switch_off() {
        let mut zones = Zones::new();
        let ids = vec![
            zones.add_actuator(Actuator::new(Float3::ZERO)),
            zones.add_actuator(Actuator::new(Float3::RIGHT)),
        ];
        let mut group = ActuatorGroup::new(ids.clone());
        group.direction = PushDirection::Reverse;
        group.brake_force = 0.5;

        group.apply(&mut zones, true);
        for &id in &ids {
            let actuator = zones.actuator(id).expect("actuator");
            assert_eq!(actuator.force, -50.0);
            assert_eq!(actuator.max_speed, 2.0);
            assert_eq!(actuator.brake_force, 0.5);
        }

        group.switch_off(&mut zones);
        let actuator = zones.actuator(ids[0]).expect("actuator");
        assert_eq!(actuator.force, 0.0);
        assert_eq!(actuator.brake_force, 0.0);
        assert_eq!(actuator.max_speed, 2.0);

        group.set_brake_only(&mut zones, 3.0);
        let actuator = zones.actuator(ids[1]).expect("actuator");
        assert_eq!(actuator.force, 0.0);
        assert_eq!(actuator.brake_force, 3.0);
    }
}
