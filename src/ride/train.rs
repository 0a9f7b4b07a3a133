//! Coupled carts sharing one speed.
//!
//! Each step sums every cart's force into the train speed, moves all carts by
//! the same distance and hands carts that ran off a chain end to the chain
//! connected there. Sensor transitions are published on the train's event bus.

use super::cart::{Cart, ChainEnd};
use super::events::{EventBus, RideEvent, Subscription};
use super::zones::{SensorId, Zones};
use crate::error::{TrackError, TrackResult};
use crate::sim::physics::{apply_force, decay_speed, settle_speed};
use crate::sim::{Float3, Pose};
use crate::track::TrackGenerator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Distance along the track between consecutive carts.
    pub cart_spacing: f32,
    /// Height of a cart's origin above the track surface.
    pub ride_height: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            cart_spacing: 1.0,
            ride_height: 1.0,
        }
    }
}

/// Chain placement of a cart after any boundary crossings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Crossing {
    pub chain: usize,
    pub distance: f32,
    pub direction: f32,
}

impl Crossing {
    pub const fn new(chain: usize, distance: f32, direction: f32) -> Self {
        Self {
            chain,
            distance,
            direction,
        }
    }
}

/// Moves one chain across if `crossing.distance` lies outside its chain.
/// `Some(None)` means the distance was already in range, `None` that the
/// exited end has no connected chain.
fn cross_once(generator: &TrackGenerator, crossing: Crossing) -> Option<Option<Crossing>> {
    let chain = generator.chain(crossing.chain).ok()?;
    let length = chain.length();
    let (exit, leftover) = if crossing.distance < 0.0 {
        (ChainEnd::Start, -crossing.distance)
    } else if crossing.distance > length {
        (ChainEnd::End, crossing.distance - length)
    } else {
        return Some(None);
    };

    let exit_distance = match exit {
        ChainEnd::Start => 0.0,
        ChainEnd::End => length,
    };
    let exit_point = chain.point_at(exit_distance, true, false).position;
    let next = generator.connected_end(exit_point, crossing.chain)?;
    let next_length = generator.chain(next.chain).ok()?.length();

    let (entry, distance) = if next.distance == 0.0 {
        (ChainEnd::Start, leftover)
    } else {
        (ChainEnd::End, next_length - leftover)
    };
    // Joining through the same kind of end reverses travel along the chain.
    let direction = if entry == exit {
        -crossing.direction
    } else {
        crossing.direction
    };
    Some(Some(Crossing::new(next.chain, distance, direction)))
}

/// Follows `distance` along `chain` across as many chain ends as it takes to
/// land inside a chain. `None` when an end has no connected chain.
pub fn resolve_crossing(
    generator: &TrackGenerator,
    chain: usize,
    distance: f32,
    direction: f32,
) -> Option<Crossing> {
    let mut crossing = Crossing::new(chain, distance, direction);
    for _ in 0..=generator.chains().len() {
        match cross_once(generator, crossing)? {
            Some(next) => crossing = next,
            None => return Some(crossing),
        }
    }
    Some(crossing)
}

#[derive(Debug)]
pub struct Train {
    config: TrainConfig,
    carts: Vec<Cart>,
    placement: Vec<Cart>,
    speed: f32,
    sensors: Vec<SensorId>,
    running: bool,
    events: EventBus,
}

impl Train {
    /// Places up to `count` carts behind the track point nearest `position`,
    /// `cart_spacing` apart. Carts that would fall off an unconnected end are
    /// left out.
    pub fn place(
        generator: &TrackGenerator,
        position: Float3,
        count: usize,
        config: TrainConfig,
    ) -> TrackResult<Self> {
        let guess = generator
            .nearest_point(position, None, false)
            .ok_or(TrackError::NoTrackNearPosition)?;

        let mut carts = Vec::with_capacity(count);
        for i in 0..count {
            let distance = guess.distance - i as f32 * config.cart_spacing;
            match resolve_crossing(generator, guess.chain, distance, 1.0) {
                Some(crossing) => {
                    let mut cart = Cart::new(crossing.chain, crossing.distance);
                    cart.direction = crossing.direction;
                    carts.push(cart);
                }
                None => log::warn!("no track for cart {i} behind chain {}", guess.chain),
            }
        }

        let mut train = Self {
            config,
            placement: Vec::new(),
            carts,
            speed: 0.0,
            sensors: Vec::new(),
            running: false,
            events: EventBus::new(),
        };
        train.update_poses(generator);
        train.placement = train.carts.clone();
        log::debug!(
            "placed {} carts from chain {} at {:.2}",
            train.carts.len(),
            guess.chain,
            guess.distance
        );
        Ok(train)
    }

    /// Train from explicit carts, posed on `generator`.
    pub fn from_carts(generator: &TrackGenerator, carts: Vec<Cart>, config: TrainConfig) -> Self {
        let mut train = Self {
            config,
            placement: Vec::new(),
            carts,
            speed: 0.0,
            sensors: Vec::new(),
            running: false,
            events: EventBus::new(),
        };
        train.update_poses(generator);
        train.placement = train.carts.clone();
        train
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn carts(&self) -> &[Cart] {
        &self.carts
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Union of every cart's sensors after the last step.
    pub fn sensors_in_range(&self) -> &[SensorId] {
        &self.sensors
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn current_pose(&self, cart: usize) -> TrackResult<Pose> {
        self.carts
            .get(cart)
            .map(Cart::pose)
            .ok_or(TrackError::CartOutOfRange {
                index: cart,
                count: self.carts.len(),
            })
    }

    pub fn start_run(&mut self) {
        self.running = true;
        self.events.publish(RideEvent::RunStart);
    }

    pub fn end_run(&mut self) {
        self.running = false;
        self.events.publish(RideEvent::RunEnd);
    }

    /// Returns every cart to where it was placed and stops the train.
    pub fn reset(&mut self) {
        self.carts = self.placement.clone();
        for cart in &mut self.carts {
            cart.clear_sensors();
        }
        self.speed = 0.0;
        self.sensors.clear();
        self.running = false;
        self.events.publish(RideEvent::Reset);
    }

    fn update_poses(&mut self, generator: &TrackGenerator) {
        let ride_height = self.config.ride_height;
        for cart in &mut self.carts {
            if let Ok(chain) = generator.chain(cart.chain) {
                cart.update_pose(chain, ride_height);
            }
        }
    }

    fn publish_sensor_changes(&mut self, current: Vec<SensorId>) {
        for &id in current.iter().filter(|id| !self.sensors.contains(id)) {
            log::debug!("train entered sensor {}", id.0);
            self.events.publish(RideEvent::SensorEnter(id));
        }
        let exited: Vec<SensorId> = self
            .sensors
            .iter()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();
        for id in exited {
            log::debug!("train exited sensor {}", id.0);
            self.events.publish(RideEvent::SensorExit(id));
        }
        self.sensors = current;
    }

    /// Advances the train by `dt` seconds.
    pub fn step(&mut self, generator: &TrackGenerator, zones: &Zones, dt: f32) {
        let mut speed = self.speed;
        let mut current: Vec<SensorId> = Vec::new();
        for cart in &mut self.carts {
            speed = decay_speed(speed, dt);
            speed = apply_force(speed, cart.compute_force(zones, speed, dt));
            for &id in cart.sensors_in_range() {
                if !current.contains(&id) {
                    current.push(id);
                }
            }
        }
        self.publish_sensor_changes(current);

        self.speed = settle_speed(speed);
        let delta = self.speed * dt;

        let mut dropped = Vec::new();
        for (i, cart) in self.carts.iter_mut().enumerate() {
            let distance = cart.advanced(delta);
            match resolve_crossing(generator, cart.chain, distance, cart.direction) {
                Some(crossing) => {
                    cart.chain = crossing.chain;
                    cart.distance = crossing.distance;
                    cart.direction = crossing.direction;
                }
                None => {
                    log::warn!(
                        "cart {i} ran off chain {} with no connected chain, removed",
                        cart.chain
                    );
                    dropped.push(i);
                }
            }
        }
        for &i in dropped.iter().rev() {
            self.carts.remove(i);
            self.events.publish(RideEvent::CartDropped { cart: i });
        }

        self.update_poses(generator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::{Actuator, Sensor};
    use crate::spline::{Anchor, SplineChain};
    use crate::track::GeneratorConfig;
    use approx::assert_relative_eq;

    fn line(from: Float3, to: Float3) -> SplineChain {
        let handle = (to - from) * (1.0 / 3.0);
        SplineChain::new(vec![Anchor::new(from, handle, 0.0), Anchor::new(to, handle, 0.0)])
    }

    fn track(reversed_second: bool) -> TrackGenerator {
        let mut generator = TrackGenerator::new(GeneratorConfig::default());
        generator.add_chain(line(Float3::new(0.0, 2.0, 0.0), Float3::new(5.0, 2.0, 0.0)));
        let (a, b) = (Float3::new(5.1, 2.0, 0.0), Float3::new(10.0, 2.0, 0.0));
        if reversed_second {
            generator.add_chain(line(b, a));
        } else {
            generator.add_chain(line(a, b));
        }
        generator
    }

    #[test]
    fn in_range_distance_is_untouched() {
        let generator = track(false);
        assert_eq!(
            resolve_crossing(&generator, 0, 2.0, 1.0),
            Some(Crossing::new(0, 2.0, 1.0))
        );
        let length = generator.chains()[0].length();
        assert_eq!(
            resolve_crossing(&generator, 0, length, 1.0),
            Some(Crossing::new(0, length, 1.0))
        );
    }

    #[test]
    fn crossing_into_chain_start() {
        let generator = track(false);
        let length = generator.chains()[0].length();
        let crossing = resolve_crossing(&generator, 0, length + 0.5, 1.0).expect("crossing");
        assert_eq!(crossing.chain, 1);
        assert_relative_eq!(crossing.distance, 0.5, epsilon = 1e-4);
        assert_eq!(crossing.direction, 1.0);
    }

    #[test]
    fn crossing_into_chain_end_reverses() {
        let generator = track(true);
        let length = generator.chains()[0].length();
        let next_length = generator.chains()[1].length();
        let crossing = resolve_crossing(&generator, 0, length + 0.5, 1.0).expect("crossing");
        assert_eq!(crossing.chain, 1);
        assert_relative_eq!(crossing.distance, next_length - 0.5, epsilon = 1e-4);
        assert_eq!(crossing.direction, -1.0);
    }

    #[test]
    fn backing_off_a_start_joins_previous_end() {
        let generator = track(false);
        let length = generator.chains()[0].length();
        let crossing = resolve_crossing(&generator, 1, -0.5, 1.0).expect("crossing");
        assert_eq!(crossing.chain, 0);
        assert_relative_eq!(crossing.distance, length - 0.5, epsilon = 1e-4);
        assert_eq!(crossing.direction, 1.0);
    }

    #[test]
    fn open_end_has_no_crossing() {
        let generator = track(false);
        assert_eq!(resolve_crossing(&generator, 0, -0.5, 1.0), None);
    }

    #[test]
    fn place_spaces_carts_backward() {
        let generator = track(false);
        let train = Train::place(&generator, Float3::new(7.0, 3.0, 0.0), 3, TrainConfig::default())
            .expect("train");
        assert_eq!(train.carts().len(), 3);
        assert_eq!(train.carts()[0].chain, 1);
        assert_eq!(train.carts()[1].chain, 1);
        assert_eq!(train.carts()[2].chain, 0);
        let pose = train.current_pose(0).expect("pose");
        assert_relative_eq!(pose.position.y, 3.0, epsilon = 1e-3);
        assert_eq!(
            train.current_pose(3).err(),
            Some(TrackError::CartOutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn place_drops_carts_past_open_end() {
        let generator = track(false);
        let train = Train::place(&generator, Float3::new(0.5, 2.0, 0.0), 3, TrainConfig::default())
            .expect("train");
        assert_eq!(train.carts().len(), 1);
    }

    #[test]
    fn resting_train_stays_put() {
        let generator = track(false);
        let mut train = Train::from_carts(&generator, vec![Cart::new(0, 0.0)], TrainConfig::default());
        train.step(&generator, &Zones::new(), 0.02);
        assert_eq!(train.speed(), 0.0);
        assert_eq!(train.carts()[0].distance, 0.0);
    }

    #[test]
    fn moving_train_crosses_chains() {
        let generator = track(false);
        let length = generator.chains()[0].length();
        let mut train =
            Train::from_carts(&generator, vec![Cart::new(0, length - 0.1)], TrainConfig::default());
        train.set_speed(0.6);
        train.step(&generator, &Zones::new(), 1.0);
        assert_eq!(train.carts()[0].chain, 1);
        assert_relative_eq!(train.carts()[0].distance, 0.5, epsilon = 1e-2);
    }

    #[test]
    fn dropped_cart_is_reported() {
        let generator = track(false);
        let mut train = Train::from_carts(&generator, vec![Cart::new(0, 0.2)], TrainConfig::default());
        let sub = train.subscribe();
        train.set_speed(-1.0);
        train.step(&generator, &Zones::new(), 1.0);
        assert!(train.carts().is_empty());
        assert_eq!(sub.receiver.try_recv(), Ok(RideEvent::CartDropped { cart: 0 }));
    }

    #[test]
    fn actuator_launches_train() {
        let generator = track(false);
        let mut train = Train::from_carts(&generator, vec![Cart::new(0, 1.0)], TrainConfig::default());
        let mut zones = Zones::new();
        zones.add_actuator(Actuator::new(train.current_pose(0).expect("pose").position));
        train.step(&generator, &zones, 1.0);
        assert_relative_eq!(train.speed(), 0.1, epsilon = 1e-4);
        assert_relative_eq!(train.carts()[0].distance, 1.1, epsilon = 1e-4);
    }

    #[test]
    fn sensor_events_fire_once_per_transition() {
        let generator = track(false);
        let mut train = Train::from_carts(&generator, vec![Cart::new(0, 1.0)], TrainConfig::default());
        let mut zones = Zones::new();
        let sensor = zones.add_sensor(Sensor::new(train.current_pose(0).expect("pose").position));
        let sub = train.subscribe();

        train.step(&generator, &zones, 0.1);
        train.step(&generator, &zones, 0.1);
        assert_eq!(train.sensors_in_range(), &[sensor]);
        assert_eq!(sub.receiver.try_recv(), Ok(RideEvent::SensorEnter(sensor)));
        assert!(sub.receiver.try_recv().is_err());

        train.set_speed(10.0);
        train.step(&generator, &zones, 0.1);
        train.step(&generator, &zones, 0.1);
        assert!(train.sensors_in_range().is_empty());
        assert_eq!(sub.receiver.try_recv(), Ok(RideEvent::SensorExit(sensor)));
        assert!(sub.receiver.try_recv().is_err());
    }

    #[test]
    fn reset_restores_placement() {
        let generator = track(false);
        let mut train = Train::from_carts(&generator, vec![Cart::new(0, 1.0)], TrainConfig::default());
        let sub = train.subscribe();
        train.start_run();
        assert!(train.is_running());
        train.set_speed(2.0);
        train.step(&generator, &Zones::new(), 0.5);
        assert!(train.carts()[0].distance > 1.5);

        train.reset();
        assert!(!train.is_running());
        assert_eq!(train.speed(), 0.0);
        assert_eq!(train.carts()[0].distance, 1.0);
        assert_eq!(sub.receiver.try_recv(), Ok(RideEvent::RunStart));
        assert_eq!(sub.receiver.try_recv(), Ok(RideEvent::Reset));
    }
}
