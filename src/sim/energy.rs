//! Smoothed energy readout for a moving body.
//!
//! Speed is estimated from successive positions at a fixed sample rate and
//! passed through an exponential filter before kinetic energy is computed.

use super::math::Float3;
use super::physics::G;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyParams {
    pub mass: f32,
    pub gravity: f32,
    pub sample_hz: f32,
    /// Filter time constant in seconds. Larger values smooth more.
    pub smooth_tau: f32,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            mass: 500.0,
            gravity: G,
            sample_hz: 30.0,
            smooth_tau: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReading {
    pub kinetic: f32,
    pub potential: f32,
    /// Total energy captured at the last baseline reset.
    pub baseline: f32,
}

impl EnergyReading {
    pub fn total(&self) -> f32 {
        self.kinetic + self.potential
    }
}

#[derive(Debug, Clone)]
pub struct EnergyMeter {
    params: EnergyParams,
    previous_position: Float3,
    baseline_height: f32,
    baseline_energy: f32,
    filtered_speed: f32,
    elapsed: f32,
}

impl EnergyMeter {
    pub fn new(params: EnergyParams, position: Float3) -> Self {
        let mut meter = Self {
            params,
            previous_position: position,
            baseline_height: position.y,
            baseline_energy: 0.0,
            filtered_speed: 0.0,
            elapsed: 0.0,
        };
        meter.reset_baseline(position, 0.0);
        meter
    }

    pub fn params(&self) -> &EnergyParams {
        &self.params
    }

    pub fn filtered_speed(&self) -> f32 {
        self.filtered_speed
    }

    /// Makes `position` the zero of potential energy and records the total
    /// energy of a body moving at `speed` there.
    pub fn reset_baseline(&mut self, position: Float3, speed: f32) {
        self.baseline_height = position.y;
        self.previous_position = position;
        self.baseline_energy = 0.5 * self.params.mass * speed * speed;
        self.filtered_speed = 0.0;
        self.elapsed = 0.0;
    }

    /// Advances the meter. Returns a reading once per sample interval.
    pub fn update(&mut self, position: Float3, dt: f32) -> Option<EnergyReading> {
        self.elapsed += dt.max(1e-6);
        let interval = 1.0 / self.params.sample_hz.max(1.0);
        if self.elapsed < interval {
            return None;
        }

        let speed = position.distance(self.previous_position) / self.elapsed;
        let alpha = 1.0 - (-self.elapsed / self.params.smooth_tau.max(0.01)).exp();
        self.filtered_speed += (speed - self.filtered_speed) * alpha;
        self.previous_position = position;
        self.elapsed = 0.0;

        let height = (position.y - self.baseline_height).max(0.0);
        Some(EnergyReading {
            kinetic: 0.5 * self.params.mass * self.filtered_speed * self.filtered_speed,
            potential: self.params.mass * self.params.gravity * height,
            baseline: self.baseline_energy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_reading_before_sample_interval() {
        let mut meter = EnergyMeter::new(EnergyParams::default(), Float3::ZERO);
        assert!(meter.update(Float3::ZERO, 0.01).is_none());
        assert!(meter.update(Float3::ZERO, 0.01).is_none());
        assert!(meter.update(Float3::ZERO, 0.02).is_some());
    }

    #[test]
    fn potential_energy_relative_to_baseline() {
        let params = EnergyParams::default();
        let mut meter = EnergyMeter::new(params, Float3::new(0.0, 2.0, 0.0));
        let reading = meter
            .update(Float3::new(0.0, 3.0, 0.0), 0.1)
            .expect("sample interval elapsed");
        assert_relative_eq!(reading.potential, 500.0 * G, epsilon = 1e-2);
        assert_relative_eq!(reading.baseline, 0.0);
    }

    #[test]
    fn below_baseline_has_no_potential() {
        let mut meter = EnergyMeter::new(EnergyParams::default(), Float3::new(0.0, 2.0, 0.0));
        let reading = meter.update(Float3::ZERO, 0.1).expect("sample");
        assert_eq!(reading.potential, 0.0);
    }

    #[test]
    fn filtered_speed_approaches_true_speed() {
        let mut meter = EnergyMeter::new(EnergyParams::default(), Float3::ZERO);
        let mut x = 0.0;
        for _ in 0..200 {
            x += 0.1;
            meter.update(Float3::new(x, 0.0, 0.0), 0.05);
        }
        assert_relative_eq!(meter.filtered_speed(), 2.0, epsilon = 1e-3);
    }

    #[test]
    fn reset_baseline_records_kinetic_energy() {
        let mut meter = EnergyMeter::new(EnergyParams::default(), Float3::ZERO);
        meter.reset_baseline(Float3::new(0.0, 5.0, 0.0), 2.0);
        let reading = meter
            .update(Float3::new(0.0, 5.0, 0.0), 0.1)
            .expect("sample");
        assert_relative_eq!(reading.baseline, 1000.0);
        assert_eq!(reading.potential, 0.0);
    }
}
