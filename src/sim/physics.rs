/// Gravitational acceleration applied to carts.
pub const G: f32 = 9.81;
pub const EPSILON: f32 = 1.192_093e-7;
/// Proportional speed decay per second.
pub const SPEED_DECAY: f32 = 0.001;
/// Divisor turning a cart's net force into a speed change.
pub const FORCE_SCALE: f32 = 10.0;
/// Speeds below this magnitude snap to zero.
pub const STOP_SPEED: f32 = 0.01;

/// Shortest signed difference `target - current` between two angles in degrees,
/// in the range [-180, 180].
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Proportional rolling loss over `dt`, applied before each cart's force is
/// evaluated.
pub fn decay_speed(speed: f32, dt: f32) -> f32 {
    speed - speed * SPEED_DECAY * dt
}

/// Adds one cart's force contribution to the shared train speed.
pub fn apply_force(speed: f32, force: f32) -> f32 {
    speed + force / FORCE_SCALE
}

/// Snaps residual creep to a standstill.
pub fn settle_speed(speed: f32) -> f32 {
    if speed.abs() < STOP_SPEED {
        0.0
    } else {
        speed
    }
}
