//! Cart and train dynamics over a generated track.

mod cart;
mod events;
mod train;
mod zones;

pub use cart::{Cart, ChainEnd};
pub use events::{EventBus, RideEvent, Subscription};
pub use train::{resolve_crossing, Crossing, Train, TrainConfig};
pub use zones::{
    Actuator, ActuatorGroup, ActuatorId, PushDirection, Sensor, SensorId, Zones,
    DEFAULT_ACTUATOR_RADIUS, DEFAULT_SENSOR_RADIUS,
};
