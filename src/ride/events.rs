//! Ride notifications delivered over channels.
//!
//! Consumers subscribe and drain their receiver at their own pace; the ride
//! never holds a reference to a consumer.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::zones::SensorId;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RideEvent {
    SensorEnter(SensorId),
    SensorExit(SensorId),
    RunStart,
    RunEnd,
    Reset,
    /// A cart left its chain with no connected chain to continue on.
    CartDropped { cart: usize },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    pub receiver: Receiver<RideEvent>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<(u64, Sender<RideEvent>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = unbounded();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, tx));
        Subscription { id, receiver: rx }
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Sends `event` to every subscriber. Subscribers whose receiver was
    /// dropped are removed.
    pub fn publish(&mut self, event: RideEvent) {
        self.subscribers.retain(|(_, tx)| tx.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(RideEvent::RunStart);
        assert_eq!(a.receiver.try_recv(), Ok(RideEvent::RunStart));
        assert_eq!(b.receiver.try_recv(), Ok(RideEvent::RunStart));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        assert!(bus.unsubscribe(a.id));
        assert!(!bus.unsubscribe(a.id));
        bus.publish(RideEvent::Reset);
        assert!(a.receiver.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let kept = bus.subscribe();
        drop(a);
        bus.publish(RideEvent::SensorEnter(SensorId(2)));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            kept.receiver.try_recv(),
            Ok(RideEvent::SensorEnter(SensorId(2)))
        );
    }
}
