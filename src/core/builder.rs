//! Builder for a [`Controller`] with subscribers attached.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::controller::Controller;
use super::registry::Registry;

/// Builder for constructing a [`Controller`].
pub struct ControllerBuilder {
    registry: Registry,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus_capacity: usize,
}

impl ControllerBuilder {
    /// Creates a builder with a fresh registry, no subscribers and the default bus capacity (1024).
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            subscribers: Vec::new(),
            bus_capacity: crate::events::DEFAULT_CAPACITY,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Runs an existing registry instead of a fresh one.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Event bus ring buffer size (min 1).
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the controller.
    ///
    /// With subscribers, spawns the fan-out listener, so this must run inside a
    /// Tokio runtime. The listener stops when the controller is dropped.
    pub fn build(self) -> Controller {
        let bus = Bus::new(self.bus_capacity);
        if self.subscribers.is_empty() {
            return Controller::from_parts(self.registry, bus, None);
        }

        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let stop = CancellationToken::new();
        spawn_listener(&bus, set, stop.clone());
        Controller::from_parts(self.registry, bus, Some(stop.drop_guard()))
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then drains the workers.
fn spawn_listener(bus: &Bus, set: SubscriberSet, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        set.shutdown().await;
    });
}
