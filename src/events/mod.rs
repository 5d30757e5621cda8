//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the controller and the supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller` (hook and run events), `Supervisor` (shutdown/reload),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `ControllerBuilder::build` (fans out to
//!   `SubscriberSet`), plus any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub(crate) use bus::DEFAULT_CAPACITY;
pub use bus::Bus;
pub use event::{Event, EventKind};
