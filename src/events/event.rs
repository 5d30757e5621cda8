//! # Lifecycle events emitted by the controller and the supervisor.
//!
//! The [`EventKind`] enum classifies events in three groups:
//! - **Hook events**: one module's hook is entered, completes, or fails
//! - **Run events**: startup began, ready, teardown began/completed, shutdown/reload requests
//! - **Subscriber events**: a subscriber panicked or dropped an event
//!
//! The [`Event`] struct carries the optional metadata (module name, phase, reason, elapsed time).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use modvisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::HookFailed)
//!     .with_module("db")
//!     .with_phase(Phase::Start)
//!     .with_reason("connection refused")
//!     .with_elapsed(Duration::from_millis(12));
//!
//! assert_eq!(ev.kind, EventKind::HookFailed);
//! assert_eq!(ev.module.as_deref(), Some("db"));
//! assert_eq!(ev.phase, Some(Phase::Start));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Hook events ===
    /// A module hook is about to run.
    ///
    /// Sets: `module`, `phase`
    HookStarting,

    /// A module hook returned successfully.
    ///
    /// Sets: `module`, `phase`, `elapsed`
    HookCompleted,

    /// A module hook returned an error.
    ///
    /// Sets: `module`, `phase`, `reason` (error text), `elapsed`
    HookFailed,

    // === Run events ===
    /// The controller began a run (or an install pass).
    StartupBegan,

    /// Every startup phase succeeded; the controller now waits for cancellation.
    ///
    /// Sets: `elapsed` (total startup time)
    Ready,

    /// The controller began stopping started modules.
    TeardownBegan,

    /// Teardown finished.
    ///
    /// Sets: `elapsed`
    TeardownCompleted,

    /// The supervisor is cancelling the run.
    ///
    /// Sets: `reason` (`signal`, `exit`, `exit_error`, `cancelled`, `controller_finished`)
    ShutdownRequested,

    /// A reload signal arrived; reloading is not supported and nothing else happens.
    ReloadIgnored,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `module` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `module` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Module (or subscriber) name, if applicable.
    pub module: Option<Arc<str>>,
    /// Lifecycle phase, for hook events.
    pub phase: Option<Phase>,
    /// Human-readable reason (error text, shutdown cause, overflow details).
    pub reason: Option<Arc<str>>,
    /// Time spent in a hook or a run stage.
    pub elapsed: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            module: None,
            phase: None,
            reason: None,
            elapsed: None,
        }
    }

    /// Attaches a module name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Attaches a lifecycle phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an elapsed duration.
    #[inline]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_module(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_module(subscriber)
            .with_reason(info)
    }

    /// True for events about a single module hook.
    #[inline]
    pub fn is_hook(&self) -> bool {
        matches!(
            self.kind,
            EventKind::HookStarting | EventKind::HookCompleted | EventKind::HookFailed
        )
    }
}
