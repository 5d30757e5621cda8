//! # LogWriter: renders lifecycle events through `tracing`
//!
//! Hook progress is logged at `debug`, failures at `warn`, run milestones at `info`.
//! Install a `tracing` subscriber (for example via [`LoggingModule`](crate::LoggingModule))
//! to see the output.
//!
//! ## Example output
//! ```text
//! DEBUG modvisor: entering hook module="db" phase=start
//! DEBUG modvisor: hook completed module="db" phase=start elapsed=1.2ms
//!  WARN modvisor: hook failed module="cache" phase=start error="port in use"
//!  INFO modvisor: modules ready elapsed=4.1ms
//!  INFO modvisor: shutdown requested reason="signal"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let module = e.module.as_deref().unwrap_or("-");
        let phase = e.phase.map(|p| p.verb()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::HookStarting => {
                tracing::debug!(target: "modvisor", module, phase, "entering hook");
            }
            EventKind::HookCompleted => {
                tracing::debug!(target: "modvisor", module, phase, elapsed = ?e.elapsed, "hook completed");
            }
            EventKind::HookFailed => {
                tracing::warn!(target: "modvisor", module, phase, error = reason, elapsed = ?e.elapsed, "hook failed");
            }
            EventKind::StartupBegan => {
                tracing::debug!(target: "modvisor", "module initialization starting");
            }
            EventKind::Ready => {
                tracing::info!(target: "modvisor", elapsed = ?e.elapsed, "modules ready");
            }
            EventKind::TeardownBegan => {
                tracing::debug!(target: "modvisor", "module teardown starting");
            }
            EventKind::TeardownCompleted => {
                tracing::info!(target: "modvisor", elapsed = ?e.elapsed, "module teardown completed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "modvisor", reason, "shutdown requested");
            }
            EventKind::ReloadIgnored => {
                tracing::info!(target: "modvisor", "reload signal received; reloading is not supported");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "modvisor", subscriber = module, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "modvisor", subscriber = module, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
