//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings of the outer [`Supervisor`](crate::Supervisor).
//! Per-module configuration is applied by [`Configuration`](crate::Configuration).

/// Settings for the process supervisor.
///
/// ## Field semantics
/// - `handle_signals`: listen for SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows) and SIGHUP
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Whether the supervisor installs OS signal listeners.
    ///
    /// Disable when the host process owns signal handling, or in tests.
    pub handle_signals: bool,
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            handle_signals: true,
        }
    }
}
