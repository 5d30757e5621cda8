//! # Cross-platform OS signal handling.
//!
//! [`wait_for_signal`] completes when the process receives a termination signal.
//! A reload signal is reserved: it is reported through `on_reload` and waiting continues.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//! - `SIGHUP` reload, reserved and not implemented
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_signal(mut on_reload: impl FnMut()) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sighup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = sigint.recv() => return Ok(()),
            _ = sigterm.recv() => return Ok(()),
            _ = sigquit.recv() => return Ok(()),
            _ = sighup.recv() => on_reload(),
        }
    }
}

/// Waits for a termination signal.
///
/// Each call creates an independent listener.
/// Returns `Err` if signal registration fails.
#[cfg(not(unix))]
pub(crate) async fn wait_for_signal(_on_reload: impl FnMut()) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
