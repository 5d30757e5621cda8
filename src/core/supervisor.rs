//! # Supervisor: runs the controller in the background and decides when it ends.
//!
//! The [`Supervisor`] is the controller's owner. It derives a cancellable context,
//! spawns [`Controller::run`] on a Tokio task, and waits for the first of:
//!
//! ```text
//! run(ctx)
//!   ├─► spawn Controller::run(shared ctx)
//!   └─► select:
//!         ├─ ExitHandle::exit(err)   → ShutdownRequested("exit" | "exit_error")
//!         ├─ caller ctx cancelled    → ShutdownRequested("cancelled")
//!         ├─ SIGINT/SIGTERM/SIGQUIT  → ShutdownRequested("signal")
//!         │    (SIGHUP → ReloadIgnored, keep waiting)
//!         └─ controller returned     → ShutdownRequested("controller_finished")
//!       shared ctx.cancel() ──► join controller task ──► merge errors
//! ```
//!
//! ## Result
//! Errors are merged in this order: the exit error, a signal registration failure,
//! then the controller's own errors (or [`SupervisorError::ControllerPanicked`]).
//!
//! ## Example
//! ```rust
//! use modvisor::{BoxError, Context, Controller, ModuleFn, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let controller = Controller::new();
//!     controller.add(
//!         "noop",
//!         ModuleFn::new(
//!             |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!             |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!         ),
//!     );
//!
//!     let sup = Supervisor::new(controller, SupervisorConfig { handle_signals: false });
//!     let exit = sup.exit_handle();
//!     tokio::spawn(async move { exit.exit(Some("done".into())) });
//!
//!     let err = sup.run(None).await.unwrap_err();
//!     assert_eq!(err.to_string(), "done");
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::context::Context;
use crate::error::{BoxError, MultiError, SupervisorError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;

use super::config::SupervisorConfig;
use super::controller::Controller;
use super::shutdown;

type ExitMsg = Option<BoxError>;

/// Requests the end of a supervised run from any task.
///
/// Clones share one slot: only the first [`exit`](ExitHandle::exit) is delivered.
#[derive(Clone, Debug)]
pub struct ExitHandle {
    tx: Arc<Mutex<Option<oneshot::Sender<ExitMsg>>>>,
}

impl ExitHandle {
    /// Asks the supervisor to shut down, optionally with an error to report.
    ///
    /// Returns `true` if this call was the one delivered; later calls are ignored.
    pub fn exit(&self, err: Option<BoxError>) -> bool {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        match tx {
            Some(tx) => tx.send(err).is_ok(),
            None => false,
        }
    }

    /// True once `exit` has been called.
    pub fn is_exited(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Owns a [`Controller`] and reconciles its completion with shutdown requests.
pub struct Supervisor {
    controller: Arc<Controller>,
    cfg: SupervisorConfig,
    exit: ExitHandle,
    exit_rx: Mutex<Option<oneshot::Receiver<ExitMsg>>>,
}

impl Supervisor {
    /// Creates a supervisor around `controller`.
    pub fn new(controller: Controller, cfg: SupervisorConfig) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            controller: Arc::new(controller),
            cfg,
            exit: ExitHandle {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            exit_rx: Mutex::new(Some(rx)),
        }
    }

    /// The supervised controller (for registering modules before `run`).
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Returns a handle that ends the run.
    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    /// Runs the controller until a shutdown request, then waits for its teardown.
    ///
    /// `None` runs until exit, signal, or the controller finishing on its own.
    /// A supervisor runs once; a second call never observes `exit`.
    pub async fn run(&self, ctx: Option<Context>) -> Result<(), MultiError> {
        let shared = ctx.unwrap_or_else(Context::background).child();
        let bus = self.controller.bus().clone();

        let controller = Arc::clone(&self.controller);
        let task_ctx = shared.clone();
        let mut task = tokio::spawn(async move { controller.run(Some(task_ctx)).await });

        let mut exit_rx = self
            .exit_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut exit_err: Option<BoxError> = None;
        let mut signal_err: Option<SupervisorError> = None;

        let finished = tokio::select! {
            err = exit_requested(&mut exit_rx) => {
                let reason = if err.is_some() { "exit_error" } else { "exit" };
                request_shutdown(&bus, reason);
                exit_err = err;
                None
            }
            _ = shared.cancelled() => {
                request_shutdown(&bus, "cancelled");
                None
            }
            res = wait_for_signal(self.cfg.handle_signals, bus.clone()) => {
                if let Err(err) = res {
                    signal_err = Some(SupervisorError::Signals(err));
                }
                request_shutdown(&bus, "signal");
                None
            }
            joined = &mut task => {
                request_shutdown(&bus, "controller_finished");
                Some(joined)
            }
        };

        shared.cancel();
        let joined = match finished {
            Some(joined) => joined,
            None => (&mut task).await,
        };

        // An exit racing with the controller's own completion is still reported.
        if exit_err.is_none() {
            if let Some(Ok(err)) = exit_rx.as_mut().map(|rx| rx.try_recv()) {
                exit_err = err;
            }
        }

        let mut errors = MultiError::new();
        errors.append_opt(exit_err);
        errors.append_opt(signal_err);
        match joined {
            Ok(res) => {
                errors.record(res);
            }
            Err(err) => {
                errors.append(controller_panicked(err));
            }
        }
        errors.into_result()
    }
}

/// Completes with the delivered exit error; pends forever if no exit can arrive.
async fn exit_requested(rx: &mut Option<oneshot::Receiver<ExitMsg>>) -> ExitMsg {
    if let Some(inner) = rx.as_mut() {
        let msg = inner.await;
        *rx = None;
        if let Ok(err) = msg {
            return err;
        }
    }
    std::future::pending().await
}

/// Completes on a termination signal; pends forever when signals are not handled.
async fn wait_for_signal(enabled: bool, bus: Bus) -> std::io::Result<()> {
    if !enabled {
        return std::future::pending().await;
    }
    shutdown::wait_for_signal(|| bus.publish(Event::new(EventKind::ReloadIgnored))).await
}

fn request_shutdown(bus: &Bus, reason: &'static str) {
    bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
}

fn controller_panicked(err: JoinError) -> SupervisorError {
    let reason = match err.try_into_panic() {
        Ok(payload) => panic_message(&*payload),
        Err(err) => err.to_string(),
    };
    SupervisorError::ControllerPanicked { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Module, ModuleFn, PhaseError};
    use async_trait::async_trait;
    use std::time::Duration;

    fn quiet() -> SupervisorConfig {
        SupervisorConfig {
            handle_signals: false,
        }
    }

    fn ok_module() -> impl Module {
        ModuleFn::new(
            |_ctx: Context| async { Ok::<_, BoxError>(()) },
            |_ctx: Context| async { Ok::<_, BoxError>(()) },
        )
    }

    struct StopFails;

    #[async_trait]
    impl Module for StopFails {
        async fn start(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
            Err("stop boom".into())
        }
    }

    struct Panics;

    #[async_trait]
    impl Module for Panics {
        async fn start(&self, _ctx: &Context) -> Result<(), BoxError> {
            panic!("start exploded");
        }

        async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn exit_error_comes_first_then_teardown_errors() {
        let controller = Controller::new();
        controller.add("a", StopFails);
        let sup = Supervisor::new(controller, quiet());
        let exit = sup.exit_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            exit.exit(Some("fatal".into()));
        });

        let err = sup.run(None).await.unwrap_err();
        let msgs: Vec<String> = err.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            msgs,
            vec![
                "fatal".to_string(),
                "failed to stop module \"a\": stop boom".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn exit_without_error_is_clean_and_delivered_once() {
        let controller = Controller::new();
        controller.add("a", ok_module());
        let sup = Supervisor::new(controller, quiet());
        let exit = sup.exit_handle();

        assert!(exit.exit(None));
        assert!(!exit.exit(Some("late".into())));
        assert!(exit.is_exited());

        assert!(sup.run(None).await.is_ok());
    }

    #[tokio::test]
    async fn cancelling_the_caller_context_is_clean() {
        let controller = Controller::new();
        controller.add("a", ok_module());
        let sup = Supervisor::new(controller, quiet());

        let ctx = Context::new();
        let cancel = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        assert!(sup.run(Some(ctx)).await.is_ok());
    }

    #[tokio::test]
    async fn controller_failure_ends_the_run() {
        let controller = Controller::new();
        controller.add("ok", ok_module());
        controller.add(
            "bad",
            ModuleFn::new(
                |_ctx: Context| async { Err::<(), BoxError>("port in use".into()) },
                |_ctx: Context| async { Ok::<_, BoxError>(()) },
            ),
        );
        let sup = Supervisor::new(controller, quiet());
        let mut rx = sup.controller().bus().subscribe();

        let err = sup.run(None).await.unwrap_err();
        assert_eq!(err.len(), 1);
        let phase = err.find::<PhaseError>().expect("phase error");
        assert_eq!(phase.module, "bad");

        let mut reasons = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::ShutdownRequested {
                reasons.push(ev.reason.as_deref().unwrap_or_default().to_string());
            }
        }
        assert_eq!(reasons, vec!["controller_finished"]);
    }

    #[tokio::test]
    async fn exit_sent_while_startup_fails_is_merged() {
        let controller = Controller::new();
        let sup_exit: Arc<Mutex<Option<ExitHandle>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&sup_exit);
        controller.add(
            "bad",
            ModuleFn::new(
                move |_ctx: Context| {
                    let slot = Arc::clone(&slot);
                    async move {
                        if let Some(exit) = slot.lock().unwrap().as_ref() {
                            exit.exit(Some("giving up".into()));
                        }
                        Err::<(), BoxError>("port in use".into())
                    }
                },
                |_ctx: Context| async { Ok::<_, BoxError>(()) },
            ),
        );
        let sup = Supervisor::new(controller, quiet());
        *sup_exit.lock().unwrap() = Some(sup.exit_handle());

        let err = sup.run(None).await.unwrap_err();
        let msgs: Vec<String> = err.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            msgs,
            vec![
                "giving up".to_string(),
                "failed to start module \"bad\": port in use".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn panicking_controller_is_reported() {
        let controller = Controller::new();
        controller.add("p", Panics);
        let sup = Supervisor::new(controller, quiet());

        let err = sup.run(None).await.unwrap_err();
        match err.find::<SupervisorError>() {
            Some(SupervisorError::ControllerPanicked { reason }) => {
                assert_eq!(reason, "start exploded");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
