//! # modvisor
//!
//! **Modvisor** is a process-lifecycle supervisor for Rust services.
//!
//! A service is split into named *modules*. The [`Controller`] drives every module
//! through a fixed startup sequence, waits until the run is cancelled, then stops
//! the modules that actually started, newest first. Every failure on the way is
//! collected into one [`MultiError`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Module A   │   │   Module B   │   │   Module C   │
//!     │  (order 1)   │   │  (order 2)   │   │  (order 3)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (name → module, insertion order)                        │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller (phase state machine)                                 │
//! │  Initialize → Install → PreStart → Start → PostStart → wait → Stop│
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        │ publish(Event)                               │ Result<(), MultiError>
//!        ▼                                              ▼
//! ┌──────────────────────────┐            ┌──────────────────────────────┐
//! │ Bus ─► SubscriberSet     │            │ Supervisor                   │
//! │   ├─► LogWriter          │            │  - ExitHandle::exit(err)     │
//! │   └─► custom subscribers │            │  - SIGINT/SIGTERM/SIGQUIT    │
//! └──────────────────────────┘            │  - caller cancellation       │
//!                                         └──────────────────────────────┘
//! ```
//!
//! ### Run lifecycle
//! ```text
//! Application::run()
//!   └─► Supervisor::run(ctx + AppInfo)
//!         ├─► spawn Controller::run(shared ctx)
//!         │     ├─ Initialize (may replace ctx; failure returns at once)
//!         │     ├─ Install / PreStart / Start / PostStart (failure → teardown)
//!         │     ├─ wait for shared ctx cancellation
//!         │     └─ Stop started modules in reverse order
//!         └─► first of: exit / signal / cancellation / controller done
//!               └─► cancel shared ctx, join, merge errors
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Modules**       | Mandatory start/stop plus optional lifecycle capabilities.   | [`Module`], [`Initializer`], [`ModuleFn`]   |
//! | **Controller**    | Ordered startup, reverse teardown, error aggregation.        | [`Controller`], [`Registry`]                |
//! | **Supervision**   | Background run, explicit exit and OS signals.                | [`Supervisor`], [`ExitHandle`]              |
//! | **Errors**        | Flattening aggregate and typed failures.                     | [`MultiError`], [`PhaseError`]              |
//! | **Subscriber API**| Observe lifecycle events.                                    | [`Subscribe`], [`Event`]                    |
//! | **Configuration** | Apply `.json`/`.toml` files to configurable modules.         | [`Configuration`], [`ConfigCell`]           |
//!
//! ## Optional features
//! - `logging` (default): the [`LogWriter`] subscriber and the [`LoggingModule`].
//!
//! ## Example
//! ```rust
//! use modvisor::{BoxError, Context, Controller, ModuleFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = Controller::new();
//!     controller.add(
//!         "db",
//!         ModuleFn::new(
//!             |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!             |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!         ),
//!     );
//!
//!     let ctx = Context::new();
//!     ctx.cancel();
//!     controller.run(Some(ctx)).await?;
//!     Ok(())
//! }
//! ```
mod application;
mod context;
mod core;
mod error;
mod events;
#[cfg(feature = "logging")]
mod logging;
mod modules;
mod settings;
mod subscribers;

// ---- Public re-exports ----

pub use application::{AppInfo, Application};
pub use context::Context;
pub use core::{
    Controller, ControllerBuilder, ExitHandle, ModuleEntry, Phase, Registry, Supervisor,
    SupervisorConfig,
};
pub use error::{BoxError, ConfigError, ContextError, MultiError, PhaseError, SupervisorError};
pub use events::{Bus, Event, EventKind};
pub use modules::{
    Initializer, Installer, Module, ModuleFn, ModuleHandle, PostStarter, PreStarter,
};
pub use settings::{
    ConfigCell, ConfigTarget, Configurable, ConfigurableNotify, Configuration, Format,
};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use logging::{LoggingConfig, LoggingModule};
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
