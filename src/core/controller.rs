//! # Controller: drives registered modules through the lifecycle.
//!
//! The [`Controller`] owns a [`Registry`] and an event [`Bus`]. [`Controller::run`]
//! sequences every phase on the caller's task; modules are never called concurrently.
//!
//! ## Run state machine
//! ```text
//! run(ctx)
//!   ├─► Initialize  (fresh snapshot) ── error ──► return error (nothing started)
//!   ├─► Install     (fresh snapshot) ── error ──┐
//!   ├─► PreStart    (fresh snapshot) ── error ──┤
//!   ├─► Start       (fresh snapshot) ── error ──┤   mark started right after each success
//!   ├─► PostStart   (Start snapshot) ── error ──┤
//!   ├─► Wait        until the caller's ctx is cancelled
//!   └─► Shutdown ◄──────────────────────────────┘
//!         reverse registration order, started modules only,
//!         clear `started` before `stop`, every stop error is recorded
//! ```
//!
//! ## Rules
//! - A snapshot is taken at the start of each phase, so modules added by an earlier
//!   hook join the later phases of the same run.
//! - A context returned from `Initialize` replaces the one given to later hooks, but
//!   the wait phase keeps watching the caller's context.
//! - Plain cancellation is a clean exit; an expired deadline is reported.
//! - No hook is timed out; a hook that never returns blocks the run.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Instant;

use crate::context::Context;
use crate::core::phase::Phase;
use crate::core::registry::{ModuleEntry, Registry};
use crate::error::{BoxError, ContextError, MultiError, PhaseError};
use crate::events::{Bus, Event, EventKind};
use crate::modules::{Module, ModuleHandle};

use super::builder::ControllerBuilder;

/// Sequences module lifecycles and aggregates their failures.
pub struct Controller {
    registry: Registry,
    bus: Bus,
    /// Stops the subscriber listener when the controller is dropped.
    _listener: Option<tokio_util::sync::DropGuard>,
}

impl Controller {
    /// Creates a controller with an empty registry and no subscribers.
    pub fn new() -> Self {
        Self::from_parts(Registry::new(), Bus::default(), None)
    }

    /// Returns a builder for attaching subscribers or sharing a registry.
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    pub(crate) fn from_parts(
        registry: Registry,
        bus: Bus,
        listener: Option<tokio_util::sync::DropGuard>,
    ) -> Self {
        Self {
            registry,
            bus,
            _listener: listener,
        }
    }

    /// The registry this controller runs. Clone it to let modules self-register.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The bus lifecycle events are published on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// See [`Registry::add`].
    pub fn add<M: Module>(&self, name: impl Into<String>, module: M) {
        self.registry.add(name, module);
    }

    /// See [`Registry::add_optional`].
    pub fn add_optional<M: Module>(&self, name: impl Into<String>, module: Option<M>) {
        self.registry.add_optional(name, module);
    }

    /// See [`Registry::remove`].
    pub fn remove(&self, name: &str) -> Option<ModuleHandle> {
        self.registry.remove(name)
    }

    /// See [`Registry::get`].
    pub fn get(&self, name: &str) -> Option<ModuleHandle> {
        self.registry.get(name)
    }

    /// See [`Registry::range`].
    pub fn range<F>(&self, visit: F)
    where
        F: FnMut(&str, &ModuleHandle) -> ControlFlow<()>,
    {
        self.registry.range(visit);
    }

    /// Runs every registered module until `ctx` is cancelled, then stops them.
    ///
    /// `None` means a background context: nothing can cancel it, so the wait
    /// phase is skipped and modules are stopped right after a successful startup.
    ///
    /// Returns every failure from every phase, teardown included.
    pub async fn run(&self, ctx: Option<Context>) -> Result<(), MultiError> {
        let root = ctx.unwrap_or_else(Context::background);
        let mut errors = MultiError::new();
        let began = Instant::now();
        self.bus.publish(Event::new(EventKind::StartupBegan));

        let ctx = match self.initialize(&root).await {
            Ok(ctx) => ctx,
            Err(err) => {
                errors.append(err);
                return errors.into_result();
            }
        };

        let mut running = Vec::new();
        match self.startup(&ctx, &mut running).await {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::Ready).with_elapsed(began.elapsed()));
                if root.is_cancellable() {
                    root.cancelled().await;
                }
            }
            Err(err) => {
                errors.append(err);
            }
        }

        self.teardown(&ctx, &mut running, &mut errors).await;

        if root.err() == Some(ContextError::DeadlineExceeded) {
            errors.append(ContextError::DeadlineExceeded);
        }
        errors.into_result()
    }

    /// Runs `Initialize` then `Install` for every module, without starting anything.
    ///
    /// Stops at the first failure. For provisioning workflows that must not block.
    pub async fn install(&self, ctx: Option<Context>) -> Result<(), MultiError> {
        let root = ctx.unwrap_or_else(Context::background);
        self.bus.publish(Event::new(EventKind::StartupBegan));

        let mut errors = MultiError::new();
        match self.initialize(&root).await {
            Ok(ctx) => {
                let snapshot = self.registry.snapshot();
                errors.record(self.run_hooks(Phase::Install, &snapshot, &ctx).await);
            }
            Err(err) => {
                errors.append(err);
            }
        }
        errors.into_result()
    }

    /// Calls every `Initialize`, threading replaced contexts forward.
    async fn initialize(&self, root: &Context) -> Result<Context, PhaseError> {
        let mut ctx = root.clone();
        for entry in self.registry.snapshot() {
            let Some(initializer) = entry.module().as_initializer() else {
                continue;
            };
            let replaced = self
                .observe(Phase::Initialize, entry.name(), initializer.initialize(&ctx))
                .await?;
            if let Some(next) = replaced {
                ctx = next;
            }
        }
        Ok(ctx)
    }

    /// Install, PreStart, Start and PostStart. `running` ends up holding the Start snapshot.
    async fn startup(
        &self,
        ctx: &Context,
        running: &mut Vec<ModuleEntry>,
    ) -> Result<(), PhaseError> {
        self.run_hooks(Phase::Install, &self.registry.snapshot(), ctx)
            .await?;
        self.run_hooks(Phase::PreStart, &self.registry.snapshot(), ctx)
            .await?;

        *running = self.registry.snapshot();
        for entry in running.iter_mut() {
            self.observe(Phase::Start, entry.name(), entry.module().start(ctx))
                .await?;
            entry.started = true;
        }

        self.run_hooks(Phase::PostStart, &running[..], ctx).await
    }

    /// Stops started modules in reverse order; never aborts early.
    async fn teardown(&self, ctx: &Context, running: &mut [ModuleEntry], errors: &mut MultiError) {
        let began = Instant::now();
        self.bus.publish(Event::new(EventKind::TeardownBegan));

        for entry in running.iter_mut().rev() {
            if !entry.started {
                continue;
            }
            entry.started = false;
            errors.record(
                self.observe(Phase::Stop, entry.name(), entry.module().stop(ctx))
                    .await,
            );
        }

        self.bus
            .publish(Event::new(EventKind::TeardownCompleted).with_elapsed(began.elapsed()));
    }

    /// Calls the optional hook for `phase` on each entry that implements it.
    async fn run_hooks(
        &self,
        phase: Phase,
        entries: &[ModuleEntry],
        ctx: &Context,
    ) -> Result<(), PhaseError> {
        for entry in entries {
            let module = entry.module();
            let hook = match phase {
                Phase::Install => module.as_installer().map(|h| h.install(ctx)),
                Phase::PreStart => module.as_pre_starter().map(|h| h.pre_start(ctx)),
                Phase::PostStart => module.as_post_starter().map(|h| h.post_start(ctx)),
                Phase::Initialize | Phase::Start | Phase::Stop => None,
            };
            if let Some(hook) = hook {
                self.observe(phase, entry.name(), hook).await?;
            }
        }
        Ok(())
    }

    /// Awaits one hook, publishing its start, outcome and duration.
    async fn observe<T, F>(&self, phase: Phase, module: &str, hook: F) -> Result<T, PhaseError>
    where
        F: Future<Output = Result<T, BoxError>>,
    {
        self.bus.publish(
            Event::new(EventKind::HookStarting)
                .with_module(module)
                .with_phase(phase),
        );
        let began = Instant::now();

        match hook.await {
            Ok(value) => {
                self.bus.publish(
                    Event::new(EventKind::HookCompleted)
                        .with_module(module)
                        .with_phase(phase)
                        .with_elapsed(began.elapsed()),
                );
                Ok(value)
            }
            Err(source) => {
                self.bus.publish(
                    Event::new(EventKind::HookFailed)
                        .with_module(module)
                        .with_phase(phase)
                        .with_reason(source.to_string())
                        .with_elapsed(began.elapsed()),
                );
                Err(PhaseError::new(phase, module, source))
            }
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
