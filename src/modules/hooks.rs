//! Optional lifecycle hooks.
//!
//! Each hook is its own trait; a module exposes one through the matching
//! `Module::as_*` query.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;

/// Runs once per run before anything starts.
#[async_trait]
pub trait Initializer: Send + Sync {
    /// Prepares the module.
    ///
    /// Returning `Some(ctx)` replaces the context for every later phase (e.g. to attach values).
    /// The replacement cannot end the run early: the controller keeps waiting on the caller's context.
    /// An error aborts the run before any module starts.
    async fn initialize(&self, ctx: &Context) -> Result<Option<Context>, BoxError>;
}

/// One-time provisioning, run by [`Controller::install`](crate::Controller::install)
/// and inline by [`Controller::run`](crate::Controller::run) before `PreStart`.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Performs the provisioning step.
    async fn install(&self, ctx: &Context) -> Result<(), BoxError>;
}

/// Runs after every `Initialize`, before any `Start`.
#[async_trait]
pub trait PreStarter: Send + Sync {
    /// Prepares for start.
    async fn pre_start(&self, ctx: &Context) -> Result<(), BoxError>;
}

/// Runs after every `Start` succeeded.
#[async_trait]
pub trait PostStarter: Send + Sync {
    /// Completes startup.
    async fn post_start(&self, ctx: &Context) -> Result<(), BoxError>;
}
