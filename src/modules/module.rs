//! # Module contract.
//!
//! A [`Module`] must implement `start`/`stop`. Every other lifecycle hook is an
//! optional capability: the module implements the hook trait and overrides the
//! matching `as_*` query to return `Some(self)`. The controller asks for each
//! capability at the boundary of the phase that needs it.
//!
//! Both hooks receive the current [`Context`]. `stop` also receives it after the
//! context was cancelled and is expected to finish regardless.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;
use crate::modules::hooks::{Initializer, Installer, PostStarter, PreStarter};
use crate::settings::Configurable;

/// Shared handle to a registered module.
pub type ModuleHandle = Arc<dyn Module>;

/// # Start/stop unit driven by the controller.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use modvisor::{BoxError, Context, Initializer, Module};
///
/// struct Cache;
///
/// #[async_trait]
/// impl Initializer for Cache {
///     async fn initialize(&self, ctx: &Context) -> Result<Option<Context>, BoxError> {
///         Ok(Some(ctx.with_value(64usize)))
///     }
/// }
///
/// #[async_trait]
/// impl Module for Cache {
///     async fn start(&self, ctx: &Context) -> Result<(), BoxError> {
///         let _capacity = ctx.value::<usize>().copied().unwrap_or(16);
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
///         Ok(())
///     }
///
///     fn as_initializer(&self) -> Option<&dyn Initializer> {
///         Some(self)
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Starts the module. Called once per run, after every `PreStart`.
    async fn start(&self, ctx: &Context) -> Result<(), BoxError>;

    /// Stops the module. Called only if `start` succeeded, in reverse registration order.
    async fn stop(&self, ctx: &Context) -> Result<(), BoxError>;

    /// Returns the [`Initializer`] capability, if implemented.
    fn as_initializer(&self) -> Option<&dyn Initializer> {
        None
    }

    /// Returns the [`Installer`] capability, if implemented.
    fn as_installer(&self) -> Option<&dyn Installer> {
        None
    }

    /// Returns the [`PreStarter`] capability, if implemented.
    fn as_pre_starter(&self) -> Option<&dyn PreStarter> {
        None
    }

    /// Returns the [`PostStarter`] capability, if implemented.
    fn as_post_starter(&self) -> Option<&dyn PostStarter> {
        None
    }

    /// Returns the [`Configurable`] capability, if implemented.
    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }
}

#[async_trait]
impl<M: Module + ?Sized> Module for Arc<M> {
    async fn start(&self, ctx: &Context) -> Result<(), BoxError> {
        (**self).start(ctx).await
    }

    async fn stop(&self, ctx: &Context) -> Result<(), BoxError> {
        (**self).stop(ctx).await
    }

    fn as_initializer(&self) -> Option<&dyn Initializer> {
        (**self).as_initializer()
    }

    fn as_installer(&self) -> Option<&dyn Installer> {
        (**self).as_installer()
    }

    fn as_pre_starter(&self) -> Option<&dyn PreStarter> {
        (**self).as_pre_starter()
    }

    fn as_post_starter(&self) -> Option<&dyn PostStarter> {
        (**self).as_post_starter()
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        (**self).as_configurable()
    }
}
