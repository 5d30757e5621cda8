//! # Closure-backed module (`ModuleFn`)
//!
//! [`ModuleFn`] wraps two closures `Fn(Context) -> Fut`, one for `start` and one
//! for `stop`. Each call produces a fresh future that owns its own clone of the context.
//! If the closures need shared state, capture an `Arc<...>` explicitly.
//!
//! `ModuleFn` implements only the mandatory hooks; write a type implementing
//! [`Module`] when you need `Initialize`/`PreStart`/`PostStart`.
//!
//! ## Example
//! ```rust
//! use modvisor::{BoxError, Context, Controller, ModuleFn};
//!
//! let controller = Controller::new();
//! controller.add(
//!     "ticker",
//!     ModuleFn::new(
//!         |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!         |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!     ),
//! );
//! assert!(controller.get("ticker").is_some());
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;
use crate::modules::module::Module;

/// Function-backed module implementation.
#[derive(Debug)]
pub struct ModuleFn<S, T> {
    start: S,
    stop: T,
}

impl<S, T> ModuleFn<S, T> {
    /// Creates a module from its `start` and `stop` closures.
    pub fn new(start: S, stop: T) -> Self {
        Self { start, stop }
    }

    /// Creates the module and returns it behind an `Arc`.
    pub fn arc(start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(start, stop))
    }
}

#[async_trait]
impl<S, SFut, T, TFut> Module for ModuleFn<S, T>
where
    S: Fn(Context) -> SFut + Send + Sync + 'static, // Fn, not FnMut
    SFut: Future<Output = Result<(), BoxError>> + Send + 'static,
    T: Fn(Context) -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn start(&self, ctx: &Context) -> Result<(), BoxError> {
        (self.start)(ctx.clone()).await
    }

    async fn stop(&self, ctx: &Context) -> Result<(), BoxError> {
        (self.stop)(ctx.clone()).await
    }
}
