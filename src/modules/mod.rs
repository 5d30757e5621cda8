//! # Module abstractions.
//!
//! This module provides the plugin contract the controller drives:
//! - [`Module`] - mandatory `start`/`stop` plus capability queries
//! - [`Initializer`], [`Installer`], [`PreStarter`], [`PostStarter`] - optional lifecycle hooks
//! - [`ModuleFn`] - closure-backed module implementation
//! - [`ModuleHandle`] - shared reference to a module (`Arc<dyn Module>`)
//!
//! Configuration capabilities ([`Configurable`](crate::Configurable),
//! [`ConfigurableNotify`](crate::ConfigurableNotify)) are applied by [`Configuration`](crate::Configuration).

mod hooks;
mod module;
mod module_fn;

pub use hooks::{Initializer, Installer, PostStarter, PreStarter};
pub use module::{Module, ModuleHandle};
pub use module_fn::ModuleFn;
