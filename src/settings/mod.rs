//! # Module configuration.
//!
//! The configuration collaborator writes file-based settings into modules before a run.
//!
//! - [`ConfigCell`] holds a module's configuration value and decodes sections into it
//! - [`Configurable`] exposes that value through [`Module::as_configurable`](crate::Module::as_configurable)
//! - [`ConfigurableNotify`] lets a module validate or react after its section was applied
//! - [`Configuration`] reads a `.json` or `.toml` file and applies it to a [`Registry`](crate::Registry)
//!
//! ## File layout
//! Each top-level key names a registered module:
//! ```toml
//! [Logging]
//! level = "debug"
//!
//! [http]
//! port = 8080
//! ```

mod cell;
mod configurable;
mod configuration;

pub use cell::{ConfigCell, ConfigTarget};
pub use configurable::{Configurable, ConfigurableNotify};
pub use configuration::{Configuration, Format};
