//! Runtime core: registry, lifecycle controller and process supervisor.
//!
//! Internal modules:
//! - [`registry`]: insertion-ordered, name-keyed module set;
//! - [`phase`]: the lifecycle phases and their verbs;
//! - [`controller`]: runs the phase state machine and aggregates failures;
//! - [`builder`]: attaches subscribers to a controller;
//! - [`supervisor`]: runs the controller in the background, handles exit and signals;
//! - [`shutdown`]: cross-platform signal handling;
//! - [`config`]: supervisor settings.

mod builder;
mod config;
mod controller;
mod phase;
mod registry;
mod shutdown;
mod supervisor;

pub use builder::ControllerBuilder;
pub use config::SupervisorConfig;
pub use controller::Controller;
pub use phase::Phase;
pub use registry::{ModuleEntry, Registry};
pub use supervisor::{ExitHandle, Supervisor};
