//! Configuration capabilities a module can expose.

use crate::error::BoxError;
use crate::settings::ConfigTarget;

/// A module whose configuration can be written by [`Configuration`](crate::Configuration).
///
/// Return it from [`Module::as_configurable`](crate::Module::as_configurable).
pub trait Configurable: Send + Sync {
    /// Where decoded settings go. `None` makes the module behave as if it were not configurable.
    fn config(&self) -> Option<&dyn ConfigTarget>;

    /// Returns the [`ConfigurableNotify`] capability, if implemented.
    fn as_notify(&self) -> Option<&dyn ConfigurableNotify> {
        None
    }
}

/// Called after the module's configuration has been applied.
pub trait ConfigurableNotify: Send + Sync {
    /// Validates or reacts to the new configuration; an error aborts the configuration pass.
    fn config_set(&self) -> Result<(), BoxError>;
}
