//! Error types used by the module controller and the process supervisor.
//!
//! - [`MultiError`]: the aggregated error returned once per run; flattens nested aggregates.
//! - [`PhaseError`]: a lifecycle hook failure tagged with its phase and module name.
//! - [`ContextError`]: why an execution [`Context`](crate::Context) ended.
//! - [`SupervisorError`]: failures of the outer supervisor itself.
//! - [`ConfigError`]: failures applying a configuration file to modules.
//!
//! Each enum provides `as_label` for logs/metrics, following the same convention everywhere.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::Phase;

/// Boxed error returned by module hooks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// # Aggregated error: zero or more underlying failures.
///
/// Appending another `MultiError` moves its children into `self`, so the tree
/// is never deeper than one level. An empty aggregate means "no error"; use
/// [`MultiError::into_result`] to turn it into `Ok(())`.
///
/// # Example
/// ```
/// use modvisor::MultiError;
///
/// let mut inner = MultiError::new();
/// inner.append("e2").append("e3");
///
/// let mut outer = MultiError::new();
/// outer.append("e1").append(inner);
///
/// assert_eq!(outer.len(), 3);
/// assert_eq!(outer.to_string(), "multiple errors: e1; e2; e3");
/// ```
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<BoxError>,
}

impl MultiError {
    /// Creates an empty aggregate.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Appends an error, flattening nested aggregates in order.
    pub fn append(&mut self, err: impl Into<BoxError>) -> &mut Self {
        let err: BoxError = err.into();
        match err.downcast::<MultiError>() {
            Ok(nested) => {
                for child in nested.errors {
                    self.append(child);
                }
            }
            Err(single) => self.errors.push(single),
        }
        self
    }

    /// Appends the error if present; `None` leaves the aggregate untouched.
    pub fn append_opt<E: Into<BoxError>>(&mut self, err: Option<E>) -> &mut Self {
        if let Some(err) = err {
            self.append(err);
        }
        self
    }

    /// Records the error side of `res` and hands back the success value, if any.
    pub fn record<T, E: Into<BoxError>>(&mut self, res: Result<T, E>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.append(e);
                None
            }
        }
    }

    /// Number of underlying errors.
    #[inline]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no error has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First recorded error (the one [`source`](StdError::source) exposes).
    pub fn first(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.errors.first().map(|e| e.as_ref())
    }

    /// Iterates the underlying errors in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn StdError + Send + Sync + 'static)> {
        self.errors.iter().map(|e| e.as_ref())
    }

    /// Returns the first underlying error of type `E`.
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        self.errors.iter().find_map(|e| e.downcast_ref::<E>())
    }

    /// Consumes the aggregate and returns the underlying errors.
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), MultiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "{single}"),
            many => {
                f.write_str("multiple errors: ")?;
                for (i, err) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl StdError for MultiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors.first().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl<E: Into<BoxError>> Extend<E> for MultiError {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for err in iter {
            self.append(err);
        }
    }
}

impl<E: Into<BoxError>> FromIterator<E> for MultiError {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut agg = MultiError::new();
        agg.extend(iter);
        agg
    }
}

impl IntoIterator for MultiError {
    type Item = BoxError;
    type IntoIter = std::vec::IntoIter<BoxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// # A lifecycle hook returned an error.
///
/// Renders as `failed to <verb> module "<name>": <cause>`.
#[derive(Error, Debug)]
#[error("failed to {} module {:?}: {}", .phase.verb(), .module, .source)]
pub struct PhaseError {
    /// Phase whose hook failed.
    pub phase: Phase,
    /// Registered name of the failing module.
    pub module: String,
    /// Error returned by the hook.
    #[source]
    pub source: BoxError,
}

impl PhaseError {
    /// Wraps a hook error.
    pub fn new(phase: Phase, module: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            phase,
            module: module.into(),
            source: source.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::{Phase, PhaseError};
    ///
    /// let err = PhaseError::new(Phase::PreStart, "db", "boom");
    /// assert_eq!(err.as_label(), "prestart_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self.phase {
            Phase::Initialize => "initialize_failed",
            Phase::Install => "install_failed",
            Phase::PreStart => "prestart_failed",
            Phase::Start => "start_failed",
            Phase::PostStart => "poststart_failed",
            Phase::Stop => "stop_failed",
        }
    }
}

/// # Why an execution context ended.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled by its owner. Treated as a clean termination.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed before anyone cancelled it.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl ContextError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ContextError::Canceled => "context_canceled",
            ContextError::DeadlineExceeded => "context_deadline_exceeded",
        }
    }
}

/// # Errors produced by the process supervisor itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The background task running the controller panicked.
    #[error("controller task panicked: {reason}")]
    ControllerPanicked {
        /// Panic payload rendered as text.
        reason: String,
    },

    /// OS signal listeners could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[from] std::io::Error),
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::SupervisorError;
    ///
    /// let err = SupervisorError::ControllerPanicked { reason: "boom".into() };
    /// assert_eq!(err.as_label(), "supervisor_controller_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::ControllerPanicked { .. } => "supervisor_controller_panicked",
            SupervisorError::Signals(_) => "supervisor_signals",
        }
    }
}

/// # Errors produced while applying a configuration file to modules.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file {} does not exist", .path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Read {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither `.json` nor `.toml`.
    #[error("unsupported configuration format {extension:?} for {}", .path.display())]
    UnsupportedFormat {
        /// Requested path.
        path: PathBuf,
        /// Lowercased extension (empty when missing).
        extension: String,
    },

    /// The JSON document could not be parsed.
    #[error("invalid JSON configuration: {0}")]
    Json(#[source] serde_json::Error),

    /// The TOML document could not be parsed.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document root is not a table of module sections.
    #[error("configuration root must be a table of module sections")]
    NotATable,

    /// A section names a module that is not registered or not configurable.
    #[error("configuration section {name:?} does not match a configurable module")]
    UnknownSection {
        /// Section name.
        name: String,
    },

    /// A section could not be decoded into the module's configuration.
    #[error("failed to decode configuration for module {module:?}: {source}")]
    Decode {
        /// Module name.
        module: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The module rejected its new configuration.
    #[error("module {module:?} rejected its configuration: {source}")]
    Notify {
        /// Module name.
        module: String,
        /// Error returned by `config_set`.
        #[source]
        source: BoxError,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NotFound { .. } => "config_not_found",
            ConfigError::Read { .. } => "config_read",
            ConfigError::UnsupportedFormat { .. } => "config_unsupported_format",
            ConfigError::Json(_) => "config_json",
            ConfigError::Toml(_) => "config_toml",
            ConfigError::NotATable => "config_not_a_table",
            ConfigError::UnknownSection { .. } => "config_unknown_section",
            ConfigError::Decode { .. } => "config_decode",
            ConfigError::Notify { .. } => "config_notify",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("custom {0}")]
    struct Custom(u32);

    #[test]
    fn empty_aggregate_is_ok() {
        let agg = MultiError::new();
        assert!(agg.is_empty());
        assert_eq!(agg.to_string(), "");
        assert!(agg.into_result().is_ok());
    }

    #[test]
    fn append_keeps_order() {
        let mut agg = MultiError::new();
        agg.append("test 1").append("test 2");

        let msgs: Vec<String> = agg.iter().map(|e| e.to_string()).collect();
        assert_eq!(msgs, vec!["test 1", "test 2"]);
    }

    #[test]
    fn append_flattens_nested_aggregate() {
        let mut inner = MultiError::new();
        inner.append("e2").append("e3");

        let mut agg = MultiError::new();
        agg.append("e1");
        agg.append(inner);

        assert_eq!(agg.len(), 3);
        assert!(agg.iter().all(|e| e.downcast_ref::<MultiError>().is_none()));
        let rendered = agg.to_string();
        assert!(rendered.contains("e1") && rendered.contains("e2") && rendered.contains("e3"));
    }

    #[test]
    fn double_nesting_stays_one_level_deep() {
        let mut deepest = MultiError::new();
        deepest.append("c");
        let mut middle = MultiError::new();
        middle.append("b").append(deepest);
        let mut top = MultiError::new();
        top.append("a").append(middle);

        let msgs: Vec<String> = top.iter().map(|e| e.to_string()).collect();
        assert_eq!(msgs, vec!["a", "b", "c"]);
    }

    #[test]
    fn none_and_empty_aggregate_are_noops() {
        let mut agg = MultiError::new();
        agg.append_opt(None::<BoxError>);
        agg.append(MultiError::new());
        assert!(agg.is_empty());
        assert!(agg.into_result().is_ok());
    }

    #[test]
    fn single_error_renders_its_own_message() {
        let mut agg = MultiError::new();
        agg.append(Custom(7));
        assert_eq!(agg.to_string(), "custom 7");
        assert_eq!(agg.source().map(|s| s.to_string()).as_deref(), Some("custom 7"));
        assert_eq!(agg.find::<Custom>().map(|c| c.0), Some(7));
    }

    #[test]
    fn record_keeps_errors_and_passes_values() {
        let mut agg = MultiError::new();
        assert_eq!(agg.record(Ok::<_, Custom>(5)), Some(5));
        assert_eq!(agg.record(Err::<u8, _>(Custom(1))), None);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn phase_error_message_names_module() {
        let err = PhaseError::new(Phase::Start, "C", "port in use");
        assert_eq!(err.to_string(), r#"failed to start module "C": port in use"#);
        assert_eq!(err.as_label(), "start_failed");
    }
}
