//! # Logging module.
//!
//! [`LoggingModule`] installs the process-wide `tracing` formatter during `Initialize`.
//! Its level is configurable under the module's section:
//!
//! ```toml
//! [Logging]
//! level = "debug,hyper=warn"
//! ```
//!
//! The level uses [`EnvFilter`] directive syntax. A configuration applied after the
//! formatter was installed takes effect immediately.
//! If another `tracing` subscriber is already installed, the module leaves it in place.

use std::sync::OnceLock;

use async_trait::async_trait;
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::context::Context;
use crate::error::BoxError;
use crate::modules::{Initializer, Module};
use crate::settings::{ConfigCell, ConfigTarget, Configurable, ConfigurableNotify};

/// Settings of the [`LoggingModule`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, for example `info` or `modvisor=debug,warn`.
    pub level: String,
}

impl Default for LoggingConfig {
    /// Default configuration:
    ///
    /// - `level = "info"`
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Installs and reconfigures the `tracing` formatter.
#[derive(Default)]
pub struct LoggingModule {
    cfg: ConfigCell<LoggingConfig>,
    handle: OnceLock<reload::Handle<EnvFilter, Registry>>,
}

impl LoggingModule {
    /// Creates the module with the default level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the module with `cfg` until a configuration file overrides it.
    pub fn with_config(cfg: LoggingConfig) -> Self {
        Self {
            cfg: ConfigCell::new(cfg),
            handle: OnceLock::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> LoggingConfig {
        self.cfg.get()
    }

    /// True once this module's formatter is the global subscriber.
    pub fn is_installed(&self) -> bool {
        self.handle.get().is_some()
    }

    fn filter(&self) -> Result<EnvFilter, BoxError> {
        let level = self.cfg.read().level.clone();
        EnvFilter::try_new(&level).map_err(|e| format!("invalid log level {level:?}: {e}").into())
    }
}

#[async_trait]
impl Initializer for LoggingModule {
    async fn initialize(&self, _ctx: &Context) -> Result<Option<Context>, BoxError> {
        if self.is_installed() {
            return Ok(None);
        }

        let (layer, handle) = reload::Layer::new(self.filter()?);
        let installed = tracing_subscriber::registry()
            .with(layer)
            .with(fmt::layer())
            .try_init();

        match installed {
            Ok(()) => {
                let _ = self.handle.set(handle);
            }
            Err(err) => {
                tracing::debug!(target: "modvisor", error = %err, "tracing subscriber already installed");
            }
        }
        Ok(None)
    }
}

impl Configurable for LoggingModule {
    fn config(&self) -> Option<&dyn ConfigTarget> {
        Some(&self.cfg)
    }

    fn as_notify(&self) -> Option<&dyn ConfigurableNotify> {
        Some(self)
    }
}

impl ConfigurableNotify for LoggingModule {
    fn config_set(&self) -> Result<(), BoxError> {
        let filter = self.filter()?;
        if let Some(handle) = self.handle.get() {
            handle.reload(filter)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Module for LoggingModule {
    async fn start(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    fn as_initializer(&self) -> Option<&dyn Initializer> {
        Some(self)
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Configuration, Format};
    use crate::{ConfigError, Registry};
    use std::sync::Arc;

    #[test]
    fn level_comes_from_configuration() {
        let logging = Arc::new(LoggingModule::new());
        let reg = Registry::new();
        reg.add("Logging", Arc::clone(&logging));

        Configuration::decode("[Logging]\nlevel = \"debug\"\n", Format::Toml, &reg).unwrap();
        assert_eq!(logging.settings().level, "debug");
    }

    #[test]
    fn invalid_level_is_rejected_on_notify() {
        let reg = Registry::new();
        reg.add("Logging", LoggingModule::new());

        let err = Configuration::decode(r#"{"Logging": {"level": "modvisor=loud"}}"#, Format::Json, &reg)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Notify { ref module, .. } if module == "Logging"));
    }

    #[test]
    fn omitted_level_resets_to_default() {
        let logging = Arc::new(LoggingModule::with_config(LoggingConfig {
            level: "warn".into(),
        }));
        let reg = Registry::new();
        reg.add("Logging", Arc::clone(&logging));

        Configuration::decode(r#"{"Logging": {}}"#, Format::Json, &reg).unwrap();
        assert_eq!(logging.settings(), LoggingConfig::default());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let logging = LoggingModule::new();
        let ctx = Context::new();
        assert!(logging.initialize(&ctx).await.unwrap().is_none());
        assert!(logging.initialize(&ctx).await.unwrap().is_none());
    }
}
