//! # Application: a named, versioned set of modules with a supervisor.
//!
//! [`Application`] is the top-level entry point. It collects modules, optionally
//! applies a configuration file to them, and runs them under a [`Supervisor`].
//! While running, every hook can read the application's [`AppInfo`] from its context.
//!
//! ## Example
//! ```rust,no_run
//! use modvisor::{AppInfo, Application, BoxError, Context, ModuleFn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::bootstrap("greeter", "1.0.0").with_module(
//!         "hello",
//!         ModuleFn::new(
//!             |ctx: Context| async move {
//!                 if let Some(info) = AppInfo::from_context(&ctx) {
//!                     println!("hello from {info}");
//!                 }
//!                 Ok::<_, BoxError>(())
//!             },
//!             |_ctx: Context| async { Ok::<_, BoxError>(()) },
//!         ),
//!     );
//!
//!     app.configure_from_file("greeter.toml")?;
//!     app.run(None).await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::context::Context;
use crate::core::{Controller, Registry, Supervisor, SupervisorConfig};
use crate::error::{ConfigError, MultiError};
use crate::modules::Module;
use crate::settings::Configuration;
use crate::subscribers::Subscribe;

/// Name and version of the running application, available from every hook's context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
}

impl AppInfo {
    /// Returns the info injected by [`Application::run`], or `None` outside an application run.
    pub fn from_context(ctx: &Context) -> Option<&AppInfo> {
        ctx.value::<AppInfo>()
    }
}

impl fmt::Display for AppInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A named, versioned set of modules.
pub struct Application {
    info: AppInfo,
    registry: Registry,
    subscribers: Vec<Arc<dyn Subscribe>>,
    cfg: SupervisorConfig,
}

impl Application {
    /// Creates an application with no modules.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: AppInfo {
                name: name.into(),
                version: version.into(),
            },
            registry: Registry::new(),
            subscribers: Vec::new(),
            cfg: SupervisorConfig::default(),
        }
    }

    /// Creates an application with the default modules registered.
    ///
    /// With the `logging` feature: the [`LoggingModule`](crate::LoggingModule) under
    /// `"Logging"` and the [`LogWriter`](crate::LogWriter) subscriber.
    pub fn bootstrap(name: impl Into<String>, version: impl Into<String>) -> Self {
        #[allow(unused_mut)]
        let mut app = Self::new(name, version);
        #[cfg(feature = "logging")]
        {
            app.registry.add("Logging", crate::logging::LoggingModule::new());
            app.subscribers
                .push(Arc::new(crate::subscribers::LogWriter::new()));
        }
        app
    }

    /// Registers a module to run. Replaces a module already registered under `name`.
    ///
    /// # Panics
    /// Panics if `name` is empty.
    pub fn with_module<M: Module>(self, name: impl Into<String>, module: M) -> Self {
        self.registry.add(name, module);
        self
    }

    /// Sets the supervisor settings.
    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Adds event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Application version.
    pub fn version(&self) -> &str {
        &self.info.version
    }

    /// Name and version.
    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// The registered modules. Clones share state.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Applies a `.json` or `.toml` file to the registered modules.
    pub fn configure_from_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        Configuration::decode_file(path, &self.registry)
    }

    /// Builds a supervisor over this application's modules.
    ///
    /// Take its [`exit_handle`](Supervisor::exit_handle) before passing it to
    /// [`run_with`](Self::run_with). Must be called inside a Tokio runtime.
    pub fn supervisor(&self) -> Supervisor {
        let controller = Controller::builder()
            .with_registry(self.registry.clone())
            .with_subscribers(self.subscribers.clone())
            .build();
        Supervisor::new(controller, self.cfg.clone())
    }

    /// Runs every module until a termination signal or until startup fails.
    pub async fn run(&self, ctx: Option<Context>) -> Result<(), MultiError> {
        self.run_with(&self.supervisor(), ctx).await
    }

    /// Runs under `supervisor`, with [`AppInfo`] added to the root context.
    pub async fn run_with(
        &self,
        supervisor: &Supervisor,
        ctx: Option<Context>,
    ) -> Result<(), MultiError> {
        let root = ctx
            .unwrap_or_else(Context::background)
            .with_value(self.info.clone());
        supervisor.run(Some(root)).await
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info, f)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("info", &self.info)
            .field("modules", &self.registry)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, ModuleFn};
    use std::sync::Mutex;

    fn quiet() -> SupervisorConfig {
        SupervisorConfig {
            handle_signals: false,
        }
    }

    #[test]
    fn display_is_name_slash_version() {
        let app = Application::new("svc", "1.2.3");
        assert_eq!(app.to_string(), "svc/1.2.3");
        assert_eq!(app.info().to_string(), "svc/1.2.3");
    }

    #[cfg(feature = "logging")]
    #[test]
    fn bootstrap_registers_logging() {
        let app = Application::bootstrap("svc", "1");
        assert_eq!(app.registry().names(), vec!["Logging"]);
    }

    #[test]
    fn app_info_is_absent_outside_a_run() {
        assert!(AppInfo::from_context(&Context::new()).is_none());
    }

    #[tokio::test]
    async fn modules_see_app_info_and_exit_ends_the_run() {
        let seen = Arc::new(Mutex::new(None::<AppInfo>));
        let record = Arc::clone(&seen);

        let app = Application::new("svc", "0.9")
            .with_config(quiet())
            .with_module(
                "probe",
                ModuleFn::new(
                    move |ctx: Context| {
                        let record = Arc::clone(&record);
                        async move {
                            *record.lock().unwrap() = AppInfo::from_context(&ctx).cloned();
                            Ok::<_, BoxError>(())
                        }
                    },
                    |_ctx: Context| async { Ok::<_, BoxError>(()) },
                ),
            );

        let sup = app.supervisor();
        let exit = sup.exit_handle();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            exit.exit(None);
        });

        app.run_with(&sup, None).await.unwrap();
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(AppInfo {
                name: "svc".into(),
                version: "0.9".into()
            })
        );
    }

    #[tokio::test]
    async fn startup_failure_is_returned() {
        let app = Application::new("svc", "1").with_config(quiet()).with_module(
            "db",
            ModuleFn::new(
                |_ctx: Context| async { Err::<(), BoxError>("unreachable host".into()) },
                |_ctx: Context| async { Ok::<_, BoxError>(()) },
            ),
        );

        let err = app.run(None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to start module \"db\": unreachable host"
        );
    }

    #[test]
    fn configure_from_missing_file_fails() {
        let app = Application::new("svc", "1");
        let err = app.configure_from_file("/no/such/app.json").unwrap_err();
        assert_eq!(err.as_label(), "config_not_found");
    }
}
