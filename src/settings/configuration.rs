//! # Configuration decoder.
//!
//! ```text
//! decode_file(path) ── read ──► decode(src, format)
//!                                  ├─ parse (.json / .toml) ──► { section name → value }
//!                                  ├─ registry.range (registration order):
//!                                  │    configurable module? ─ no ──► skip
//!                                  │        └─ yes: take its section ─► ConfigTarget::apply
//!                                  │                └─► ConfigurableNotify::config_set
//!                                  └─ sections left over ──► UnknownSection
//! ```
//!
//! The first failure stops the pass. Modules visited before it keep their new values.

use std::ops::ControlFlow;
use std::path::Path;

use crate::core::Registry;
use crate::error::ConfigError;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl Format {
    /// Picks the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Applies configuration documents to the modules of a [`Registry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Configuration;

impl Configuration {
    /// Reads `path` and applies it to `registry`.
    pub fn decode_file(path: impl AsRef<Path>, registry: &Registry) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let src = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::decode(&src, format, registry)
    }

    /// Parses `src` and applies every section to the module of the same name.
    ///
    /// Every configurable module is notified, including those without a section,
    /// so they can validate their defaults.
    pub fn decode(src: &str, format: Format, registry: &Registry) -> Result<(), ConfigError> {
        let root: serde_json::Value = match format {
            Format::Json => serde_json::from_str(src).map_err(ConfigError::Json)?,
            Format::Toml => toml::from_str(src)?,
        };
        let serde_json::Value::Object(mut sections) = root else {
            return Err(ConfigError::NotATable);
        };

        let mut outcome = Ok(());
        registry.range(|name, module| {
            let Some(configurable) = module.as_configurable() else {
                return ControlFlow::Continue(());
            };
            let Some(target) = configurable.config() else {
                return ControlFlow::Continue(());
            };

            if let Some(section) = sections.remove(name) {
                if let Err(source) = target.apply(section) {
                    outcome = Err(ConfigError::Decode {
                        module: name.to_string(),
                        source,
                    });
                    return ControlFlow::Break(());
                }
            }

            if let Some(notify) = configurable.as_notify() {
                if let Err(source) = notify.config_set() {
                    outcome = Err(ConfigError::Notify {
                        module: name.to_string(),
                        source,
                    });
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        outcome?;

        match sections.into_iter().next() {
            Some((name, _)) => Err(ConfigError::UnknownSection { name }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ConfigCell, ConfigTarget, Configurable, ConfigurableNotify};
    use crate::{BoxError, Context, Module};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, Default, Deserialize, PartialEq)]
    struct HttpConfig {
        #[serde(default)]
        port: u16,
        #[serde(default)]
        host: String,
    }

    #[derive(Default)]
    struct Http {
        cfg: ConfigCell<HttpConfig>,
        notified: AtomicUsize,
        reject: bool,
    }

    impl Configurable for Http {
        fn config(&self) -> Option<&dyn ConfigTarget> {
            Some(&self.cfg)
        }

        fn as_notify(&self) -> Option<&dyn ConfigurableNotify> {
            Some(self)
        }
    }

    impl ConfigurableNotify for Http {
        fn config_set(&self) -> Result<(), BoxError> {
            self.notified.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Err("port must not be zero".into())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Module for Http {
        async fn start(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        fn as_configurable(&self) -> Option<&dyn Configurable> {
            Some(self)
        }
    }

    struct Plain;

    #[async_trait]
    impl Module for Plain {
        async fn start(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn registry_with(http: &Arc<Http>) -> Registry {
        let reg = Registry::new();
        reg.add("http", Arc::clone(http));
        reg.add("plain", Plain);
        reg
    }

    fn write_file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn toml_file_is_applied_and_notified() {
        let http = Arc::new(Http::default());
        let reg = registry_with(&http);
        let file = write_file(".toml", "[http]\nport = 8080\nhost = \"0.0.0.0\"\n");

        Configuration::decode_file(file.path(), &reg).unwrap();

        assert_eq!(
            http.cfg.get(),
            HttpConfig {
                port: 8080,
                host: "0.0.0.0".into()
            }
        );
        assert_eq!(http.notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn json_file_is_applied() {
        let http = Arc::new(Http::default());
        let reg = registry_with(&http);
        let file = write_file(".JSON", r#"{ "http": { "port": 9000 } }"#);

        Configuration::decode_file(file.path(), &reg).unwrap();
        assert_eq!(http.cfg.get().port, 9000);
    }

    #[test]
    fn missing_section_still_notifies() {
        let http = Arc::new(Http::default());
        let reg = registry_with(&http);

        Configuration::decode("{}", Format::Json, &reg).unwrap();
        assert_eq!(http.cfg.get(), HttpConfig::default());
        assert_eq!(http.notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn section_for_plain_module_is_unknown() {
        let http = Arc::new(Http::default());
        let reg = registry_with(&http);

        let err = Configuration::decode("[plain]\nx = 1\n", Format::Toml, &reg).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSection { ref name } if name == "plain"));
    }

    #[test]
    fn decode_error_names_the_module() {
        let http = Arc::new(Http::default());
        let reg = registry_with(&http);

        let err = Configuration::decode(r#"{"http": {"port": "high"}}"#, Format::Json, &reg)
            .unwrap_err();
        assert_eq!(err.as_label(), "config_decode");
        assert!(err.to_string().contains("\"http\""));
        assert_eq!(http.notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notify_rejection_stops_the_pass() {
        let http = Arc::new(Http {
            reject: true,
            ..Http::default()
        });
        let reg = registry_with(&http);

        let err = Configuration::decode("{}", Format::Json, &reg).unwrap_err();
        assert!(matches!(err, ConfigError::Notify { ref module, .. } if module == "http"));
    }

    #[test]
    fn file_errors_are_distinct() {
        let reg = Registry::new();

        let err = Configuration::decode_file("/definitely/not/here.toml", &reg).unwrap_err();
        assert_eq!(err.as_label(), "config_not_found");

        let file = write_file(".yaml", "a: 1");
        let err = Configuration::decode_file(file.path(), &reg).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { ref extension, .. } if extension == "yaml"));

        let err = Configuration::decode("[1, 2]", Format::Json, &reg).unwrap_err();
        assert_eq!(err.as_label(), "config_not_a_table");

        let err = Configuration::decode("not = [valid", Format::Toml, &reg).unwrap_err();
        assert_eq!(err.as_label(), "config_toml");
    }
}
