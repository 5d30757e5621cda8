//! # Shared configuration value.
//!
//! A [`ConfigCell`] is owned by a module and read from its hooks. The decoder
//! replaces the whole value, so fields that may be omitted from the file should
//! carry `#[serde(default)]`.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use serde::de::DeserializeOwned;

/// Type-erased destination for one decoded configuration section.
pub trait ConfigTarget: Send + Sync {
    /// Replaces the current value with `section`.
    fn apply(&self, section: serde_json::Value) -> Result<(), serde_json::Error>;
}

/// Lock-guarded configuration value.
///
/// # Example
/// ```
/// use modvisor::{ConfigCell, ConfigTarget};
/// use serde::Deserialize;
///
/// #[derive(Clone, Debug, Default, Deserialize, PartialEq)]
/// struct Http {
///     #[serde(default)]
///     port: u16,
/// }
///
/// let cell = ConfigCell::new(Http { port: 80 });
/// cell.apply(serde_json::json!({ "port": 8080 })).unwrap();
/// assert_eq!(cell.get(), Http { port: 8080 });
/// ```
#[derive(Default)]
pub struct ConfigCell<T> {
    value: RwLock<T>,
}

impl<T> ConfigCell<T> {
    /// Creates a cell holding `value` until a configuration is applied.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Borrows the current value.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the current value.
    pub fn set(&self, value: T) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl<T: Clone> ConfigCell<T> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.read().clone()
    }
}

impl<T> ConfigTarget for ConfigCell<T>
where
    T: DeserializeOwned + Send + Sync,
{
    fn apply(&self, section: serde_json::Value) -> Result<(), serde_json::Error> {
        let value = serde_json::from_value::<T>(section)?;
        self.set(value);
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigCell").field(&*self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Deserialize, PartialEq)]
    struct Limits {
        max: u32,
        #[serde(default)]
        strict: bool,
    }

    #[test]
    fn failed_apply_keeps_previous_value() {
        let cell = ConfigCell::new(Limits {
            max: 1,
            strict: true,
        });

        assert!(cell.apply(serde_json::json!({ "max": "lots" })).is_err());
        assert_eq!(
            cell.get(),
            Limits {
                max: 1,
                strict: true
            }
        );

        cell.apply(serde_json::json!({ "max": 5 })).unwrap();
        assert_eq!(
            cell.get(),
            Limits {
                max: 5,
                strict: false
            }
        );
    }
}
