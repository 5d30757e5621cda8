//! # Module registry - insertion-ordered, name-keyed module set.
//!
//! The registry maps names to modules and remembers the order in which they
//! were added. Every lifecycle phase iterates a [`snapshot`](Registry::snapshot)
//! sorted by that order, never the live map.
//!
//! ## Architecture
//! ```text
//! add(name, m) ──► order = counter.fetch_add(1) + 1
//!              └─► HashMap[name] = ModuleEntry { name, order, module }
//!
//! snapshot()   ──► clone entries ──► sort by order ──► Vec<ModuleEntry>
//! ```
//!
//! ## Rules
//! - Adding under an existing name replaces the module; the replacement takes a fresh order value
//! - An empty name is a programmer error and panics
//! - The lock is never held while a hook runs, so hooks may add or remove modules
//! - Clones share state: hand a clone to a module so it can self-register

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::modules::{Module, ModuleHandle};

/// A registered module plus its bookkeeping.
///
/// Entries inside the registry are never marked started; the controller flips
/// `started` on the copies in its own snapshot.
#[derive(Clone)]
pub struct ModuleEntry {
    name: Arc<str>,
    order: u64,
    module: ModuleHandle,
    pub(crate) started: bool,
}

impl ModuleEntry {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration order (strictly increasing across `add` calls).
    pub fn order(&self) -> u64 {
        self.order
    }

    /// The module implementation.
    pub fn module(&self) -> &ModuleHandle {
        &self.module
    }

    /// True when `start` succeeded and `stop` has not been called yet.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Inner {
    modules: RwLock<HashMap<String, ModuleEntry>>,
    counter: AtomicU64,
}

/// Insertion-ordered registry of named modules.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` under `name`, replacing any module already registered under it.
    ///
    /// # Panics
    /// Panics if `name` is empty.
    pub fn add<M: Module>(&self, name: impl Into<String>, module: M) {
        self.insert(name.into(), Arc::new(module));
    }

    /// Registers the module if present; `None` is a silent no-op.
    ///
    /// Lets constructors opt out of registration by returning `None`.
    ///
    /// # Panics
    /// Panics if `name` is empty, even when `module` is `None`.
    pub fn add_optional<M: Module>(&self, name: impl Into<String>, module: Option<M>) {
        let name = name.into();
        assert!(!name.is_empty(), "module name must not be empty");
        if let Some(module) = module {
            self.insert(name, Arc::new(module));
        }
    }

    fn insert(&self, name: String, module: ModuleHandle) {
        assert!(!name.is_empty(), "module name must not be empty");

        let mut modules = self.write();
        // Taken under the write lock: the entry that lands last holds the highest order.
        let order = self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = ModuleEntry {
            name: Arc::from(name.as_str()),
            order,
            module,
            started: false,
        };
        let replaced = modules.insert(name, entry);
        drop(modules);
        drop(replaced);
    }

    /// Removes the module registered under `name`; no-op if absent.
    pub fn remove(&self, name: &str) -> Option<ModuleHandle> {
        self.write().remove(name).map(|e| e.module)
    }

    /// Returns the module registered under `name`.
    pub fn get(&self, name: &str) -> Option<ModuleHandle> {
        self.read().get(name).map(|e| Arc::clone(&e.module))
    }

    /// True if a module is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Visits every module in registration order until `visit` breaks.
    ///
    /// Iterates a snapshot, so `visit` may add or remove modules; those changes
    /// are not seen by the ongoing iteration.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &ModuleHandle) -> ControlFlow<()>,
    {
        for entry in self.snapshot() {
            if visit(&entry.name, &entry.module).is_break() {
                break;
            }
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .map(|e| e.name.to_string())
            .collect()
    }

    /// Point-in-time copy of all entries, sorted by registration order.
    pub fn snapshot(&self) -> Vec<ModuleEntry> {
        let mut entries: Vec<ModuleEntry> = self.read().values().cloned().collect();
        entries.sort_unstable_by_key(|e| e.order);
        entries
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ModuleEntry>> {
        self.inner
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ModuleEntry>> {
        self.inner
            .modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
