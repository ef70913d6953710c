// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The state registry: `identity path → (key → value)`.
//!
//! Values are opaque (`Any`) and live as long as their identity path keeps
//! appearing in rendered frames; an identity reset evicts every entry whose
//! path vanished. Access is serialized by a plain mutex — operations are
//! tiny (clone an `Arc`), never held across await points.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

type Slot = Arc<dyn Any + Send + Sync>;

/// Cheap-to-clone handle to the shared registry.
#[derive(Clone, Default)]
#[allow(missing_debug_implementations)]
pub struct StateRegistry {
    inner: Arc<StdMutex<HashMap<String, HashMap<String, Slot>>>>,
}

impl StateRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Return the stored value, or store and return `init()`.
    pub fn get_or_init<T>(&self, path: &str, key: &str, init: impl FnOnce() -> T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock().unwrap();
        let slots = registry.entry(path.to_string()).or_default();
        if let Some(slot) = slots.get(key)
            && let Some(value) = slot.downcast_ref::<T>()
        {
            return value.clone();
        }
        let value = init();
        slots.insert(key.to_string(), Arc::new(value.clone()));
        value
    }

    /// Store a value. Does not trigger a re-render by itself; callers are
    /// expected to request one.
    pub fn set<T>(&self, path: &str, key: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut registry = self.inner.lock().unwrap();
        registry
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), Arc::new(value));
    }

    #[must_use]
    pub fn get<T>(&self, path: &str, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let registry = self.inner.lock().unwrap();
        registry
            .get(path)?
            .get(key)?
            .downcast_ref::<T>()
            .cloned()
    }

    /// Drop every entry whose identity path is not in `keep`.
    pub fn retain_paths(&self, keep: &HashSet<String>) {
        let mut registry = self.inner.lock().unwrap();
        registry.retain(|path, _| keep.contains(path));
    }

    /// Number of identity paths currently holding state.
    #[must_use]
    pub fn path_count(&self) -> usize { self.inner.lock().unwrap().len() }
}

/// Typed handle to one `(path, key)` slot; what `use_state` / `use_ref`
/// hand back. Setting does not re-render — pair it with
/// [`crate::AppHandle::request_rerender`].
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct StateHandle<T> {
    pub(crate) registry: StateRegistry,
    pub(crate) path: String,
    pub(crate) key: String,
    pub(crate) _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> StateHandle<T> {
    #[must_use]
    pub fn get(&self) -> Option<T> { self.registry.get(&self.path, &self.key) }

    pub fn set(&self, value: T) { self.registry.set(&self.path, &self.key, value); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_or_init_stores_initial_value() {
        let registry = StateRegistry::new();
        let first: u32 = registry.get_or_init("App/Counter", "count", || 7);
        assert_eq!(first, 7);
        // Second init is ignored; stored value wins.
        let second: u32 = registry.get_or_init("App/Counter", "count", || 99);
        assert_eq!(second, 7);
    }

    #[test]
    fn test_set_and_get() {
        let registry = StateRegistry::new();
        registry.set("App", "name", "hello".to_string());
        assert_eq!(registry.get::<String>("App", "name").as_deref(), Some("hello"));
        assert_eq!(registry.get::<u32>("App", "name"), None); // type mismatch
        assert_eq!(registry.get::<String>("App", "missing"), None);
    }

    #[test]
    fn test_retain_paths_evicts_vanished_identities() {
        let registry = StateRegistry::new();
        registry.set("App/A", "k", 1_u8);
        registry.set("App/B", "k", 2_u8);
        let keep: HashSet<String> = std::iter::once("App/A".to_string()).collect();
        registry.retain_paths(&keep);
        assert_eq!(registry.get::<u8>("App/A", "k"), Some(1));
        assert_eq!(registry.get::<u8>("App/B", "k"), None);
        assert_eq!(registry.path_count(), 1);
    }

    #[test]
    fn test_state_handle() {
        let registry = StateRegistry::new();
        let _initial: u32 = registry.get_or_init("App", "n", || 1);
        let handle = StateHandle::<u32> {
            registry: registry.clone(),
            path: "App".into(),
            key: "n".into(),
            _marker: std::marker::PhantomData,
        };
        assert_eq!(handle.get(), Some(1));
        handle.set(5);
        assert_eq!(registry.get::<u32>("App", "n"), Some(5));
    }
}
