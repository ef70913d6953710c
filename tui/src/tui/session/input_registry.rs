// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The session's input-handler registry.
//!
//! `use_input` subscribes handlers here (from inside its effect) and removes
//! them in the effect's cleanup. Dispatch snapshots the registry so handlers
//! can re-subscribe or unsubscribe while an event is being delivered without
//! deadlocking.

use std::sync::{Arc, Mutex as StdMutex};

use crate::KeyEvent;

pub type InputHandlerFn = Arc<dyn Fn(&KeyEvent) + Send + Sync>;

/// One subscription: see the dispatch gating rules on
/// [`InputRegistry::snapshot`] consumers.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct InputHandlerEntry {
    /// `identity_path + "::" + key`; replacing an id replaces the entry.
    pub id: String,
    pub active: bool,
    pub requires_focus: bool,
    pub identity_path: String,
    pub handler: InputHandlerFn,
}

/// Cheap-to-clone shared registry, insertion-ordered.
#[derive(Clone, Default)]
#[allow(missing_debug_implementations)]
pub struct InputRegistry {
    inner: Arc<StdMutex<Vec<InputHandlerEntry>>>,
}

impl InputRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert or replace by id, keeping first-subscription order.
    pub fn register(&self, entry: InputHandlerEntry) {
        let mut entries = self.inner.lock().unwrap();
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    pub fn remove(&self, id: &str) {
        self.inner.lock().unwrap().retain(|entry| entry.id != id);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<InputHandlerEntry> {
        self.inner.lock().unwrap().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize { self.inner.lock().unwrap().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
