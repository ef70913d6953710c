// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The hooks context threaded through the render call chain.
//!
//! [`Hooks`] is an explicit context object, not ambient task-local state:
//! every registrar a component may touch during render — state access,
//! effect collection, input subscription, focus recording, the app handle,
//! the I/O streams — hangs off this one value, scoped to the component's
//! identity path. [`Hooks::render_child`] derives the child scope, which is
//! how identity paths accumulate.
//!
//! Hook keys are explicit strings rather than call-order slots; `(identity
//! path, key)` addresses a state cell, and `identity path + "::" + key`
//! addresses an effect.

use std::collections::HashSet;

use super::{
    app::AppHandle,
    component::Component,
    deps::DepsToken,
    effects::{CleanupFn, EffectScope, EffectSpec},
    identity::child_identity_path,
    input_registry::InputHandlerEntry,
    state::{StateHandle, StateRegistry},
};
use crate::{KeyEvent, OutputDevice, Size, StyledText};

/// Everything one render pass collects: effect specs, focusables in render
/// order, and the frame's identity-path set (for reset-time eviction).
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct RenderCollector {
    pub effects: Vec<EffectSpec>,
    pub focusables: Vec<String>,
    pub identity_paths: HashSet<String>,
}

/// Options for [`Hooks::use_input_with`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InputOptions {
    pub active: bool,
    pub requires_focus: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            active: true,
            requires_focus: false,
        }
    }
}

/// The per-component registrar surface. See the module docs.
#[allow(missing_debug_implementations)]
pub struct Hooks<'a> {
    path: String,
    collector: &'a mut RenderCollector,
    state: StateRegistry,
    app: AppHandle,
    focused_path: Option<String>,
    stdout: OutputDevice,
    stderr: OutputDevice,
}

impl<'a> Hooks<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        path: String,
        collector: &'a mut RenderCollector,
        state: StateRegistry,
        app: AppHandle,
        focused_path: Option<String>,
        stdout: OutputDevice,
        stderr: OutputDevice,
    ) -> Self {
        collector.identity_paths.insert(path.clone());
        Self {
            path,
            collector,
            state,
            app,
            focused_path,
            stdout,
            stderr,
        }
    }

    /// This component's identity path.
    #[must_use]
    pub fn identity_path(&self) -> &str { &self.path }

    /// Keyed state: returns the current value (storing `init()` on first
    /// use) and a setter handle. Setting does not re-render by itself; call
    /// [`AppHandle::request_rerender`] afterwards.
    pub fn use_state<T>(
        &mut self,
        key: &str,
        init: impl FnOnce() -> T,
    ) -> (T, StateHandle<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.state.get_or_init(&self.path, key, init);
        (value, self.handle(key))
    }

    /// A state slot without render semantics: same registry, no implied
    /// re-render anywhere.
    pub fn use_ref<T>(&mut self, key: &str, init: impl FnOnce() -> T) -> StateHandle<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let _unused = self.state.get_or_init(&self.path, key, init);
        self.handle(key)
    }

    fn handle<T>(&self, key: &str) -> StateHandle<T> {
        StateHandle {
            registry: self.state.clone(),
            path: self.path.clone(),
            key: key.to_string(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Memoized computation keyed by `(path, key)`; recomputes when `deps`
    /// changes ([`DepsToken::Always`] disables memoization entirely).
    pub fn use_memo<T>(
        &mut self,
        key: &str,
        deps: DepsToken,
        compute: impl FnOnce() -> T,
    ) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let slot_key = format!("__memo::{key}");
        if let Some((stored_deps, value)) =
            self.state.get::<(DepsToken, T)>(&self.path, &slot_key)
            && !deps.should_rerun(&stored_deps)
        {
            return value;
        }
        let value = compute();
        self.state.set(&self.path, &slot_key, (deps, value.clone()));
        value
    }

    /// Register an effect for the post-commit lifecycle.
    pub fn use_effect(
        &mut self,
        key: &str,
        deps: DepsToken,
        run: impl FnMut(&mut EffectScope) -> Option<CleanupFn> + Send + 'static,
    ) {
        self.collector.effects.push(EffectSpec {
            id: format!("{}::{key}", self.path),
            deps,
            run: Box::new(run),
        });
    }

    /// Subscribe to key events (always active, no focus requirement).
    pub fn use_input(
        &mut self,
        handler: impl Fn(&KeyEvent) + Send + Sync + 'static,
    ) {
        self.use_input_with("input", InputOptions::default(), handler);
    }

    /// Subscribe to key events. Implemented as an effect whose deps token is
    /// derived from `active`, so toggling activity resubscribes and the
    /// cleanup unsubscribes.
    pub fn use_input_with(
        &mut self,
        key: &str,
        options: InputOptions,
        handler: impl Fn(&KeyEvent) + Send + Sync + 'static,
    ) {
        let id = format!("{}::{key}", self.path);
        let identity_path = self.path.clone();
        let handler: std::sync::Arc<dyn Fn(&KeyEvent) + Send + Sync> =
            std::sync::Arc::new(handler);

        self.collector.effects.push(EffectSpec {
            id: id.clone(),
            deps: DepsToken::Token(format!("bool={}", options.active)),
            run: Box::new(move |scope| {
                if !options.active {
                    return None;
                }
                scope.inputs.register(InputHandlerEntry {
                    id: id.clone(),
                    active: true,
                    requires_focus: options.requires_focus,
                    identity_path: identity_path.clone(),
                    handler: handler.clone(),
                });
                let inputs = scope.inputs.clone();
                let entry_id = id.clone();
                Some(Box::new(move || inputs.remove(&entry_id)))
            }),
        });
    }

    /// Record this component as focusable; returns whether it currently
    /// holds focus.
    pub fn use_focus(&mut self) -> bool {
        self.collector.focusables.push(self.path.clone());
        self.focused_path.as_deref() == Some(self.path.as_str())
    }

    /// App-exit / re-render / focus capability.
    #[must_use]
    pub fn app(&self) -> AppHandle { self.app.clone() }

    /// The session's output streams (the real terminal fds even while
    /// console capture has the process-wide ones patched).
    #[must_use]
    pub fn stdout(&self) -> OutputDevice { self.stdout.clone() }

    #[must_use]
    pub fn stderr(&self) -> OutputDevice { self.stderr.clone() }

    /// Render a child component in a derived identity scope.
    pub fn render_child(
        &mut self,
        child: &mut dyn Component,
        bounds: Size,
    ) -> Vec<StyledText> {
        let child_path = child_identity_path(
            &self.path,
            child.type_name(),
            child.identity().as_deref(),
        );
        let mut child_hooks = Hooks::new(
            child_path,
            &mut *self.collector,
            self.state.clone(),
            self.app.clone(),
            self.focused_path.clone(),
            self.stdout.clone(),
            self.stderr.clone(),
        );
        child.render(bounds, &mut child_hooks)
    }
}
