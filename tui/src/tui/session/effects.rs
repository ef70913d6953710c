// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Effect records and the commit lifecycle.
//!
//! After every frame commit:
//! 1. effects that disappeared from the new spec set run their cleanup and
//!    are dropped;
//! 2. new effects run; surviving effects re-run when their deps token says
//!    so (previous cleanup first);
//! 3. each invocation's returned cleanup is stored for next time.
//!
//! The task yields between a cleanup and the effect that replaces it, so
//! work scheduled by the cleanup can observe the disposal before the new
//! effect runs. A panicking effect is caught at the commit boundary: its
//! previous cleanup has already run, its record keeps a `None` cleanup, the
//! error is logged, and the session continues.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::{app::AppHandle, deps::DepsToken, input_registry::InputRegistry};

pub type CleanupFn = Box<dyn FnOnce() + Send>;
pub type EffectFn = Box<dyn FnMut(&mut EffectScope) -> Option<CleanupFn> + Send>;

/// What an effect body may touch: capability handles only, never the
/// session itself.
#[allow(missing_debug_implementations)]
pub struct EffectScope {
    pub app: AppHandle,
    pub inputs: InputRegistry,
}

/// One effect registration collected during a render.
#[allow(missing_debug_implementations)]
pub struct EffectSpec {
    /// `identity_path + "::" + key`.
    pub id: String,
    pub deps: DepsToken,
    pub run: EffectFn,
}

struct EffectRecord {
    deps: DepsToken,
    cleanup: Option<CleanupFn>,
}

/// Active effects, in first-registration order.
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct EffectRegistry {
    records: Vec<(String, EffectRecord)>,
}

impl EffectRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn len(&self) -> usize { self.records.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Commit one frame's collected effect specs. See the module docs for
    /// the lifecycle contract.
    pub async fn commit(&mut self, specs: Vec<EffectSpec>, scope: &mut EffectScope) {
        // 1. Cleanup for effects no longer present.
        let live_ids: std::collections::HashSet<&str> =
            specs.iter().map(|spec| spec.id.as_str()).collect();
        let mut index = 0;
        while index < self.records.len() {
            if live_ids.contains(self.records[index].0.as_str()) {
                index += 1;
                continue;
            }
            let (id, record) = self.records.remove(index);
            run_cleanup(&id, record.cleanup);
            tokio::task::yield_now().await;
        }

        // 2/3. Run new and re-running effects; store their cleanups.
        for mut spec in specs {
            let position = self.records.iter().position(|(id, _)| *id == spec.id);
            match position {
                None => {
                    tokio::task::yield_now().await;
                    let cleanup = run_effect(&spec.id, &mut spec.run, scope);
                    self.records.push((
                        spec.id,
                        EffectRecord {
                            deps: spec.deps,
                            cleanup,
                        },
                    ));
                }
                Some(position) => {
                    let record = &mut self.records[position].1;
                    if spec.deps.should_rerun(&record.deps) {
                        run_cleanup(&spec.id, record.cleanup.take());
                        tokio::task::yield_now().await;
                        let cleanup = run_effect(&spec.id, &mut spec.run, scope);
                        let record = &mut self.records[position].1;
                        record.cleanup = cleanup;
                        record.deps = spec.deps;
                    }
                    // Else: preserve the stored cleanup; the fresh closure
                    // from this render is discarded.
                }
            }
        }
    }

    /// Unmount path: run every remaining cleanup, newest first.
    pub fn cleanup_all(&mut self) {
        while let Some((id, record)) = self.records.pop() {
            run_cleanup(&id, record.cleanup);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn run_effect(
    id: &str,
    run: &mut EffectFn,
    scope: &mut EffectScope,
) -> Option<CleanupFn> {
    match catch_unwind(AssertUnwindSafe(|| run(scope))) {
        Ok(cleanup) => cleanup,
        Err(payload) => {
            tracing::error!(
                effect = id,
                panic = %panic_message(payload.as_ref()),
                "effect panicked; continuing"
            );
            None
        }
    }
}

fn run_cleanup(id: &str, cleanup: Option<CleanupFn>) {
    if let Some(cleanup) = cleanup
        && let Err(payload) = catch_unwind(AssertUnwindSafe(cleanup))
    {
        tracing::error!(
            effect = id,
            panic = %panic_message(payload.as_ref()),
            "effect cleanup panicked"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::mpsc;

    fn scope() -> EffectScope {
        let (msg_tx, _rx) = mpsc::unbounded_channel();
        EffectScope {
            app: AppHandle { msg_tx },
            inputs: InputRegistry::new(),
        }
    }

    fn recording_spec(
        id: &str,
        deps: DepsToken,
        log: &Arc<StdMutex<Vec<String>>>,
    ) -> EffectSpec {
        let run_log = log.clone();
        let cleanup_log = log.clone();
        let run_id = id.to_string();
        EffectSpec {
            id: id.to_string(),
            deps,
            run: Box::new(move |_scope| {
                run_log.lock().unwrap().push(format!("run:{run_id}"));
                let cleanup_log = cleanup_log.clone();
                let cleanup_id = run_id.clone();
                Some(Box::new(move || {
                    cleanup_log
                        .lock()
                        .unwrap()
                        .push(format!("cleanup:{cleanup_id}"));
                }))
            }),
        }
    }

    #[tokio::test]
    async fn test_mount_only_effect_runs_once() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        registry
            .commit(vec![recording_spec("a", deps![], &log)], &mut scope)
            .await;
        registry
            .commit(vec![recording_spec("a", deps![], &log)], &mut scope)
            .await;
        assert_eq!(*log.lock().unwrap(), vec!["run:a"]);
    }

    #[tokio::test]
    async fn test_always_effect_reruns_with_cleanup_first() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        registry
            .commit(
                vec![recording_spec("a", DepsToken::Always, &log)],
                &mut scope,
            )
            .await;
        registry
            .commit(
                vec![recording_spec("a", DepsToken::Always, &log)],
                &mut scope,
            )
            .await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["run:a", "cleanup:a", "run:a"]
        );
    }

    #[tokio::test]
    async fn test_deps_change_triggers_rerun() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        registry
            .commit(vec![recording_spec("a", deps![1_u8], &log)], &mut scope)
            .await;
        registry
            .commit(vec![recording_spec("a", deps![1_u8], &log)], &mut scope)
            .await;
        registry
            .commit(vec![recording_spec("a", deps![2_u8], &log)], &mut scope)
            .await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["run:a", "cleanup:a", "run:a"]
        );
    }

    #[tokio::test]
    async fn test_removed_effect_cleans_up() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        registry
            .commit(vec![recording_spec("a", deps![], &log)], &mut scope)
            .await;
        registry.commit(vec![], &mut scope).await;
        assert_eq!(*log.lock().unwrap(), vec!["run:a", "cleanup:a"]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_effect_is_contained() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        let panicking = EffectSpec {
            id: "boom".into(),
            deps: DepsToken::Always,
            run: Box::new(|_scope| panic!("effect exploded")),
        };
        registry.commit(vec![panicking], &mut scope).await;
        // The registry records the effect with no cleanup and stays usable.
        assert_eq!(registry.len(), 1);

        registry
            .commit(vec![recording_spec("a", deps![], &log)], &mut scope)
            .await;
        assert_eq!(*log.lock().unwrap(), vec!["run:a"]);
    }

    #[tokio::test]
    async fn test_cleanup_all_runs_in_reverse_order() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut registry = EffectRegistry::new();
        let mut scope = scope();

        registry
            .commit(
                vec![
                    recording_spec("first", deps![], &log),
                    recording_spec("second", deps![], &log),
                ],
                &mut scope,
            )
            .await;
        registry.cleanup_all();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["run:first", "run:second", "cleanup:second", "cleanup:first"]
        );
    }
}
