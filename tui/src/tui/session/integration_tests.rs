// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! End-to-end session tests over headless (mock-device) sessions: state +
//! input driving re-renders, focus traversal and gating, ctrl-c exit,
//! idempotent unmount, identity reset eviction.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::{
    Component, Hooks, InputOptions, KeyEvent, KeyKind, LayoutEngine, Modifiers,
    RenderSession, SessionOptions, Size, StyledText, VerticalStack, size,
};

async fn wait_for_commits(session: &RenderSession, count: u64) {
    while session.commit_count() < count {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

fn observed_text(buffer: &Arc<StdMutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock().unwrap().clone()).into_owned()
}

/// Counter app: `+` increments, renders `n=<count>`.
struct Counter;

impl Component for Counter {
    fn type_name(&self) -> &str { "Counter" }

    fn render(&mut self, _bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
        let (count, setter) = hooks.use_state("n", || 0_u32);
        let app = hooks.app();
        hooks.use_input(move |event| {
            if let KeyEvent::Key {
                kind: KeyKind::Char('+'),
                ..
            } = event
            {
                setter.set(setter.get().unwrap_or(0) + 1);
                app.request_rerender();
            }
        });
        vec![StyledText::plain(format!("n={count}"))]
    }
}

#[tokio::test(start_paused = true)]
async fn test_state_input_rerender_loop() {
    let (options, observed) = SessionOptions::headless(size(20_u16, 2_u16));
    let session = RenderSession::mount(Box::new(Counter), options).unwrap();

    wait_for_commits(&session, 1).await;
    assert!(observed_text(&observed).contains("n=0"));

    session.dispatch_input(KeyEvent::key(KeyKind::Char('+')));
    wait_for_commits(&session, 2).await;
    assert!(observed_text(&observed).contains("n=1"));

    let status = session.unmount().await;
    assert!(status.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_ctrl_c_exits_without_delivering_event() {
    let delivered = Arc::new(StdMutex::new(Vec::<KeyEvent>::new()));

    struct Recorder(Arc<StdMutex<Vec<KeyEvent>>>);
    impl Component for Recorder {
        fn type_name(&self) -> &str { "Recorder" }
        fn render(&mut self, _bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
            let log = self.0.clone();
            hooks.use_input(move |event| log.lock().unwrap().push(event.clone()));
            vec![StyledText::plain("recording")]
        }
    }

    let (options, _observed) = SessionOptions::headless(size(20_u16, 1_u16));
    let session =
        RenderSession::mount(Box::new(Recorder(delivered.clone())), options).unwrap();
    wait_for_commits(&session, 1).await;

    session.dispatch_input(KeyEvent::CtrlC);
    let status = session.wait_until_exit().await;
    assert!(status.is_success());
    assert!(delivered.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unmount_is_idempotent() {
    let (options, _observed) = SessionOptions::headless(size(10_u16, 1_u16));
    let session = RenderSession::mount(Box::new(Counter), options).unwrap();
    wait_for_commits(&session, 1).await;

    let first = session.unmount().await;
    let second = session.unmount().await;
    assert_eq!(first, second);
    let metrics_after_first = session.writer_metrics();
    let _unused = session.unmount().await;
    assert_eq!(session.writer_metrics(), metrics_after_first);
}

/// Two focusable items; each records delivered chars; focus gates delivery.
struct FocusPair {
    log: Arc<StdMutex<Vec<String>>>,
}

struct FocusItem {
    name: &'static str,
    log: Arc<StdMutex<Vec<String>>>,
}

impl Component for FocusItem {
    fn type_name(&self) -> &str { "Item" }
    fn identity(&self) -> Option<String> { Some(self.name.to_string()) }

    fn render(&mut self, _bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
        let focused = hooks.use_focus();
        let log = self.log.clone();
        let name = self.name;
        hooks.use_input_with(
            "keys",
            InputOptions {
                active: true,
                requires_focus: true,
            },
            move |event| {
                if let KeyEvent::Key {
                    kind: KeyKind::Char(c),
                    ..
                } = event
                {
                    log.lock().unwrap().push(format!("{name}:{c}"));
                }
            },
        );
        vec![StyledText::plain(if focused {
            format!("[{name}]")
        } else {
            format!(" {name} ")
        })]
    }
}

impl Component for FocusPair {
    fn type_name(&self) -> &str { "Pair" }

    fn render(&mut self, bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
        let mut first = FocusItem {
            name: "one",
            log: self.log.clone(),
        };
        let mut second = FocusItem {
            name: "two",
            log: self.log.clone(),
        };
        // One row per item, stacked top to bottom.
        let rects = VerticalStack.split(&[1, 1], bounds);
        let mut lines = hooks.render_child(&mut first, rects[0].size);
        lines.extend(hooks.render_child(&mut second, rects[1].size));
        lines
    }
}

#[tokio::test(start_paused = true)]
async fn test_focus_gated_dispatch_and_tab_traversal() {
    let log = Arc::new(StdMutex::new(Vec::new()));
    let (options, observed) = SessionOptions::headless(size(20_u16, 2_u16));
    let session = RenderSession::mount(
        Box::new(FocusPair { log: log.clone() }),
        options,
    )
    .unwrap();
    wait_for_commits(&session, 1).await;
    assert!(observed_text(&observed).contains("[one]"));

    // Focused handler receives; unfocused does not.
    session.dispatch_input(KeyEvent::key(KeyKind::Char('x')));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(*log.lock().unwrap(), vec!["one:x"]);

    // Tab advances focus and re-renders.
    session.dispatch_input(KeyEvent::key(KeyKind::Tab));
    wait_for_commits(&session, 2).await;
    session.dispatch_input(KeyEvent::key(KeyKind::Char('y')));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(*log.lock().unwrap(), vec!["one:x", "two:y"]);

    // Shift-Tab retreats.
    session.dispatch_input(KeyEvent::key_with(KeyKind::Tab, Modifiers::SHIFT));
    wait_for_commits(&session, 3).await;
    session.dispatch_input(KeyEvent::key(KeyKind::Char('z')));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(
        *log.lock().unwrap(),
        vec!["one:x", "two:y", "one:z"]
    );

    let _unused = session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_programmatic_focus_by_id() {
    let log = Arc::new(StdMutex::new(Vec::new()));
    let (options, _observed) = SessionOptions::headless(size(20_u16, 2_u16));
    let session = RenderSession::mount_with_layout(
        Box::new(FocusPair { log: log.clone() }),
        Box::new(VerticalStack),
        options,
    )
    .unwrap();
    wait_for_commits(&session, 1).await;

    session.app_handle().focus_id("two");
    wait_for_commits(&session, 2).await;
    session.dispatch_input(KeyEvent::key(KeyKind::Char('q')));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(*log.lock().unwrap(), vec!["two:q"]);

    let _unused = session.unmount().await;
}

/// Root whose explicit identity can change between frames.
struct SwitchableRoot {
    identity: Arc<StdMutex<String>>,
}

impl Component for SwitchableRoot {
    fn type_name(&self) -> &str { "Root" }
    fn identity(&self) -> Option<String> {
        Some(self.identity.lock().unwrap().clone())
    }

    fn render(&mut self, _bounds: Size, hooks: &mut Hooks<'_>) -> Vec<StyledText> {
        let (count, setter) = hooks.use_state("n", || 0_u32);
        // Bump on every render so surviving state is observable.
        setter.set(count + 1);
        vec![StyledText::plain(format!("seen={count}"))]
    }
}

#[tokio::test(start_paused = true)]
async fn test_identity_reset_evicts_state_and_forces_full() {
    let identity = Arc::new(StdMutex::new("a".to_string()));
    let (options, observed) = SessionOptions::headless(size(20_u16, 1_u16));
    let session = RenderSession::mount(
        Box::new(SwitchableRoot {
            identity: identity.clone(),
        }),
        options,
    )
    .unwrap();
    wait_for_commits(&session, 1).await;
    session.rerender();
    wait_for_commits(&session, 2).await;
    assert!(observed_text(&observed).contains("seen=1"));
    assert_eq!(session.state_registry().path_count(), 1);

    // Flip the root identity: diff state resets, old path's state evicted.
    *identity.lock().unwrap() = "b".to_string();
    observed.lock().unwrap().clear();
    session.rerender();
    wait_for_commits(&session, 3).await;
    assert!(observed_text(&observed).contains("seen=0"));
    assert_eq!(session.state_registry().path_count(), 1);
    assert_eq!(
        session.state_registry().get::<u32>("Root:b", "n"),
        Some(1)
    );
    assert_eq!(session.state_registry().get::<u32>("Root:a", "n"), None);

    let _unused = session.unmount().await;
}
