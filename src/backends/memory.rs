//! In-process adapter with scripted behaviour.
//!
//! Used by tests and benches to stand in for a real host application.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Focus, TargetAdapter};
use crate::core::{BackendKind, Payload, Target};

/// A payload captured by [`MemoryAdapter::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPayload {
    /// Target id it was sent to
    pub target_id: String,
    /// What was sent
    pub payload: Payload,
    /// Whether Enter was requested
    pub append_newline: bool,
}

/// Adapter over a fixed, mutable list of targets.
#[derive(Debug)]
pub struct MemoryAdapter {
    kind: BackendKind,
    targets: Mutex<Vec<Target>>,
    running: AtomicBool,
    enumerate_calls: AtomicUsize,
    fail_enumerate: AtomicBool,
    fail_send: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    focus: Mutex<Option<Option<String>>>,
    sent: Mutex<Vec<SentPayload>>,
}

impl MemoryAdapter {
    /// Create a running adapter with no targets.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            targets: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
            enumerate_calls: AtomicUsize::new(0),
            fail_enumerate: AtomicBool::new(false),
            fail_send: Mutex::new(None),
            delay: Mutex::new(None),
            focus: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Seed the target list.
    pub fn with_targets(self, targets: Vec<Target>) -> Self {
        *self.targets.lock() = targets;
        self
    }

    /// Append a target.
    pub fn add_target(&self, target: Target) {
        self.targets.lock().push(target);
    }

    /// Remove a target by id.
    pub fn remove_target(&self, id: &str) {
        self.targets.lock().retain(|t| t.id != id);
    }

    /// Simulate the application starting or quitting.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Make `enumerate` fail.
    pub fn fail_enumerate(&self, fail: bool) {
        self.fail_enumerate.store(fail, Ordering::SeqCst);
    }

    /// Make `send` fail with the given detail, or succeed again with `None`.
    pub fn fail_send(&self, detail: Option<&str>) {
        *self.fail_send.lock() = detail.map(str::to_string);
    }

    /// Delay every call by this much.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Report focus: `Some(id)` focuses a target, `None` reports nothing focused.
    pub fn set_focused(&self, id: Option<&str>) {
        *self.focus.lock() = Some(id.map(str::to_string));
    }

    /// Number of `enumerate` calls so far.
    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<SentPayload> {
        self.sent.lock().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TargetAdapter for MemoryAdapter {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<Target>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_enumerate.load(Ordering::SeqCst) {
            anyhow::bail!("{} enumeration failed", self.kind);
        }
        if !self.is_running().await {
            return Ok(Vec::new());
        }
        Ok(self.targets.lock().clone())
    }

    async fn focused_target(&self) -> anyhow::Result<Focus> {
        let focus = self.focus.lock().clone();
        let Some(focused_id) = focus else {
            return Ok(Focus::Unsupported);
        };

        let target = focused_id.and_then(|id| {
            self.targets.lock().iter().find(|t| t.id == id).cloned().map(Target::focused)
        });
        Ok(target.map_or(Focus::NoneFocused, Focus::Target))
    }

    async fn send(
        &self,
        target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()> {
        self.pause().await;

        let failure = self.fail_send.lock().clone();
        if let Some(detail) = failure {
            anyhow::bail!(detail);
        }

        self.sent.lock().push(SentPayload {
            target_id: target.id.clone(),
            payload: payload.clone(),
            append_newline,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MemoryAdapter {
        MemoryAdapter::new(BackendKind::Terminal).with_targets(vec![
            Target::new(BackendKind::Terminal, 1, "one").with_ordinal(1),
            Target::new(BackendKind::Terminal, 2, "two").with_ordinal(2),
        ])
    }

    #[tokio::test]
    async fn test_enumerate_counts_calls() {
        let adapter = adapter();
        assert_eq!(adapter.enumerate().await.unwrap().len(), 2);
        assert_eq!(adapter.enumerate_calls(), 1);

        adapter.set_running(false);
        assert!(adapter.enumerate().await.unwrap().is_empty());
        assert_eq!(adapter.enumerate_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let adapter = adapter();
        adapter.fail_enumerate(true);
        assert!(adapter.enumerate().await.is_err());

        let target = Target::new(BackendKind::Terminal, 1, "one");
        adapter.fail_send(Some("window closed"));
        let err = adapter.send(&target, &Payload::Command("ls".into()), true).await.unwrap_err();
        assert_eq!(err.to_string(), "window closed");
        assert!(adapter.sent().is_empty());

        adapter.fail_send(None);
        adapter.send(&target, &Payload::Text("hi".into()), false).await.unwrap();
        assert_eq!(adapter.sent()[0].target_id, "Terminal:1");
        assert!(!adapter.sent()[0].append_newline);
    }

    #[tokio::test]
    async fn test_focus() {
        let adapter = adapter();
        assert_eq!(adapter.focused_target().await.unwrap(), Focus::Unsupported);

        adapter.set_focused(None);
        assert_eq!(adapter.focused_target().await.unwrap(), Focus::NoneFocused);

        adapter.set_focused(Some("Terminal:2"));
        match adapter.focused_target().await.unwrap() {
            Focus::Target(target) => {
                assert_eq!(target.id, "Terminal:2");
                assert!(target.is_focused);
            }
            other => panic!("unexpected focus: {other:?}"),
        }
    }
}
