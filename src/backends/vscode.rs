//! VS Code integrated terminal adapter.

use std::time::Duration;

use async_trait::async_trait;

use super::applescript::{
    applescript_escape, is_process_running, run_action, DEFAULT_SCRIPT_TIMEOUT,
};
use super::TargetAdapter;
use crate::core::{BackendKind, Payload, Target};

/// Local key of the single VS Code target.
pub const INTEGRATED_KEY: &str = "integrated";

/// Drives the integrated terminal of the frontmost VS Code window.
#[derive(Debug, Clone)]
pub struct VsCodeAdapter {
    timeout: Duration,
}

impl VsCodeAdapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self { timeout: DEFAULT_SCRIPT_TIMEOUT }
    }

    /// Set the per-script timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn integrated_target() -> Target {
        Target::new(BackendKind::VsCode, INTEGRATED_KEY, "Integrated Terminal")
    }
}

impl Default for VsCodeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetAdapter for VsCodeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::VsCode
    }

    fn script_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn is_running(&self) -> bool {
        is_process_running("Code", self.timeout).await
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<Target>> {
        if self.is_running().await {
            Ok(vec![Self::integrated_target()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn send(
        &self,
        _target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()> {
        let text = applescript_escape(payload.text());
        let enter = if append_newline { "\n        key code 36" } else { "" };

        let script = format!(
            r#"tell application "Visual Studio Code" to activate
delay 0.3
tell application "System Events"
    tell process "Code"
        keystroke "`" using {{control down}}
        delay 0.3
        keystroke "{text}"{enter}
    end tell
end tell"#
        );

        run_action(&script, self.timeout).await
    }
}
