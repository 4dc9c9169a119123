//! Warp adapter.
//!
//! Warp has no scripting dictionary, so windows are listed and typed into
//! through System Events UI scripting.

use std::time::Duration;

use async_trait::async_trait;

use super::applescript::{
    applescript_escape, is_process_running, parse_records, run_action, run_applescript,
    ScriptOutput, DEFAULT_SCRIPT_TIMEOUT,
};
use super::{Focus, TargetAdapter};
use crate::core::{BackendKind, Payload, Target};

// System Events lists windows front to back, so window 1 has focus.
const ENUMERATE_SCRIPT: &str = r#"
tell application "System Events"
    if not (exists process "Warp") then return ""
    tell process "Warp"
        set output to ""
        set i to 0
        repeat with w in windows
            set i to i + 1
            set output to output & i & "|" & (name of w) & linefeed
        end repeat
        return output
    end tell
end tell
"#;

/// Drives Warp windows.
#[derive(Debug, Clone)]
pub struct WarpAdapter {
    timeout: Duration,
}

impl WarpAdapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self { timeout: DEFAULT_SCRIPT_TIMEOUT }
    }

    /// Set the per-script timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_windows(output: &str) -> Vec<Target> {
        parse_records(output)
            .into_iter()
            .filter_map(|(number, title)| {
                let number: u32 = number.parse().ok()?;
                let title = if title.is_empty() { format!("Warp Window {number}") } else { title };
                let target = Target::new(BackendKind::Warp, number, title)
                    .with_ordinal(number)
                    .with_data("window_number", number.to_string());
                Some(if number == 1 { target.focused() } else { target })
            })
            .collect()
    }
}

impl Default for WarpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetAdapter for WarpAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Warp
    }

    fn script_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn is_running(&self) -> bool {
        is_process_running("Warp", self.timeout).await
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<Target>> {
        match run_applescript(ENUMERATE_SCRIPT, self.timeout).await? {
            ScriptOutput::Ok(output) => Ok(Self::parse_windows(&output)),
            ScriptOutput::Unavailable => Ok(Vec::new()),
        }
    }

    async fn focused_target(&self) -> anyhow::Result<Focus> {
        let windows = self.enumerate().await?;
        Ok(windows.into_iter().find(|t| t.is_focused).map_or(Focus::NoneFocused, Focus::Target))
    }

    async fn send(
        &self,
        target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()> {
        let window = target
            .data("window_number")
            .and_then(|n| n.parse::<u32>().ok())
            .or(target.ordinal)
            .unwrap_or(1);
        let text = applescript_escape(payload.text());
        let enter = if append_newline { "\n        key code 36" } else { "" };

        let script = format!(
            r#"tell application "Warp" to activate
delay 0.2
tell application "System Events"
    tell process "Warp"
        perform action "AXRaise" of window {window}
        delay 0.2
        keystroke "{text}"{enter}
    end tell
end tell"#
        );

        run_action(&script, self.timeout).await
    }
}
