//! Terminal.app adapter.

use std::time::Duration;

use async_trait::async_trait;

use super::applescript::{
    applescript_escape, is_process_running, parse_records, run_action, run_applescript,
    ScriptOutput, DEFAULT_SCRIPT_TIMEOUT,
};
use super::{Focus, TargetAdapter};
use crate::core::{BackendKind, Payload, Target};

const ENUMERATE_SCRIPT: &str = r#"
tell application "Terminal"
    set output to ""
    repeat with i from 1 to count of windows
        try
            set winTitle to custom title of tab 1 of window i
        on error
            set winTitle to ""
        end try
        set output to output & i & "|" & winTitle & linefeed
    end repeat
    return output
end tell
"#;

const FOCUSED_SCRIPT: &str = r#"
tell application "Terminal"
    if (count of windows) is 0 then return ""
    set frontWin to front window
    repeat with i from 1 to count of windows
        if window i is frontWin then
            try
                set winTitle to custom title of tab 1 of window i
            on error
                set winTitle to ""
            end try
            return (i as string) & "|" & winTitle
        end if
    end repeat
    return ""
end tell
"#;

/// Drives Terminal.app windows.
#[derive(Debug, Clone)]
pub struct TerminalAppAdapter {
    timeout: Duration,
}

impl TerminalAppAdapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self { timeout: DEFAULT_SCRIPT_TIMEOUT }
    }

    /// Set the per-script timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn window_target(number: u32, title: &str) -> Target {
        let title =
            if title.is_empty() { format!("Terminal Window {number}") } else { title.to_string() };
        Target::new(BackendKind::Terminal, number, title)
            .with_ordinal(number)
            .with_data("window_number", number.to_string())
    }

    fn window_number(target: &Target) -> anyhow::Result<u32> {
        target
            .data("window_number")
            .and_then(|n| n.parse().ok())
            .or(target.ordinal)
            .ok_or_else(|| anyhow::anyhow!("target {} has no window number", target.id))
    }
}

impl Default for TerminalAppAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetAdapter for TerminalAppAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Terminal
    }

    fn script_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn is_running(&self) -> bool {
        is_process_running("Terminal", self.timeout).await
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<Target>> {
        if !self.is_running().await {
            return Ok(Vec::new());
        }
        let ScriptOutput::Ok(output) = run_applescript(ENUMERATE_SCRIPT, self.timeout).await?
        else {
            return Ok(Vec::new());
        };

        Ok(parse_records(&output)
            .into_iter()
            .filter_map(|(number, title)| {
                number.parse::<u32>().ok().map(|n| Self::window_target(n, &title))
            })
            .collect())
    }

    async fn focused_target(&self) -> anyhow::Result<Focus> {
        if !self.is_running().await {
            return Ok(Focus::NoneFocused);
        }
        let ScriptOutput::Ok(output) = run_applescript(FOCUSED_SCRIPT, self.timeout).await?
        else {
            return Ok(Focus::Unsupported);
        };

        Ok(parse_records(&output)
            .into_iter()
            .find_map(|(number, title)| {
                number.parse::<u32>().ok().map(|n| Self::window_target(n, &title).focused())
            })
            .map_or(Focus::NoneFocused, Focus::Target))
    }

    async fn send(
        &self,
        target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()> {
        let window = Self::window_number(target)?;
        let text = applescript_escape(payload.text());

        // `do script` always runs the line; typing without Enter goes through System Events.
        let script = if append_newline {
            format!(
                "tell application \"Terminal\" to do script \"{text}\" in window {window}"
            )
        } else {
            format!(
                r#"tell application "Terminal"
    activate
    set index of window {window} to 1
end tell
tell application "System Events" to tell process "Terminal" to keystroke "{text}""#
            )
        };

        run_action(&script, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_target() {
        let target = TerminalAppAdapter::window_target(2, "api");
        assert_eq!(target.id, "Terminal:2");
        assert_eq!(target.ordinal, Some(2));
        assert_eq!(target.data("window_number"), Some("2"));
        assert_eq!(target.display_name(), "Terminal 2");

        let untitled = TerminalAppAdapter::window_target(3, "");
        assert_eq!(untitled.title, "Terminal Window 3");
    }

    #[test]
    fn test_window_number_falls_back_to_ordinal() {
        let target = Target::new(BackendKind::Terminal, 4, "x").with_ordinal(4);
        assert_eq!(TerminalAppAdapter::window_number(&target).unwrap(), 4);

        let bare = Target::new(BackendKind::Terminal, "x", "x");
        assert!(TerminalAppAdapter::window_number(&bare).is_err());
    }
}
