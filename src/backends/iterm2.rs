//! iTerm2 adapter.
//!
//! Every session of every tab is a target, addressed by its unique id.

use std::time::Duration;

use async_trait::async_trait;

use super::applescript::{
    applescript_escape, is_process_running, run_action, run_applescript, ScriptOutput,
    DEFAULT_SCRIPT_TIMEOUT,
};
use super::{Focus, TargetAdapter};
use crate::core::{BackendKind, Payload, Target};

// One line per session: id|focused|job|name
const ENUMERATE_SCRIPT: &str = r#"
tell application "iTerm2"
    set output to ""
    try
        set currentId to unique id of current session of current tab of current window
    on error
        set currentId to ""
    end try
    repeat with w in windows
        repeat with t in tabs of w
            repeat with s in sessions of t
                set sid to unique id of s
                set flag to "0"
                if sid is currentId then set flag to "1"
                set job to ""
                try
                    tell s to set job to (variable named "jobName")
                end try
                set output to output & sid & "|" & flag & "|" & job & "|" & (name of s) & linefeed
            end repeat
        end repeat
    end repeat
    return output
end tell
"#;

/// Drives iTerm2 sessions.
#[derive(Debug, Clone)]
pub struct ITerm2Adapter {
    timeout: Duration,
}

/// A parsed session line.
#[derive(Debug, PartialEq, Eq)]
struct SessionRecord {
    id: String,
    focused: bool,
    job: String,
    name: String,
}

impl ITerm2Adapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self { timeout: DEFAULT_SCRIPT_TIMEOUT }
    }

    /// Set the per-script timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_sessions(output: &str) -> Vec<SessionRecord> {
        output
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(4, '|');
                let id = parts.next()?.trim();
                let focused = parts.next()? == "1";
                let job = parts.next()?.trim();
                let name = parts.next().unwrap_or_default().trim();
                (!id.is_empty()).then(|| SessionRecord {
                    id: id.to_string(),
                    focused,
                    job: job.to_string(),
                    name: name.to_string(),
                })
            })
            .collect()
    }

    fn session_target(ordinal: u32, record: &SessionRecord) -> Target {
        let title = if record.name.is_empty() { "iTerm2 Session" } else { record.name.as_str() };
        let mut target = Target::new(BackendKind::ITerm2, &record.id, title)
            .with_ordinal(ordinal)
            .with_data("session_id", &record.id);
        if !record.job.is_empty() {
            target = target.with_process(&record.job);
        }
        if record.focused {
            target = target.focused();
        }
        target
    }

    async fn sessions(&self) -> anyhow::Result<Vec<Target>> {
        if !self.is_running().await {
            return Ok(Vec::new());
        }
        let ScriptOutput::Ok(output) = run_applescript(ENUMERATE_SCRIPT, self.timeout).await?
        else {
            return Ok(Vec::new());
        };

        Ok(Self::parse_sessions(&output)
            .iter()
            .zip(1..)
            .map(|(record, ordinal)| Self::session_target(ordinal, record))
            .collect())
    }
}

impl Default for ITerm2Adapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetAdapter for ITerm2Adapter {
    fn kind(&self) -> BackendKind {
        BackendKind::ITerm2
    }

    fn script_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn is_running(&self) -> bool {
        is_process_running("iTerm2", self.timeout).await
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<Target>> {
        self.sessions().await
    }

    async fn focused_target(&self) -> anyhow::Result<Focus> {
        let sessions = self.sessions().await?;
        Ok(sessions.into_iter().find(|t| t.is_focused).map_or(Focus::NoneFocused, Focus::Target))
    }

    async fn send(
        &self,
        target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()> {
        let session_id = target
            .data("session_id")
            .ok_or_else(|| anyhow::anyhow!("target {} has no session id", target.id))?;
        let session_id = applescript_escape(session_id);
        let text = applescript_escape(payload.text());
        let newline = if append_newline { "" } else { " newline NO" };

        let script = format!(
            r#"tell application "iTerm2"
    repeat with w in windows
        repeat with t in tabs of w
            repeat with s in sessions of t
                if unique id of s is "{session_id}" then
                    tell s to write text "{text}"{newline}
                    return "ok"
                end if
            end repeat
        end repeat
    end repeat
    error "session {session_id} not found"
end tell"#
        );

        run_action(&script, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sessions() {
        let output = "w0t0p0:AAA|1|zsh|api\nw0t1p0:BBB|0|ssh|prod | eu\n|0||orphan\n";
        let sessions = ITerm2Adapter::parse_sessions(output);
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].focused);
        assert_eq!(sessions[0].name, "api");
        assert_eq!(sessions[1].job, "ssh");
        assert_eq!(sessions[1].name, "prod | eu");
    }

    #[test]
    fn test_session_target() {
        let record = SessionRecord {
            id: "w0t1p0:BBB".to_string(),
            focused: false,
            job: "ssh".to_string(),
            name: String::new(),
        };
        let target = ITerm2Adapter::session_target(2, &record);
        assert_eq!(target.id, "iTerm2:w0t1p0:BBB");
        assert_eq!(target.title, "iTerm2 Session");
        assert_eq!(target.data("session_id"), Some("w0t1p0:BBB"));
        assert_eq!(target.display_name(), "iTerm2 2");
        assert!(target.is_remote());
        assert!(!target.is_focused);
    }
}
