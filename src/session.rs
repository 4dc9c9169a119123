//! Interactive sessions.
//!
//! Turns free-form utterances ("switch to warp", "in terminal 2, ls",
//! "send yes to api") into router calls and plain-text replies. Speech
//! front-ends and the REPL both sit on top of this.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::LocalExecutor;
use crate::router::{split_contextual, CommandRouter, RouteError, RouteOutcome};

static SEND_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:send|type|say|write)\s+(?P<text>.+?)\s+to\s+(?P<target>\S.*?)\s*$")
        .expect("send-text pattern is valid")
});

const EXIT_PHRASES: [&str; 6] = ["exit", "quit", "goodbye", "sleep", "go to sleep", "stop listening"];
const LIST_PHRASES: [&str; 4] =
    ["list terminals", "show terminals", "available terminals", "list targets"];
const STATUS_PHRASES: [&str; 3] = ["status", "where am i", "current target"];

/// What an utterance asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// End the session
    Exit,
    /// List discovered targets
    ListTargets,
    /// Show the routing status
    Status,
    /// Change the current target
    SwitchTarget(String),
    /// "in X, do Y"
    Contextual {
        /// Target phrase as spoken
        target: String,
        /// Command to run there
        command: String,
    },
    /// Type raw text into a named target
    SendText {
        /// Text to type
        text: String,
        /// Target phrase
        target: String,
    },
    /// Anything else is a command for the current target
    Command(String),
}

impl Intent {
    /// Classify an utterance. Blank input yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let lower = input.to_lowercase();

        if EXIT_PHRASES.contains(&lower.as_str()) {
            return Some(Self::Exit);
        }
        if LIST_PHRASES.contains(&lower.as_str()) {
            return Some(Self::ListTargets);
        }
        if STATUS_PHRASES.contains(&lower.as_str()) {
            return Some(Self::Status);
        }
        for prefix in ["switch to ", "use "] {
            if lower.starts_with(prefix) {
                let target = input[prefix.len()..].trim();
                if !target.is_empty() {
                    return Some(Self::SwitchTarget(target.to_string()));
                }
            }
        }
        if let Some((target, command)) = split_contextual(input) {
            return Some(Self::Contextual { target, command });
        }
        if let Some(caps) = SEND_TEXT_RE.captures(input) {
            return Some(Self::SendText {
                text: caps["text"].to_string(),
                target: caps["target"].to_string(),
            });
        }

        Some(Self::Command(input.to_string()))
    }
}

/// A flagged command waiting for a yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    /// The command
    pub command: String,
    /// Target id, `None` for local
    pub target_id: Option<String>,
    /// Where it would go, for the prompt
    pub display_name: String,
    /// Why it was flagged
    pub warning: String,
}

/// Session reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to show or speak
    pub text: String,
    /// Set when the command needs confirmation
    pub pending: Option<PendingCommand>,
    /// Set when the session should end
    pub exit: bool,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self { text: text.into(), pending: None, exit: false }
    }

    fn confirm(pending: PendingCommand) -> Self {
        let text = format!(
            "{}. Run '{}' in {}?",
            pending.warning, pending.command, pending.display_name
        );
        Self { text, pending: Some(pending), exit: false }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Drives the router from utterances.
#[derive(Debug)]
pub struct Session {
    router: Arc<CommandRouter>,
    executor: LocalExecutor,
    confirm_local: bool,
}

impl Session {
    /// Create a session.
    pub fn new(router: Arc<CommandRouter>, executor: LocalExecutor) -> Self {
        Self { router, executor, confirm_local: true }
    }

    /// Whether flagged local commands need confirmation.
    pub fn with_confirm_local(mut self, confirm: bool) -> Self {
        self.confirm_local = confirm;
        self
    }

    /// The router behind this session.
    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Parse and handle one line of input.
    pub async fn handle_line(&self, input: &str) -> Option<Reply> {
        let intent = Intent::parse(input)?;
        Some(self.handle(intent).await)
    }

    /// Handle a parsed intent.
    pub async fn handle(&self, intent: Intent) -> Reply {
        tracing::debug!(?intent, "Handling intent");
        match intent {
            Intent::Exit => Reply { text: "Goodbye!".to_string(), pending: None, exit: true },
            Intent::ListTargets => self.list_targets().await,
            Intent::Status => {
                let status = self.router.status().await;
                Reply::say(format!(
                    "Current target: {} ({} terminals available)",
                    status.current, status.total_targets
                ))
            }
            Intent::SwitchTarget(name) => {
                if self.router.set_target(&name).await {
                    let current = self.router.current_target().await;
                    Reply::say(format!("Switched to {}", current.target))
                } else {
                    Reply::say(format!("Could not find terminal: {name}"))
                }
            }
            Intent::Contextual { target, command } => {
                let query = format!("in {target}, {command}");
                match self.router.parse_contextual(&query).await {
                    (Some(id), command) => self.route(&command, Some(&id)).await,
                    (None, _) => Reply::say(format!("Could not find terminal: {target}")),
                }
            }
            Intent::SendText { text, target } => {
                match self.router.send_raw_text(&text, Some(&target)).await {
                    Ok(message) => Reply::say(message),
                    Err(e) => Reply::say(describe_error(&e)),
                }
            }
            Intent::Command(command) => self.route(&command, None).await,
        }
    }

    /// Run a command the user confirmed.
    pub async fn confirm(&self, pending: &PendingCommand) -> Reply {
        match &pending.target_id {
            None => self.run_local(&pending.command).await,
            Some(id) => match self.router.route_confirmed(&pending.command, Some(id)).await {
                Ok(outcome) => self.finish(&pending.command, outcome).await,
                Err(e) => Reply::say(describe_error(&e)),
            },
        }
    }

    async fn route(&self, command: &str, target: Option<&str>) -> Reply {
        match self.router.route_command(command, target).await {
            Ok(outcome) => self.finish(command, outcome).await,
            Err(e) => Reply::say(describe_error(&e)),
        }
    }

    async fn finish(&self, command: &str, outcome: RouteOutcome) -> Reply {
        match outcome {
            RouteOutcome::Local { verdict, .. } => {
                if !verdict.is_safe && self.confirm_local {
                    return Reply::confirm(PendingCommand {
                        command: command.to_string(),
                        target_id: None,
                        display_name: "the local terminal".to_string(),
                        warning: verdict.warning,
                    });
                }
                self.run_local(command).await
            }
            RouteOutcome::NeedsConfirmation { target_id, display_name, warning } => {
                Reply::confirm(PendingCommand {
                    command: command.to_string(),
                    target_id: Some(target_id),
                    display_name,
                    warning,
                })
            }
            RouteOutcome::Dispatched { message, .. } => Reply::say(message),
        }
    }

    async fn run_local(&self, command: &str) -> Reply {
        match self.executor.execute(command).await {
            Ok(result) if result.timed_out => Reply::say(format!("Command timed out: {command}")),
            Ok(result) if result.success() => {
                let output = result.output();
                if output.is_empty() {
                    Reply::say("Command completed")
                } else {
                    Reply::say(output)
                }
            }
            Ok(result) => {
                let detail = result.output();
                let code = result.code().map_or_else(|| "?".to_string(), |c| c.to_string());
                Reply::say(format!("Command failed (exit {code}): {detail}"))
            }
            Err(e) => Reply::say(format!("Command failed: {e}")),
        }
    }

    async fn list_targets(&self) -> Reply {
        let targets = self.router.registry().available_targets(false).await;
        if targets.is_empty() {
            return Reply::say("No terminals found");
        }
        let listing: Vec<String> = targets
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t.target.display_name()))
            .collect();
        Reply::say(format!("Available terminals: {}", listing.join(", ")))
    }
}

/// User-facing text for a routing error.
pub fn describe_error(error: &RouteError) -> String {
    match error.suggestions() {
        [] => error.to_string(),
        suggestions => format!("{error}. Did you mean: {}?", suggestions.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MemoryAdapter, TargetAdapter};
    use crate::core::{BackendKind, Payload, Target};
    use crate::registry::TargetRegistry;

    fn setup() -> (Arc<MemoryAdapter>, Session) {
        let adapter = Arc::new(MemoryAdapter::new(BackendKind::Warp).with_targets(vec![
            Target::new(BackendKind::Warp, 1, "api").with_ordinal(1),
            Target::new(BackendKind::Warp, 2, "logs").with_ordinal(2),
        ]));
        let registry = Arc::new(TargetRegistry::new(vec![adapter.clone() as Arc<dyn TargetAdapter>]));
        let router = Arc::new(CommandRouter::new(registry));
        (adapter, Session::new(router, LocalExecutor::new()))
    }

    #[test]
    fn test_parse_intents() {
        assert_eq!(Intent::parse("   "), None);
        assert_eq!(Intent::parse("Goodbye"), Some(Intent::Exit));
        assert_eq!(Intent::parse("List Terminals"), Some(Intent::ListTargets));
        assert_eq!(Intent::parse("where am I"), Some(Intent::Status));
        assert_eq!(
            Intent::parse("Switch to Warp 2"),
            Some(Intent::SwitchTarget("Warp 2".to_string()))
        );
        assert_eq!(Intent::parse("use api"), Some(Intent::SwitchTarget("api".to_string())));
        assert_eq!(
            Intent::parse("in warp two, npm Test"),
            Some(Intent::Contextual {
                target: "warp two".to_string(),
                command: "npm Test".to_string()
            })
        );
        assert_eq!(
            Intent::parse("type Hello World to warp 1"),
            Some(Intent::SendText { text: "Hello World".to_string(), target: "warp 1".to_string() })
        );
        assert_eq!(Intent::parse("git status"), Some(Intent::Command("git status".to_string())));
    }

    #[test]
    fn test_send_needs_a_target() {
        assert_eq!(Intent::parse("send it"), Some(Intent::Command("send it".to_string())));
    }

    #[test]
    fn test_list_phrase_inside_command_is_a_command() {
        for line in ["grep \"list targets\" notes.md", "echo show terminals", "please list terminals"] {
            assert_eq!(Intent::parse(line), Some(Intent::Command(line.to_string())), "{line}");
        }
    }

    #[tokio::test]
    async fn test_command_mentioning_list_phrase_is_dispatched() {
        let (adapter, session) = setup();
        session.handle_line("switch to warp 1").await.unwrap();
        let reply = session.handle_line("echo list terminals").await.unwrap();
        assert_eq!(reply.text, "Command sent to Warp 1");
        assert_eq!(
            adapter.sent().last().map(|s| s.payload.clone()),
            Some(Payload::Command("echo list terminals".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_and_switch() {
        let (_adapter, session) = setup();
        let reply = session.handle_line("show terminals").await.unwrap();
        assert_eq!(reply.text, "Available terminals: 1. Warp 1, 2. Warp 2");

        let reply = session.handle_line("switch to warp two").await.unwrap();
        assert_eq!(reply.text, "Switched to Warp 2");

        let reply = session.handle_line("switch to emacs").await.unwrap();
        assert_eq!(reply.text, "Could not find terminal: emacs");

        let reply = session.handle_line("status").await.unwrap();
        assert_eq!(reply.text, "Current target: Warp 2 (2 terminals available)");
    }

    #[tokio::test]
    async fn test_contextual_dispatch() {
        let (adapter, session) = setup();
        let reply = session.handle_line("in warp one, cargo build").await.unwrap();
        assert_eq!(reply.text, "Command sent to Warp 1");
        assert_eq!(adapter.sent()[0].target_id, "Warp:1");

        let reply = session.handle_line("in emacs, ls").await.unwrap();
        assert_eq!(reply.text, "Could not find terminal: emacs");
    }

    #[tokio::test]
    async fn test_send_text() {
        let (adapter, session) = setup();
        let reply = session.handle_line("send yes to warp 2").await.unwrap();
        assert_eq!(reply.text, "Text sent to Warp 2: 'yes'");
        assert_eq!(adapter.sent()[0].payload, Payload::Text("yes".to_string()));
    }

    #[tokio::test]
    async fn test_remote_confirmation_round_trip() {
        let (adapter, session) = setup();
        session.handle_line("use warp 1").await.unwrap();

        let reply = session.handle_line("rm -rf /").await.unwrap();
        let pending = reply.pending.clone().unwrap();
        assert_eq!(pending.target_id.as_deref(), Some("Warp:1"));
        assert_eq!(pending.command, "rm -rf /");
        assert!(adapter.sent().is_empty());

        let reply = session.confirm(&pending).await;
        assert_eq!(reply.text, "Command sent to Warp 1");
        assert_eq!(adapter.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_local_dangerous_is_held() {
        let (_adapter, session) = setup();
        let reply = session.handle_line("mkfs /dev/sdb").await.unwrap();
        let pending = reply.pending.unwrap();
        assert!(pending.target_id.is_none());
        assert!(reply.text.starts_with("Dangerous command detected: mkfs"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_command_runs() {
        let (_adapter, session) = setup();
        let reply = session.handle_line("echo hello").await.unwrap();
        assert_eq!(reply.text, "hello");
        let reply = session.handle_line("true").await.unwrap();
        assert_eq!(reply.text, "Command completed");
    }

    #[tokio::test]
    async fn test_not_found_lists_suggestions() {
        let (_adapter, session) = setup();
        let reply = session.handle_line("send hi to wa").await.unwrap();
        assert_eq!(reply.text, "Text sent to Warp 1: 'hi'");

        let reply = session.handle_line("send hi to zebra").await.unwrap();
        assert_eq!(reply.text, "Terminal 'zebra' not found");
    }

    #[tokio::test]
    async fn test_exit() {
        let (_adapter, session) = setup();
        let reply = session.handle_line("quit").await.unwrap();
        assert!(reply.exit);
        assert_eq!(reply.to_string(), "Goodbye!");
    }
}
