//! Command routing.
//!
//! Decides whether a command runs in the caller's own shell or is delivered
//! to a discovered target, gates dangerous commands behind confirmation,
//! and records what was sent.

mod contextual;
mod error;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

pub use contextual::{phrase_candidates, split_contextual, synonym_for, TARGET_SYNONYMS};
pub use error::{RouteError, RouteResult};

use crate::core::{
    is_local_keyword, Config, HistoryEntry, Payload, RouteTarget, TargetInfo, TargetStatus,
};
use crate::registry::TargetRegistry;
use crate::security::{validator_from_config, CommandValidator, SafetyVerdict};

/// The current target plus what it replaced, if it went stale.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentTarget {
    /// Where commands go now
    pub target: RouteTarget,

    /// Id of the target that vanished and was replaced by local
    pub fallback_from: Option<String>,
}

/// What `route_command` decided.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Run the command in the caller's own shell.
    Local {
        /// The command to run
        command: String,
        /// Safety check for the local command
        verdict: SafetyVerdict,
    },

    /// The command was flagged and needs explicit confirmation.
    NeedsConfirmation {
        /// Target the command was aimed at
        target_id: String,
        /// Target display name
        display_name: String,
        /// Why it was flagged
        warning: String,
    },

    /// The command was delivered.
    Dispatched {
        /// Target it was sent to
        target_id: String,
        /// Human-readable status
        message: String,
    },
}

/// Routing summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterStatus {
    /// Current target display name
    pub current: String,

    /// "local" plus every target display name
    pub available: Vec<String>,

    /// Number of discovered targets
    pub total_targets: usize,

    /// Total recorded dispatches
    pub history_size: usize,
}

/// Routes commands and text to targets.
#[derive(Debug)]
pub struct CommandRouter {
    registry: Arc<TargetRegistry>,
    validator: CommandValidator,
    current: Mutex<Option<String>>,
    confirm_dangerous: bool,
    press_enter_after_text: bool,
}

impl CommandRouter {
    /// Create a router with local as the current target.
    pub fn new(registry: Arc<TargetRegistry>) -> Self {
        Self {
            registry,
            validator: CommandValidator::new(),
            current: Mutex::new(None),
            confirm_dangerous: true,
            press_enter_after_text: true,
        }
    }

    /// Build a router from the `[router]` and `[safety]` config sections.
    pub fn from_config(registry: Arc<TargetRegistry>, config: &Config) -> Self {
        Self::new(registry)
            .with_validator(validator_from_config(&config.safety))
            .with_confirm_dangerous(config.router.confirm_dangerous)
            .with_press_enter(config.router.press_enter_after_text)
    }

    /// Use a different validator.
    pub fn with_validator(mut self, validator: CommandValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Whether flagged commands need confirmation.
    pub fn with_confirm_dangerous(mut self, confirm: bool) -> Self {
        self.confirm_dangerous = confirm;
        self
    }

    /// Whether raw text is followed by Enter.
    pub fn with_press_enter(mut self, press_enter: bool) -> Self {
        self.press_enter_after_text = press_enter;
        self
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Select the current target. Local keywords always succeed.
    pub async fn set_target(&self, name: &str) -> bool {
        if is_local_keyword(name) {
            *self.current.lock() = None;
            tracing::info!("Target set to local");
            return true;
        }

        match self.registry.target_by_name(name).await {
            Some(info) => {
                tracing::info!(target_id = %info.id(), name = %info.target.display_name(), "Target set");
                *self.current.lock() = Some(info.id().to_string());
                true
            }
            None => {
                tracing::warn!(name, "Target not found");
                false
            }
        }
    }

    /// Resolve the current target against the live snapshot.
    ///
    /// A target that has disappeared resets the selection to local.
    pub async fn current_target(&self) -> CurrentTarget {
        let Some(id) = self.current.lock().clone() else {
            return CurrentTarget { target: RouteTarget::Local, fallback_from: None };
        };

        if let Some(info) = self.registry.target_by_id(&id).await {
            return CurrentTarget { target: RouteTarget::External(info), fallback_from: None };
        }

        {
            let mut current = self.current.lock();
            if current.as_deref() == Some(id.as_str()) {
                *current = None;
            }
        }
        tracing::warn!(target_id = %id, "Current target no longer exists, falling back to local");
        CurrentTarget { target: RouteTarget::Local, fallback_from: Some(id) }
    }

    /// Parse "in X, do Y" / "on X, do Y".
    ///
    /// Returns the resolved target id and the command, or `(None, query)`
    /// when the grammar does not match or the phrase names nothing.
    pub async fn parse_contextual(&self, query: &str) -> (Option<String>, String) {
        let Some((phrase, command)) = split_contextual(query) else {
            return (None, query.to_string());
        };

        for candidate in phrase_candidates(&phrase) {
            if let Some(info) = self.registry.target_by_name(&candidate).await {
                tracing::debug!(phrase = %phrase, target_id = %info.id(), "Contextual target");
                return (Some(info.id().to_string()), command);
            }
        }

        (None, query.to_string())
    }

    /// Route a command to an explicit target or the current one.
    pub async fn route_command(
        &self,
        command: &str,
        explicit_target: Option<&str>,
    ) -> RouteResult<RouteOutcome> {
        self.route(command, explicit_target, false).await
    }

    /// Route a command the user already confirmed.
    pub async fn route_confirmed(
        &self,
        command: &str,
        explicit_target: Option<&str>,
    ) -> RouteResult<RouteOutcome> {
        self.route(command, explicit_target, true).await
    }

    async fn route(
        &self,
        command: &str,
        explicit_target: Option<&str>,
        confirmed: bool,
    ) -> RouteResult<RouteOutcome> {
        let route_target = self.resolve(explicit_target).await?;
        let verdict = self.validate_command(command, &route_target);

        let info = match route_target {
            RouteTarget::Local => {
                return Ok(RouteOutcome::Local { command: command.to_string(), verdict });
            }
            RouteTarget::External(info) => info,
        };

        if !verdict.is_safe && !confirmed && self.confirm_dangerous {
            tracing::warn!(target_id = %info.id(), warning = %verdict.warning, "Confirmation required");
            return Ok(RouteOutcome::NeedsConfirmation {
                target_id: info.id().to_string(),
                display_name: info.target.display_name(),
                warning: verdict.warning,
            });
        }

        self.dispatch(&info, Payload::Command(command.to_string()), true).await?;
        Ok(RouteOutcome::Dispatched {
            target_id: info.id().to_string(),
            message: format!("Command sent to {}", info.target.display_name()),
        })
    }

    /// Type raw text into a target. No safety check is applied.
    pub async fn send_raw_text(
        &self,
        text: &str,
        explicit_target: Option<&str>,
    ) -> RouteResult<String> {
        let info = match self.resolve(explicit_target).await? {
            RouteTarget::Local => return Err(RouteError::LocalTextTarget),
            RouteTarget::External(info) => info,
        };

        self.dispatch(&info, Payload::Text(text.to_string()), self.press_enter_after_text).await?;
        Ok(format!("Text sent to {}: '{}'", info.target.display_name(), text))
    }

    async fn resolve(&self, explicit_target: Option<&str>) -> RouteResult<RouteTarget> {
        let Some(name) = explicit_target else {
            return Ok(self.current_target().await.target);
        };
        if is_local_keyword(name) {
            return Ok(RouteTarget::Local);
        }

        match self.registry.target_by_name(name).await {
            Some(info) => Ok(RouteTarget::External(info)),
            None => {
                let suggestions = self
                    .registry
                    .suggestions(name)
                    .await
                    .iter()
                    .map(|t| t.target.display_name())
                    .collect();
                Err(RouteError::NotFound { name: name.to_string(), suggestions })
            }
        }
    }

    async fn dispatch(
        &self,
        info: &TargetInfo,
        payload: Payload,
        append_newline: bool,
    ) -> RouteResult<()> {
        let target = &info.target;
        let display_name = target.display_name();
        let adapter = self.registry.adapter_for(target.backend_kind).ok_or_else(|| {
            RouteError::Unsupported { target: display_name.clone(), kind: target.backend_kind }
        })?;

        let timeout = self.registry.adapter_timeout();
        match tokio::time::timeout(timeout, adapter.send(target, &payload, append_newline)).await {
            Ok(Ok(())) => {
                self.registry.mark_status(info.id(), TargetStatus::Available);
                self.registry.record_dispatch(info.id(), HistoryEntry::from_payload(&payload));
                tracing::info!(target_id = %info.id(), kind = ?payload.kind(), "Dispatched");
                Ok(())
            }
            Ok(Err(e)) => {
                self.registry.mark_status(info.id(), TargetStatus::Unknown);
                tracing::warn!(target_id = %info.id(), error = %e, "Dispatch failed");
                Err(RouteError::DispatchFailed { target: display_name, detail: e.to_string() })
            }
            Err(_) => {
                self.registry.mark_status(info.id(), TargetStatus::Unknown);
                tracing::warn!(target_id = %info.id(), timeout = ?timeout, "Dispatch timed out");
                Err(RouteError::Timeout { target: display_name, timeout })
            }
        }
    }

    /// Check a command for a route target.
    pub fn validate_command(&self, command: &str, target: &RouteTarget) -> SafetyVerdict {
        self.validator.validate_for(command, target)
    }

    /// Record a dispatch by hand.
    pub fn add_to_history(&self, target_id: &str, entry: HistoryEntry) {
        self.registry.record_dispatch(target_id, entry);
    }

    /// Dispatch history of a target, oldest first.
    pub fn history(&self, target_id: &str) -> Vec<HistoryEntry> {
        self.registry.history(target_id)
    }

    /// "local" followed by every target's display name.
    pub async fn list_targets(&self) -> Vec<String> {
        let mut names = vec!["local".to_string()];
        names.extend(
            self.registry.available_targets(false).await.iter().map(|t| t.target.display_name()),
        );
        names
    }

    /// Summary of routing state.
    pub async fn status(&self) -> RouterStatus {
        let current = self.current_target().await.target.to_string();
        let available = self.list_targets().await;
        RouterStatus {
            current,
            total_targets: available.len() - 1,
            available,
            history_size: self.registry.history_size(),
        }
    }
}
