//! Command safety validation.
//!
//! A case-insensitive substring denylist. Remote sessions get a second,
//! stricter list on top of the base one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::RouteTarget;

/// One denylist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerRule {
    /// Pattern as written
    pub pattern: String,
    needle: String,
}

impl DangerRule {
    fn new(pattern: &str) -> Self {
        Self { pattern: pattern.to_string(), needle: pattern.to_lowercase() }
    }

    /// Whether a lowercased command contains this pattern.
    pub fn matches(&self, lowered: &str) -> bool {
        lowered.contains(&self.needle)
    }
}

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Whether the command may be sent without confirmation
    pub is_safe: bool,

    /// Human-readable warning, empty when safe
    pub warning: String,

    /// Pattern that triggered the warning
    pub matched: Option<String>,
}

impl SafetyVerdict {
    /// A passing verdict.
    pub fn safe() -> Self {
        Self { is_safe: true, warning: String::new(), matched: None }
    }

    fn flagged(warning: String, pattern: &str) -> Self {
        Self { is_safe: false, warning, matched: Some(pattern.to_string()) }
    }
}

impl fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_safe {
            f.write_str("safe")
        } else {
            f.write_str(&self.warning)
        }
    }
}

/// Checks commands against the denylists.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    /// Checked for every target
    dangerous_patterns: Vec<DangerRule>,

    /// Checked for remote sessions only
    remote_patterns: Vec<DangerRule>,
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandValidator {
    /// Create a validator with the default rules.
    pub fn new() -> Self {
        let dangerous_patterns = vec![
            DangerRule::new("rm -rf /"),
            DangerRule::new("sudo rm -rf"),
            DangerRule::new("format"),
            DangerRule::new("mkfs"),
            DangerRule::new("> /dev/sda"),
            DangerRule::new("dd if="),
            DangerRule::new("chmod -R 777 /"),
        ];

        let remote_patterns = vec![
            DangerRule::new("rm -rf"),
            DangerRule::new("sudo"),
            DangerRule::new("chmod -R"),
            DangerRule::new("chown -R"),
        ];

        Self { dangerous_patterns, remote_patterns }
    }

    /// Add a custom blocked pattern to the base list.
    #[must_use]
    pub fn with_blocked_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if !pattern.trim().is_empty() {
            self.dangerous_patterns.push(DangerRule::new(&pattern));
        }
        self
    }

    /// Add several custom blocked patterns.
    #[must_use]
    pub fn with_blocked_patterns<I, S>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        patterns.into_iter().fold(self, |validator, p| validator.with_blocked_pattern(p))
    }

    /// Base denylist.
    pub fn dangerous_patterns(&self) -> &[DangerRule] {
        &self.dangerous_patterns
    }

    /// Check a command. `remote` adds the remote-session list.
    pub fn validate(&self, command: &str, remote: bool) -> SafetyVerdict {
        let lowered = command.to_lowercase();

        if let Some(rule) = self.dangerous_patterns.iter().find(|r| r.matches(&lowered)) {
            return SafetyVerdict::flagged(
                format!("Dangerous command detected: {}", rule.pattern),
                &rule.pattern,
            );
        }

        if remote {
            if let Some(rule) = self.remote_patterns.iter().find(|r| r.matches(&lowered)) {
                return SafetyVerdict::flagged(
                    format!("Potentially dangerous command on remote session: {}", rule.pattern),
                    &rule.pattern,
                );
            }
        }

        SafetyVerdict::safe()
    }

    /// Check a command for a specific route target.
    pub fn validate_for(&self, command: &str, target: &RouteTarget) -> SafetyVerdict {
        let remote = target.target().is_some_and(|t| t.is_remote());
        self.validate(command, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BackendKind, Target, TargetInfo};

    fn remote_target() -> RouteTarget {
        RouteTarget::External(TargetInfo::new(
            Target::new(BackendKind::ITerm2, "prod", "prod").with_process("ssh"),
        ))
    }

    fn local_window() -> RouteTarget {
        RouteTarget::External(TargetInfo::new(Target::new(BackendKind::Terminal, 1, "zsh")))
    }

    #[test]
    fn test_safe_commands() {
        let validator = CommandValidator::new();
        for cmd in ["ls -la", "npm run build", "cargo test", "rm -rf ./target", "git status"] {
            assert!(validator.validate(cmd, false).is_safe, "{cmd} should be safe");
        }
    }

    #[test]
    fn test_dangerous_commands() {
        let validator = CommandValidator::new();
        for cmd in [
            "rm -rf /",
            "sudo rm -rf /var/log",
            "mkfs.ext4 /dev/sdb1",
            "echo x > /dev/sda",
            "dd if=/dev/zero of=/dev/disk2",
            "chmod -R 777 /",
            "diskutil eraseDisk FORMAT",
        ] {
            let verdict = validator.validate(cmd, false);
            assert!(!verdict.is_safe, "{cmd} should be flagged");
            assert!(verdict.warning.starts_with("Dangerous command detected: "));
        }
    }

    #[test]
    fn test_case_insensitive() {
        let validator = CommandValidator::new();
        assert!(!validator.validate("RM -RF /", false).is_safe);
        assert!(!validator.validate("CHMOD -R 777 /", false).is_safe);
        assert!(!validator.validate("chmod -r 777 /", false).is_safe);
    }

    #[test]
    fn test_remote_list_only_for_remote() {
        let validator = CommandValidator::new();

        let verdict = validator.validate_for("sudo apt update", &remote_target());
        assert!(!verdict.is_safe);
        assert_eq!(verdict.warning, "Potentially dangerous command on remote session: sudo");
        assert_eq!(verdict.matched.as_deref(), Some("sudo"));

        assert!(validator.validate_for("sudo apt update", &local_window()).is_safe);
        assert!(validator.validate_for("sudo apt update", &RouteTarget::Local).is_safe);
        assert!(!validator.validate_for("chown -R me .", &remote_target()).is_safe);
    }

    #[test]
    fn test_base_list_wins_on_remote() {
        let validator = CommandValidator::new();
        let verdict = validator.validate_for("sudo mkfs /dev/sdb", &remote_target());
        assert_eq!(verdict.matched.as_deref(), Some("mkfs"));
        assert!(verdict.warning.starts_with("Dangerous command detected"));
    }

    #[test]
    fn test_custom_blocked_pattern() {
        let validator = CommandValidator::new()
            .with_blocked_patterns(["git push --force", "  "])
            .with_blocked_pattern("DROP TABLE");

        assert_eq!(validator.dangerous_patterns().len(), 9);
        assert!(!validator.validate("git push --force origin main", false).is_safe);
        assert!(!validator.validate("psql -c 'drop table users'", false).is_safe);
        assert!(validator.validate("git push origin main", false).is_safe);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(SafetyVerdict::safe().to_string(), "safe");
        let verdict = CommandValidator::new().validate("mkfs /dev/sdb", false);
        assert_eq!(verdict.to_string(), "Dangerous command detected: mkfs");
    }
}
