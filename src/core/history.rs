//! Dispatch history.
//!
//! Tracks what was sent to each target, keeping only the most recent
//! entries per target id.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries kept per target.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// What gets delivered to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// A command line for the target's shell
    Command(String),
    /// Raw text typed into the target
    Text(String),
}

impl Payload {
    /// The payload kind.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Command(_) => PayloadKind::Command,
            Self::Text(_) => PayloadKind::Text,
        }
    }

    /// The text being delivered.
    pub fn text(&self) -> &str {
        match self {
            Self::Command(text) | Self::Text(text) => text,
        }
    }
}

/// Kind of payload recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Shell command
    Command,
    /// Raw text
    Text,
}

/// A single dispatch record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Command or text
    pub kind: PayloadKind,
    /// What was sent
    pub text: String,
    /// When it was sent
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(kind: PayloadKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), timestamp: Utc::now() }
    }

    /// Record a payload.
    pub fn from_payload(payload: &Payload) -> Self {
        Self::new(payload.kind(), payload.text())
    }

    /// Create a command entry.
    pub fn command(text: impl Into<String>) -> Self {
        Self::new(PayloadKind::Command, text)
    }

    /// Create a raw-text entry.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PayloadKind::Text, text)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self.timestamp.format("%H:%M:%S");
        match self.kind {
            PayloadKind::Command => write!(f, "{stamp} {}", self.text),
            PayloadKind::Text => write!(f, "{stamp} [TEXT] {}", self.text),
        }
    }
}

/// Per-target dispatch history with FIFO eviction.
#[derive(Debug, Clone)]
pub struct DispatchHistory {
    /// Entries keyed by target id, oldest first
    entries: HashMap<String, VecDeque<HistoryEntry>>,
    /// Maximum entries kept per target
    limit: usize,
}

impl DispatchHistory {
    /// Create a history with the given per-target limit.
    pub fn new(limit: usize) -> Self {
        Self { entries: HashMap::new(), limit: limit.max(1) }
    }

    /// Per-target limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append an entry, dropping the oldest ones beyond the limit.
    pub fn push(&mut self, target_id: &str, entry: HistoryEntry) {
        let log = self.entries.entry(target_id.to_string()).or_default();
        log.push_back(entry);
        while log.len() > self.limit {
            log.pop_front();
        }
    }

    /// Copy of the entries for a target, oldest first.
    pub fn get(&self, target_id: &str) -> Vec<HistoryEntry> {
        self.entries.get(target_id).map(|log| log.iter().cloned().collect()).unwrap_or_default()
    }

    /// Total number of entries across all targets.
    pub fn total(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }
}

impl Default for DispatchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut history = DispatchHistory::default();
        history.push("Terminal:1", HistoryEntry::command("ls"));
        history.push("Terminal:1", HistoryEntry::text("hello"));

        let entries = history.get("Terminal:1");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "ls");
        assert_eq!(entries[1].kind, PayloadKind::Text);
        assert!(history.get("Terminal:2").is_empty());
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = DispatchHistory::new(50);
        for i in 0..60 {
            history.push("Warp:1", HistoryEntry::command(format!("echo {i}")));
        }

        let entries = history.get("Warp:1");
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].text, "echo 10");
        assert_eq!(entries[49].text, "echo 59");
    }

    #[test]
    fn test_get_returns_copy() {
        let mut history = DispatchHistory::default();
        history.push("a", HistoryEntry::command("one"));

        let mut copy = history.get("a");
        copy.clear();
        assert_eq!(history.get("a").len(), 1);
    }

    #[test]
    fn test_total_counts_every_target() {
        let mut history = DispatchHistory::default();
        history.push("a", HistoryEntry::command("one"));
        history.push("b", HistoryEntry::command("two"));
        history.push("b", HistoryEntry::command("three"));
        assert_eq!(history.total(), 3);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let mut history = DispatchHistory::new(0);
        history.push("a", HistoryEntry::command("one"));
        history.push("a", HistoryEntry::command("two"));
        assert_eq!(history.limit(), 1);
        assert_eq!(history.get("a")[0].text, "two");
    }

    #[test]
    fn test_entry_display() {
        let entry = HistoryEntry::text("hello");
        assert!(entry.to_string().ends_with("[TEXT] hello"));
        assert_eq!(HistoryEntry::from_payload(&Payload::Command("ls".into())).kind, PayloadKind::Command);
    }
}
