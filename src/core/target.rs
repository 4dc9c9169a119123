//! Target data structures.
//!
//! Defines the `Target` snapshot produced by a discovery backend, the
//! registry-owned `TargetInfo` wrapper, and the per-call `RouteTarget`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::history::HistoryEntry;

/// Names that always mean "run it here" rather than in another window.
pub const LOCAL_KEYWORDS: [&str; 3] = ["local", "current", "here"];

/// Check whether a target name refers to local execution.
pub fn is_local_keyword(name: &str) -> bool {
    let name = name.trim();
    LOCAL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

/// Kind of host application a target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackendKind {
    /// macOS Terminal.app
    Terminal,
    /// iTerm2
    ITerm2,
    /// Visual Studio Code integrated terminal
    VsCode,
    /// Warp
    Warp,
    /// Alacritty
    Alacritty,
    /// Kitty
    Kitty,
    /// Hyper
    Hyper,
    /// Anything else
    Unknown,
}

impl BackendKind {
    /// All kinds in a stable order.
    pub const ALL: [Self; 8] = [
        Self::Terminal,
        Self::ITerm2,
        Self::VsCode,
        Self::Warp,
        Self::Alacritty,
        Self::Kitty,
        Self::Hyper,
        Self::Unknown,
    ];

    /// Application name as the OS reports it.
    pub fn app_name(&self) -> &'static str {
        match self {
            Self::Terminal => "Terminal",
            Self::ITerm2 => "iTerm2",
            Self::VsCode => "Visual Studio Code",
            Self::Warp => "Warp",
            Self::Alacritty => "Alacritty",
            Self::Kitty => "Kitty",
            Self::Hyper => "Hyper",
            Self::Unknown => "Unknown",
        }
    }

    /// Prefix used for target ids (`<prefix>:<local-key>`).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::VsCode => "VSCode",
            other => other.app_name(),
        }
    }

    /// Spoken or typed names that refer to this kind.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Terminal => &["terminal", "terminal app", "terminal.app", "mac terminal"],
            Self::ITerm2 => &["iterm", "iterm2", "iterm 2", "i term"],
            Self::VsCode => &["vscode", "vs code", "code", "visual studio code"],
            Self::Warp => &["warp", "warp terminal"],
            Self::Alacritty => &["alacritty"],
            Self::Kitty => &["kitty"],
            Self::Hyper => &["hyper"],
            Self::Unknown => &[],
        }
    }

    /// Look up a kind from a spoken or typed phrase.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|kind| kind.synonyms().contains(&phrase.as_str()))
    }

    /// Look up a kind from a configuration key (`terminal`, `iterm2`, ...).
    pub fn from_config_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "terminal" => Some(Self::Terminal),
            "iterm2" | "iterm" => Some(Self::ITerm2),
            "vscode" => Some(Self::VsCode),
            "warp" => Some(Self::Warp),
            "alacritty" => Some(Self::Alacritty),
            "kitty" => Some(Self::Kitty),
            "hyper" => Some(Self::Hyper),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_name())
    }
}

/// One discoverable destination: a window, tab, or session of a host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique identifier, `<backend>:<local-key>`
    pub id: String,

    /// Backend (application) name
    pub backend_name: String,

    /// Backend kind
    pub backend_kind: BackendKind,

    /// Raw display text from the backend
    pub title: String,

    /// User-assigned name
    pub alias: Option<String>,

    /// Whether the backend reported this target as focused
    pub is_focused: bool,

    /// Backend-specific addressing info, forwarded to the adapter untouched
    #[serde(default)]
    pub backend_data: BTreeMap<String, String>,

    /// Window or tab number
    pub ordinal: Option<u32>,

    /// Current working directory, when the backend knows it
    #[serde(default)]
    pub working_directory: Option<String>,

    /// Foreground process (zsh, ssh, ...), when the backend knows it
    #[serde(default)]
    pub process_name: Option<String>,
}

impl Target {
    /// Create a target for the given backend kind and local key.
    pub fn new(kind: BackendKind, local_key: impl fmt::Display, title: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", kind.id_prefix(), local_key),
            backend_name: kind.app_name().to_string(),
            backend_kind: kind,
            title: title.into(),
            alias: None,
            is_focused: false,
            backend_data: BTreeMap::new(),
            ordinal: None,
            working_directory: None,
            process_name: None,
        }
    }

    /// Set the window/tab number.
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Add a backend data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.backend_data.insert(key.into(), value.into());
        self
    }

    /// Mark as focused.
    pub fn focused(mut self) -> Self {
        self.is_focused = true;
        self
    }

    /// Set the foreground process name.
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process_name = Some(process.into());
        self
    }

    /// Human-readable name used in listings and spoken replies.
    pub fn display_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(ordinal) = self.ordinal {
            return format!("{} {}", self.backend_name, ordinal);
        }
        let title: String = self.title.chars().take(30).collect();
        format!("{} - {}", self.backend_name, title)
    }

    /// Whether this target is a remote (SSH-type) session.
    pub fn is_remote(&self) -> bool {
        let ssh_process = self
            .process_name
            .as_deref()
            .map(|p| p.to_lowercase().contains("ssh"))
            .unwrap_or(false);
        let flagged = self
            .backend_data
            .get("is_remote")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        ssh_process || flagged
    }

    /// Fetch a backend data value.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.backend_data.get(key).map(String::as_str)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.backend_name, self.title)?;
        if let Some(alias) = &self.alias {
            write!(f, " ({alias})")?;
        }
        Ok(())
    }
}

/// Availability of a target as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    /// Ready to receive input
    Available,
    /// Running something
    Busy,
    /// Gone away
    Disconnected,
    /// Last delivery failed or state not known
    Unknown,
}

impl TargetStatus {
    /// Lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Disconnected => "disconnected",
            Self::Unknown => "unknown",
        }
    }

    /// Single-character marker for listings.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Available => "+",
            Self::Busy => "~",
            Self::Disconnected => "x",
            Self::Unknown => "?",
        }
    }
}

/// Registry-owned view of a target for one discovery cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// The target snapshot
    pub target: Target,

    /// Last known status
    pub status: TargetStatus,

    /// Recent dispatches, oldest first
    pub history: Vec<HistoryEntry>,
}

impl TargetInfo {
    /// Wrap a freshly discovered target.
    pub fn new(target: Target) -> Self {
        Self { target, status: TargetStatus::Available, history: Vec::new() }
    }

    /// Shortcut for the target id.
    pub fn id(&self) -> &str {
        &self.target.id
    }
}

impl fmt::Display for TargetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.status.icon(), self.target.display_name(), self.status.label())
    }
}

/// Where a single routing call goes.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget {
    /// The caller's own shell
    Local,
    /// A discovered target
    External(TargetInfo),
}

impl RouteTarget {
    /// Whether this is local execution.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// The external target, if any.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::Local => None,
            Self::External(info) => Some(&info.target),
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local Terminal"),
            Self::External(info) => f.write_str(&info.target.display_name()),
        }
    }
}
