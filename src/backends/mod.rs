//! Discovery adapters.
//!
//! Each adapter knows how to enumerate the targets of one host application
//! and how to deliver text into them. The registry only ever talks to the
//! [`TargetAdapter`] trait.

pub mod applescript;
mod iterm2;
mod memory;
mod terminal_app;
mod vscode;
mod warp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use iterm2::ITerm2Adapter;
pub use memory::{MemoryAdapter, SentPayload};
pub use terminal_app::TerminalAppAdapter;
pub use vscode::VsCodeAdapter;
pub use warp::WarpAdapter;

use crate::core::{BackendKind, Payload, Target};

/// Answer to "which target has focus?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// The backend cannot tell
    Unsupported,
    /// The backend is up but nothing of it is focused
    NoneFocused,
    /// This target is focused
    Target(Target),
}

/// Trait for host-application backends.
///
/// Implementations must be cheap to share across tasks; the registry holds
/// them behind `Arc` and calls them concurrently.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    /// Kind of application this adapter drives.
    fn kind(&self) -> BackendKind;

    /// Adapter name for logs.
    fn name(&self) -> &str {
        self.kind().app_name()
    }

    /// Per-script timeout, for adapters that shell out to a scripting host.
    fn script_timeout(&self) -> Option<Duration> {
        None
    }

    /// Whether the host application is running.
    async fn is_running(&self) -> bool;

    /// List current targets.
    ///
    /// Returns an empty list when the application is not running. Errors are
    /// reserved for unexpected transport failures.
    async fn enumerate(&self) -> anyhow::Result<Vec<Target>>;

    /// The focused target, if the backend can tell.
    async fn focused_target(&self) -> anyhow::Result<Focus> {
        Ok(Focus::Unsupported)
    }

    /// Deliver a payload to a target previously returned by `enumerate`.
    async fn send(
        &self,
        target: &Target,
        payload: &Payload,
        append_newline: bool,
    ) -> anyhow::Result<()>;
}

/// Build the adapter for a backend kind, if one exists.
pub fn adapter_for_kind(kind: BackendKind, timeout: Duration) -> Option<Arc<dyn TargetAdapter>> {
    match kind {
        BackendKind::Terminal => Some(Arc::new(TerminalAppAdapter::new().with_timeout(timeout))),
        BackendKind::ITerm2 => Some(Arc::new(ITerm2Adapter::new().with_timeout(timeout))),
        BackendKind::VsCode => Some(Arc::new(VsCodeAdapter::new().with_timeout(timeout))),
        BackendKind::Warp => Some(Arc::new(WarpAdapter::new().with_timeout(timeout))),
        BackendKind::Alacritty | BackendKind::Kitty | BackendKind::Hyper | BackendKind::Unknown => {
            None
        }
    }
}

/// Build the enabled adapters from config keys, keeping their order.
///
/// Every adapter gets `timeout` as its per-script timeout. Unknown keys and
/// kinds without an adapter are skipped with a warning.
pub fn default_adapters(enabled: &[String], timeout: Duration) -> Vec<Arc<dyn TargetAdapter>> {
    let mut seen = Vec::new();
    let mut adapters = Vec::new();

    for key in enabled {
        let Some(kind) = BackendKind::from_config_key(key) else {
            tracing::warn!(backend = %key, "Unknown backend in configuration");
            continue;
        };
        if seen.contains(&kind) {
            continue;
        }
        seen.push(kind);

        match adapter_for_kind(kind, timeout) {
            Some(adapter) => {
                tracing::debug!(
                    backend = %kind,
                    timeout_ms = ?adapter.script_timeout().map(|t| t.as_millis()),
                    "Adapter enabled"
                );
                adapters.push(adapter);
            }
            None => tracing::warn!(backend = %kind, "No adapter available for backend"),
        }
    }

    adapters
}
