//! Target registry.
//!
//! Aggregates every adapter into one cached snapshot of targets, owns the
//! alias table and the dispatch history, and resolves loose names to a
//! single target.
//!
//! The snapshot is an immutable `Arc` swapped in one step, so readers never
//! observe a half-applied refresh. Refreshes are serialised by an async
//! mutex; the parking_lot locks are only ever taken in the order
//! aliases, history, snapshot and never across an `.await`.

mod alias;
mod matching;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};

pub use alias::{normalize_alias, AliasTable};
pub use matching::{
    best_match, match_score, parse_number, parse_ordinal, resolve_name, suggest, MAX_SUGGESTIONS,
    SCORE_ALIAS, SCORE_EXACT, SCORE_PREFIX, SCORE_SUBSTRING,
};

use crate::backends::{default_adapters, Focus, TargetAdapter};
use crate::core::{
    BackendKind, Clock, Config, DispatchHistory, HistoryEntry, SystemClock, Target, TargetInfo,
    TargetStatus, DEFAULT_HISTORY_LIMIT,
};

/// Default freshness window of a snapshot.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Default bound for a single adapter call.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// One discovery cycle's worth of targets.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Targets in adapter registration order
    pub targets: Vec<TargetInfo>,

    /// When the snapshot was taken (`None` before the first refresh)
    pub refreshed_at: Option<Instant>,
}

impl Snapshot {
    /// Find a target by exact id.
    pub fn get(&self, id: &str) -> Option<&TargetInfo> {
        self.targets.iter().find(|t| t.id() == id)
    }
}

/// Registry of discoverable targets.
pub struct TargetRegistry {
    adapters: Vec<Arc<dyn TargetAdapter>>,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh_lock: tokio::sync::Mutex<()>,
    aliases: Mutex<AliasTable>,
    history: Mutex<DispatchHistory>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    adapter_timeout: Duration,
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("adapters", &self.adapters.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("refresh_interval", &self.refresh_interval)
            .field("adapter_timeout", &self.adapter_timeout)
            .finish_non_exhaustive()
    }
}

impl TargetRegistry {
    /// Create a registry over the given adapters, in registration order.
    pub fn new(adapters: Vec<Arc<dyn TargetAdapter>>) -> Self {
        Self {
            adapters,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            refresh_lock: tokio::sync::Mutex::new(()),
            aliases: Mutex::new(AliasTable::new()),
            history: Mutex::new(DispatchHistory::new(DEFAULT_HISTORY_LIMIT)),
            clock: Arc::new(SystemClock),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    /// Build a registry from configuration: enabled backends, timings,
    /// history limit, and persisted aliases.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.discovery.adapter_timeout();
        let registry = Self::new(default_adapters(&config.discovery.backends, timeout))
            .with_refresh_interval(config.discovery.refresh_interval())
            .with_adapter_timeout(timeout)
            .with_history_limit(config.router.history_limit);
        registry.restore_aliases(config.aliases.iter().map(|a| (a.name.clone(), a.target.clone())));
        registry
    }

    /// Set the snapshot freshness window.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the per-adapter-call timeout.
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Use a different time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the number of dispatches kept per target.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = Mutex::new(DispatchHistory::new(limit));
        self
    }

    /// Per-adapter-call timeout.
    pub fn adapter_timeout(&self) -> Duration {
        self.adapter_timeout
    }

    /// Registered adapters.
    pub fn adapters(&self) -> &[Arc<dyn TargetAdapter>] {
        &self.adapters
    }

    /// Adapter responsible for a backend kind.
    pub fn adapter_for(&self, kind: BackendKind) -> Option<Arc<dyn TargetAdapter>> {
        self.adapters.iter().find(|a| a.kind() == kind).cloned()
    }

    /// Current snapshot without refreshing.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// List targets, refreshing when forced or when the snapshot is stale.
    pub async fn available_targets(&self, force_refresh: bool) -> Vec<TargetInfo> {
        self.current_snapshot(force_refresh).await.targets.clone()
    }

    async fn current_snapshot(&self, force_refresh: bool) -> Arc<Snapshot> {
        if !force_refresh {
            if let Some(snapshot) = self.fresh_snapshot() {
                return snapshot;
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if !force_refresh {
            if let Some(snapshot) = self.fresh_snapshot() {
                return snapshot;
            }
        }

        self.refresh().await
    }

    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        let snapshot = self.snapshot();
        let refreshed_at = snapshot.refreshed_at?;
        let age = self.clock.now().saturating_duration_since(refreshed_at);
        (age < self.refresh_interval).then_some(snapshot)
    }

    async fn refresh(&self) -> Arc<Snapshot> {
        let timeout = self.adapter_timeout;
        let results = join_all(self.adapters.iter().map(|adapter| async move {
            (adapter, tokio::time::timeout(timeout, adapter.enumerate()).await)
        }))
        .await;

        let mut seen = HashSet::new();
        let mut discovered: Vec<Target> = Vec::new();
        for (adapter, result) in results {
            match result {
                Ok(Ok(targets)) => {
                    tracing::debug!(adapter = adapter.name(), count = targets.len(), "Enumerated");
                    for target in targets {
                        if seen.insert(target.id.clone()) {
                            discovered.push(target);
                        } else {
                            tracing::warn!(target_id = %target.id, "Duplicate target id skipped");
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(adapter = adapter.name(), error = %e, "Adapter failed");
                }
                Err(_) => {
                    tracing::warn!(adapter = adapter.name(), timeout = ?timeout, "Adapter timed out");
                }
            }
        }

        let aliases = self.aliases.lock();
        let history = self.history.lock();
        let targets: Vec<TargetInfo> = discovered
            .into_iter()
            .map(|mut target| {
                target.alias = aliases.alias_for(&target.id).map(str::to_string);
                let mut info = TargetInfo::new(target);
                info.history = history.get(info.id());
                info
            })
            .collect();

        tracing::info!(count = targets.len(), "Discovered targets");
        let snapshot = Arc::new(Snapshot { targets, refreshed_at: Some(self.clock.now()) });
        *self.snapshot.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Resolve a loose name to one target.
    pub async fn target_by_name(&self, name: &str) -> Option<TargetInfo> {
        if name.trim().is_empty() {
            return None;
        }
        let snapshot = self.current_snapshot(false).await;
        let aliases = self.aliases.lock();
        resolve_name(&snapshot.targets, &aliases, name).cloned()
    }

    /// Find a target by exact id in the current snapshot, refreshing if stale.
    pub async fn target_by_id(&self, id: &str) -> Option<TargetInfo> {
        self.current_snapshot(false).await.get(id).cloned()
    }

    /// Best candidates for a name that did not resolve.
    pub async fn suggestions(&self, query: &str) -> Vec<TargetInfo> {
        let snapshot = self.current_snapshot(false).await;
        suggest(&snapshot.targets, query).into_iter().cloned().collect()
    }

    /// Give a target a custom name.
    ///
    /// Returns `false` for an unknown id or an empty or reserved alias.
    pub async fn set_alias(&self, id: &str, alias: &str) -> bool {
        if normalize_alias(alias).is_none() {
            return false;
        }
        if self.current_snapshot(false).await.get(id).is_none() {
            tracing::debug!(target_id = %id, "Alias for unknown target rejected");
            return false;
        }

        let mut aliases = self.aliases.lock();
        let Some(stored) = aliases.set(id, alias) else {
            return false;
        };
        self.reapply_aliases(&aliases);
        tracing::info!(target_id = %id, alias = %stored, "Alias set");
        true
    }

    /// Remove an alias. Returns `false` if it did not exist.
    pub fn remove_alias(&self, alias: &str) -> bool {
        let mut aliases = self.aliases.lock();
        let Some(id) = aliases.remove(alias) else {
            return false;
        };
        self.reapply_aliases(&aliases);
        tracing::info!(target_id = %id, alias = %alias.trim(), "Alias removed");
        true
    }

    /// All `(alias, id)` pairs, sorted by alias.
    pub fn aliases(&self) -> Vec<(String, String)> {
        self.aliases.lock().entries()
    }

    /// Load persisted aliases. Ids need not be live.
    pub fn restore_aliases<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut aliases = self.aliases.lock();
        for (alias, id) in entries {
            if aliases.set(&id, &alias).is_none() {
                tracing::warn!(alias = %alias, "Ignoring invalid persisted alias");
            }
        }
        self.reapply_aliases(&aliases);
    }

    fn reapply_aliases(&self, aliases: &AliasTable) {
        self.update_snapshot(|snapshot| {
            for info in &mut snapshot.targets {
                info.target.alias = aliases.alias_for(info.id()).map(str::to_string);
            }
        });
    }

    fn update_snapshot(&self, apply: impl FnOnce(&mut Snapshot)) {
        let mut current = self.snapshot.write();
        let mut next = Snapshot::clone(&current);
        apply(&mut next);
        *current = Arc::new(next);
    }

    /// Ask adapters in order for the focused target.
    pub async fn focused_target(&self) -> Option<TargetInfo> {
        for adapter in &self.adapters {
            match tokio::time::timeout(self.adapter_timeout, adapter.focused_target()).await {
                Ok(Ok(Focus::Target(target))) => {
                    if let Some(info) = self.target_by_id(&target.id).await {
                        return Some(info);
                    }
                    let mut target = target;
                    target.alias = self.aliases.lock().alias_for(&target.id).map(str::to_string);
                    return Some(TargetInfo::new(target));
                }
                Ok(Ok(Focus::NoneFocused | Focus::Unsupported)) => {}
                Ok(Err(e)) => {
                    tracing::debug!(adapter = adapter.name(), error = %e, "Focus query failed");
                }
                Err(_) => {
                    tracing::debug!(adapter = adapter.name(), "Focus query timed out");
                }
            }
        }
        None
    }

    /// Record a dispatch against a target id.
    pub fn record_dispatch(&self, id: &str, entry: HistoryEntry) {
        let mut history = self.history.lock();
        history.push(id, entry);
        let entries = history.get(id);
        self.update_snapshot(|snapshot| {
            if let Some(info) = snapshot.targets.iter_mut().find(|t| t.id() == id) {
                info.history = entries;
            }
        });
    }

    /// Dispatch history of a target, oldest first.
    pub fn history(&self, id: &str) -> Vec<HistoryEntry> {
        self.history.lock().get(id)
    }

    /// Total recorded dispatches.
    pub fn history_size(&self) -> usize {
        self.history.lock().total()
    }

    /// Update the last known status of a target.
    pub fn mark_status(&self, id: &str, status: TargetStatus) {
        self.update_snapshot(|snapshot| {
            if let Some(info) = snapshot.targets.iter_mut().find(|t| t.id() == id) {
                info.status = status;
            }
        });
    }
}
