//! Core types and functionality for termroute.
//!
//! This module contains the fundamental data structures used throughout
//! the application: targets, dispatch history, configuration, the clock,
//! and local execution.

mod clock;
mod config;
mod executor;
mod history;
mod target;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AliasConfig, Config, DiscoveryConfig, LocalConfig, RouterConfig, SafetyConfig,
    LOCAL_CONFIG_FILE,
};
pub use executor::{ExecutionResult, LocalExecutor, DEFAULT_LOCAL_TIMEOUT};
pub use history::{DispatchHistory, HistoryEntry, Payload, PayloadKind, DEFAULT_HISTORY_LIMIT};
pub use target::{
    is_local_keyword, BackendKind, RouteTarget, Target, TargetInfo, TargetStatus, LOCAL_KEYWORDS,
};
