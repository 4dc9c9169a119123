#![allow(clippy::vec_init_then_push)]
#![allow(clippy::needless_collect)]
#![allow(clippy::format_push_string)]
#![allow(clippy::unused_self)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::unnecessary_filter_map)]
#![allow(clippy::unnecessary_lazy_evaluations)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::manual_strip)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::single_char_pattern)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::or_fun_call)]
#![allow(clippy::case_sensitive_file_extension_comparisons)]
#![allow(clippy::should_implement_trait)]

//! # Termroute
//!
//! Route shell commands and typed text to the terminal windows, tabs and
//! sessions already open on your machine.
//!
//! Termroute discovers targets across several terminal applications, lets
//! you name them ("api", "logs"), resolves loose spoken-style references
//! ("terminal two", "the main session") and delivers commands with a safety
//! gate in front of anything destructive.
//!
//! ## Features
//!
//! - **Discovery**: Terminal.app windows, iTerm2 sessions, the VS Code integrated terminal, Warp windows
//! - **Resolution**: Aliases, ids, fuzzy names, ordinals ("warp 2") and backend synonyms
//! - **Contextual grammar**: "in terminal 2, run the tests"
//! - **Safety**: Denylist with stricter rules for SSH sessions
//! - **History**: Bounded per-target dispatch log
//!
//! ## Quick Start
//!
//! ```bash
//! termroute list
//! termroute send --to "terminal 2" "cargo test"
//! termroute repl
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::redundant_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unnecessary_literal_bound)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::redundant_clone)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unnecessary_debug_formatting)]
#![allow(clippy::for_kv_map)]
#![allow(clippy::use_self)]
#![allow(clippy::ptr_arg)]

pub mod backends;
pub mod core;
pub mod registry;
pub mod router;
pub mod security;
pub mod session;

pub use backends::{default_adapters, Focus, MemoryAdapter, TargetAdapter};
pub use core::{
    BackendKind, Config, DispatchHistory, HistoryEntry, LocalExecutor, Payload, RouteTarget,
    Target, TargetInfo, TargetStatus,
};
pub use registry::{AliasTable, Snapshot, TargetRegistry};
pub use router::{CommandRouter, CurrentTarget, RouteError, RouteOutcome, RouteResult, RouterStatus};
pub use security::{CommandValidator, SafetyVerdict};
pub use session::{Intent, PendingCommand, Reply, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "termroute";
