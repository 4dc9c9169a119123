//! Security module for termroute.
//!
//! Screens commands before they are sent to another window. Flagged
//! commands are not refused outright; the router asks for confirmation.

mod validation;

pub use validation::{CommandValidator, DangerRule, SafetyVerdict};

use crate::core::SafetyConfig;

/// Build a validator from the `[safety]` config section.
pub fn validator_from_config(config: &SafetyConfig) -> CommandValidator {
    CommandValidator::new().with_blocked_patterns(config.blocked_patterns.iter().cloned())
}
