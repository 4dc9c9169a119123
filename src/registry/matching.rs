//! Name resolution over a target snapshot.
//!
//! Resolution order, first hit wins:
//! 1. exact alias
//! 2. exact id
//! 3. best fuzzy score
//! 4. ordinal phrase ("terminal 2", "warp #3")
//! 5. backend-kind synonym ("vs code", "iterm")

use once_cell::sync::Lazy;
use regex::Regex;

use super::alias::AliasTable;
use crate::core::{BackendKind, TargetInfo};

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// Exact match of a name field.
pub const SCORE_EXACT: u32 = 100;
/// Query contained in the alias.
pub const SCORE_ALIAS: u32 = 90;
/// Name field starts with the query.
pub const SCORE_PREFIX: u32 = 80;
/// Name field contains the query.
pub const SCORE_SUBSTRING: u32 = 60;

static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<kind>.+?)\s*(?:#|no\.?\s*|number\s+)?(?P<num>\d+|one|two|three|four|five|six|seven|eight|nine|ten)$",
    )
    .expect("ordinal pattern is valid")
});

/// Parse a spoken or written number word.
pub fn parse_number(word: &str) -> Option<u32> {
    let n = match word.to_lowercase().as_str() {
        "one" | "first" => 1,
        "two" | "second" => 2,
        "three" | "third" => 3,
        "four" | "fourth" => 4,
        "five" | "fifth" => 5,
        "six" | "sixth" => 6,
        "seven" | "seventh" => 7,
        "eight" | "eighth" => 8,
        "nine" | "ninth" => 9,
        "ten" | "tenth" => 10,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

/// Split "terminal 2" into a backend kind and an ordinal.
pub fn parse_ordinal(name: &str) -> Option<(BackendKind, u32)> {
    let caps = ORDINAL_RE.captures(name.trim())?;
    let kind = BackendKind::from_phrase(&caps["kind"])?;
    let number = parse_number(&caps["num"])?;
    Some((kind, number))
}

/// Score a target against a lowercased query. Zero means no match.
pub fn match_score(query: &str, info: &TargetInfo) -> u32 {
    if query.is_empty() {
        return 0;
    }
    let target = &info.target;
    let alias = target.alias.as_deref().map(str::to_lowercase);

    let mut fields = vec![
        target.display_name().to_lowercase(),
        target.backend_name.to_lowercase(),
        target.title.to_lowercase(),
    ];
    if let Some(ordinal) = target.ordinal {
        fields.push(format!("{} {}", target.backend_name, ordinal).to_lowercase());
    }

    if fields.iter().any(|f| f == query) {
        SCORE_EXACT
    } else if alias.as_deref().is_some_and(|a| a.contains(query)) {
        SCORE_ALIAS
    } else if fields.iter().any(|f| f.starts_with(query)) {
        SCORE_PREFIX
    } else if fields.iter().any(|f| f.contains(query)) {
        SCORE_SUBSTRING
    } else {
        0
    }
}

/// Highest scoring target; ties go to the earlier one.
pub fn best_match<'a>(targets: &'a [TargetInfo], query: &str) -> Option<&'a TargetInfo> {
    let query = query.trim().to_lowercase();
    let mut best: Option<(&TargetInfo, u32)> = None;

    for info in targets {
        let score = match_score(&query, info);
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((info, score));
        }
    }

    best.map(|(info, _)| info)
}

/// Resolve a name against a snapshot.
pub fn resolve_name<'a>(
    targets: &'a [TargetInfo],
    aliases: &AliasTable,
    name: &str,
) -> Option<&'a TargetInfo> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    if let Some(id) = aliases.id_for(name) {
        if let Some(info) = targets.iter().find(|t| t.id() == id) {
            return Some(info);
        }
    }

    if let Some(info) = targets.iter().find(|t| t.id().eq_ignore_ascii_case(name)) {
        return Some(info);
    }

    if let Some(info) = best_match(targets, name) {
        return Some(info);
    }

    if let Some((kind, number)) = parse_ordinal(name) {
        if let Some(info) = targets
            .iter()
            .find(|t| t.target.backend_kind == kind && t.target.ordinal == Some(number))
        {
            return Some(info);
        }
    }

    let kind = BackendKind::from_phrase(name)?;
    targets.iter().find(|t| t.target.backend_kind == kind)
}

/// Top suggestions for a query, best first.
pub fn suggest<'a>(targets: &'a [TargetInfo], query: &str) -> Vec<&'a TargetInfo> {
    let query = query.trim().to_lowercase();
    let mut scored: Vec<(u32, &TargetInfo)> = targets
        .iter()
        .map(|info| (match_score(&query, info), info))
        .filter(|(score, _)| *score > 0)
        .collect();

    // stable: equal scores keep discovery order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, info)| info).collect()
}
