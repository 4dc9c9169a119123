//! The "in X, do Y" grammar.

use once_cell::sync::Lazy;
use regex::Regex;

static CONTEXTUAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:in|on)\s+(?P<target>[^,\s][^,]*?)\s*,\s*(?P<command>\S.*?)\s*$")
        .expect("contextual pattern is valid")
});

/// Spoken phrases mapped to names the registry can resolve.
pub const TARGET_SYNONYMS: &[(&str, &str)] = &[
    ("vs code", "vscode"),
    ("code", "vscode"),
    ("terminal one", "terminal 1"),
    ("terminal two", "terminal 2"),
    ("terminal three", "terminal 3"),
    ("iterm", "iterm2"),
    ("main session", "iterm2"),
    ("warp tab", "warp 1"),
    ("warp one", "warp 1"),
    ("warp two", "warp 2"),
    ("test tab", "warp 1"),
];

const FILLER_SUFFIXES: [&str; 3] = [" window", " tab", " session"];

/// Split "in X, do Y" into its target phrase and command.
///
/// The command keeps its original case.
pub fn split_contextual(query: &str) -> Option<(String, String)> {
    let caps = CONTEXTUAL_RE.captures(query)?;
    Some((caps["target"].to_string(), caps["command"].to_string()))
}

/// Look up a phrase in the synonym table.
pub fn synonym_for(phrase: &str) -> Option<&'static str> {
    let phrase = phrase.trim().to_lowercase();
    TARGET_SYNONYMS.iter().find(|(spoken, _)| *spoken == phrase).map(|(_, name)| *name)
}

/// Names to try for a target phrase, most literal first.
pub fn phrase_candidates(phrase: &str) -> Vec<String> {
    let phrase = phrase.trim().to_lowercase();
    let mut variants = vec![phrase.clone()];

    if let Some(rest) = phrase.strip_prefix("the ") {
        variants.push(rest.trim().to_string());
    }
    for base in variants.clone() {
        for suffix in FILLER_SUFFIXES {
            if let Some(rest) = base.strip_suffix(suffix) {
                if !rest.trim().is_empty() && synonym_for(&base).is_none() {
                    variants.push(rest.trim().to_string());
                }
            }
        }
    }

    let mut candidates = Vec::new();
    for variant in &variants {
        push_unique(&mut candidates, variant.clone());
    }
    for variant in &variants {
        if let Some(name) = synonym_for(variant) {
            push_unique(&mut candidates, name.to_string());
        }
    }
    candidates
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}
