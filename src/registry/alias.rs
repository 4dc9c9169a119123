//! Alias table.
//!
//! Case-insensitive alias to target id, unique in both directions. Lookups
//! use the lowercased key; the alias keeps the casing it was given for
//! display. The table lives independently of discovery cycles, so an alias
//! set for an id that disappears comes back when the id does.

use std::collections::{BTreeMap, HashMap};

use crate::core::is_local_keyword;

/// Lookup key for an alias. `None` for empty or reserved names.
pub fn normalize_alias(alias: &str) -> Option<String> {
    let key = alias.trim().to_lowercase();
    if key.is_empty() || is_local_keyword(&key) {
        None
    } else {
        Some(key)
    }
}

/// Bidirectional alias map.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// lookup key -> id
    by_alias: BTreeMap<String, String>,
    /// id -> alias as given
    by_id: HashMap<String, String>,
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `id`.
    ///
    /// The alias is taken away from any other id, and the id's previous
    /// alias is dropped. Returns the stored alias (trimmed, casing kept), or
    /// `None` if the alias is empty or reserved.
    pub fn set(&mut self, id: &str, alias: &str) -> Option<String> {
        let key = normalize_alias(alias)?;
        let alias = alias.trim().to_string();

        if let Some(previous_id) = self.by_alias.remove(&key) {
            self.by_id.remove(&previous_id);
        }
        if let Some(previous_alias) = self.by_id.remove(id) {
            self.by_alias.remove(&previous_alias.to_lowercase());
        }

        self.by_alias.insert(key, id.to_string());
        self.by_id.insert(id.to_string(), alias.clone());
        Some(alias)
    }

    /// Remove an alias. Returns the id it pointed at.
    pub fn remove(&mut self, alias: &str) -> Option<String> {
        let id = self.by_alias.remove(&alias.trim().to_lowercase())?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Id bound to an alias.
    pub fn id_for(&self, alias: &str) -> Option<&str> {
        self.by_alias.get(&alias.trim().to_lowercase()).map(String::as_str)
    }

    /// Alias bound to an id, as it was given.
    pub fn alias_for(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// All `(alias, id)` pairs, sorted case-insensitively by alias.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.by_alias
            .values()
            .filter_map(|id| self.by_id.get(id).map(|alias| (alias.clone(), id.clone())))
            .collect()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}
