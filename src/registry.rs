//! Name-keyed tables of constructors
//!
//! The loss, optimizer and scheduler builders all share this table. Entries
//! are added by explicit `register` calls (normally once at startup) and are
//! looked up by exact, case-sensitive name afterwards.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A named table mapping strings to constructors of type `F`.
#[derive(Clone)]
pub struct Registry<F> {
    name: String,
    entries: BTreeMap<String, F>,
}

impl<F> Registry<F> {
    /// Create an empty registry; `name` only appears in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: BTreeMap::new() }
    }

    /// Create a registry from a fixed table of entries. A repeated key keeps
    /// its first entry.
    pub fn with_entries<K: Into<String>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, F)>,
    ) -> Self {
        let mut registry = Self::new(name);
        for (key, entry) in entries {
            registry.entries.entry(key.into()).or_insert(entry);
        }
        registry
    }

    /// Registry name, e.g. "Loss Registry".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an entry. Fails if `key` is already present.
    pub fn register(&mut self, key: impl Into<String>, entry: F) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateName { registry: self.name.clone(), name: key });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Look up an entry by exact name.
    pub fn get(&self, key: &str) -> Option<&F> {
        self.entries.get(key)
    }

    /// Check whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F> std::fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
