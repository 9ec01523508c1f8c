//! The codebook: which codes exist and which are currently visible.
//!
//! A codebook is a registry, not a gatekeeper. The index happily stores
//! spans for keys the codebook has never heard of; the codebook only
//! decides what a filtered export shows. Deactivating a code hides it
//! from [`export_visible`](crate::export::export_visible) without
//! touching the index, so reactivating later brings every span back
//! intact.
//!
//! A key absent from the codebook counts as inactive. Filtered views are
//! therefore opt-in per code; the unfiltered [`export`](crate::export::export)
//! remains the way to get everything.

use crate::record::CodeKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One code definition: key, display label, visibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDef {
    /// The key spans carry in the index.
    pub key: CodeKey,
    /// Human-readable label shown in listings.
    pub label: String,
    /// Whether filtered exports include this code.
    pub active: bool,
}

impl CodeDef {
    /// A new definition, active by default.
    pub fn new(key: impl Into<CodeKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            active: true,
        }
    }
}

/// Registry of code definitions keyed by [`CodeKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Codebook {
    entries: HashMap<CodeKey, CodeDef>,
}

impl Codebook {
    /// An empty codebook. Everything is inactive until defined.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, keyed by `def.key`.
    pub fn insert(&mut self, def: CodeDef) {
        self.entries.insert(def.key.clone(), def);
    }

    /// Mark a code active. Returns `false` if the key is not defined.
    pub fn activate(&mut self, key: &CodeKey) -> bool {
        match self.entries.get_mut(key) {
            Some(def) => {
                def.active = true;
                true
            }
            None => false,
        }
    }

    /// Mark a code inactive. Returns `false` if the key is not defined.
    pub fn deactivate(&mut self, key: &CodeKey) -> bool {
        match self.entries.get_mut(key) {
            Some(def) => {
                def.active = false;
                true
            }
            None => false,
        }
    }

    /// True if the key is defined and active. Absent keys are inactive.
    #[must_use]
    pub fn is_active(&self, key: &CodeKey) -> bool {
        self.entries.get(key).is_some_and(|def| def.active)
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, key: &CodeKey) -> Option<&CodeDef> {
        self.entries.get(key)
    }

    /// True if the key is defined, active or not.
    #[must_use]
    pub fn contains(&self, key: &CodeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of defined codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no codes are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate definitions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &CodeDef> {
        self.entries.values()
    }
}

impl FromIterator<CodeDef> for Codebook {
    fn from_iter<I: IntoIterator<Item = CodeDef>>(iter: I) -> Self {
        let mut book = Self::new();
        for def in iter {
            book.insert(def);
        }
        book
    }
}

// =============================================================================
// Tests
// =============================================================================
