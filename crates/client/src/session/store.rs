// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Last-known values of cloud variables.
//!
//! Both local writes and server pushes land here. Entries are never removed;
//! the store grows with the number of distinct names a project uses.

use std::collections::BTreeMap;

use cv_core::Value;

/// Mapping from prefixed variable name to its most recent value.
#[derive(Debug, Default)]
pub struct VariableStore {
    values: BTreeMap<String, Value>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any previous one.
    pub fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    /// Look up a value by exact (prefixed) name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Copy out every entry, ordered by name.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
