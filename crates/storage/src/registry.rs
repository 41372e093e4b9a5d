//! Store registry.
//!
//! This module provides the `StoreRegistry` which maps store names to the
//! stores a topology owns. Value getters are bound by store name through the
//! `StoreLookup` trait.

use crate::store::StateStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tabulon_core::{Error, Result};

/// Resolves a store by name.
pub trait StoreLookup {
    /// Returns the store registered under `name`.
    fn store(&self, name: &str) -> Option<Arc<dyn StateStore>>;
}

/// Registry of named state stores.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    /// Store name → store.
    stores: BTreeMap<String, Arc<dyn StateStore>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            stores: BTreeMap::new(),
        }
    }

    /// Registers a store under its own name.
    pub fn register(&mut self, store: Arc<dyn StateStore>) -> Result<()> {
        let name = store.name().to_string();
        if self.stores.contains_key(&name) {
            return Err(Error::duplicate_store(name));
        }
        self.stores.insert(name, store);
        Ok(())
    }

    /// Gets a store by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn StateStore>> {
        self.stores.get(name)
    }

    /// Checks if a store exists.
    pub fn contains(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Returns the number of stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns true if no store is registered.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Returns all store names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.stores.keys().map(|s| s.as_str()).collect()
    }

    /// Flushes every store.
    pub fn flush_all(&self) -> Result<()> {
        for store in self.stores.values() {
            store.flush()?;
        }
        Ok(())
    }
}

impl StoreLookup for StoreRegistry {
    fn store(&self, name: &str) -> Option<Arc<dyn StateStore>> {
        self.stores.get(name).cloned()
    }
}

impl core::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.names())
            .finish()
    }
}
