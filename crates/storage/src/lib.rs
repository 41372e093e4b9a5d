//! Tabulon Storage - State stores backing materialized table views.
//!
//! This crate provides the storage contract the view-maintenance engine
//! consumes, plus the stores it ships with:
//!
//! - `StateStore`: keyed get/put/delete contract, safe to share across threads
//! - `InMemoryStore`: hash map behind a read/write lock
//! - `LoggedStore`: a store that journals every write as a changelog entry
//! - `Journal`: the changelog itself, replayable into a fresh store
//! - `StoreRegistry`: name to store mapping used to bind value getters
//!
//! # Example
//!
//! ```rust
//! use tabulon_core::Value;
//! use tabulon_storage::{InMemoryStore, StateStore};
//!
//! let store = InMemoryStore::new("counts");
//! store.put(Value::from("A"), Some(Value::Int32(1))).unwrap();
//! assert_eq!(store.get(&Value::from("A")).unwrap(), Some(Value::Int32(1)));
//!
//! // A `None` put is a tombstone.
//! store.put(Value::from("A"), None).unwrap();
//! assert_eq!(store.get(&Value::from("A")).unwrap(), None);
//! ```

pub mod journal;
pub mod registry;
pub mod store;

pub use journal::{Journal, JournalEntry, LoggedStore};
pub use registry::{StoreLookup, StoreRegistry};
pub use store::{InMemoryStore, StateStore};
