//! Changelog journal for state stores.
//!
//! A `LoggedStore` records every write to the store it wraps as a
//! `JournalEntry`. Replaying a journal into an empty store reproduces the
//! store's contents, which is how a materialized view is rebuilt after a
//! restart.

use crate::store::StateStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tabulon_core::{Key, Result, Value};
use tracing::debug;

/// A single changelog entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalEntry {
    /// Position in the journal, starting at 0.
    pub sequence: u64,
    /// Key that was written.
    pub key: Key,
    /// New value; `None` records a deletion.
    pub value: Option<Value>,
}

impl JournalEntry {
    /// Returns true if this entry deleted its key.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Append-only list of store writes.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write and returns its sequence number.
    pub fn append(&self, key: Key, value: Option<Value>) -> u64 {
        let mut entries = self.entries.lock();
        let sequence = entries.len() as u64;
        entries.push(JournalEntry {
            sequence,
            key,
            value,
        });
        sequence
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been journaled.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns a copy of every entry, in write order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().clone()
    }

    /// Returns the last entry per key, in write order, dropping keys whose
    /// last entry is a tombstone.
    pub fn compacted(&self) -> Vec<JournalEntry> {
        let entries = self.entries.lock();
        let mut last: hashbrown::HashMap<&Key, usize> = hashbrown::HashMap::new();
        for (pos, entry) in entries.iter().enumerate() {
            last.insert(&entry.key, pos);
        }
        let mut positions: Vec<usize> = last
            .into_values()
            .filter(|&pos| !entries[pos].is_tombstone())
            .collect();
        positions.sort_unstable();
        positions.into_iter().map(|pos| entries[pos].clone()).collect()
    }

    /// Replays every entry into `store`, returning the number applied.
    pub fn restore(&self, store: &dyn StateStore) -> Result<usize> {
        let entries = self.entries();
        for entry in &entries {
            store.put(entry.key.clone(), entry.value.clone())?;
        }
        debug!(store = store.name(), entries = entries.len(), "Restored store from journal");
        Ok(entries.len())
    }
}

/// A state store that journals every write it applies.
///
/// A write is journaled only once the wrapped store accepted it, so
/// replaying the journal never produces a state the store did not hold.
pub struct LoggedStore {
    inner: Arc<dyn StateStore>,
    journal: Arc<Journal>,
}

impl LoggedStore {
    /// Wraps `inner`, journaling into a fresh journal.
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        Self::with_journal(inner, Arc::new(Journal::new()))
    }

    /// Wraps `inner`, journaling into an existing journal.
    pub fn with_journal(inner: Arc<dyn StateStore>, journal: Arc<Journal>) -> Self {
        Self { inner, journal }
    }

    /// Returns the journal this store writes to.
    pub fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }
}

impl StateStore for LoggedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.inner.get(key)
    }

    fn put(&self, key: Key, value: Option<Value>) -> Result<()> {
        self.inner.put(key.clone(), value.clone())?;
        self.journal.append(key, value);
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<Option<Value>> {
        let previous = self.inner.delete(key)?;
        self.journal.append(key.clone(), None);
        Ok(previous)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn all(&self) -> Result<Vec<(Key, Value)>> {
        self.inner.all()
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }
}
