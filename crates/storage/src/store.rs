//! State store contract and the in-memory implementation.

use hashbrown::HashMap;
use parking_lot::RwLock;
use tabulon_core::{Key, Result, Value};

/// A keyed store holding the current value of every live key.
///
/// Methods take `&self`: a store is written by the processing thread while
/// value getters read it from other threads, so implementations carry their
/// own synchronization. A single-key read must observe some completed write,
/// never a partial one. Nothing is promised across several keys.
pub trait StateStore: Send + Sync {
    /// Returns the store name, unique within a topology.
    fn name(&self) -> &str;

    /// Returns the current value for a key, `None` if absent.
    fn get(&self, key: &Key) -> Result<Option<Value>>;

    /// Writes a value; a `None` value deletes the key.
    fn put(&self, key: Key, value: Option<Value>) -> Result<()>;

    /// Deletes a key, returning the value it held.
    fn delete(&self, key: &Key) -> Result<Option<Value>>;

    /// Returns the number of live keys.
    fn len(&self) -> usize;

    /// Returns true if the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of all entries, ordered by key.
    fn all(&self) -> Result<Vec<(Key, Value)>>;

    /// Flushes buffered writes. In-memory stores have nothing to do.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory state store.
pub struct InMemoryStore {
    name: String,
    entries: RwLock<HashMap<Key, Value>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty store with room for `capacity` keys.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl StateStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: Key, value: Option<Value>) -> Result<()> {
        let mut entries = self.entries.write();
        match value {
            Some(v) => {
                entries.insert(key, v);
            }
            None => {
                entries.remove(&key);
            }
        }
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.entries.write().remove(key))
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn all(&self) -> Result<Vec<(Key, Value)>> {
        let mut snapshot: Vec<(Key, Value)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(snapshot)
    }
}

impl core::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(s: &str) -> Key {
        Value::from(s)
    }

    #[test]
    fn test_put_get() {
        let store = InMemoryStore::new("s");
        assert_eq!(store.name(), "s");
        assert!(store.is_empty());

        store.put(key("A"), Some(Value::Int32(1))).unwrap();
        store.put(key("B"), Some(Value::Int32(2))).unwrap();
        assert_eq!(store.get(&key("A")).unwrap(), Some(Value::Int32(1)));
        assert_eq!(store.get(&key("C")).unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_overwrites() {
        let store = InMemoryStore::new("s");
        store.put(key("A"), Some(Value::Int32(1))).unwrap();
        store.put(key("A"), Some(Value::Int32(3))).unwrap();
        assert_eq!(store.get(&key("A")).unwrap(), Some(Value::Int32(3)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_tombstone_put_deletes() {
        let store = InMemoryStore::new("s");
        store.put(key("A"), Some(Value::Int32(1))).unwrap();
        store.put(key("A"), None).unwrap();
        assert_eq!(store.get(&key("A")).unwrap(), None);

        // A second tombstone leaves the key absent.
        store.put(key("A"), None).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_returns_previous() {
        let store = InMemoryStore::new("s");
        store.put(key("A"), Some(Value::from("x"))).unwrap();
        assert_eq!(store.delete(&key("A")).unwrap(), Some(Value::from("x")));
        assert_eq!(store.delete(&key("A")).unwrap(), None);
    }

    #[test]
    fn test_equal_float_keys_share_entry() {
        let store = InMemoryStore::new("s");
        store.put(Value::Float64(0.0), Some(Value::from("x"))).unwrap();

        assert_eq!(store.get(&Value::Float64(-0.0)).unwrap(), Some(Value::from("x")));
        store.put(Value::Float64(-0.0), Some(Value::from("y"))).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.delete(&Value::Float64(0.0)).unwrap(), Some(Value::from("y")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_all_sorted() {
        let store = InMemoryStore::with_capacity("s", 4);
        store.put(key("C"), Some(Value::Int32(3))).unwrap();
        store.put(key("A"), Some(Value::Int32(1))).unwrap();
        store.put(key("B"), Some(Value::Int32(2))).unwrap();

        let keys: Vec<Key> = store.all().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![key("A"), key("B"), key("C")]);

        store.clear();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_reads_see_whole_values() {
        let store = Arc::new(InMemoryStore::new("s"));
        store.put(key("A"), Some(Value::Int64(0))).unwrap();

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let v = store.get(&key("A")).unwrap();
                    assert!(matches!(v, Some(Value::Int64(_))));
                }
            })
        };

        for i in 0..1000 {
            store.put(key("A"), Some(Value::Int64(i))).unwrap();
        }
        reader.join().unwrap();
        assert_eq!(store.get(&key("A")).unwrap(), Some(Value::Int64(999)));
    }
}
