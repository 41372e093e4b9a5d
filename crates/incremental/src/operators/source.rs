//! Table source operator.
//!
//! Sources and the read-back side of repartition channels receive raw
//! `(key, value)` pairs and turn them into changes, reading the previous
//! value from their own store when old values are requested.

use crate::change::Change;
use tabulon_core::{Error, Key, Result, Value};
use tabulon_storage::StateStore;

/// Turns a raw update into a change, writing it through `store`.
///
/// The old value is read before the write, and only when
/// `send_old_values` is set; a node asked for old values without a store is
/// an error.
pub fn source_change(
    node: &str,
    store: Option<&dyn StateStore>,
    key: &Key,
    new: Option<Value>,
    send_old_values: bool,
) -> Result<Change> {
    let old = match (send_old_values, store) {
        (true, Some(store)) => store.get(key)?,
        (true, None) => return Err(Error::not_materialized(node)),
        (false, _) => None,
    };
    if let Some(store) = store {
        store.put(key.clone(), new.clone())?;
    }
    Ok(Change::new(new, old))
}

/// Writes the new value of a derived node's change into its store.
#[inline]
pub fn materialize_change(store: &dyn StateStore, key: &Key, change: &Change) -> Result<()> {
    store.put(key.clone(), change.new.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabulon_storage::InMemoryStore;

    fn key() -> Key {
        Value::from("A")
    }

    #[test]
    fn test_source_change_with_old_values() {
        let store = InMemoryStore::new("s");

        let first = source_change("n", Some(&store), &key(), Some(Value::from("01")), true).unwrap();
        assert_eq!(first, Change::update(Value::from("01")));

        let second =
            source_change("n", Some(&store), &key(), Some(Value::from("02")), true).unwrap();
        assert_eq!(second.old, Some(Value::from("01")));

        let deleted = source_change("n", Some(&store), &key(), None, true).unwrap();
        assert_eq!(deleted, Change::new(None, Some(Value::from("02"))));
        assert_eq!(store.get(&key()).unwrap(), None);

        // Deleting again is a no-op for the store but still yields a change.
        let again = source_change("n", Some(&store), &key(), None, true).unwrap();
        assert_eq!(again, Change::tombstone());
    }

    #[test]
    fn test_source_change_without_old_values() {
        let store = InMemoryStore::new("s");
        source_change("n", Some(&store), &key(), Some(Value::from("01")), false).unwrap();

        let second =
            source_change("n", Some(&store), &key(), Some(Value::from("02")), false).unwrap();

        assert_eq!(second.old, None);
        assert_eq!(store.get(&key()).unwrap(), Some(Value::from("02")));
    }

    #[test]
    fn test_source_change_unmaterialized() {
        let change = source_change("n", None, &key(), Some(Value::from("01")), false).unwrap();
        assert_eq!(change, Change::update(Value::from("01")));

        let result = source_change("n", None, &key(), Some(Value::from("01")), true);
        assert!(matches!(result, Err(Error::NotMaterialized { .. })));
    }

    #[test]
    fn test_materialize_change() {
        let store = InMemoryStore::new("s");
        materialize_change(&store, &key(), &Change::update(Value::Int32(1))).unwrap();
        assert_eq!(store.get(&key()).unwrap(), Some(Value::Int32(1)));
        materialize_change(&store, &key(), &Change::tombstone()).unwrap();
        assert!(store.is_empty());
    }
}
