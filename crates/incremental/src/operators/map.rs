//! Incremental map-values operator.

use crate::change::Change;
use crate::dataflow::MapperFn;
use tabulon_core::{Result, Value};

/// Applies a mapper to an optional value.
///
/// The mapper is never called on an absent value.
#[inline]
pub fn map_value(mapper: &MapperFn, value: Option<&Value>) -> Result<Option<Value>> {
    value.map(|v| mapper(v)).transpose()
}

/// Maps a parent change through `mapper`.
///
/// The old value is mapped only when `send_old_values` is set; otherwise the
/// forwarded old value is `None` whatever the parent sent, and the mapper
/// runs at most once.
pub fn map_change(mapper: &MapperFn, change: &Change, send_old_values: bool) -> Result<Change> {
    let new = map_value(mapper, change.new.as_ref())?;
    let old = if send_old_values {
        map_value(mapper, change.old.as_ref())?
    } else {
        None
    };
    Ok(Change::new(new, old))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tabulon_core::Error;

    fn parse_int() -> MapperFn {
        Arc::new(|v: &Value| -> Result<Value> { Ok(Value::Int32(v.parse_i32()?)) })
    }

    #[test]
    fn test_map_change_basic() {
        let change = Change::new(Some(Value::from("02")), Some(Value::from("01")));

        let mapped = map_change(&parse_int(), &change, true).unwrap();

        assert_eq!(mapped.new, Some(Value::Int32(2)));
        assert_eq!(mapped.old, Some(Value::Int32(1)));
    }

    #[test]
    fn test_map_change_drops_old_when_disabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mapper: MapperFn = Arc::new(move |v: &Value| -> Result<Value> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(v.clone())
        });
        let change = Change::new(Some(Value::from("02")), Some(Value::from("01")));

        let mapped = map_change(&mapper, &change, false).unwrap();

        assert_eq!(mapped.old, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_map_change_tombstone() {
        let change = Change::new(None, Some(Value::from("03")));

        let mapped = map_change(&parse_int(), &change, true).unwrap();

        assert!(mapped.is_tombstone());
        assert_eq!(mapped.old, Some(Value::Int32(3)));
    }

    #[test]
    fn test_map_change_propagates_failure() {
        let change = Change::update(Value::from("not a number"));
        let result = map_change(&parse_int(), &change, false);
        assert!(matches!(result, Err(Error::Transform { .. })));
    }
}
