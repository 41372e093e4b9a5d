//! Incremental filter operator.

use crate::change::Change;
use crate::dataflow::PredicateFn;
use tabulon_core::{Key, Result, Value};

/// Applies a filter predicate to an optional value.
///
/// Absent values stay absent without calling the predicate. A present value
/// survives if the predicate holds (fails, when `negate` is set); otherwise
/// the key reads as absent in the filtered view.
///
/// # Example
///
/// ```ignore
/// let even: PredicateFn = Arc::new(|_, v| Ok(v.as_i32().map_or(false, |i| i % 2 == 0)));
/// assert_eq!(filter_value(&even, false, &key, Some(Value::Int32(2)))?, Some(Value::Int32(2)));
/// assert_eq!(filter_value(&even, false, &key, Some(Value::Int32(1)))?, None);
/// ```
pub fn filter_value(
    predicate: &PredicateFn,
    negate: bool,
    key: &Key,
    value: Option<Value>,
) -> Result<Option<Value>> {
    match value {
        None => Ok(None),
        Some(v) => {
            let keep = predicate(key, &v)? != negate;
            Ok(if keep { Some(v) } else { None })
        }
    }
}

/// Filters a parent change.
///
/// The new value is forwarded when it passes, a tombstone otherwise. The old
/// value is filtered the same way, so a key whose old value fails the
/// predicate did not previously exist from the downstream point of view.
/// Without `send_old_values` the old value is `None` and the predicate is
/// not evaluated on it.
pub fn filter_change(
    predicate: &PredicateFn,
    negate: bool,
    key: &Key,
    change: &Change,
    send_old_values: bool,
) -> Result<Change> {
    let new = filter_value(predicate, negate, key, change.new.clone())?;
    let old = if send_old_values {
        filter_value(predicate, negate, key, change.old.clone())?
    } else {
        None
    };
    Ok(Change::new(new, old))
}
