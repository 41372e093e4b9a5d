//! Change types flowing through a table view.
//!
//! A `Change` pairs the new value of a key with the value it held just
//! before, when old values are being forwarded. A `ChangeEvent` is a change
//! addressed to a key at an event time.

use core::fmt;
use tabulon_core::{Key, Value};

/// The new and (optionally) old value of one key.
///
/// `new == None` is a tombstone. `old == None` means either that the key had
/// no prior value or that the emitting node does not forward old values;
/// which one is a property of the node, not of the change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Change {
    /// Value after the update
    pub new: Option<Value>,
    /// Value before the update
    pub old: Option<Value>,
}

impl Change {
    /// Creates a change from a new and old value.
    #[inline]
    pub fn new(new: Option<Value>, old: Option<Value>) -> Self {
        Self { new, old }
    }

    /// Creates a change carrying only a new value.
    #[inline]
    pub fn update(new: Value) -> Self {
        Self {
            new: Some(new),
            old: None,
        }
    }

    /// Creates a tombstone with no old value.
    #[inline]
    pub fn tombstone() -> Self {
        Self::default()
    }

    /// Returns true if this change deletes its key.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.new.is_none()
    }
}

impl fmt::Display for Change {
    /// Renders as `(new<-old)`, with `null` for absent values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_optional(f, self.new.as_ref())?;
        write!(f, "<-")?;
        write_optional(f, self.old.as_ref())?;
        write!(f, ")")
    }
}

/// A change to one key at an event time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Key being updated
    pub key: Key,
    /// New and old value
    pub change: Change,
    /// Event time in milliseconds
    pub timestamp: i64,
}

impl ChangeEvent {
    /// Creates a change event.
    #[inline]
    pub fn new(key: Key, change: Change, timestamp: i64) -> Self {
        Self {
            key,
            change,
            timestamp,
        }
    }

    /// Returns the new value.
    #[inline]
    pub fn new_value(&self) -> Option<&Value> {
        self.change.new.as_ref()
    }

    /// Returns the old value.
    #[inline]
    pub fn old_value(&self) -> Option<&Value> {
        self.change.old.as_ref()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.change)
    }
}

pub(crate) fn write_optional(f: &mut fmt::Formatter<'_>, value: Option<&Value>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{}", v),
        None => f.write_str("null"),
    }
}
