//! Table-to-stream conversion.
//!
//! A table's change log read as a plain record stream: every forwarded
//! change becomes one `(key, new value, timestamp)` record, and old values
//! are dropped.

use core::fmt;
use tabulon_core::{Key, Result, Value};
use tabulon_incremental::{ChangeEvent, ChangeSink};

/// A record of a table's change stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamRecord {
    pub key: Key,
    /// New value; `None` for a deletion
    pub value: Option<Value>,
    pub timestamp: i64,
}

impl From<&ChangeEvent> for StreamRecord {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            key: event.key.clone(),
            value: event.change.new.clone(),
            timestamp: event.timestamp,
        }
    }
}

impl fmt::Display for StreamRecord {
    /// Renders as `key:value`, with `null` for a deletion.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.key, value),
            None => write!(f, "{}:null", self.key),
        }
    }
}

/// Sink forwarding a table's changes to a stream consumer.
pub struct StreamSink<F> {
    consumer: F,
}

impl<F> StreamSink<F>
where
    F: FnMut(StreamRecord) -> Result<()> + Send,
{
    pub fn new(consumer: F) -> Self {
        Self { consumer }
    }
}

impl<F> ChangeSink for StreamSink<F>
where
    F: FnMut(StreamRecord) -> Result<()> + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()> {
        (self.consumer)(StreamRecord::from(event))
    }
}

/// Converts table changes into stream records for `consumer`.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use tabulon_core::{Result, Value};
/// use tabulon_incremental::TopologyBuilder;
/// use tabulon_reactive::{to_stream, StreamRecord};
///
/// let mut builder = TopologyBuilder::default();
/// let table = builder.create_source("topic1").unwrap();
/// let parsed = builder
///     .map_values(table, |v: &Value| -> Result<Value> { Ok(Value::Int32(v.parse_i32()?)) })
///     .unwrap();
///
/// let out = Arc::new(Mutex::new(Vec::new()));
/// let sink_out = Arc::clone(&out);
/// builder
///     .add_sink(parsed, to_stream(move |record: StreamRecord| -> Result<()> {
///         sink_out.lock().unwrap().push(record.to_string());
///         Ok(())
///     }))
///     .unwrap();
///
/// let mut topology = builder.build().unwrap();
/// topology.process("topic1", Value::from("A"), Some(Value::from("01"))).unwrap();
/// assert_eq!(*out.lock().unwrap(), vec!["A:1"]);
/// ```
pub fn to_stream<F>(consumer: F) -> StreamSink<F>
where
    F: FnMut(StreamRecord) -> Result<()> + Send,
{
    StreamSink::new(consumer)
}
