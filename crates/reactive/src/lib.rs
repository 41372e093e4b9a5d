//! Tabulon Reactive - Consumers of table view changes.
//!
//! This crate provides the downstream side of a topology: the sinks that
//! receive every change a node forwards.
//!
//! # Core Concepts
//!
//! - `SubscriptionManager`: fans changes out to id-addressed callbacks
//! - `SharedSubscriptions`: a manager callers keep subscribing to after build
//! - `ChangeRecorder`: records changes and renders them as `key:(new<-old)`
//! - `to_stream`: reads a table's changes as plain `key:value` records
//!
//! # Example
//!
//! ```rust
//! use tabulon_core::{Result, Value};
//! use tabulon_incremental::TopologyBuilder;
//! use tabulon_reactive::ChangeRecorder;
//!
//! let mut builder = TopologyBuilder::default();
//! let table = builder.create_source("topic1").unwrap();
//! let parsed = builder
//!     .map_values(table, |v: &Value| -> Result<Value> { Ok(Value::Int32(v.parse_i32()?)) })
//!     .unwrap();
//! builder.enable_sending_old_values(parsed).unwrap();
//!
//! let recorder = ChangeRecorder::new();
//! builder.add_sink(parsed, recorder.clone()).unwrap();
//!
//! let mut topology = builder.build().unwrap();
//! topology.process("topic1", Value::from("A"), Some(Value::from("01"))).unwrap();
//! topology.process("topic1", Value::from("A"), Some(Value::from("02"))).unwrap();
//!
//! recorder.check_and_clear(&["A:(1<-null)", "A:(2<-1)"]);
//! ```

pub mod recorder;
pub mod stream;
pub mod subscription;

pub use recorder::ChangeRecorder;
pub use stream::{to_stream, StreamRecord, StreamSink};
pub use subscription::{
    ChangeCallback, SharedSubscriptions, Subscription, SubscriptionId, SubscriptionManager,
};

// Re-export commonly used types from dependencies
pub use tabulon_incremental::{ChangeEvent, ChangeSink};
