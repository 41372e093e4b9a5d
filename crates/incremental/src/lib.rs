//! Tabulon Incremental - Incremental maintenance of derived table views.
//!
//! A table view is a keyed collection whose every update is a `Change`: the
//! key's new value and, when requested, the value it replaced. Views are
//! derived from each other through a DAG of nodes, and every update pushed
//! into a source is propagated synchronously to every view below it.
//!
//! # Core Concepts
//!
//! - `Change` / `ChangeEvent`: a `(new <- old)` pair for one key; `new == None`
//!   is a tombstone
//! - `TopologyBuilder`: assembles the DAG (sources, `map_values`, `filter`,
//!   `through`) and attaches stores, old-value requests and sinks
//! - `Topology`: the frozen DAG; `process` pushes updates through it
//! - `ValueGetter`: point lookup of one key in one view, read from a store or
//!   recomputed through the parent chain
//!
//! # Old values
//!
//! Nodes forward `old = None` unless old values were requested on them or on
//! a descendant. The request is resolved once, at build time, into an
//! immutable flag per node. Sources and repartition nodes read old values
//! from their own store and are given one automatically when needed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use tabulon_core::{Key, Result, Value};
//! use tabulon_incremental::{ChangeEvent, TopologyBuilder};
//!
//! let mut builder = TopologyBuilder::default();
//! let table = builder.create_source("topic1").unwrap();
//! builder.materialize(table, "table-store").unwrap();
//! let parsed = builder
//!     .map_values(table, |v: &Value| -> Result<Value> { Ok(Value::Int32(v.parse_i32()?)) })
//!     .unwrap();
//! let even = builder
//!     .filter(parsed, |_: &Key, v: &Value| -> Result<bool> {
//!         Ok(v.as_i32().map_or(false, |i| i % 2 == 0))
//!     })
//!     .unwrap();
//! builder.enable_sending_old_values(even).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink_seen = Arc::clone(&seen);
//! builder
//!     .add_sink(even, move |event: &ChangeEvent| -> Result<()> {
//!         sink_seen.lock().unwrap().push(event.to_string());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut topology = builder.build().unwrap();
//! let getter = topology.value_getter(even).unwrap();
//!
//! topology.process("topic1", Value::from("A"), Some(Value::from("02"))).unwrap();
//! topology.process("topic1", Value::from("A"), Some(Value::from("03"))).unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["A:(2<-null)", "A:(null<-2)"]);
//! assert_eq!(getter.get(&Value::from("A")).unwrap(), None);
//! ```

pub mod builder;
pub mod change;
pub mod config;
pub mod dataflow;
pub mod getter;
pub mod introspect;
pub mod negotiate;
pub mod operators;
pub mod repartition;
pub mod sink;
pub mod topology;

pub use builder::TopologyBuilder;
pub use change::{Change, ChangeEvent};
pub use config::TopologyConfig;
pub use dataflow::{MapperFn, NodeId, NodeKind, PredicateFn, TableNode};
pub use getter::{ValueGetter, ValueGetterSupplier};
pub use introspect::TableIntrospect;
pub use negotiate::OldValueFlags;
pub use repartition::{RepartitionChannel, RepartitionRecord};
pub use sink::{BoxedSink, ChangeSink};
pub use topology::Topology;
