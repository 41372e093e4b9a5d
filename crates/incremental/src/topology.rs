//! Frozen topology and event processing.
//!
//! Every event is pushed depth-first through the subtree below its source:
//! a node hands the change to its sinks, then to each child in creation
//! order, and each child finishes its whole downstream effect (including
//! store writes) before the next sibling runs. `through` nodes stop the
//! traversal at their channel; `pump` reads the channels back and resumes it
//! from the `through` node.

use crate::change::ChangeEvent;
use crate::config::TopologyConfig;
use crate::dataflow::{NodeArena, NodeId, NodeKind, TableNode};
use crate::getter::{ValueGetter, ValueGetterSupplier};
use crate::introspect::TableIntrospect;
use crate::negotiate::OldValueFlags;
use crate::operators::{filter_change, map_change, materialize_change, source_change};
use crate::repartition::{RepartitionChannel, RepartitionRecord};
use crate::sink::BoxedSink;
use core::fmt::{self, Write};
use hashbrown::HashMap;
use std::sync::Arc;
use tabulon_core::{Error, Key, Result, Value};
use tabulon_storage::{StateStore, StoreLookup, StoreRegistry};
use tracing::{trace, warn};

/// A built table view topology.
///
/// Node properties (kind, parent, store, old-value flag) are fixed. The
/// topology only mutates store contents, channel contents and stream time.
pub struct Topology {
    config: TopologyConfig,
    arena: NodeArena,
    flags: OldValueFlags,
    stores: StoreRegistry,
    topics: HashMap<String, NodeId>,
    channels: Vec<RepartitionChannel>,
    /// Channel index per `through` node
    channel_of: HashMap<NodeId, usize>,
    /// Sinks per node, indexed by `NodeId`
    sinks: Vec<Vec<BoxedSink>>,
    /// Largest event time seen so far
    stream_time: i64,
}

impl Topology {
    pub(crate) fn assemble(
        config: TopologyConfig,
        arena: NodeArena,
        flags: OldValueFlags,
        stores: StoreRegistry,
        topics: HashMap<String, NodeId>,
        channels: Vec<RepartitionChannel>,
        sinks: Vec<Vec<BoxedSink>>,
    ) -> Self {
        let channel_of = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| (channel.node(), index))
            .collect();
        Self {
            config,
            arena,
            flags,
            stores,
            topics,
            channels,
            channel_of,
            sinks,
            stream_time: 0,
        }
    }

    /// Processes an update stamped with the current stream time.
    pub fn process(&mut self, topic: &str, key: Key, value: Option<Value>) -> Result<()> {
        let timestamp = self.stream_time;
        self.process_at(topic, key, value, timestamp)
    }

    /// Processes an update stamped with `timestamp`.
    ///
    /// `value == None` deletes the key. The update is fully propagated, and
    /// with `auto_pump` every repartition record it produced is read back,
    /// before this returns. The first error from a transform, predicate,
    /// sink or store aborts the traversal and is returned unchanged; nodes
    /// already visited keep their writes.
    pub fn process_at(
        &mut self,
        topic: &str,
        key: Key,
        value: Option<Value>,
        timestamp: i64,
    ) -> Result<()> {
        let node = match self.topics.get(topic) {
            Some(&node) => node,
            None => {
                warn!(topic, "Update for unknown topic");
                return Err(Error::unknown_topic(topic));
            }
        };
        self.stream_time = self.stream_time.max(timestamp);
        self.ingest(node, key, value, timestamp)?;
        if self.config.auto_pump {
            self.pump()?;
        }
        Ok(())
    }

    /// Reads every repartition channel back until all are empty.
    ///
    /// Each record re-enters its `through` node the way a source update
    /// would. Returns the number of records replayed.
    pub fn pump(&mut self) -> Result<usize> {
        let mut replayed = 0;
        loop {
            let before = replayed;
            for index in 0..self.channels.len() {
                let node = self.channels[index].node();
                loop {
                    let record = match self.channels[index].try_recv()? {
                        Some(record) => record,
                        None => break,
                    };
                    let RepartitionRecord {
                        key,
                        value,
                        timestamp,
                    } = record;
                    self.ingest(node, key, value, timestamp)?;
                    replayed += 1;
                }
            }
            if replayed == before {
                break;
            }
        }
        if replayed > 0 {
            trace!(replayed, "Pumped repartition channels");
        }
        Ok(replayed)
    }

    /// Returns the number of records waiting in repartition channels.
    pub fn pending_repartition(&self) -> usize {
        self.channels.iter().map(|c| c.len()).sum()
    }

    /// Returns a bound value getter for `node`.
    pub fn value_getter(&self, node: NodeId) -> Result<ValueGetter> {
        self.value_getter_supplier(node)?.get(self)
    }

    /// Succeeds only if `node` already forwards old values.
    pub fn enable_sending_old_values(&self, node: NodeId) -> Result<()> {
        let target = self.arena.get(node)?;
        if self.flags.is_enabled(node) {
            return Ok(());
        }
        warn!(node = target.name(), "Old values requested after build");
        Err(Error::topology_frozen(
            "enable sending old values",
            target.name(),
        ))
    }

    /// Succeeds only if `node` is already backed by `store_name`.
    pub fn materialize(&self, node: NodeId, store_name: &str) -> Result<()> {
        let target = self.arena.get(node)?;
        if target.store_name() == Some(store_name) {
            return Ok(());
        }
        warn!(
            node = target.name(),
            store = store_name,
            "Materialization requested after build"
        );
        Err(Error::topology_frozen("materialize", target.name()))
    }

    /// Returns the registry of every store in the topology.
    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// Flushes every store.
    pub fn flush(&self) -> Result<()> {
        self.stores.flush_all()
    }

    /// Returns a node by handle.
    pub fn node(&self, node: NodeId) -> Result<&TableNode> {
        self.arena.get(node)
    }

    /// Returns the generated name of a node.
    pub fn node_name(&self, node: NodeId) -> Result<&str> {
        Ok(self.arena.get(node)?.name())
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Returns the node reading `topic`, if any.
    pub fn topic_node(&self, topic: &str) -> Option<NodeId> {
        self.topics.get(topic).copied()
    }

    /// Returns the largest event time processed so far.
    pub fn stream_time(&self) -> i64 {
        self.stream_time
    }

    /// Returns the configuration the topology was built with.
    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Renders the DAG as an indented tree, one node per line.
    ///
    /// ```text
    /// tabulon
    ///   KTABLE-SOURCE-0000000000 topic=topic1 store=source-store old-values
    ///     KTABLE-MAPVALUES-0000000001
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.config.application_id);
        out.push('\n');
        for root in self.arena.roots() {
            // Writing to a String cannot fail.
            let _ = self.describe_node(&mut out, root, 1);
        }
        out
    }

    fn describe_node(&self, out: &mut String, id: NodeId, depth: usize) -> fmt::Result {
        let node = match self.arena.get(id) {
            Ok(node) => node,
            Err(_) => return Ok(()),
        };
        write!(out, "{:indent$}{}", "", node.name(), indent = depth * 2)?;
        match node.kind() {
            NodeKind::Source { topic } => write!(out, " topic={}", topic)?,
            NodeKind::Through { channel } => write!(out, " channel={}", channel)?,
            NodeKind::Filter { negate: true, .. } => out.push_str(" negated"),
            _ => {}
        }
        if let Some(store) = node.store_name() {
            write!(out, " store={}", store)?;
        }
        if self.flags.is_enabled(id) {
            out.push_str(" old-values");
        }
        out.push('\n');
        for &child in self.arena.children(id) {
            self.describe_node(out, child, depth + 1)?;
        }
        Ok(())
    }

    /// Feeds a raw update into a source or `through` node.
    fn ingest(&mut self, id: NodeId, key: Key, value: Option<Value>, timestamp: i64) -> Result<()> {
        let node = self.arena.get(id)?;
        let change = source_change(
            node.name(),
            node.store().map(Arc::as_ref),
            &key,
            value,
            self.flags.is_enabled(id),
        )?;
        self.forward(id, ChangeEvent::new(key, change, timestamp))
    }

    /// Hands a node's output to its sinks, then to its children.
    fn forward(&mut self, id: NodeId, event: ChangeEvent) -> Result<()> {
        trace!(node = %id, event = %event, "Forwarding change");
        if let Some(sinks) = self.sinks.get_mut(id.index()) {
            for sink in sinks.iter_mut() {
                if let Err(error) = sink.on_change(&event) {
                    warn!(node = %id, error = %error, "Sink failed");
                    return Err(error);
                }
            }
        }
        let children = self.arena.children(id).to_vec();
        for child in children {
            self.apply(child, &event)?;
        }
        Ok(())
    }

    /// Runs a derived node on its parent's output.
    fn apply(&mut self, id: NodeId, input: &ChangeEvent) -> Result<()> {
        let node = self.arena.get(id)?;
        let send_old_values = self.flags.is_enabled(id);
        let result = match node.kind() {
            NodeKind::MapValues { mapper } => map_change(mapper, &input.change, send_old_values),
            NodeKind::Filter { predicate, negate } => {
                filter_change(predicate, *negate, &input.key, &input.change, send_old_values)
            }
            NodeKind::Through { .. } => {
                return self.send_to_channel(id, input);
            }
            NodeKind::Source { .. } => Err(Error::invalid_operation(format!(
                "source {} cannot have a parent",
                node.name()
            ))),
        };
        let change = match result {
            Ok(change) => change,
            Err(error) => {
                warn!(node = node.name(), key = %input.key, error = %error, "Transform failed");
                return Err(error);
            }
        };
        if let Some(store) = node.store() {
            materialize_change(store.as_ref(), &input.key, &change)?;
        }
        self.forward(id, ChangeEvent::new(input.key.clone(), change, input.timestamp))
    }

    fn send_to_channel(&self, id: NodeId, input: &ChangeEvent) -> Result<()> {
        let index = match self.channel_of.get(&id) {
            Some(&index) => index,
            None => return Err(Error::unknown_node(id.index())),
        };
        let channel = &self.channels[index];
        let record = RepartitionRecord {
            key: input.key.clone(),
            value: input.change.new.clone(),
            timestamp: input.timestamp,
        };
        if let Err(error) = channel.send(record) {
            warn!(channel = channel.name(), error = %error, "Repartition send failed");
            return Err(error);
        }
        trace!(channel = channel.name(), key = %input.key, "Sent to repartition channel");
        Ok(())
    }
}

impl TableIntrospect for Topology {
    fn sending_old_value_enabled(&self, node: NodeId) -> Result<bool> {
        self.arena.get(node)?;
        Ok(self.flags.is_enabled(node))
    }

    fn value_getter_supplier(&self, node: NodeId) -> Result<ValueGetterSupplier> {
        ValueGetterSupplier::for_node(&self.arena, node)
    }
}

impl StoreLookup for Topology {
    fn store(&self, name: &str) -> Option<Arc<dyn StateStore>> {
        self.stores.store(name)
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("config", &self.config)
            .field("nodes", &self.arena.len())
            .field("stores", &self.stores)
            .field("channels", &self.channels)
            .field("stream_time", &self.stream_time)
            .finish()
    }
}
