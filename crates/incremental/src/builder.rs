//! Topology construction.
//!
//! The builder owns the node arena while the DAG is being assembled. Nodes
//! are created below their parent and addressed by the returned `NodeId`;
//! stores, old-value requests and sinks are attached by handle. `build()`
//! freezes everything into a `Topology`.

use crate::config::TopologyConfig;
use crate::dataflow::{MapperFn, NodeArena, NodeId, NodeKind, PredicateFn};
use crate::getter::ValueGetterSupplier;
use crate::introspect::TableIntrospect;
use crate::negotiate::{negotiate, unmaterialized_old_value_readers};
use crate::repartition::RepartitionChannel;
use crate::sink::{BoxedSink, ChangeSink};
use crate::topology::Topology;
use hashbrown::HashMap;
use std::sync::Arc;
use tabulon_core::{Error, Key, Result, Value};
use tabulon_storage::{InMemoryStore, StateStore, StoreRegistry};
use tracing::{debug, warn};

/// Builder for a table view topology.
///
/// # Example
///
/// ```rust
/// use tabulon_core::{Result, Value};
/// use tabulon_incremental::TopologyBuilder;
///
/// let mut builder = TopologyBuilder::default();
/// let table = builder.create_source("topic1").unwrap();
/// builder.materialize(table, "table-store").unwrap();
/// let parsed = builder
///     .map_values(table, |v: &Value| -> Result<Value> { Ok(Value::Int32(v.parse_i32()?)) })
///     .unwrap();
///
/// let mut topology = builder.build().unwrap();
/// let getter = topology.value_getter(parsed).unwrap();
///
/// topology.process("topic1", Value::from("A"), Some(Value::from("01"))).unwrap();
/// assert_eq!(getter.get(&Value::from("A")).unwrap(), Some(Value::Int32(1)));
/// ```
pub struct TopologyBuilder {
    config: TopologyConfig,
    arena: NodeArena,
    /// Source topics and repartition channels, sharing one namespace
    topics: HashMap<String, NodeId>,
    stores: StoreRegistry,
    old_value_requests: Vec<NodeId>,
    sinks: Vec<(NodeId, BoxedSink)>,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new(TopologyConfig::default())
    }
}

impl TopologyBuilder {
    /// Creates an empty builder.
    pub fn new(config: TopologyConfig) -> Self {
        Self {
            config,
            arena: NodeArena::new(),
            topics: HashMap::new(),
            stores: StoreRegistry::new(),
            old_value_requests: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Returns the configuration the topology will be built with.
    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Returns the number of nodes created so far.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Returns the generated name of a node.
    pub fn node_name(&self, node: NodeId) -> Result<&str> {
        Ok(self.arena.get(node)?.name())
    }

    /// Creates a table fed by `topic`.
    pub fn create_source(&mut self, topic: impl Into<String>) -> Result<NodeId> {
        let topic = topic.into();
        self.claim_topic(&topic)?;
        let id = self.add_node(
            NodeKind::Source {
                topic: topic.clone(),
            },
            None,
        )?;
        self.topics.insert(topic, id);
        Ok(id)
    }

    /// Derives a table by transforming every value of `parent`.
    pub fn map_values<F>(&mut self, parent: NodeId, mapper: F) -> Result<NodeId>
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        let mapper: MapperFn = Arc::new(mapper);
        self.add_node(NodeKind::MapValues { mapper }, Some(parent))
    }

    /// Derives a table keeping the entries of `parent` the predicate accepts.
    pub fn filter<P>(&mut self, parent: NodeId, predicate: P) -> Result<NodeId>
    where
        P: Fn(&Key, &Value) -> Result<bool> + Send + Sync + 'static,
    {
        self.add_filter(parent, Arc::new(predicate), false)
    }

    /// Derives a table dropping the entries of `parent` the predicate accepts.
    pub fn filter_not<P>(&mut self, parent: NodeId, predicate: P) -> Result<NodeId>
    where
        P: Fn(&Key, &Value) -> Result<bool> + Send + Sync + 'static,
    {
        self.add_filter(parent, Arc::new(predicate), true)
    }

    /// Routes `parent` through the repartition channel `channel`.
    ///
    /// The channel name shares the topic namespace: records published to it
    /// with `Topology::process` are read back like round-tripped ones.
    pub fn through(&mut self, parent: NodeId, channel: impl Into<String>) -> Result<NodeId> {
        let channel = channel.into();
        self.arena.get(parent)?;
        self.claim_topic(&channel)?;
        let id = self.add_node(
            NodeKind::Through {
                channel: channel.clone(),
            },
            Some(parent),
        )?;
        self.topics.insert(channel, id);
        Ok(id)
    }

    /// Backs `node` with a fresh in-memory store named `store_name`.
    pub fn materialize(&mut self, node: NodeId, store_name: impl Into<String>) -> Result<()> {
        self.materialize_with(node, Arc::new(InMemoryStore::new(store_name)))
    }

    /// Backs `node` with a caller-provided store.
    pub fn materialize_with(&mut self, node: NodeId, store: Arc<dyn StateStore>) -> Result<()> {
        let target = self.arena.get(node)?;
        if let Some(existing) = target.store_name() {
            return Err(Error::AlreadyMaterialized {
                node: target.name().to_string(),
                store: existing.to_string(),
            });
        }
        self.stores.register(Arc::clone(&store))?;
        debug!(node = target.name(), store = store.name(), "Materialized node");
        self.arena.get_mut(node)?.store = Some(store);
        Ok(())
    }

    /// Asks `node` to forward old values. Idempotent.
    ///
    /// The request is resolved into per-node flags when the topology is
    /// built; the node's ancestors are flagged along with it.
    pub fn enable_sending_old_values(&mut self, node: NodeId) -> Result<()> {
        self.arena.get(node)?;
        if !self.old_value_requests.contains(&node) {
            self.old_value_requests.push(node);
        }
        Ok(())
    }

    /// Subscribes `sink` to every change `node` forwards.
    pub fn add_sink<S>(&mut self, node: NodeId, sink: S) -> Result<()>
    where
        S: ChangeSink + 'static,
    {
        self.arena.get(node)?;
        self.sinks.push((node, Box::new(sink)));
        Ok(())
    }

    /// Freezes the DAG into a runnable topology.
    ///
    /// Validates the configuration, resolves old-value requests, backs every
    /// source and repartition node that must read old values with a store
    /// (or fails, when auto-materialization is off) and opens one channel
    /// per `through`.
    pub fn build(self) -> Result<Topology> {
        let TopologyBuilder {
            config,
            mut arena,
            topics,
            mut stores,
            old_value_requests,
            sinks,
        } = self;

        config.validate()?;
        let flags = negotiate(&arena, &old_value_requests)?;

        for id in unmaterialized_old_value_readers(&arena, &flags) {
            let node = arena.get_mut(id)?;
            if !config.auto_materialize {
                warn!(node = node.name(), "Node must send old values but has no store");
                return Err(Error::not_materialized(node.name()));
            }
            let store: Arc<dyn StateStore> =
                Arc::new(InMemoryStore::new(format!("{}-STORE", node.name())));
            stores.register(Arc::clone(&store))?;
            debug!(
                node = node.name(),
                store = store.name(),
                "Auto-materialized node to supply old values"
            );
            node.store = Some(store);
        }

        let mut channels = Vec::new();
        for node in arena.iter() {
            if let NodeKind::Through { channel } = node.kind() {
                debug!(
                    node = node.name(),
                    channel = channel.as_str(),
                    capacity = ?config.repartition_capacity,
                    "Opened repartition channel"
                );
                channels.push(RepartitionChannel::open(
                    channel.clone(),
                    node.id(),
                    config.repartition_capacity,
                ));
            }
        }

        let mut node_sinks: Vec<Vec<BoxedSink>> = (0..arena.len()).map(|_| Vec::new()).collect();
        for (id, sink) in sinks {
            node_sinks[id.index()].push(sink);
        }

        debug!(
            nodes = arena.len(),
            stores = stores.len(),
            channels = channels.len(),
            old_value_nodes = flags.count(),
            "Built topology"
        );

        Ok(Topology::assemble(
            config, arena, flags, stores, topics, channels, node_sinks,
        ))
    }

    fn add_filter(&mut self, parent: NodeId, predicate: PredicateFn, negate: bool) -> Result<NodeId> {
        self.add_node(NodeKind::Filter { predicate, negate }, Some(parent))
    }

    fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.arena.add(kind, parent)?;
        debug!(node = self.arena.get(id)?.name(), parent = ?parent, "Created node");
        Ok(id)
    }

    fn claim_topic(&self, topic: &str) -> Result<()> {
        if self.topics.contains_key(topic) {
            return Err(Error::duplicate_topic(topic));
        }
        Ok(())
    }
}

impl TableIntrospect for TopologyBuilder {
    /// Reports the flag the node would get if the topology were built now.
    fn sending_old_value_enabled(&self, node: NodeId) -> Result<bool> {
        self.arena.get(node)?;
        Ok(negotiate(&self.arena, &self.old_value_requests)?.is_enabled(node))
    }

    /// Resolves the supplier against the stores attached so far.
    fn value_getter_supplier(&self, node: NodeId) -> Result<ValueGetterSupplier> {
        ValueGetterSupplier::for_node(&self.arena, node)
    }
}

impl core::fmt::Debug for TopologyBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TopologyBuilder")
            .field("config", &self.config)
            .field("nodes", &self.arena.len())
            .field("stores", &self.stores)
            .field("old_value_requests", &self.old_value_requests)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_int(v: &Value) -> Result<Value> {
        Ok(Value::Int32(v.parse_i32()?))
    }

    #[test]
    fn test_node_names() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();
        let mapped = builder.map_values(source, parse_int).unwrap();
        let through = builder.through(mapped, "topic2").unwrap();

        assert_eq!(builder.node_name(source).unwrap(), "KTABLE-SOURCE-0000000000");
        assert_eq!(builder.node_name(mapped).unwrap(), "KTABLE-MAPVALUES-0000000001");
        assert_eq!(builder.node_name(through).unwrap(), "KTABLE-THROUGH-0000000002");
        assert_eq!(builder.node_count(), 3);
    }

    #[test]
    fn test_duplicate_topics() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();

        assert!(matches!(
            builder.create_source("topic1"),
            Err(Error::DuplicateTopic { .. })
        ));
        assert!(matches!(
            builder.through(source, "topic1"),
            Err(Error::DuplicateTopic { .. })
        ));
        assert_eq!(builder.node_count(), 1);
    }

    #[test]
    fn test_unknown_parent() {
        let mut builder = TopologyBuilder::default();
        assert!(matches!(
            builder.map_values(NodeId(4), parse_int),
            Err(Error::UnknownNode { id: 4 })
        ));
        assert!(matches!(
            builder.through(NodeId(4), "topic2"),
            Err(Error::UnknownNode { id: 4 })
        ));
        // A failed through does not claim its channel.
        let source = builder.create_source("topic1").unwrap();
        assert!(builder.through(source, "topic2").is_ok());
    }

    #[test]
    fn test_materialize_twice() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();
        let other = builder.create_source("topic2").unwrap();
        builder.materialize(source, "store").unwrap();

        assert!(matches!(
            builder.materialize(source, "store2"),
            Err(Error::AlreadyMaterialized { .. })
        ));
        assert!(matches!(
            builder.materialize(other, "store"),
            Err(Error::DuplicateStore { .. })
        ));
    }

    #[test]
    fn test_sending_old_value_enabled_before_build() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();
        let mapped = builder.map_values(source, parse_int).unwrap();

        assert!(!builder.sending_old_value_enabled(source).unwrap());
        assert!(!builder.sending_old_value_enabled(mapped).unwrap());

        builder.enable_sending_old_values(mapped).unwrap();
        builder.enable_sending_old_values(mapped).unwrap();

        assert!(builder.sending_old_value_enabled(source).unwrap());
        assert!(builder.sending_old_value_enabled(mapped).unwrap());
    }

    #[test]
    fn test_build_auto_materializes_source() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();
        let mapped = builder.map_values(source, parse_int).unwrap();
        builder.enable_sending_old_values(mapped).unwrap();

        let topology = builder.build().unwrap();

        assert!(topology
            .stores()
            .contains("KTABLE-SOURCE-0000000000-STORE"));
    }

    #[test]
    fn test_build_without_auto_materialize() {
        let config = TopologyConfig {
            auto_materialize: false,
            ..TopologyConfig::default()
        };
        let mut builder = TopologyBuilder::new(config);
        let source = builder.create_source("topic1").unwrap();
        builder.enable_sending_old_values(source).unwrap();

        assert!(matches!(
            builder.build(),
            Err(Error::NotMaterialized { .. })
        ));
    }

    #[test]
    fn test_supplier_before_build() {
        let mut builder = TopologyBuilder::default();
        let source = builder.create_source("topic1").unwrap();
        let mapped = builder.map_values(source, parse_int).unwrap();

        assert!(matches!(
            builder.value_getter_supplier(mapped),
            Err(Error::NotQueryable { .. })
        ));

        builder.materialize(source, "source-store").unwrap();
        let supplier = builder.value_getter_supplier(mapped).unwrap();
        assert_eq!(supplier.store_names(), vec!["source-store".to_string()]);
    }

    #[test]
    fn test_build_rejects_zero_repartition_capacity() {
        let config = TopologyConfig {
            repartition_capacity: Some(0),
            ..TopologyConfig::default()
        };
        let mut builder = TopologyBuilder::new(config);
        let source = builder.create_source("topic1").unwrap();
        builder.through(source, "topic2").unwrap();

        assert!(matches!(
            builder.build(),
            Err(Error::InvalidOperation { .. })
        ));
    }
}
