//! Table node definitions.

use core::fmt;
use std::sync::Arc;
use tabulon_core::{Key, Result, Value};
use tabulon_storage::StateStore;

/// Mapper function for transforming values.
pub type MapperFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Predicate for filtering key/value pairs.
pub type PredicateFn = Arc<dyn Fn(&Key, &Value) -> Result<bool> + Send + Sync>;

/// Handle of a node inside a topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node does with the changes it receives.
pub enum NodeKind {
    /// Root of a chain, fed by an external change stream
    Source { topic: String },

    /// Transforms every value with a pure mapper
    MapValues { mapper: MapperFn },

    /// Keeps values the predicate accepts (rejects, when negated)
    Filter { predicate: PredicateFn, negate: bool },

    /// Routes changes through a repartition channel and reads them back
    Through { channel: String },
}

impl NodeKind {
    /// Returns the label used in generated node names.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Source { .. } => "SOURCE",
            NodeKind::MapValues { .. } => "MAPVALUES",
            NodeKind::Filter { .. } => "FILTER",
            NodeKind::Through { .. } => "THROUGH",
        }
    }

    /// Returns the topic or channel this node reads, if any.
    pub fn topic(&self) -> Option<&str> {
        match self {
            NodeKind::Source { topic } => Some(topic.as_str()),
            NodeKind::Through { channel } => Some(channel.as_str()),
            _ => None,
        }
    }

    /// Returns true for nodes that take raw `(key, value)` input and read
    /// old values from their own store: sources, and repartition nodes on
    /// the read-back side of their channel.
    pub fn reads_own_store(&self) -> bool {
        matches!(self, NodeKind::Source { .. } | NodeKind::Through { .. })
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Source { topic } => f.debug_struct("Source").field("topic", topic).finish(),
            NodeKind::MapValues { .. } => f.write_str("MapValues"),
            NodeKind::Filter { negate, .. } => {
                f.debug_struct("Filter").field("negate", negate).finish()
            }
            NodeKind::Through { channel } => {
                f.debug_struct("Through").field("channel", channel).finish()
            }
        }
    }
}

/// A node in the table view DAG.
///
/// The parent link is a plain handle into the arena; children are tracked by
/// the arena, never by the node.
pub struct TableNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) store: Option<Arc<dyn StateStore>>,
}

impl TableNode {
    /// Returns the node handle.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the generated node name, e.g. `KTABLE-MAPVALUES-0000000001`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node kind.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the parent handle; `None` for sources.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns true if the node owns a state store.
    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the name of the node's state store.
    pub fn store_name(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.name())
    }

    /// Returns the node's state store.
    pub fn store(&self) -> Option<&Arc<dyn StateStore>> {
        self.store.as_ref()
    }
}

impl fmt::Debug for TableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("store", &self.store_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let source = NodeKind::Source {
            topic: "topic1".into(),
        };
        assert_eq!(source.label(), "SOURCE");
        assert_eq!(source.topic(), Some("topic1"));
        assert!(source.reads_own_store());

        let map = NodeKind::MapValues {
            mapper: Arc::new(|v: &Value| -> Result<Value> { Ok(v.clone()) }),
        };
        assert_eq!(map.label(), "MAPVALUES");
        assert_eq!(map.topic(), None);
        assert!(!map.reads_own_store());

        let through = NodeKind::Through {
            channel: "topic2".into(),
        };
        assert_eq!(through.topic(), Some("topic2"));
        assert!(through.reads_own_store());
    }

    #[test]
    fn test_kind_debug_hides_closures() {
        let filter = NodeKind::Filter {
            predicate: Arc::new(|_: &Key, _: &Value| -> Result<bool> { Ok(true) }),
            negate: true,
        };
        assert_eq!(format!("{:?}", filter), "Filter { negate: true }");
    }
}
