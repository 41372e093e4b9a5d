//! Node arena for the table view DAG.

use crate::dataflow::node::{NodeId, NodeKind, TableNode};
use tabulon_core::{Error, Result};

/// Arena owning every node of a topology.
///
/// Nodes are addressed by `NodeId` and never removed. Each node has at most
/// one parent, created before it, so the graph cannot contain cycles.
#[derive(Default)]
pub struct NodeArena {
    /// Nodes indexed by `NodeId`
    nodes: Vec<TableNode>,
    /// Child handles per node, in creation order
    children: Vec<Vec<NodeId>>,
}

impl NodeArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds a node below `parent` and returns its handle.
    ///
    /// The node is named `KTABLE-<KIND>-<sequence>`.
    pub fn add(&mut self, kind: NodeKind, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(p) = parent {
            self.get(p)?;
        }
        let id = NodeId(self.nodes.len());
        let name = format!("KTABLE-{}-{:010}", kind.label(), id.0);
        self.nodes.push(TableNode {
            id,
            name,
            kind,
            parent,
            store: None,
        });
        self.children.push(Vec::new());
        if let Some(p) = parent {
            self.children[p.0].push(id);
        }
        Ok(id)
    }

    /// Gets a node by handle.
    pub fn get(&self, id: NodeId) -> Result<&TableNode> {
        self.nodes.get(id.0).ok_or_else(|| Error::unknown_node(id.0))
    }

    /// Gets a mutable node by handle.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut TableNode> {
        self.nodes.get_mut(id.0).ok_or_else(|| Error::unknown_node(id.0))
    }

    /// Returns the children of a node, in creation order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id.0)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the path from `id` up to its root, starting with `id`.
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            path.push(node_id);
            current = self.get(node_id)?.parent;
        }
        Ok(path)
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &TableNode> + '_ {
        self.nodes.iter()
    }

    /// Returns the handles of all parentless nodes.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.parent.is_none()).map(|n| n.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tabulon_core::Value;

    fn source(topic: &str) -> NodeKind {
        NodeKind::Source {
            topic: topic.into(),
        }
    }

    fn identity() -> NodeKind {
        NodeKind::MapValues {
            mapper: Arc::new(|v: &Value| -> Result<Value> { Ok(v.clone()) }),
        }
    }

    #[test]
    fn test_arena_add_node() {
        let mut arena = NodeArena::new();
        let id = arena.add(source("t"), None).unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id).unwrap().name(), "KTABLE-SOURCE-0000000000");
    }

    #[test]
    fn test_arena_children() {
        let mut arena = NodeArena::new();
        let root = arena.add(source("t"), None).unwrap();
        let a = arena.add(identity(), Some(root)).unwrap();
        let b = arena.add(identity(), Some(root)).unwrap();

        assert_eq!(arena.children(root), &[a, b]);
        assert!(arena.children(a).is_empty());
        assert_eq!(arena.get(b).unwrap().name(), "KTABLE-MAPVALUES-0000000002");
        assert_eq!(arena.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn test_arena_unknown_parent() {
        let mut arena = NodeArena::new();
        let result = arena.add(identity(), Some(NodeId(7)));
        assert!(matches!(result, Err(Error::UnknownNode { id: 7 })));
        assert!(arena.is_empty());
    }

    #[test]
    fn test_path_to_root() {
        let mut arena = NodeArena::new();
        let root = arena.add(source("t"), None).unwrap();
        let a = arena.add(identity(), Some(root)).unwrap();
        let b = arena.add(identity(), Some(a)).unwrap();

        assert_eq!(arena.path_to_root(b).unwrap(), vec![b, a, root]);
        assert_eq!(arena.path_to_root(root).unwrap(), vec![root]);
        assert!(arena.path_to_root(NodeId(9)).is_err());
    }
}
