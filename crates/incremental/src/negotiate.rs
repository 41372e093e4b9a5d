//! Old-value negotiation.
//!
//! A node asked to forward old values needs its parent to forward them too,
//! up to the node that reads old values from its own store. The negotiation
//! is a single pass over the finished DAG producing an immutable flag per
//! node.

use crate::dataflow::{NodeArena, NodeId, NodeKind};
use tabulon_core::Result;
use tracing::debug;

/// Per-node "send old values" flags, fixed once a topology is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OldValueFlags {
    flags: Vec<bool>,
}

impl OldValueFlags {
    /// Returns true if the node forwards old values.
    #[inline]
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.flags.get(id.index()).copied().unwrap_or(false)
    }

    /// Returns the handles of every flagged node, in creation order.
    pub fn enabled_nodes(&self) -> Vec<NodeId> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Returns the number of flagged nodes.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&on| on).count()
    }
}

/// Flags every requested node and its ancestors.
///
/// Each walk climbs parent links and stops at a node that is already flagged,
/// since its ancestors were flagged with it, or at a repartition node, which
/// recomputes old values from its own store after the round trip and needs
/// nothing from its parent.
pub fn negotiate(arena: &NodeArena, requested: &[NodeId]) -> Result<OldValueFlags> {
    let mut flags = vec![false; arena.len()];
    for &start in requested {
        let mut current = Some(start);
        while let Some(id) = current {
            let node = arena.get(id)?;
            if flags[id.index()] {
                break;
            }
            flags[id.index()] = true;
            current = match node.kind() {
                NodeKind::Through { .. } => None,
                _ => node.parent(),
            };
        }
    }
    let flags = OldValueFlags { flags };
    debug!(
        requested = requested.len(),
        enabled = flags.count(),
        "Negotiated old-value forwarding"
    );
    Ok(flags)
}

/// Returns flagged nodes that must read old values from a store they lack.
pub fn unmaterialized_old_value_readers(arena: &NodeArena, flags: &OldValueFlags) -> Vec<NodeId> {
    arena
        .iter()
        .filter(|n| n.kind().reads_own_store() && !n.is_materialized() && flags.is_enabled(n.id()))
        .map(|n| n.id())
        .collect()
}
