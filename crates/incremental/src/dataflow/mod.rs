//! Table view DAG.
//!
//! This module provides the node definitions and the arena that owns them.
//! Parent links are handles into the arena, so nodes never own each other.

mod graph;
pub mod node;

pub use graph::NodeArena;
pub use node::{MapperFn, NodeId, NodeKind, PredicateFn, TableNode};
