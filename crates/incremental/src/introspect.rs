//! Read-only access to negotiated node properties.

use crate::dataflow::NodeId;
use crate::getter::ValueGetterSupplier;
use tabulon_core::Result;

/// Inspects the old-value flag and value getter of a node.
///
/// Implemented by both `TopologyBuilder` and `Topology`, so callers can query
/// a node the same way before and after the DAG is frozen.
pub trait TableIntrospect {
    /// Returns true if the node forwards old values.
    fn sending_old_value_enabled(&self, node: NodeId) -> Result<bool>;

    /// Returns the supplier of the node's value getter.
    ///
    /// Fails with `NotQueryable` when neither the node nor any ancestor
    /// reachable through lookups is materialized.
    fn value_getter_supplier(&self, node: NodeId) -> Result<ValueGetterSupplier>;
}
