//! Value getters: point lookups into a table view.
//!
//! A `ValueGetterSupplier` describes how to compute a node's current value
//! for a key: read the node's own store, or look the key up in the parent
//! view and re-apply the node's transform. Binding a supplier against the
//! stores of a topology yields a `ValueGetter`.
//!
//! # Example
//!
//! ```ignore
//! // source (materialized) -> map_values(parse) -> filter(even)
//! let getter = topology.value_getter(filtered)?;
//! topology.process("topic1", Value::from("A"), Some(Value::from("02")))?;
//! assert_eq!(getter.get(&Value::from("A"))?, Some(Value::Int32(2)));
//! ```

use crate::dataflow::{MapperFn, NodeArena, NodeId, NodeKind, PredicateFn};
use crate::operators::{filter_value, map_value};
use core::fmt;
use std::sync::Arc;
use tabulon_core::{Error, Key, Result, Value};
use tabulon_storage::{StateStore, StoreLookup};

/// Recipe for a node's value getter.
#[derive(Clone)]
pub enum ValueGetterSupplier {
    /// Read the named store directly
    Materialized { store: String },

    /// Look up in the parent, then map
    Mapped {
        parent: Box<ValueGetterSupplier>,
        mapper: MapperFn,
    },

    /// Look up in the parent, then filter
    Filtered {
        parent: Box<ValueGetterSupplier>,
        predicate: PredicateFn,
        negate: bool,
    },
}

impl ValueGetterSupplier {
    /// Builds the supplier for `id`, recursing up to the nearest
    /// materialized ancestor.
    pub(crate) fn for_node(arena: &NodeArena, id: NodeId) -> Result<Self> {
        let node = arena.get(id)?;
        if let Some(store) = node.store_name() {
            return Ok(ValueGetterSupplier::Materialized {
                store: store.to_string(),
            });
        }
        let parent = match node.parent() {
            Some(parent) => parent,
            None => return Err(Error::not_queryable(node.name())),
        };
        let parent_supplier = || -> Result<Box<Self>> {
            Self::for_node(arena, parent)
                .map(Box::new)
                .map_err(|e| match e {
                    Error::NotQueryable { .. } => Error::not_queryable(node.name()),
                    other => other,
                })
        };
        match node.kind() {
            NodeKind::MapValues { mapper } => Ok(ValueGetterSupplier::Mapped {
                parent: parent_supplier()?,
                mapper: Arc::clone(mapper),
            }),
            NodeKind::Filter { predicate, negate } => Ok(ValueGetterSupplier::Filtered {
                parent: parent_supplier()?,
                predicate: Arc::clone(predicate),
                negate: *negate,
            }),
            // An unmaterialized repartition node is the identity on values.
            NodeKind::Through { .. } => parent_supplier().map(|b| *b),
            NodeKind::Source { .. } => Err(Error::not_queryable(node.name())),
        }
    }

    /// Returns the names of the stores this getter reads.
    pub fn store_names(&self) -> Vec<String> {
        match self {
            ValueGetterSupplier::Materialized { store } => vec![store.clone()],
            ValueGetterSupplier::Mapped { parent, .. }
            | ValueGetterSupplier::Filtered { parent, .. } => parent.store_names(),
        }
    }

    /// Binds the supplier to concrete stores.
    pub fn get<L>(&self, stores: &L) -> Result<ValueGetter>
    where
        L: StoreLookup + ?Sized,
    {
        match self {
            ValueGetterSupplier::Materialized { store } => {
                let bound = stores
                    .store(store)
                    .ok_or_else(|| Error::store_not_found(store.as_str()))?;
                Ok(ValueGetter::Materialized { store: bound })
            }
            ValueGetterSupplier::Mapped { parent, mapper } => Ok(ValueGetter::Mapped {
                parent: Box::new(parent.get(stores)?),
                mapper: Arc::clone(mapper),
            }),
            ValueGetterSupplier::Filtered {
                parent,
                predicate,
                negate,
            } => Ok(ValueGetter::Filtered {
                parent: Box::new(parent.get(stores)?),
                predicate: Arc::clone(predicate),
                negate: *negate,
            }),
        }
    }

    /// Returns the number of transforms applied above the store.
    pub fn depth(&self) -> usize {
        match self {
            ValueGetterSupplier::Materialized { .. } => 0,
            ValueGetterSupplier::Mapped { parent, .. }
            | ValueGetterSupplier::Filtered { parent, .. } => parent.depth() + 1,
        }
    }
}

impl fmt::Debug for ValueGetterSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueGetterSupplier::Materialized { store } => {
                f.debug_struct("Materialized").field("store", store).finish()
            }
            ValueGetterSupplier::Mapped { parent, .. } => {
                f.debug_struct("Mapped").field("parent", parent).finish()
            }
            ValueGetterSupplier::Filtered { parent, negate, .. } => f
                .debug_struct("Filtered")
                .field("parent", parent)
                .field("negate", negate)
                .finish(),
        }
    }
}

/// Point-lookup handle for one node of a table view.
///
/// Getters own their stores and transforms, so they can be moved to another
/// thread and used while the topology keeps processing. Each lookup reads a
/// single key; lookups of several keys are not atomic with respect to each
/// other.
#[derive(Clone)]
pub enum ValueGetter {
    /// Reads a store directly
    Materialized { store: Arc<dyn StateStore> },

    /// Maps the parent's value at read time
    Mapped {
        parent: Box<ValueGetter>,
        mapper: MapperFn,
    },

    /// Filters the parent's value at read time
    Filtered {
        parent: Box<ValueGetter>,
        predicate: PredicateFn,
        negate: bool,
    },
}

impl ValueGetter {
    /// Returns the current value for `key`, `None` if the key is absent
    /// from this view.
    pub fn get(&self, key: &Key) -> Result<Option<Value>> {
        match self {
            ValueGetter::Materialized { store } => store.get(key),
            ValueGetter::Mapped { parent, mapper } => {
                let value = parent.get(key)?;
                map_value(mapper, value.as_ref())
            }
            ValueGetter::Filtered {
                parent,
                predicate,
                negate,
            } => {
                let value = parent.get(key)?;
                filter_value(predicate, *negate, key, value)
            }
        }
    }
}

impl fmt::Debug for ValueGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueGetter::Materialized { store } => f
                .debug_struct("Materialized")
                .field("store", &store.name())
                .finish(),
            ValueGetter::Mapped { parent, .. } => {
                f.debug_struct("Mapped").field("parent", parent).finish()
            }
            ValueGetter::Filtered { parent, negate, .. } => f
                .debug_struct("Filtered")
                .field("parent", parent)
                .field("negate", negate)
                .finish(),
        }
    }
}
