//! Error types for tabulon.

use crate::types::DataType;
use thiserror::Error;

/// Result type alias for tabulon operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for topology construction, event processing and lookups.
///
/// A missing value is never an error; lookups and events use `Option::None`
/// for absent keys and tombstones.
#[derive(Debug, Error)]
pub enum Error {
    /// A value did not have the type a transform expected.
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: DataType, got: DataType },

    /// A mapper, predicate or downstream consumer failed.
    #[error("Transform failed: {message}")]
    Transform { message: String },

    /// A node handle does not belong to this topology.
    #[error("Unknown node: {id}")]
    UnknownNode { id: usize },

    /// An event arrived for a topic no source or repartition node reads.
    #[error("Unknown topic: {topic}")]
    UnknownTopic { topic: String },

    /// A topic or repartition channel name was registered twice.
    #[error("Topic already registered: {topic}")]
    DuplicateTopic { topic: String },

    /// A state store name was registered twice.
    #[error("State store already registered: {name}")]
    DuplicateStore { name: String },

    /// The node already owns a state store.
    #[error("Node {node} is already materialized in store {store}")]
    AlreadyMaterialized { node: String, store: String },

    /// A value getter was bound against a registry missing its store.
    #[error("State store not found: {name}")]
    StoreNotFound { name: String },

    /// Neither the node nor any ancestor is materialized.
    #[error("Node {node} has no materialized ancestor to look values up from")]
    NotQueryable { node: String },

    /// The node must read old values from a store it does not have.
    #[error("Node {node} must send old values but is not materialized")]
    NotMaterialized { node: String },

    /// A build-time property was changed after the topology was frozen.
    #[error("Topology is frozen: cannot {operation} on {node}")]
    TopologyFrozen { operation: String, node: String },

    /// A bounded repartition channel had no room for another record.
    #[error("Repartition channel full: {channel}")]
    RepartitionFull { channel: String },

    /// The receiving end of a repartition channel went away.
    #[error("Repartition channel closed: {channel}")]
    ChannelClosed { channel: String },

    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates a transform error.
    pub fn transform(message: impl Into<String>) -> Self {
        Error::Transform {
            message: message.into(),
        }
    }

    /// Creates an unknown node error.
    pub fn unknown_node(id: usize) -> Self {
        Error::UnknownNode { id }
    }

    /// Creates an unknown topic error.
    pub fn unknown_topic(topic: impl Into<String>) -> Self {
        Error::UnknownTopic {
            topic: topic.into(),
        }
    }

    /// Creates a duplicate topic error.
    pub fn duplicate_topic(topic: impl Into<String>) -> Self {
        Error::DuplicateTopic {
            topic: topic.into(),
        }
    }

    /// Creates a duplicate store error.
    pub fn duplicate_store(name: impl Into<String>) -> Self {
        Error::DuplicateStore { name: name.into() }
    }

    /// Creates a store not found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Error::StoreNotFound { name: name.into() }
    }

    /// Creates a not queryable error.
    pub fn not_queryable(node: impl Into<String>) -> Self {
        Error::NotQueryable { node: node.into() }
    }

    /// Creates a not materialized error.
    pub fn not_materialized(node: impl Into<String>) -> Self {
        Error::NotMaterialized { node: node.into() }
    }

    /// Creates a topology frozen error.
    pub fn topology_frozen(operation: impl Into<String>, node: impl Into<String>) -> Self {
        Error::TopologyFrozen {
            operation: operation.into(),
            node: node.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}
