//! Topology configuration.

use tabulon_core::{Error, Result};

/// Configuration for building and running a topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Application id, prefixed to `describe()` output.
    pub application_id: String,

    /// Attach an in-memory store to sources and repartition nodes that must
    /// send old values but were not materialized. When false, such a
    /// topology fails to build.
    pub auto_materialize: bool,

    /// Drain repartition channels before `process` returns.
    pub auto_pump: bool,

    /// Maximum records in flight per repartition channel (`None` = unbounded).
    /// Must be at least 1.
    pub repartition_capacity: Option<usize>,
}

impl TopologyConfig {
    /// Creates the default configuration under another application id.
    pub fn with_application_id(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            ..Self::default()
        }
    }

    /// Checks the settings a topology cannot run with.
    ///
    /// A repartition channel is written and drained by the same thread, so
    /// it needs room for at least one record.
    pub fn validate(&self) -> Result<()> {
        if self.repartition_capacity == Some(0) {
            return Err(Error::invalid_operation(
                "repartition_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            application_id: "tabulon".to_string(),
            auto_materialize: true,
            auto_pump: true,
            repartition_capacity: None,
        }
    }
}
