//! Incremental operators for table views.
//!
//! This module provides the per-node transforms applied to each change:
//! - Source: turns raw updates into changes, reading old values from a store
//! - Map: transforms new (and optionally old) values with a mapper
//! - Filter: turns rejected values into absences

mod filter;
mod map;
mod source;

pub use filter::{filter_change, filter_value};
pub use map::{map_change, map_value};
pub use source::{materialize_change, source_change};
