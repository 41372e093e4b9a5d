//! Tabulon Core - Core value and error types for tabulon table views.
//!
//! This crate provides the foundational types shared by every tabulon crate:
//!
//! - `DataType`: Supported value types (Boolean, Int32, Int64, Float64, String)
//! - `Value`: Runtime values flowing through a table view; also used as keys
//! - `Error`: Error types for topology construction, processing and lookups
//!
//! Absence is never a value: a key without a value (never set, or deleted by
//! a tombstone) is represented as `Option::None` by the crates built on top.
//!
//! # Example
//!
//! ```rust
//! use tabulon_core::{DataType, Value};
//!
//! let raw = Value::from("01");
//! assert_eq!(raw.data_type(), DataType::String);
//! assert_eq!(raw.parse_i32().unwrap(), 1);
//! ```

mod error;
mod types;
mod value;

pub use error::{Error, Result};
pub use types::DataType;
pub use value::{Key, Value};
