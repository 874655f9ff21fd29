//! `result-row` provides the record type for tabular query results: an immutable, hashable
//! [`row::Row`] with positional and keyed access, plus a reusable [`extractor::TupleExtractor`]
//! that projects several keys out of a row at once.
//!
//! ## Building rows
//!
//! Rows come from a [`metadata::ResultMetadata`], which owns the column descriptions (a
//! [`types::Schema`] of [`types::Field`]s with optional aliases), a shared
//! [`keymap::Keymap`], and one optional [`processors::Processor`] per column. Processors run
//! exactly once, when the row is built.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use result_row::metadata::{MetadataOptions, ResultMetadata};
//! use result_row::row::SliceSpec;
//! use result_row::types::{DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), result_row::RowError> {
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int64),
//!     Field::new("name", DataType::Utf8).with_alias("full_name"),
//!     Field::new("score", DataType::Float64),
//! ]);
//! let opts = MetadataOptions { coerce_types: true, ..MetadataOptions::default() };
//! let meta = Arc::new(ResultMetadata::new(schema, opts));
//!
//! // Text from the driver is coerced into the declared column types.
//! let row = meta.make_row(vec![Value::from("1"), Value::from("Ada"), Value::from("98.5")])?;
//!
//! assert_eq!(row.get(0)?, &Value::Int64(1));
//! assert_eq!(row.get(-1)?, &Value::Float64(98.5));
//! assert_eq!(row.get_by_key(&"full_name".into())?, &Value::from("Ada"));
//! assert_eq!(row.slice(SliceSpec::from(1..3))?, vec![Value::from("Ada"), Value::Float64(98.5)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Snapshots
//!
//! [`row::Row::snapshot`] captures a row as a serializable [`row::RowSnapshot`];
//! [`row::RowSnapshot::restore`] rebuilds an equal row without re-running processors.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use result_row::metadata::{MetadataOptions, ResultMetadata};
//! use result_row::row::{RowSnapshot, StandardRow, StandardRowState};
//! use result_row::types::{DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), result_row::RowError> {
//! let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
//! let meta = Arc::new(ResultMetadata::new(schema, MetadataOptions::default()));
//! let row = meta.make_row(vec![Value::Int64(5)])?;
//!
//! let json = row.snapshot::<StandardRow>().to_json()?;
//! let back = RowSnapshot::<StandardRowState<ResultMetadata>>::from_json(&json)?
//!     .restore::<ResultMetadata, StandardRow>()?;
//! assert_eq!(back, row);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`row`]: the row type, subscripts and snapshot/restore
//! - [`extractor`]: multi-key tuple extraction
//! - [`metadata`]: result metadata (keymap, processors, key fallback)
//! - [`keymap`]: key → column lookup tables
//! - [`processors`]: per-column value processors
//! - [`types`]: values, schema and column keys
//! - [`error`]: error types

pub mod error;
pub mod extractor;
pub mod keymap;
pub mod metadata;
pub mod processors;
pub mod row;
pub mod types;

pub use error::{ErrorKind, RowError, RowResult};
pub use extractor::TupleExtractor;
pub use row::Row;
