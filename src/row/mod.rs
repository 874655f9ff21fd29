//! The [`Row`] value type.
//!
//! A row is built once from raw column values, running each column's [`Processor`] exactly once,
//! and is immutable afterwards. It can then be read:
//!
//! - by position ([`Row::get`], negative indices count from the end),
//! - by slice ([`Row::slice`], returns a projected `Vec`, not a row),
//! - by key ([`Row::get_by_key`], through the shared [`Keymap`] and the owner's fallback),
//! - through one unified subscript ([`Row::get_item`]),
//! - by attribute name ([`Row::get_attr`]).
//!
//! Hashing and equality only look at the values, so rows work as `HashMap`/`HashSet` keys no
//! matter which metadata produced them.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use result_row::keymap::{KeyRecord, Keymap};
//! use result_row::processors::to_upper;
//! use result_row::row::{NoFallback, Row};
//! use result_row::types::Value;
//!
//! let keymap: Keymap = [("x", KeyRecord::at(0, "x")), ("y", KeyRecord::at(1, "y"))]
//!     .into_iter()
//!     .collect();
//! let row = Row::new(
//!     Arc::new(NoFallback),
//!     &[None, Some(to_upper())],
//!     Arc::new(keymap),
//!     vec![Value::from("a"), Value::from("b")],
//! )
//! .unwrap();
//!
//! assert_eq!(row.get(0).unwrap(), &Value::from("a"));
//! assert_eq!(row.get_by_key(&"y".into()).unwrap(), &Value::from("B"));
//! assert_eq!(row.len(), 2);
//! ```

mod snapshot;
mod subscript;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RowError, RowResult};
use crate::keymap::{KeyRecord, Keymap};
use crate::processors::Processor;
use crate::types::{ColumnKey, Value};

pub use snapshot::{
    reconstruct, Reconstructor, RowClass, RowSlot, RowSnapshot, StandardRow, StandardRowState,
};
pub use subscript::{Item, SliceSpec, Subscript};

/// The owner of a row: resolves keys that are missing from the keymap.
///
/// This is where policies such as case-insensitive matching live. Implementations return a
/// synthesized [`KeyRecord`] or fail, usually with [`RowError::NoSuchColumn`].
pub trait RowParent {
    fn key_fallback(&self, key: &ColumnKey) -> RowResult<KeyRecord>;
}

/// An owner that resolves nothing beyond the keymap itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoFallback;

impl RowParent for NoFallback {
    fn key_fallback(&self, key: &ColumnKey) -> RowResult<KeyRecord> {
        Err(RowError::NoSuchColumn {
            key: key.to_string(),
        })
    }
}

/// Attribute-style lookup result; see [`Row::get_attr`].
pub enum Attr<'a, P> {
    /// `_parent`
    Parent(&'a Arc<P>),
    /// `_data`
    Data(&'a [Value]),
    /// `_keymap`
    Keymap(&'a Arc<Keymap>),
    /// A column value.
    Column(&'a Value),
}

impl<P> fmt::Debug for Attr<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Parent(_) => f.write_str("Parent(..)"),
            Attr::Data(values) => f.debug_tuple("Data").field(values).finish(),
            Attr::Keymap(keymap) => f.debug_tuple("Keymap").field(keymap).finish(),
            Attr::Column(value) => f.debug_tuple("Column").field(value).finish(),
        }
    }
}

/// One immutable result record.
pub struct Row<P> {
    pub(crate) parent: Arc<P>,
    pub(crate) values: Box<[Value]>,
    pub(crate) keymap: Arc<Keymap>,
}

impl<P: RowParent> Row<P> {
    /// Build a row by running `processors` over `raw`, column by column.
    ///
    /// Fails with [`RowError::LengthMismatch`] if `raw` and `processors` differ in length, with
    /// [`RowError::InvalidKeymap`] if `keymap` points past the end of the row, and with
    /// [`RowError::Processor`] on the first processor failure.
    pub fn new(
        parent: Arc<P>,
        processors: &[Option<Processor>],
        keymap: Arc<Keymap>,
        raw: Vec<Value>,
    ) -> RowResult<Self> {
        if raw.len() != processors.len() {
            return Err(RowError::LengthMismatch {
                values: raw.len(),
                processors: processors.len(),
            });
        }
        check_keymap(&keymap, raw.len())?;

        let values = raw
            .into_iter()
            .zip(processors)
            .enumerate()
            .map(|(column, (value, processor))| match processor {
                Some(p) => p(value).map_err(|source| RowError::Processor { column, source }),
                None => Ok(value),
            })
            .collect::<RowResult<Box<[Value]>>>()?;

        Ok(Self {
            parent,
            values,
            keymap,
        })
    }

    /// Value at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> RowResult<&Value> {
        let len = self.values.len();
        let resolved = if index < 0 {
            index.checked_add(len as isize)
        } else {
            Some(index)
        };
        resolved
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.values.get(i))
            .ok_or(RowError::IndexOutOfRange { index, len })
    }

    /// Values selected by `spec`, as a new tuple.
    pub fn slice(&self, spec: impl Into<SliceSpec>) -> RowResult<Vec<Value>> {
        let indices = spec.into().indices(self.values.len())?;
        Ok(indices.into_iter().map(|i| self.values[i].clone()).collect())
    }

    /// Look a value up by key.
    ///
    /// Keys missing from the keymap go to the owner's [`RowParent::key_fallback`]. A key that
    /// resolves to several columns fails with [`RowError::AmbiguousColumn`].
    pub fn get_by_key(&self, key: &ColumnKey) -> RowResult<&Value> {
        let fallback;
        let record = match self.keymap.get(key) {
            Some(record) => record,
            None => {
                trace!(%key, "key not in keymap, trying owner fallback");
                fallback = self.parent.key_fallback(key)?;
                &fallback
            }
        };

        match record.position {
            Some(position) => self.values.get(position).ok_or(RowError::IndexOutOfRange {
                index: position as isize,
                len: self.values.len(),
            }),
            None => {
                debug!(%key, label = %record.label, "ambiguous column lookup");
                Err(RowError::ambiguous(&record.label))
            }
        }
    }

    /// Unified subscript: a position, a slice, or a key.
    pub fn get_item(&self, subscript: impl Into<Subscript>) -> RowResult<Item<'_>> {
        match subscript.into() {
            Subscript::Index(i) => self.get(i).map(Item::Value),
            Subscript::Slice(spec) => self.slice(spec).map(Item::Values),
            Subscript::Key(key) => self.get_by_key(&key).map(Item::Value),
        }
    }

    /// Mapping-style subscript; dispatches exactly like [`Row::get_item`].
    pub fn get_item_mapping(&self, subscript: impl Into<Subscript>) -> RowResult<Item<'_>> {
        self.get_item(subscript)
    }

    /// Attribute-style lookup.
    ///
    /// The row's own fields (`_parent`, `_data`, `_keymap`) win. Any other name is looked up as
    /// a column key, and a missing column is reported as [`RowError::NoSuchAttribute`].
    /// Ambiguity errors are returned as they are.
    pub fn get_attr(&self, name: &str) -> RowResult<Attr<'_, P>> {
        if let Some(attr) = self.field_attr(name) {
            return Ok(attr);
        }

        match self.get_by_key(&ColumnKey::from(name)) {
            Ok(value) => Ok(Attr::Column(value)),
            Err(RowError::NoSuchColumn { .. }) => Err(RowError::no_such_attribute(name)),
            Err(e) => Err(e),
        }
    }

    fn field_attr(&self, name: &str) -> Option<Attr<'_, P>> {
        match name {
            "_parent" => Some(Attr::Parent(&self.parent)),
            "_data" => Some(Attr::Data(&self.values)),
            "_keymap" => Some(Attr::Keymap(&self.keymap)),
            _ => None,
        }
    }
}

impl<P> Row<P> {
    /// The owner this row falls back to for unknown keys.
    pub fn parent(&self) -> &Arc<P> {
        &self.parent
    }

    /// The keymap shared with sibling rows.
    pub fn keymap(&self) -> &Arc<Keymap> {
        &self.keymap
    }

    /// The processed values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Copy the values out as a list.
    pub fn to_vec(&self) -> Vec<Value> {
        self.values.to_vec()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` for a row with no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate values in column order. Every call starts a fresh traversal.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

fn check_keymap(keymap: &Keymap, len: usize) -> RowResult<()> {
    let required = keymap.required_width();
    if required > len {
        return Err(RowError::InvalidKeymap { required, len });
    }
    Ok(())
}

impl<P> Clone for Row<P> {
    fn clone(&self) -> Self {
        Self {
            parent: Arc::clone(&self.parent),
            values: self.values.clone(),
            keymap: Arc::clone(&self.keymap),
        }
    }
}

impl<P> PartialEq for Row<P> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<P> Eq for Row<P> {}

impl<P> Hash for Row<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl<P> Index<usize> for Row<P> {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl<'a, P> IntoIterator for &'a Row<P> {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<P> fmt::Debug for Row<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Row").field(&self.values).finish()
    }
}

impl<P> fmt::Display for Row<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        if self.values.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}
