//! Multi-key projection of rows.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RowResult;
use crate::row::{Row, RowParent};
use crate::types::{ColumnKey, Value};

/// Pulls a fixed list of keyed values out of a row as a tuple.
///
/// Each key goes through [`Row::get_by_key`], so fallback and ambiguity rules apply exactly as
/// for single lookups. An extractor is immutable and cheap to clone; share it across rows and
/// threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ExtractorSnapshot", into = "ExtractorSnapshot")]
pub struct TupleExtractor {
    keys: Arc<[ColumnKey]>,
}

/// Serializable state of a [`TupleExtractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorSnapshot {
    pub keys: Vec<ColumnKey>,
}

impl TupleExtractor {
    /// An extractor for `keys`, in output order.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ColumnKey>,
    {
        Self {
            keys: keys.into_iter().map(Into::<ColumnKey>::into).collect(),
        }
    }

    /// The keys, in output order.
    pub fn keys(&self) -> &[ColumnKey] {
        &self.keys
    }

    /// Number of keys, which is also the width of every result.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when the extractor has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Project `row`. The first failing key aborts the call.
    pub fn call<P: RowParent>(&self, row: &Row<P>) -> RowResult<Vec<Value>> {
        self.keys
            .iter()
            .map(|key| row.get_by_key(key).cloned())
            .collect()
    }

    /// The serializable form of this extractor.
    pub fn snapshot(&self) -> ExtractorSnapshot {
        ExtractorSnapshot {
            keys: self.keys.to_vec(),
        }
    }

    /// Rebuild an extractor from [`TupleExtractor::snapshot`] output.
    pub fn from_snapshot(snapshot: ExtractorSnapshot) -> Self {
        Self::new(snapshot.keys)
    }
}

impl From<ExtractorSnapshot> for TupleExtractor {
    fn from(snapshot: ExtractorSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

impl From<TupleExtractor> for ExtractorSnapshot {
    fn from(extractor: TupleExtractor) -> Self {
        extractor.snapshot()
    }
}

impl fmt::Display for TupleExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TupleExtractor(")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str(")")
    }
}
