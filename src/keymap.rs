//! Key → column lookup tables shared by rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ColumnKey, Value};

/// What a key resolves to.
///
/// `position` is `None` when the key names more than one column. `label` is the name reported
/// in errors for such keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub position: Option<usize>,
    pub marker: Value,
    pub label: String,
}

impl KeyRecord {
    /// A record with an explicit position, marker value and error label.
    pub fn new(position: Option<usize>, marker: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            position,
            marker: marker.into(),
            label: label.into(),
        }
    }

    /// A record resolving to column `position`.
    pub fn at(position: usize, label: impl Into<String>) -> Self {
        Self::new(Some(position), Value::Null, label)
    }

    /// A record for a key shared by several columns.
    pub fn ambiguous(label: impl Into<String>) -> Self {
        Self::new(None, Value::Null, label)
    }

    /// `true` when the key names more than one column.
    pub fn is_ambiguous(&self) -> bool {
        self.position.is_none()
    }
}

/// Immutable mapping from [`ColumnKey`] to [`KeyRecord`].
///
/// A keymap is built once per result shape and shared by every row of that shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(ColumnKey, KeyRecord)>", into = "Vec<(ColumnKey, KeyRecord)>")]
pub struct Keymap {
    entries: HashMap<ColumnKey, KeyRecord>,
    required_width: usize,
}

impl Keymap {
    /// Build a keymap and record the row width its positions require.
    pub fn new(entries: HashMap<ColumnKey, KeyRecord>) -> Self {
        let required_width = entries
            .values()
            .filter_map(|r| r.position)
            .map(|p| p.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self {
            entries,
            required_width,
        }
    }

    /// The record stored for `key`, without any fallback.
    pub fn get(&self, key: &ColumnKey) -> Option<&KeyRecord> {
        self.entries.get(key)
    }

    /// `true` if `key` has a record.
    pub fn contains_key(&self, key: &ColumnKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the keymap has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate keys and records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnKey, &KeyRecord)> {
        self.entries.iter()
    }

    /// Smallest row length every non-ambiguous position fits in.
    pub fn required_width(&self) -> usize {
        self.required_width
    }
}

impl From<HashMap<ColumnKey, KeyRecord>> for Keymap {
    fn from(entries: HashMap<ColumnKey, KeyRecord>) -> Self {
        Self::new(entries)
    }
}

// Serialized as a list of pairs; JSON objects only allow string keys.
impl From<Vec<(ColumnKey, KeyRecord)>> for Keymap {
    fn from(entries: Vec<(ColumnKey, KeyRecord)>) -> Self {
        Self::new(entries.into_iter().collect())
    }
}

impl From<Keymap> for Vec<(ColumnKey, KeyRecord)> {
    fn from(keymap: Keymap) -> Self {
        let mut entries: Vec<_> = keymap.entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<K: Into<ColumnKey>> FromIterator<(K, KeyRecord)> for Keymap {
    fn from_iter<I: IntoIterator<Item = (K, KeyRecord)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, r)| (k.into(), r)).collect())
    }
}
