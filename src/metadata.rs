//! Result metadata: the owner of a family of rows.
//!
//! [`ResultMetadata`] turns a [`Schema`] into everything rows need:
//!
//! - one shared [`Keymap`], where every column name, every alias, and a positional
//!   [`ColumnKey::Token`] per column resolve to that column (a name claimed by two columns is
//!   recorded as ambiguous);
//! - one optional [`Processor`] per column;
//! - the key fallback, which adds case-insensitive matching when
//!   [`MetadataOptions::case_sensitive`] is off.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use result_row::metadata::{MetadataOptions, ResultMetadata};
//! use result_row::types::{DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int64).with_alias("user_id"),
//!     Field::new("name", DataType::Utf8),
//! ]);
//! let meta = Arc::new(ResultMetadata::new(schema, MetadataOptions::default()));
//!
//! let row = meta.make_row(vec![Value::Int64(7), Value::from("Ada")]).unwrap();
//! assert_eq!(row.get_by_key(&"user_id".into()).unwrap(), &Value::Int64(7));
//!
//! let getter = meta.extractor(["name", "id"]);
//! assert_eq!(getter.call(&row).unwrap(), vec![Value::from("Ada"), Value::Int64(7)]);
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RowError, RowResult};
use crate::extractor::TupleExtractor;
use crate::keymap::{KeyRecord, Keymap};
use crate::processors::{coerce, Processor};
use crate::row::{Row, RowParent};
use crate::types::{ColumnKey, Schema, Value};

/// Configuration for [`ResultMetadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOptions {
    /// Match column names exactly. When `false`, names missing from the keymap are retried
    /// case-insensitively.
    pub case_sensitive: bool,
    /// Attach a [`coerce`] processor for each field's data type to columns without an explicit
    /// processor.
    pub coerce_types: bool,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            coerce_types: false,
        }
    }
}

/// Column descriptions, keymap and processors shared by the rows of one result.
///
/// Serializing keeps the schema and options. Explicit processors are dropped, so a deserialized
/// metadata object only has the processors its options imply. Rows restored from snapshots
/// already hold processed values.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "MetadataState", into = "MetadataState")]
pub struct ResultMetadata {
    schema: Schema,
    options: MetadataOptions,
    keymap: Arc<Keymap>,
    folded: HashMap<String, KeyRecord>,
    processors: Vec<Option<Processor>>,
}

#[derive(Serialize, Deserialize)]
struct MetadataState {
    schema: Schema,
    options: MetadataOptions,
}

impl ResultMetadata {
    /// Build metadata for `schema`.
    pub fn new(schema: Schema, options: MetadataOptions) -> Self {
        let processors = vec![None; schema.len()];
        Self::build(schema, processors, options)
    }

    /// Build metadata with explicit per-column processors.
    ///
    /// `None` entries still get a coercion processor when [`MetadataOptions::coerce_types`] is on.
    pub fn with_processors(
        schema: Schema,
        processors: Vec<Option<Processor>>,
        options: MetadataOptions,
    ) -> RowResult<Self> {
        if processors.len() != schema.len() {
            return Err(RowError::SchemaMismatch {
                message: format!(
                    "{} processors supplied for {} columns",
                    processors.len(),
                    schema.len()
                ),
            });
        }
        Ok(Self::build(schema, processors, options))
    }

    fn build(schema: Schema, processors: Vec<Option<Processor>>, options: MetadataOptions) -> Self {
        let processors = processors
            .into_iter()
            .zip(&schema.fields)
            .map(|(p, field)| match p {
                Some(p) => Some(p),
                None if options.coerce_types => Some(coerce(field.data_type)),
                None => None,
            })
            .collect();

        let keymap = build_keymap(&schema);
        let folded = if options.case_sensitive {
            HashMap::new()
        } else {
            build_folded(&schema)
        };

        debug!(
            columns = schema.len(),
            keys = keymap.len(),
            ambiguous = keymap.iter().filter(|(_, r)| r.is_ambiguous()).count(),
            case_sensitive = options.case_sensitive,
            "built result metadata"
        );

        Self {
            schema,
            options,
            keymap: Arc::new(keymap),
            folded,
            processors,
        }
    }

    /// The column descriptions.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The options this metadata was built with.
    pub fn options(&self) -> MetadataOptions {
        self.options
    }

    /// The keymap every row of this result shares.
    pub fn keymap(&self) -> &Arc<Keymap> {
        &self.keymap
    }

    /// Processors in column order, including implied coercions.
    pub fn processors(&self) -> &[Option<Processor>] {
        &self.processors
    }

    /// Column names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.field_names()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.schema.len()
    }

    /// `true` when the result has no columns.
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Build one row from raw column values.
    pub fn make_row(self: &Arc<Self>, raw: Vec<Value>) -> RowResult<Row<Self>> {
        Row::new(Arc::clone(self), &self.processors, Arc::clone(&self.keymap), raw)
    }

    /// Build rows in order, stopping at the first failure.
    pub fn make_rows(self: &Arc<Self>, raws: Vec<Vec<Value>>) -> RowResult<Vec<Row<Self>>> {
        raws.into_iter().map(|raw| self.make_row(raw)).collect()
    }

    /// Build rows on the rayon pool.
    ///
    /// Output order matches input order. On failure the error of the earliest failing row is
    /// returned.
    pub fn make_rows_par(self: &Arc<Self>, raws: Vec<Vec<Value>>) -> RowResult<Vec<Row<Self>>> {
        let results: Vec<RowResult<Row<Self>>> =
            raws.into_par_iter().map(|raw| self.make_row(raw)).collect();
        results.into_iter().collect()
    }

    /// An extractor over `keys`.
    pub fn extractor<I, K>(&self, keys: I) -> TupleExtractor
    where
        I: IntoIterator<Item = K>,
        K: Into<ColumnKey>,
    {
        TupleExtractor::new(keys)
    }
}

impl RowParent for ResultMetadata {
    fn key_fallback(&self, key: &ColumnKey) -> RowResult<KeyRecord> {
        if !self.options.case_sensitive {
            if let Some(name) = key.as_name() {
                if let Some(record) = self.folded.get(&name.to_lowercase()) {
                    trace!(%key, position = ?record.position, "resolved key case-insensitively");
                    return Ok(match record.position {
                        Some(_) => record.clone(),
                        None => KeyRecord::new(None, record.marker.clone(), name),
                    });
                }
            }
        }

        Err(RowError::NoSuchColumn {
            key: key.to_string(),
        })
    }
}

fn build_keymap(schema: &Schema) -> Keymap {
    let mut entries: HashMap<ColumnKey, KeyRecord> = HashMap::new();
    for (idx, field) in schema.fields.iter().enumerate() {
        entries.insert(
            ColumnKey::Token(idx as u64),
            KeyRecord::new(Some(idx), Value::Int64(idx as i64), field.name.clone()),
        );
        for name in field.names() {
            insert_name(&mut entries, ColumnKey::from(name), idx, name);
        }
    }
    Keymap::new(entries)
}

fn build_folded(schema: &Schema) -> HashMap<String, KeyRecord> {
    let mut folded: HashMap<String, KeyRecord> = HashMap::new();
    for (idx, field) in schema.fields.iter().enumerate() {
        for name in field.names() {
            insert_name(&mut folded, name.to_lowercase(), idx, name);
        }
    }
    folded
}

fn insert_name<K: std::hash::Hash + Eq>(
    entries: &mut HashMap<K, KeyRecord>,
    key: K,
    idx: usize,
    name: &str,
) {
    match entries.entry(key) {
        Entry::Vacant(e) => {
            e.insert(KeyRecord::new(Some(idx), Value::Int64(idx as i64), name));
        }
        Entry::Occupied(mut e) => {
            if e.get().position != Some(idx) {
                e.insert(KeyRecord::ambiguous(name));
            }
        }
    }
}

impl From<MetadataState> for ResultMetadata {
    fn from(state: MetadataState) -> Self {
        Self::new(state.schema, state.options)
    }
}

impl From<ResultMetadata> for MetadataState {
    fn from(meta: ResultMetadata) -> Self {
        Self {
            schema: meta.schema,
            options: meta.options,
        }
    }
}

impl fmt::Debug for ResultMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultMetadata")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .field(
                "processors",
                &self.processors.iter().filter(|p| p.is_some()).count(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::processors::to_upper;
    use crate::types::{DataType, Field};

    fn people_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64).with_alias("pk"),
            Field::new("name", DataType::Utf8).with_alias("label"),
            Field::new("Score", DataType::Float64).with_alias("label"),
        ])
    }

    #[test]
    fn keymap_covers_names_aliases_and_tokens() {
        let meta = ResultMetadata::new(people_schema(), MetadataOptions::default());
        let km = meta.keymap();
        assert_eq!(km.get(&"id".into()).unwrap().position, Some(0));
        assert_eq!(km.get(&"pk".into()).unwrap().position, Some(0));
        assert_eq!(km.get(&ColumnKey::Token(2)).unwrap().position, Some(2));
        assert!(km.get(&"label".into()).unwrap().is_ambiguous());
        assert_eq!(km.required_width(), 3);
    }

    #[test]
    fn rows_share_the_keymap() {
        let meta = Arc::new(ResultMetadata::new(people_schema(), MetadataOptions::default()));
        let a = meta
            .make_row(vec![Value::Int64(1), Value::from("a"), Value::Float64(1.0)])
            .unwrap();
        let b = meta
            .make_row(vec![Value::Int64(2), Value::from("b"), Value::Float64(2.0)])
            .unwrap();
        assert!(Arc::ptr_eq(a.keymap(), b.keymap()));
        assert!(Arc::ptr_eq(a.parent(), &meta));
    }

    #[test]
    fn case_sensitive_by_default() {
        let meta = Arc::new(ResultMetadata::new(people_schema(), MetadataOptions::default()));
        let row = meta
            .make_row(vec![Value::Int64(1), Value::from("a"), Value::Float64(1.0)])
            .unwrap();
        let err = row.get_by_key(&"ID".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key);
    }

    #[test]
    fn case_insensitive_fallback() {
        let opts = MetadataOptions {
            case_sensitive: false,
            ..MetadataOptions::default()
        };
        let meta = Arc::new(ResultMetadata::new(people_schema(), opts));
        let row = meta
            .make_row(vec![Value::Int64(1), Value::from("a"), Value::Float64(1.5)])
            .unwrap();
        assert_eq!(row.get_by_key(&"ID".into()).unwrap(), &Value::Int64(1));
        assert_eq!(row.get_by_key(&"score".into()).unwrap(), &Value::Float64(1.5));

        let err = row.get_by_key(&"LABEL".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
        assert!(err.to_string().contains("'LABEL'"));
    }

    #[test]
    fn coerce_types_attaches_processors() {
        let opts = MetadataOptions {
            coerce_types: true,
            ..MetadataOptions::default()
        };
        let meta = Arc::new(ResultMetadata::new(people_schema(), opts));
        let row = meta
            .make_row(vec![Value::from("7"), Value::from("Ada"), Value::from("")])
            .unwrap();
        assert_eq!(row.to_vec(), vec![Value::Int64(7), Value::from("Ada"), Value::Null]);
    }

    #[test]
    fn explicit_processors_must_match_schema() {
        let err =
            ResultMetadata::with_processors(people_schema(), vec![None], MetadataOptions::default())
                .unwrap_err();
        assert!(matches!(err, RowError::SchemaMismatch { .. }));

        let meta = ResultMetadata::with_processors(
            people_schema(),
            vec![None, Some(to_upper()), None],
            MetadataOptions::default(),
        )
        .unwrap();
        assert_eq!(meta.processors().iter().filter(|p| p.is_some()).count(), 1);
    }

    #[test]
    fn parallel_rows_keep_order_and_first_error() {
        let opts = MetadataOptions {
            coerce_types: true,
            ..MetadataOptions::default()
        };
        let meta = Arc::new(ResultMetadata::new(people_schema(), opts));
        let raws: Vec<Vec<Value>> = (0..100)
            .map(|i| vec![Value::from(i.to_string()), Value::from("n"), Value::Null])
            .collect();
        let rows = meta.make_rows_par(raws.clone()).unwrap();
        assert_eq!(rows, meta.make_rows(raws).unwrap());
        assert_eq!(rows[42].get(0).unwrap(), &Value::Int64(42));

        let mut bad: Vec<Vec<Value>> = (0..10)
            .map(|i| vec![Value::from(i.to_string()), Value::from("n"), Value::Null])
            .collect();
        bad[3] = vec![Value::from("x3"), Value::from("n"), Value::Null];
        bad[7] = vec![Value::Int64(1)];
        let err = meta.make_rows_par(bad).unwrap_err();
        assert!(matches!(err, RowError::Processor { column: 0, .. }));
    }

    #[test]
    fn serde_round_trip_rebuilds_keymap() {
        let meta = ResultMetadata::new(people_schema(), MetadataOptions::default());
        let json = serde_json::to_string(&meta).unwrap();
        let back: ResultMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema(), meta.schema());
        assert_eq!(back.keymap().as_ref(), meta.keymap().as_ref());
        assert_eq!(back.options(), meta.options());
    }
}
