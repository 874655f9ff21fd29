use thiserror::Error;

use crate::processors::ProcessorError;

/// Convenience result type for row operations.
pub type RowResult<T> = Result<T, RowError>;

/// Longest label rendered into ambiguity and lookup messages, in characters.
const MAX_LABEL_CHARS: usize = 200;

/// Error type returned by row construction, lookup, extraction and reconstruction.
#[derive(Debug, Error)]
pub enum RowError {
    /// The raw values and the column processors have different lengths.
    #[error("number of values in row ({values}) differ from number of column processors ({processors})")]
    LengthMismatch { values: usize, processors: usize },

    /// The keymap addresses a position outside the row.
    #[error("keymap requires a row of at least {required} values, got {len}")]
    InvalidKeymap { required: usize, len: usize },

    /// Metadata inputs do not line up (e.g. processor list vs schema fields).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A column processor failed; the processor's own error is the source.
    #[error("processor for column {column} failed: {source}")]
    Processor {
        column: usize,
        #[source]
        source: ProcessorError,
    },

    /// Positional access outside the row.
    #[error("row index {index} out of range for row of length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// A slice was requested with a step of zero.
    #[error("slice step cannot be zero")]
    ZeroSliceStep,

    /// Keyed lookup found no column, even after the owner's fallback.
    #[error("Could not locate column in row for column {key}")]
    NoSuchColumn { key: String },

    /// Attribute-style lookup found no column.
    #[error("Could not locate column in row for column '{name}'")]
    NoSuchAttribute { name: String },

    /// The key maps to more than one column.
    #[error("Ambiguous column name '{label}' in result set column descriptions")]
    AmbiguousColumn { label: String },

    /// Restoring a row left one of its required fields unset.
    #[error("{message}")]
    Reconstruction { message: String },

    /// A snapshot was restored through a row class it was not taken with.
    #[error("snapshot was taken with row class '{found}', cannot restore as '{expected}'")]
    ClassMismatch { expected: String, found: String },

    /// Snapshot encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`RowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    Processor,
    Index,
    Key,
    Attribute,
    Ambiguous,
    Reconstruction,
    Serialization,
}

impl RowError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RowError::LengthMismatch { .. }
            | RowError::InvalidKeymap { .. }
            | RowError::SchemaMismatch { .. } => ErrorKind::Construction,
            RowError::Processor { .. } => ErrorKind::Processor,
            RowError::IndexOutOfRange { .. } | RowError::ZeroSliceStep => ErrorKind::Index,
            RowError::NoSuchColumn { .. } => ErrorKind::Key,
            RowError::NoSuchAttribute { .. } => ErrorKind::Attribute,
            RowError::AmbiguousColumn { .. } => ErrorKind::Ambiguous,
            RowError::Reconstruction { .. } | RowError::ClassMismatch { .. } => {
                ErrorKind::Reconstruction
            }
            RowError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub(crate) fn ambiguous(label: &str) -> Self {
        RowError::AmbiguousColumn {
            label: truncate_label(label),
        }
    }

    pub(crate) fn no_such_attribute(name: &str) -> Self {
        RowError::NoSuchAttribute {
            name: truncate_label(name),
        }
    }
}

fn truncate_label(label: &str) -> String {
    match label.char_indices().nth(MAX_LABEL_CHARS) {
        Some((cut, _)) => label[..cut].to_owned(),
        None => label.to_owned(),
    }
}
