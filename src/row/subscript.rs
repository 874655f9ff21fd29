use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{RowError, RowResult};
use crate::types::{ColumnKey, Value};

/// A slice request with optional bounds and step.
///
/// Resolution follows sequence slicing rules: half-open, negative bounds count from the end,
/// out-of-range bounds are clamped, and a negative step walks backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    /// A slice from explicit parts; `None` takes the default for the step direction.
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// Replace the step.
    pub fn with_step(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    /// Resolve into concrete indices for a sequence of length `len`.
    pub fn indices(&self, len: usize) -> RowResult<Vec<usize>> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(RowError::ZeroSliceStep);
        }

        let len = len as isize;
        let (start, stop) = if step > 0 {
            (
                self.start.map_or(0, |s| clamp(s, len, 0, len)),
                self.stop.map_or(len, |s| clamp(s, len, 0, len)),
            )
        } else {
            (
                self.start.map_or(len - 1, |s| clamp(s, len, -1, len - 1)),
                self.stop.map_or(-1, |s| clamp(s, len, -1, len - 1)),
            )
        };

        let mut out = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(out)
    }
}

fn clamp(bound: isize, len: isize, lower: isize, upper: isize) -> isize {
    if bound < 0 {
        (bound + len).max(lower)
    } else {
        bound.min(upper)
    }
}

impl From<Range<isize>> for SliceSpec {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<isize>> for SliceSpec {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None, None)
    }
}

impl From<RangeTo<isize>> for SliceSpec {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end), None)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

/// What a row subscript addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscript {
    /// A single position; negative counts from the end.
    Index(isize),
    /// A projection of several positions.
    Slice(SliceSpec),
    /// A keymap lookup.
    Key(ColumnKey),
}

impl From<isize> for Subscript {
    fn from(i: isize) -> Self {
        Subscript::Index(i)
    }
}

impl From<SliceSpec> for Subscript {
    fn from(s: SliceSpec) -> Self {
        Subscript::Slice(s)
    }
}

impl From<Range<isize>> for Subscript {
    fn from(r: Range<isize>) -> Self {
        Subscript::Slice(r.into())
    }
}

impl From<RangeFrom<isize>> for Subscript {
    fn from(r: RangeFrom<isize>) -> Self {
        Subscript::Slice(r.into())
    }
}

impl From<RangeTo<isize>> for Subscript {
    fn from(r: RangeTo<isize>) -> Self {
        Subscript::Slice(r.into())
    }
}

impl From<RangeFull> for Subscript {
    fn from(r: RangeFull) -> Self {
        Subscript::Slice(r.into())
    }
}

impl From<ColumnKey> for Subscript {
    fn from(k: ColumnKey) -> Self {
        Subscript::Key(k)
    }
}

impl From<&str> for Subscript {
    fn from(k: &str) -> Self {
        Subscript::Key(k.into())
    }
}

impl From<String> for Subscript {
    fn from(k: String) -> Self {
        Subscript::Key(k.into())
    }
}

/// Result of a subscript: a single value, or a projected tuple of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<'a> {
    Value(&'a Value),
    Values(Vec<Value>),
}

impl<'a> Item<'a> {
    /// The single value, if this item is not a projection.
    pub fn as_value(&self) -> Option<&'a Value> {
        match self {
            Item::Value(v) => Some(v),
            Item::Values(_) => None,
        }
    }

    /// The projected values, if this item came from a slice.
    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Item::Value(_) => None,
            Item::Values(vs) => Some(vs),
        }
    }
}
