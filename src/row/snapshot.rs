//! Snapshot/restore for rows.
//!
//! A snapshot is `(reconstructor, (class, state))`: enough to rebuild an equivalent row later,
//! possibly in another process, without going through [`Row::new`]. Restoring is two-phase.
//! [`reconstruct`] hands a bare [`RowSlot`] to the class's [`RowClass::set_state`], and only then
//! checks that parent, values and keymap were all provided.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RowError, RowResult};
use crate::keymap::Keymap;
use crate::types::Value;

use super::{check_keymap, Row};

/// Entry point a snapshot is restored through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reconstructor {
    /// [`reconstruct`]: allocate a bare slot, apply state, verify.
    SafeRow,
}

/// Defines what a row's snapshot state is.
pub trait RowClass<P> {
    /// Name recorded in snapshots and checked on restore.
    const NAME: &'static str;

    type State: Serialize + DeserializeOwned;

    /// Capture the state of `row`.
    fn get_state(row: &Row<P>) -> Self::State;

    /// Populate `slot` from `state`. Leaving a field unset makes [`reconstruct`] fail.
    fn set_state(slot: &mut RowSlot<P>, state: Self::State) -> RowResult<()>;
}

/// The default row class: the state is parent, data and keymap.
///
/// The state owns copies of the parent and keymap, so rows restored with
/// [`RowSnapshot::restore`] each get their own. Use [`RowSnapshot::restore_shared`] to have a
/// batch of restored rows point at one parent and keymap again.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRow;

/// State captured by [`StandardRow`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardRowState<P> {
    pub parent: Arc<P>,
    pub data: Vec<Value>,
    pub keymap: Arc<Keymap>,
}

impl<P> RowClass<P> for StandardRow
where
    P: Serialize + DeserializeOwned,
{
    const NAME: &'static str = "Row";

    type State = StandardRowState<P>;

    fn get_state(row: &Row<P>) -> Self::State {
        StandardRowState {
            parent: Arc::clone(&row.parent),
            data: row.values.to_vec(),
            keymap: Arc::clone(&row.keymap),
        }
    }

    fn set_state(slot: &mut RowSlot<P>, state: Self::State) -> RowResult<()> {
        slot.set_parent(state.parent);
        slot.set_values(state.data);
        slot.set_keymap(state.keymap);
        Ok(())
    }
}

/// A row under restoration. Not a valid row until [`RowSlot::finish`] succeeds.
pub struct RowSlot<P> {
    parent: Option<Arc<P>>,
    values: Option<Vec<Value>>,
    keymap: Option<Arc<Keymap>>,
}

impl<P> RowSlot<P> {
    /// An empty slot with nothing set.
    pub fn new() -> Self {
        Self {
            parent: None,
            values: None,
            keymap: None,
        }
    }

    /// Set the owning parent.
    pub fn set_parent(&mut self, parent: Arc<P>) {
        self.parent = Some(parent);
    }

    /// Set the processed values.
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = Some(values);
    }

    /// Set the keymap.
    pub fn set_keymap(&mut self, keymap: Arc<Keymap>) {
        self.keymap = Some(keymap);
    }

    /// `true` once parent, values and keymap are all set.
    pub fn is_complete(&self) -> bool {
        self.parent.is_some() && self.values.is_some() && self.keymap.is_some()
    }

    /// Turn the slot into a row, checking that every field was set.
    pub fn finish(self) -> RowResult<Row<P>> {
        let missing: Vec<&str> = [
            ("parent", self.parent.is_none()),
            ("row", self.values.is_none()),
            ("keymap", self.keymap.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, unset)| unset.then_some(name))
        .collect();

        let (Some(parent), Some(values), Some(keymap)) = (self.parent, self.values, self.keymap)
        else {
            return Err(RowError::Reconstruction {
                message: format!(
                    "set_state for row classes must set values for parent, row, and keymap (missing: {})",
                    missing.join(", ")
                ),
            });
        };

        check_keymap(&keymap, values.len())?;
        Ok(Row {
            parent,
            values: values.into_boxed_slice(),
            keymap,
        })
    }
}

impl<P> Default for RowSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A self-contained description of a row: reconstructor, class name and state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSnapshot<S> {
    pub reconstructor: Reconstructor,
    pub class: String,
    pub state: S,
}

impl<S> RowSnapshot<S> {
    /// Rebuild the row through the recorded reconstructor.
    pub fn restore<P, C>(self) -> RowResult<Row<P>>
    where
        C: RowClass<P, State = S>,
    {
        match self.reconstructor {
            Reconstructor::SafeRow => reconstruct::<P, C>(&self.class, self.state),
        }
    }
}

impl<S: Serialize> RowSnapshot<S> {
    /// Encode the snapshot as JSON.
    pub fn to_json(&self) -> RowResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<S: DeserializeOwned> RowSnapshot<S> {
    /// Decode a snapshot written by [`RowSnapshot::to_json`].
    pub fn from_json(json: &str) -> RowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<P> RowSnapshot<StandardRowState<P>>
where
    P: Serialize + DeserializeOwned,
{
    /// Restore with `parent` and `keymap` in place of the copies the snapshot carries.
    ///
    /// Fails with [`RowError::SchemaMismatch`] when the snapshot's keymap differs from `keymap`.
    pub fn restore_shared(self, parent: &Arc<P>, keymap: &Arc<Keymap>) -> RowResult<Row<P>> {
        if *self.state.keymap != **keymap {
            return Err(RowError::SchemaMismatch {
                message: "snapshot keymap differs from the shared keymap".to_owned(),
            });
        }
        let state = StandardRowState {
            parent: Arc::clone(parent),
            data: self.state.data,
            keymap: Arc::clone(keymap),
        };
        reconstruct::<P, StandardRow>(&self.class, state)
    }
}

impl<P> Row<P> {
    /// Capture this row as a [`RowSnapshot`] of class `C`.
    pub fn snapshot<C: RowClass<P>>(&self) -> RowSnapshot<C::State> {
        RowSnapshot {
            reconstructor: Reconstructor::SafeRow,
            class: C::NAME.to_owned(),
            state: C::get_state(self),
        }
    }
}

/// Rebuild a row of class `C` from `state`, bypassing [`Row::new`].
///
/// Processors are not run again; the state already holds processed values.
pub fn reconstruct<P, C: RowClass<P>>(class: &str, state: C::State) -> RowResult<Row<P>> {
    if class != C::NAME {
        return Err(RowError::ClassMismatch {
            expected: C::NAME.to_owned(),
            found: class.to_owned(),
        });
    }

    let mut slot = RowSlot::new();
    C::set_state(&mut slot, state)?;
    match slot.finish() {
        Ok(row) => {
            debug!(class, columns = row.len(), "reconstructed row");
            Ok(row)
        }
        Err(e) => {
            warn!(class, error = %e, "row reconstruction failed");
            Err(e)
        }
    }
}
