//! Module: relation
//! Responsibility: bind, create, and detach related rows for one root
//! instance, and orchestrate whole-aggregate writes.
//! Does not own: row storage or transaction mechanics, both live behind
//! the engine traits.
//! Boundary: every engine call receives the explicit `SaveContext`; no
//! ambient transaction state exists anywhere in the crate.

mod save;
mod sync;

pub use save::{
    AggregateError, AggregateStore, create_with_related, run_in_transaction, update_with_related,
};
pub use sync::{SyncStats, sync_association};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{
    record::RecordMut,
    value::{Value, ValueMap},
};

///
/// SaveContext
///
/// Explicit transaction context threaded through every engine call. A
/// copyable token instead of process-wide ambient state, so concurrent
/// save flows cannot observe each other's transactions.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SaveContext {
    in_transaction: bool,
}

impl SaveContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_transaction: false,
        }
    }

    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Context handed to work already running inside a transaction.
    #[must_use]
    pub const fn entered(self) -> Self {
        Self {
            in_transaction: true,
        }
    }
}

///
/// RelatedSpec
///
/// One incoming related row, tagged by how it binds.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RelatedSpec {
    /// Bind an existing target row by primary id.
    Id(Value),
    /// Look the target up by the association's match field; bind it when
    /// found, create it from the full map when not.
    Upsert(ValueMap),
    /// Always create and bind.
    Create(ValueMap),
}

impl RelatedSpec {
    /// Lookup value the to-many diff matches attached rows against. Id
    /// specs bind by primary id and take no part in the diff.
    fn lookup_value(&self, match_field: &str) -> Option<&Value> {
        match self {
            Self::Id(_) => None,
            Self::Upsert(values) | Self::Create(values) => values.get(match_field),
        }
    }
}

///
/// RelatedData
///
/// Payload for one association, mirroring its cardinality. A `Many` with
/// an empty list is an explicit detach-all instruction.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RelatedData {
    One(RelatedSpec),
    Many(Vec<RelatedSpec>),
}

///
/// SaveData
///
/// One aggregate write: scalar values for the root plus related payloads
/// keyed by association name.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SaveData {
    pub values: ValueMap,
    pub related: BTreeMap<String, RelatedData>,
}

impl SaveData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_related(mut self, association: impl Into<String>, data: RelatedData) -> Self {
        self.related.insert(association.into(), data);
        self
    }
}

///
/// AssociationOps
///
/// Accessor surface an engine adapter exposes for one association of one
/// root instance. `sync_association` drives it; implementations decide
/// how attach and detach translate to storage.
///

pub trait AssociationOps {
    type Row: RecordMut;
    type Error;

    /// Find one target row whose `field` equals `value`.
    fn find_by(
        &mut self,
        ctx: SaveContext,
        field: &str,
        value: &Value,
    ) -> Result<Option<Self::Row>, Self::Error>;

    /// Rows currently attached to the root through this association.
    fn attached(&mut self, ctx: SaveContext) -> Result<Vec<Self::Row>, Self::Error>;

    /// Attach one target by id, leaving other attachments alone.
    fn add(&mut self, ctx: SaveContext, target: &Value) -> Result<(), Self::Error>;

    /// Make one target by id the sole attachment.
    fn set(&mut self, ctx: SaveContext, target: &Value) -> Result<(), Self::Error>;

    /// Create a target row from `values` and attach it.
    fn create(&mut self, ctx: SaveContext, values: &ValueMap) -> Result<Self::Row, Self::Error>;

    /// Persist one detached but still referenced target row.
    fn save(&mut self, ctx: SaveContext, row: &Self::Row) -> Result<(), Self::Error>;

    /// Delete one fully orphaned target row.
    fn destroy(&mut self, ctx: SaveContext, row: &Self::Row) -> Result<(), Self::Error>;
}

///
/// RelatedError
///
/// Sync failures. Engine errors pass through untranslated.
///

#[derive(Debug, ThisError)]
pub enum RelatedError<E> {
    #[error("association '{association}' does not accept a list payload")]
    KindMismatch { association: String },

    #[error("association '{association}' has no match field configured for upsert")]
    MissingMatchField { association: String },

    #[error("row bound through '{association}' has no readable primary key '{primary_key}'")]
    MissingPrimaryKey {
        association: String,
        primary_key: String,
    },

    #[error("association '{association}' has no foreign key configured for detach")]
    MissingForeignKey { association: String },

    #[error("engine operation failed: {0}")]
    Engine(E),
}
