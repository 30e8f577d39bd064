use thiserror::Error as ThisError;

use crate::{
    record::{Record, RecordMut},
    relation::{AssociationOps, RelatedError, SaveContext, SaveData, SyncStats, sync_association},
    schema::EntityShape,
    value::{Value, ValueMap},
};

///
/// AggregateStore
///
/// Root-row surface of the engine adapter.
///

pub trait AggregateStore {
    type Row: RecordMut;
    type Error;

    /// Create the root row from scalar values.
    fn create(&mut self, ctx: SaveContext, values: &ValueMap) -> Result<Self::Row, Self::Error>;

    /// Load one root row by primary key value.
    fn load(&mut self, ctx: SaveContext, id: &Value) -> Result<Option<Self::Row>, Self::Error>;

    /// Persist the root row.
    fn save(&mut self, ctx: SaveContext, row: &Self::Row) -> Result<(), Self::Error>;

    /// Run `work` inside one engine transaction, handing it
    /// `ctx.entered()`. A failed closure rolls the transaction back and
    /// surfaces the closure's error unchanged.
    fn transaction<T>(
        &mut self,
        ctx: SaveContext,
        work: impl FnOnce(&mut Self, SaveContext) -> Result<T, AggregateError<Self::Error>>,
    ) -> Result<T, AggregateError<Self::Error>>;
}

///
/// AggregateError
///
/// Aggregate-write failures. Engine errors pass through untranslated.
///

#[derive(Debug, ThisError)]
pub enum AggregateError<E> {
    #[error("aggregate writes are disabled by configuration")]
    WritesDisabled,

    #[error("unknown association '{association}' on entity '{entity}'")]
    UnknownAssociation { entity: String, association: String },

    #[error(transparent)]
    Related(RelatedError<E>),

    #[error("root row of entity '{entity}' vanished during save")]
    RootNotFound { entity: String },

    #[error("engine operation failed: {0}")]
    Engine(E),
}

/// Runs `work` in the current transaction when the context already holds
/// one, otherwise opens one around it.
pub fn run_in_transaction<S, T>(
    store: &mut S,
    ctx: SaveContext,
    work: impl FnOnce(&mut S, SaveContext) -> Result<T, AggregateError<S::Error>>,
) -> Result<T, AggregateError<S::Error>>
where
    S: AggregateStore,
{
    if ctx.in_transaction() {
        work(store, ctx)
    } else {
        store.transaction(ctx, work)
    }
}

/// Creates the root row from the shape's columns of `data.values`, syncs
/// every related payload, saves, and returns the root reloaded by primary
/// key. The whole flow runs in one transaction.
pub fn create_with_related<S, O>(
    shape: &EntityShape,
    store: &mut S,
    ctx: SaveContext,
    data: &SaveData,
    mut ops_for: impl FnMut(&S::Row, &str) -> O,
) -> Result<S::Row, AggregateError<S::Error>>
where
    S: AggregateStore,
    O: AssociationOps<Row = S::Row, Error = S::Error>,
{
    run_in_transaction(store, ctx, |store, ctx| {
        let values = restrict_to_columns(shape, &data.values);
        let root = store.create(ctx, &values).map_err(AggregateError::Engine)?;

        sync_related(shape, &root, data, ctx, &mut ops_for)?;

        store.save(ctx, &root).map_err(AggregateError::Engine)?;

        reload_root(shape, store, ctx, &root)
    })
}

/// Loads the root by `id`, assigns the shape's columns of `data.values`
/// (primary key excluded), syncs every related payload, saves, and
/// returns the root reloaded by primary key. One transaction end to end.
pub fn update_with_related<S, O>(
    shape: &EntityShape,
    store: &mut S,
    ctx: SaveContext,
    id: &Value,
    data: &SaveData,
    mut ops_for: impl FnMut(&S::Row, &str) -> O,
) -> Result<S::Row, AggregateError<S::Error>>
where
    S: AggregateStore,
    O: AssociationOps<Row = S::Row, Error = S::Error>,
{
    run_in_transaction(store, ctx, |store, ctx| {
        let mut root = store
            .load(ctx, id)
            .map_err(AggregateError::Engine)?
            .ok_or_else(|| root_not_found(shape))?;

        for (name, value) in restrict_to_columns(shape, &data.values) {
            if name != shape.primary_key() {
                root.set_field(&name, value);
            }
        }

        sync_related(shape, &root, data, ctx, &mut ops_for)?;

        store.save(ctx, &root).map_err(AggregateError::Engine)?;

        reload_root(shape, store, ctx, &root)
    })
}

/// Syncs every entry of `data.related` against the shape, in association
/// name order.
fn sync_related<R, E, O>(
    shape: &EntityShape,
    root: &R,
    data: &SaveData,
    ctx: SaveContext,
    ops_for: &mut impl FnMut(&R, &str) -> O,
) -> Result<SyncStats, AggregateError<E>>
where
    R: RecordMut,
    O: AssociationOps<Row = R, Error = E>,
{
    let mut totals = SyncStats::default();
    for (name, payload) in &data.related {
        let Some(association) = shape.association(name) else {
            return Err(AggregateError::UnknownAssociation {
                entity: shape.entity().to_string(),
                association: name.clone(),
            });
        };

        let mut ops = ops_for(root, name);
        let stats = sync_association(name, association, &mut ops, ctx, payload)
            .map_err(AggregateError::Related)?;
        totals.merge(stats);
    }

    Ok(totals)
}

// Drop every value the shape has no column for, so payload noise never
// reaches the engine.
fn restrict_to_columns(shape: &EntityShape, values: &ValueMap) -> ValueMap {
    values
        .iter()
        .filter(|(name, _)| shape.has_column(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn reload_root<S>(
    shape: &EntityShape,
    store: &mut S,
    ctx: SaveContext,
    root: &S::Row,
) -> Result<S::Row, AggregateError<S::Error>>
where
    S: AggregateStore,
{
    let id = root
        .field(shape.primary_key())
        .live_value()
        .cloned()
        .ok_or_else(|| root_not_found(shape))?;

    store
        .load(ctx, &id)
        .map_err(AggregateError::Engine)?
        .ok_or_else(|| root_not_found(shape))
}

fn root_not_found<E>(shape: &EntityShape) -> AggregateError<E> {
    AggregateError::RootNotFound {
        entity: shape.entity().to_string(),
    }
}
