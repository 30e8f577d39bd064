use crate::{
    record::{Record, RecordMut},
    relation::{AssociationOps, RelatedData, RelatedError, RelatedSpec, SaveContext},
    schema::{Association, AssociationKind},
    value::{Value, ValueMap},
};

///
/// SyncStats
///
/// Row accounting for one association sync.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncStats {
    /// Existing rows attached or re-bound.
    pub bound: usize,
    /// Rows created and attached.
    pub created: usize,
    /// Stale rows kept because another reference column is live.
    pub detached_saved: usize,
    /// Stale rows with no remaining reference, removed.
    pub detached_destroyed: usize,
}

impl SyncStats {
    pub const fn merge(&mut self, other: Self) {
        self.bound += other.bound;
        self.created += other.created;
        self.detached_saved += other.detached_saved;
        self.detached_destroyed += other.detached_destroyed;
    }
}

/// Applies one association payload. The `(kind, payload)` pair selects
/// the flow: to-one rebinding, single to-many attach, or the full to-many
/// diff with stale-row detach.
///
/// The attached set is read before any spec is applied, so only rows that
/// were attached before this call are detach candidates.
pub fn sync_association<O: AssociationOps>(
    name: &str,
    association: &Association,
    ops: &mut O,
    ctx: SaveContext,
    data: &RelatedData,
) -> Result<SyncStats, RelatedError<O::Error>> {
    let mut syncer = Syncer {
        name,
        association,
        ops,
        ctx,
        stats: SyncStats::default(),
    };

    match (association.kind, data) {
        (AssociationKind::ToOne, RelatedData::One(spec)) => syncer.apply_one(spec, Attach::Set)?,
        (AssociationKind::ToMany, RelatedData::One(spec)) => syncer.apply_one(spec, Attach::Add)?,
        (AssociationKind::ToMany, RelatedData::Many(specs)) => syncer.apply_many(specs)?,
        (AssociationKind::ToOne, RelatedData::Many(_)) => {
            return Err(RelatedError::KindMismatch {
                association: name.to_string(),
            });
        }
    }

    Ok(syncer.stats)
}

/// How a resolved target binds to the root.
#[derive(Clone, Copy)]
enum Attach {
    Add,
    Set,
}

///
/// Syncer
///
/// One sync pass over one association, bundling the accessor handle with
/// the descriptor it executes against.
///

struct Syncer<'a, O: AssociationOps> {
    name: &'a str,
    association: &'a Association,
    ops: &'a mut O,
    ctx: SaveContext,
    stats: SyncStats,
}

impl<'a, O: AssociationOps> Syncer<'a, O> {
    fn apply_one(
        &mut self,
        spec: &RelatedSpec,
        attach: Attach,
    ) -> Result<(), RelatedError<O::Error>> {
        match spec {
            RelatedSpec::Id(id) => {
                self.attach(attach, id)?;
                self.stats.bound += 1;
            }
            RelatedSpec::Upsert(values) => {
                let match_field = self.match_field()?;
                // A map without the lookup value cannot match anything
                // and falls through to create.
                let found = match values.get(match_field) {
                    Some(lookup) => self
                        .ops
                        .find_by(self.ctx, match_field, lookup)
                        .map_err(RelatedError::Engine)?,
                    None => None,
                };

                match found {
                    Some(row) => {
                        let id = self.primary_id(&row)?;
                        self.attach(attach, &id)?;
                        self.stats.bound += 1;
                    }
                    None => self.create(values)?,
                }
            }
            RelatedSpec::Create(values) => self.create(values)?,
        }

        Ok(())
    }

    fn apply_many(&mut self, specs: &[RelatedSpec]) -> Result<(), RelatedError<O::Error>> {
        let attached = self.ops.attached(self.ctx).map_err(RelatedError::Engine)?;

        for spec in specs {
            self.apply_one(spec, Attach::Add)?;
        }

        self.detach_stale(attached, specs)
    }

    /// Detaches every previously attached row the incoming list no longer
    /// claims. An empty list is an explicit detach-all instruction.
    fn detach_stale(
        &mut self,
        attached: Vec<O::Row>,
        specs: &[RelatedSpec],
    ) -> Result<(), RelatedError<O::Error>> {
        if attached.is_empty() {
            return Ok(());
        }

        if specs.is_empty() {
            for row in attached {
                self.detach(row)?;
            }

            return Ok(());
        }

        let match_field = self.match_field()?;
        let wanted: Vec<&Value> = specs
            .iter()
            .filter_map(|spec| spec.lookup_value(match_field))
            .collect();

        for row in attached {
            let stale = match row.field(match_field).live_value() {
                Some(value) => !wanted.iter().any(|claimed| **claimed == *value),
                // A row unreadable through the match field cannot be
                // claimed by any incoming spec.
                None => true,
            };
            if stale {
                self.detach(row)?;
            }
        }

        Ok(())
    }

    /// Nulls the foreign key, then keeps or removes the row depending on
    /// whether any other reference column is still live.
    fn detach(&mut self, mut row: O::Row) -> Result<(), RelatedError<O::Error>> {
        let Some(foreign_key) = self.association.foreign_key.as_deref() else {
            return Err(RelatedError::MissingForeignKey {
                association: self.name.to_string(),
            });
        };

        row.set_field(foreign_key, Value::Null);

        if self.has_live_reference(&row) {
            self.ops.save(self.ctx, &row).map_err(RelatedError::Engine)?;
            self.stats.detached_saved += 1;
        } else {
            self.ops
                .destroy(self.ctx, &row)
                .map_err(RelatedError::Engine)?;
            self.stats.detached_destroyed += 1;
        }

        Ok(())
    }

    fn create(&mut self, values: &ValueMap) -> Result<(), RelatedError<O::Error>> {
        self.ops
            .create(self.ctx, values)
            .map_err(RelatedError::Engine)?;
        self.stats.created += 1;

        Ok(())
    }

    fn attach(&mut self, attach: Attach, target: &Value) -> Result<(), RelatedError<O::Error>> {
        match attach {
            Attach::Add => self.ops.add(self.ctx, target),
            Attach::Set => self.ops.set(self.ctx, target),
        }
        .map_err(RelatedError::Engine)
    }

    // Returned with the descriptor's lifetime, so callers can keep it
    // across later accessor calls.
    fn match_field(&self) -> Result<&'a str, RelatedError<O::Error>> {
        self.association
            .match_field
            .as_deref()
            .ok_or_else(|| RelatedError::MissingMatchField {
                association: self.name.to_string(),
            })
    }

    fn primary_id(&self, row: &O::Row) -> Result<Value, RelatedError<O::Error>> {
        let primary_key = &self.association.primary_key;

        row.field(primary_key)
            .live_value()
            .cloned()
            .ok_or_else(|| RelatedError::MissingPrimaryKey {
                association: self.name.to_string(),
                primary_key: primary_key.clone(),
            })
    }

    fn has_live_reference(&self, row: &O::Row) -> bool {
        self.association
            .target_references
            .iter()
            .any(|reference| row.field(reference).live_value().is_some())
    }
}
