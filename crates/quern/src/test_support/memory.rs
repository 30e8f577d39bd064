use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use thiserror::Error as ThisError;

use crate::{
    find::FindOptions,
    post_fetch::apply_virtual_order,
    record::Record,
    relation::{AggregateError, AggregateStore, AssociationOps, SaveContext},
    schema::{Association, EntityShape},
    test_support::eval,
    value::{Value, ValueMap},
};

///
/// MemoryError
///
/// Failures the in-memory engine produces.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub(crate) enum MemoryError {
    #[error("no table named '{table}'")]
    NoTable { table: String },

    #[error("memory engine needs a foreign key for '{association}'")]
    NoForeignKey { association: String },
}

///
/// MemoryDb
///
/// Shared in-memory engine: one table per entity, rows as value maps,
/// whole-state snapshots standing in for transactions. Attachment is
/// modeled as the target row's foreign key pointing at the root id.
///

#[derive(Clone, Default)]
pub(crate) struct MemoryDb {
    state: Rc<RefCell<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<ValueMap>>,
    transactions_opened: usize,
}

impl MemoryDb {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `table` and fill it with `rows`.
    pub(crate) fn seed(&self, table: &str, rows: Vec<ValueMap>) {
        self.state
            .borrow_mut()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<ValueMap> {
        self.state
            .borrow()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn transactions_opened(&self) -> usize {
        self.state.borrow().transactions_opened
    }

    /// Relational fetch: filter, order, offset, limit. Includes are join
    /// instructions for a real engine and are ignored here.
    pub(crate) fn fetch(
        &self,
        shape: &EntityShape,
        options: &FindOptions,
    ) -> Result<Vec<ValueMap>, MemoryError> {
        let state = self.state.borrow();
        let table = state
            .tables
            .get(shape.entity())
            .ok_or_else(|| no_table(shape.entity()))?;

        let mut rows: Vec<ValueMap> = table
            .iter()
            .filter(|row| {
                options
                    .filter
                    .as_ref()
                    .is_none_or(|filter| eval::eval(filter, row))
            })
            .cloned()
            .collect();

        apply_virtual_order(&mut rows, &options.order);

        let offset = usize::try_from(options.offset).unwrap_or(usize::MAX);
        let mut rows: Vec<ValueMap> = rows.into_iter().skip(offset).collect();
        if let Some(limit) = options.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(rows)
    }

    /// Entity-scoped root-row handle.
    pub(crate) fn store(&self, shape: &EntityShape) -> MemoryStore {
        MemoryStore {
            db: self.clone(),
            entity: shape.entity().to_string(),
            primary_key: shape.primary_key().to_string(),
        }
    }

    /// Association-scoped accessor handle for one root row.
    pub(crate) fn ops(&self, shape: &EntityShape, association: &str, root: &ValueMap) -> MemoryOps {
        let descriptor = shape
            .association(association)
            .expect("association exists on the shape")
            .clone();
        let root_id = root
            .field(shape.primary_key())
            .live_value()
            .cloned()
            .expect("root row carries its primary key");

        MemoryOps {
            db: self.clone(),
            association: association.to_string(),
            descriptor,
            root_id,
        }
    }
}

///
/// MemoryStore
///
/// Root-row handle over the shared state for one entity.
///

pub(crate) struct MemoryStore {
    db: MemoryDb,
    entity: String,
    primary_key: String,
}

impl AggregateStore for MemoryStore {
    type Row = ValueMap;
    type Error = MemoryError;

    fn create(&mut self, _ctx: SaveContext, values: &ValueMap) -> Result<ValueMap, MemoryError> {
        let mut state = self.db.state.borrow_mut();
        let table = state
            .tables
            .get_mut(&self.entity)
            .ok_or_else(|| no_table(&self.entity))?;

        let mut row = values.clone();
        if row.field(&self.primary_key).live_value().is_none() {
            row.insert(
                self.primary_key.clone(),
                Value::Uint(allocate_id(table, &self.primary_key)),
            );
        }
        table.push(row.clone());

        Ok(row)
    }

    fn load(&mut self, _ctx: SaveContext, id: &Value) -> Result<Option<ValueMap>, MemoryError> {
        let state = self.db.state.borrow();
        let table = state
            .tables
            .get(&self.entity)
            .ok_or_else(|| no_table(&self.entity))?;

        Ok(find_by_field(table, &self.primary_key, id).cloned())
    }

    fn save(&mut self, _ctx: SaveContext, row: &ValueMap) -> Result<(), MemoryError> {
        let mut state = self.db.state.borrow_mut();
        let table = state
            .tables
            .get_mut(&self.entity)
            .ok_or_else(|| no_table(&self.entity))?;

        match row
            .get(&self.primary_key)
            .and_then(|id| position_by_field(table, &self.primary_key, id))
        {
            Some(index) => table[index] = row.clone(),
            None => table.push(row.clone()),
        }

        Ok(())
    }

    fn transaction<T>(
        &mut self,
        ctx: SaveContext,
        work: impl FnOnce(&mut Self, SaveContext) -> Result<T, AggregateError<MemoryError>>,
    ) -> Result<T, AggregateError<MemoryError>> {
        let snapshot = {
            let mut state = self.db.state.borrow_mut();
            state.transactions_opened += 1;
            state.tables.clone()
        };

        let result = work(self, ctx.entered());
        if result.is_err() {
            self.db.state.borrow_mut().tables = snapshot;
        }

        result
    }
}

///
/// MemoryOps
///
/// Accessor handle for one association of one root row.
///

pub(crate) struct MemoryOps {
    db: MemoryDb,
    association: String,
    descriptor: Association,
    root_id: Value,
}

impl MemoryOps {
    fn foreign_key(&self) -> Result<String, MemoryError> {
        self.descriptor
            .foreign_key
            .clone()
            .ok_or_else(|| MemoryError::NoForeignKey {
                association: self.association.clone(),
            })
    }

    fn with_target_table<T>(
        &self,
        work: impl FnOnce(&mut Vec<ValueMap>) -> T,
    ) -> Result<T, MemoryError> {
        let mut state = self.db.state.borrow_mut();
        let table = state
            .tables
            .get_mut(&self.descriptor.target)
            .ok_or_else(|| no_table(&self.descriptor.target))?;

        Ok(work(table))
    }
}

impl AssociationOps for MemoryOps {
    type Row = ValueMap;
    type Error = MemoryError;

    fn find_by(
        &mut self,
        _ctx: SaveContext,
        field: &str,
        value: &Value,
    ) -> Result<Option<ValueMap>, MemoryError> {
        self.with_target_table(|rows| find_by_field(rows, field, value).cloned())
    }

    fn attached(&mut self, _ctx: SaveContext) -> Result<Vec<ValueMap>, MemoryError> {
        let foreign_key = self.foreign_key()?;
        let root_id = self.root_id.clone();

        self.with_target_table(|rows| {
            rows.iter()
                .filter(|row| row.get(&foreign_key) == Some(&root_id))
                .cloned()
                .collect()
        })
    }

    fn add(&mut self, _ctx: SaveContext, target: &Value) -> Result<(), MemoryError> {
        let foreign_key = self.foreign_key()?;
        let root_id = self.root_id.clone();
        let primary_key = self.descriptor.primary_key.clone();

        // Unknown target ids are ignored; tests seed what they bind.
        self.with_target_table(|rows| {
            if let Some(index) = position_by_field(rows, &primary_key, target) {
                rows[index].insert(foreign_key, root_id);
            }
        })
    }

    fn set(&mut self, _ctx: SaveContext, target: &Value) -> Result<(), MemoryError> {
        let foreign_key = self.foreign_key()?;
        let root_id = self.root_id.clone();
        let primary_key = self.descriptor.primary_key.clone();

        self.with_target_table(|rows| {
            for row in rows.iter_mut() {
                if row.get(&foreign_key) == Some(&root_id) {
                    row.insert(foreign_key.clone(), Value::Null);
                }
            }
            if let Some(index) = position_by_field(rows, &primary_key, target) {
                rows[index].insert(foreign_key, root_id);
            }
        })
    }

    fn create(&mut self, _ctx: SaveContext, values: &ValueMap) -> Result<ValueMap, MemoryError> {
        let foreign_key = self.foreign_key()?;
        let root_id = self.root_id.clone();
        let primary_key = self.descriptor.primary_key.clone();

        self.with_target_table(|rows| {
            let mut row = values.clone();
            if row.field(&primary_key).live_value().is_none() {
                row.insert(primary_key.clone(), Value::Uint(allocate_id(rows, &primary_key)));
            }
            row.insert(foreign_key, root_id);
            rows.push(row.clone());
            row
        })
    }

    fn save(&mut self, _ctx: SaveContext, row: &ValueMap) -> Result<(), MemoryError> {
        let primary_key = self.descriptor.primary_key.clone();

        self.with_target_table(|rows| {
            if let Some(index) = row
                .get(&primary_key)
                .and_then(|id| position_by_field(rows, &primary_key, id))
            {
                rows[index] = row.clone();
            }
        })
    }

    fn destroy(&mut self, _ctx: SaveContext, row: &ValueMap) -> Result<(), MemoryError> {
        let primary_key = self.descriptor.primary_key.clone();

        self.with_target_table(|rows| {
            if let Some(index) = row
                .get(&primary_key)
                .and_then(|id| position_by_field(rows, &primary_key, id))
            {
                rows.remove(index);
            }
        })
    }
}

fn no_table(table: &str) -> MemoryError {
    MemoryError::NoTable {
        table: table.to_string(),
    }
}

fn allocate_id(rows: &[ValueMap], primary_key: &str) -> u64 {
    rows.iter()
        .filter_map(|row| match row.get(primary_key) {
            Some(Value::Uint(id)) => Some(*id),
            _ => None,
        })
        .max()
        .map_or(1, |highest| highest + 1)
}

fn find_by_field<'a>(rows: &'a [ValueMap], field: &str, value: &Value) -> Option<&'a ValueMap> {
    rows.iter().find(|row| row.get(field) == Some(value))
}

fn position_by_field(rows: &[ValueMap], field: &str, value: &Value) -> Option<usize> {
    rows.iter().position(|row| row.get(field) == Some(value))
}
