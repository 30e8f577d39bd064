//! Module: session
//! Responsibility: bind one entity shape to one configuration and drive
//! the find lifecycle and gated aggregate writes.
//! Does not own: engine access; fetches arrive as closures and writes go
//! through the store traits.
//! Boundary: holds only borrowed shape and copied config, so sessions are
//! cheap to create per call site.

use serde::Deserialize;

use crate::{
    error::{MatchError, RewriteError},
    find::{FindError, FindOptions},
    post_fetch::{PostFetchStats, apply_post_fetch},
    record::Record,
    relation::{
        AggregateError, AggregateStore, AssociationOps, SaveContext, SaveData, create_with_related,
        update_with_related,
    },
    rewrite::{RewriteStats, split_order, split_where},
    schema::EntityShape,
    value::Value,
};

///
/// Config
///
/// Behavior toggles, deserializable from host configuration. Missing
/// fields fall back to the defaults.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Rewrite filters before the fetch and run the post-fetch phase.
    pub virtual_filtering: bool,
    /// Allow aggregate writes through the session.
    pub aggregate_writes: bool,
}

impl Config {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            virtual_filtering: true,
            aggregate_writes: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

///
/// Session
///
/// Facade binding one entity shape to one configuration. Holds no engine
/// state of its own.
///

#[derive(Clone, Copy, Debug)]
pub struct Session<'shape> {
    shape: &'shape EntityShape,
    config: Config,
}

impl<'shape> Session<'shape> {
    #[must_use]
    pub const fn new(shape: &'shape EntityShape) -> Self {
        Self::with_config(shape, Config::new())
    }

    #[must_use]
    pub const fn with_config(shape: &'shape EntityShape, config: Config) -> Self {
        Self { shape, config }
    }

    #[must_use]
    pub const fn shape(&self) -> &'shape EntityShape {
        self.shape
    }

    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Rewrites `options` in place: splits the filter tree, appends the
    /// finalized includes, installs the side channels, and splits the
    /// sort list. Running it again on its own output changes nothing,
    /// because side channels only install when the new split produced
    /// one.
    ///
    /// Does nothing when virtual filtering is off.
    pub fn before_find(&self, options: &mut FindOptions) -> Result<RewriteStats, RewriteError> {
        if !self.config.virtual_filtering {
            return Ok(RewriteStats::default());
        }

        let mut stats = RewriteStats::default();

        if let Some(filter) = options.filter.take() {
            let split = split_where(self.shape, filter)?;
            options.filter = split.filter;
            options.include.extend(split.includes);
            if !split.virtuals.is_empty() {
                options.virtuals = split.virtuals;
            }
            stats = split.stats;
        }

        let order = std::mem::take(&mut options.order);
        let split = split_order(self.shape, order);
        options.order = split.relational;
        if !split.deferred.is_empty() {
            options.virtual_order = split.deferred;
        }

        Ok(stats)
    }

    /// Runs the matcher and then the sorter over the side channels the
    /// rewrite installed.
    pub fn after_find<R: Record>(
        &self,
        options: &FindOptions,
        rows: &mut Vec<R>,
    ) -> Result<PostFetchStats, MatchError> {
        if !self.config.virtual_filtering {
            return Ok(PostFetchStats {
                rows_in: rows.len(),
                ..PostFetchStats::default()
            });
        }

        apply_post_fetch(&options.virtuals, &options.virtual_order, rows)
    }

    /// The full find lifecycle: rewrite, fetch through `fetch`, then the
    /// post-fetch phase. Engine errors propagate unchanged and skip the
    /// post-fetch phase.
    pub fn find_via<R, E>(
        &self,
        mut options: FindOptions,
        fetch: impl FnOnce(&FindOptions) -> Result<Vec<R>, E>,
    ) -> Result<Vec<R>, FindError<E>>
    where
        R: Record,
    {
        self.before_find(&mut options)?;

        let mut rows = fetch(&options).map_err(FindError::Engine)?;

        self.after_find(&options, &mut rows)?;

        Ok(rows)
    }

    /// Aggregate create, rejected when the configuration does not allow
    /// writes.
    pub fn create_with_related<S, O>(
        &self,
        store: &mut S,
        ctx: SaveContext,
        data: &SaveData,
        ops_for: impl FnMut(&S::Row, &str) -> O,
    ) -> Result<S::Row, AggregateError<S::Error>>
    where
        S: AggregateStore,
        O: AssociationOps<Row = S::Row, Error = S::Error>,
    {
        if !self.config.aggregate_writes {
            return Err(AggregateError::WritesDisabled);
        }

        create_with_related(self.shape, store, ctx, data, ops_for)
    }

    /// Aggregate update, rejected when the configuration does not allow
    /// writes.
    pub fn update_with_related<S, O>(
        &self,
        store: &mut S,
        ctx: SaveContext,
        id: &Value,
        data: &SaveData,
        ops_for: impl FnMut(&S::Row, &str) -> O,
    ) -> Result<S::Row, AggregateError<S::Error>>
    where
        S: AggregateStore,
        O: AssociationOps<Row = S::Row, Error = S::Error>,
    {
        if !self.config.aggregate_writes {
            return Err(AggregateError::WritesDisabled);
        }

        update_with_related(self.shape, store, ctx, id, data, ops_for)
    }
}
