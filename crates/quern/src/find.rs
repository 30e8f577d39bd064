use crate::{
    error::{MatchError, RewriteError},
    filter::{Filter, Test},
};
use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

///
/// Include
///
/// One association join requested from the engine, with an optional
/// filter over the joined rows.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Include {
    /// Association name on the root entity.
    pub association: String,
    /// Engine-resolvable target entity name or path.
    pub target: String,
    pub filter: Option<Filter>,
}

///
/// VirtualFilters
///
/// Side channel carrying the virtual-property tests extracted from a
/// filter tree: property name → test. Last write wins on duplicates.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq)]
pub struct VirtualFilters(BTreeMap<String, Test>);

impl VirtualFilters {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }
}

///
/// FindOptions
///
/// One find call's worth of caller intent plus the pipeline-managed side
/// channels. `filter`, `order`, `include`, `limit`, and `offset` are what
/// the engine sees after the rewrite; `virtuals` and `virtual_order` are
/// consumed by the post-fetch phase and must be ignored by engines.
///
/// `limit`/`offset` pass through untouched: when virtual filtering drops
/// rows out of an engine-limited page, the page comes back short.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FindOptions {
    pub filter: Option<Filter>,
    pub order: Vec<(String, SortDirection)>,
    pub include: Vec<Include>,
    pub limit: Option<u32>,
    pub offset: u32,
    pub virtuals: VirtualFilters,
    pub virtual_order: Vec<(String, SortDirection)>,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), SortDirection::Asc));
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), SortDirection::Desc));
        self
    }

    #[must_use]
    pub fn with_include(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

///
/// FindError
///
/// Failure surface of one composed find call. Engine errors propagate
/// unchanged; when the fetch fails the post-fetch phase never runs.
///

#[derive(Debug, ThisError)]
pub enum FindError<E> {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("engine fetch failed: {0}")]
    Engine(E),
}
