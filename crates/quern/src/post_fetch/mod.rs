//! Module: post_fetch
//! Responsibility: run deferred virtual-property filters and sort keys
//! over fetched rows.
//! Does not own: leaf classification or engine access.
//! Boundary: mutates one fetched row vector in place and reports what it
//! did; never talks to the engine.

mod matcher;
mod sort;


pub use matcher::{MatchProgram, apply_virtual_filters};
pub use sort::apply_virtual_order;

use crate::{
    error::MatchError,
    find::{SortDirection, VirtualFilters},
    record::Record,
};

///
/// PostFetchStats
///
/// Row accounting for one post-fetch pass.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PostFetchStats {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub filtered: bool,
    pub ordered: bool,
}

/// Runs the match phase and then the order phase. Matching compiles the
/// whole virtual-filter map before any row is touched, so a bad test
/// shape fails on empty input too.
pub fn apply_post_fetch<R: Record>(
    virtuals: &VirtualFilters,
    order: &[(String, SortDirection)],
    rows: &mut Vec<R>,
) -> Result<PostFetchStats, MatchError> {
    let rows_in = rows.len();

    // Phase 1: virtual-property matching.
    let filtered = if virtuals.is_empty() {
        false
    } else {
        apply_virtual_filters(virtuals, rows)?;
        true
    };

    // Phase 2: deferred ordering.
    let ordered = if order.is_empty() {
        false
    } else {
        apply_virtual_order(rows, order);
        true
    };

    Ok(PostFetchStats {
        rows_in,
        rows_dropped: rows_in - rows.len(),
        filtered,
        ordered,
    })
}
