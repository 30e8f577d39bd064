//! Core runtime for Quern: where-tree rewriting, post-fetch matching and
//! ordering, relation syncing, and the ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod error;
pub mod filter;
pub mod find;
pub mod post_fetch;
pub mod record;
pub mod relation;
pub mod rewrite;
pub mod schema;
pub mod session;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, engines, stats structs, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        filter::Filter,
        find::{FindOptions, SortDirection},
        record::{Record, RecordMut},
        schema::{Association, AssociationKind, EntityShape},
        session::{Config, Session},
        value::{Value, ValueMap},
    };
}
