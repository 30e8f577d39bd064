//! Module: rewrite
//! Responsibility: split caller filters and sort lists into the part the
//! engine executes and the part deferred to the post-fetch phase.
//! Does not own: matching semantics or engine execution.
//! Boundary: consumes `EntityShape`, produces rebuilt trees and side
//! channels; never mutates caller input.

mod include;
mod order;
mod where_tree;


pub use order::{OrderSplit, split_order};
pub use where_tree::{WhereSplit, split_where};

///
/// RewriteStats
///
/// Leaf classification counts for one rewrite pass.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RewriteStats {
    /// Condition leaves left in the relational tree.
    pub kept_leaves: usize,
    /// Condition leaves moved into association include groups.
    pub include_leaves: usize,
    /// Condition leaves moved into the virtual-filter side channel.
    pub virtual_leaves: usize,
}

impl RewriteStats {
    #[must_use]
    pub const fn total_leaves(&self) -> usize {
        self.kept_leaves + self.include_leaves + self.virtual_leaves
    }
}
