use crate::{find::SortDirection, schema::EntityShape};

///
/// OrderSplit
///
/// Sort keys partitioned by where they can run. Relative order inside
/// each side matches the caller's list, so key precedence survives the
/// split.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderSplit {
    /// Keys on real columns, handed to the engine.
    pub relational: Vec<(String, SortDirection)>,
    /// Keys on virtual properties, applied by the post-fetch sorter.
    pub deferred: Vec<(String, SortDirection)>,
}

/// Partitions `order` by column existence on `shape`.
#[must_use]
pub fn split_order(shape: &EntityShape, order: Vec<(String, SortDirection)>) -> OrderSplit {
    let mut split = OrderSplit::default();
    for (field, direction) in order {
        if shape.has_column(&field) {
            split.relational.push((field, direction));
        } else {
            split.deferred.push((field, direction));
        }
    }

    split
}
