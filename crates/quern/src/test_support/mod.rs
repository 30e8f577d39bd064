pub(crate) mod eval;
pub(crate) mod memory;

use crate::{
    schema::{Association, EntityShape},
    value::{Value, ValueMap},
};

/// Task shape most tests share: three scalar columns, a to-one
/// association and a fully configured to-many association.
pub(crate) fn task_shape() -> EntityShape {
    EntityShape::new("Task")
        .with_columns(["id", "title", "state"])
        .with_association(
            "Project",
            Association::to_one("Project").with_foreign_key("task_id"),
        )
        .with_association(
            "Tags",
            Association::to_many("Tag")
                .with_match_field("name")
                .with_foreign_key("task_id")
                .with_target_references(["task_id", "sprint_id"]),
        )
}

/// Build one row from field pairs.
pub(crate) fn row(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}
