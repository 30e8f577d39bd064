use std::cmp::Ordering;

use crate::{
    find::SortDirection,
    record::{FieldPresence, Record},
    value::Value,
};

/// Stable multi-key sort over fetched rows. Ties keep fetch order, so
/// whatever ordering the engine produced survives inside equal keys.
pub fn apply_virtual_order<R: Record>(rows: &mut [R], order: &[(String, SortDirection)]) {
    if order.is_empty() || rows.len() < 2 {
        return;
    }

    rows.sort_by(|left, right| compare_rows(left, right, order));
}

// Compare two rows according to the key list, returning the first non-equal
// key ordering.
fn compare_rows<R: Record>(left: &R, right: &R, order: &[(String, SortDirection)]) -> Ordering {
    for (field, direction) in order {
        let ordering = compare_field_pair(left, right, field, *direction);

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

// Compare one configured key across two rows.
fn compare_field_pair<R: Record>(
    left: &R,
    right: &R,
    field: &str,
    direction: SortDirection,
) -> Ordering {
    let ordering = compare_presence(&left.field(field), &right.field(field));

    apply_direction(ordering, direction)
}

// Compare presence slots using the same semantics as value ordering:
// - Missing values sort lower than present values in ascending order
// - Present values use canonical value ordering
fn compare_presence(left: &FieldPresence, right: &FieldPresence) -> Ordering {
    match (left, right) {
        (FieldPresence::Missing, FieldPresence::Missing) => Ordering::Equal,
        (FieldPresence::Missing, FieldPresence::Present(_)) => Ordering::Less,
        (FieldPresence::Present(_), FieldPresence::Missing) => Ordering::Greater,
        (FieldPresence::Present(left_value), FieldPresence::Present(right_value)) => {
            Value::canonical_cmp(left_value, right_value)
        }
    }
}

// Apply configured direction to one base slot ordering.
const fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
