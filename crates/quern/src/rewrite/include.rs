use crate::{
    filter::{Cond, Filter},
    find::Include,
    rewrite::where_tree::Combinator,
};

///
/// IncludeGroup
///
/// Accumulator for every dotted leaf that named one association. Members
/// keep the boolean context they were found under, so the finalized
/// include filter combines them the way the caller's tree did.
///

#[derive(Clone, Debug)]
pub(super) struct IncludeGroup {
    association: String,
    target: String,
    and_members: Vec<Filter>,
    or_members: Vec<Filter>,
}

impl IncludeGroup {
    pub(super) fn new(association: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            association: association.into(),
            target: target.into(),
            and_members: Vec::new(),
            or_members: Vec::new(),
        }
    }

    pub(super) fn push(&mut self, ctx: Combinator, cond: Cond) {
        let branch = match ctx {
            Combinator::And => &mut self.and_members,
            Combinator::Or => &mut self.or_members,
        };
        branch.push(Filter::Cond(cond));
    }

    /// Rebuilds the group as one include filter. Disjunctive members fold
    /// into an or group, conjunctive ones into an and group, and when both
    /// exist the or group becomes one more conjunct.
    pub(super) fn finalize(self) -> Include {
        let or_part = combine(self.or_members, Filter::Or);
        let and_part = combine(self.and_members, Filter::And);

        let filter = match (or_part, and_part) {
            (None, None) => None,
            (Some(filter), None) | (None, Some(filter)) => Some(filter),
            (Some(or_part), Some(and_part)) => Some(Filter::And(vec![or_part, and_part])),
        };

        Include {
            association: self.association,
            target: self.target,
            filter,
        }
    }
}

/// Single members stand alone instead of gaining a one-child wrapper.
fn combine(mut members: Vec<Filter>, wrap: fn(Vec<Filter>) -> Filter) -> Option<Filter> {
    match members.len() {
        0 => None,
        1 => members.pop(),
        _ => Some(wrap(members)),
    }
}
