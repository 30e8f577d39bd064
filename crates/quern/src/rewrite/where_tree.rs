use std::collections::BTreeMap;

use crate::{
    error::RewriteError,
    filter::{Cond, Filter},
    find::{Include, VirtualFilters},
    rewrite::{RewriteStats, include::IncludeGroup},
    schema::EntityShape,
};

///
/// WhereSplit
///
/// Outcome of classifying one filter tree against an entity shape. Every
/// condition leaf of the input lands in exactly one of the three channels.
///

#[derive(Clone, Debug)]
pub struct WhereSplit {
    /// Rebuilt tree holding only real-column and raw leaves, `None` when
    /// every leaf was routed elsewhere.
    pub filter: Option<Filter>,
    /// One include per association referenced with dotted syntax, in
    /// association-name order.
    pub includes: Vec<Include>,
    /// Virtual-property tests for the post-fetch matcher.
    pub virtuals: VirtualFilters,
    pub stats: RewriteStats,
}

/// Splits `filter` into the engine-executable tree and the deferred side
/// channels, classifying each condition leaf against `shape`.
///
/// The input tree is consumed and a new one is built; group nodes whose
/// children were all extracted disappear, and single-child groups collapse
/// to the child.
pub fn split_where(shape: &EntityShape, filter: Filter) -> Result<WhereSplit, RewriteError> {
    let mut splitter = Splitter::new(shape);
    let filter = splitter.walk(filter, Combinator::And)?;

    let Splitter {
        groups,
        virtuals,
        stats,
        ..
    } = splitter;

    Ok(WhereSplit {
        filter,
        includes: groups.into_values().map(IncludeGroup::finalize).collect(),
        virtuals,
        stats,
    })
}

/// Boolean context a leaf inherits from its nearest enclosing group. The
/// root of a tree is an implicit conjunction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Combinator {
    And,
    Or,
}

struct Splitter<'shape> {
    shape: &'shape EntityShape,
    groups: BTreeMap<String, IncludeGroup>,
    virtuals: VirtualFilters,
    stats: RewriteStats,
}

impl<'shape> Splitter<'shape> {
    fn new(shape: &'shape EntityShape) -> Self {
        Self {
            shape,
            groups: BTreeMap::new(),
            virtuals: VirtualFilters::new(),
            stats: RewriteStats::default(),
        }
    }

    /// Rebuilds `node` bottom-up, returning `None` when every leaf below
    /// it was routed to a side channel.
    fn walk(&mut self, node: Filter, ctx: Combinator) -> Result<Option<Filter>, RewriteError> {
        match node {
            Filter::And(children) => {
                let kept = self.walk_group(children, Combinator::And)?;

                Ok(Self::regroup(kept, Filter::And))
            }
            Filter::Or(children) => {
                let kept = self.walk_group(children, Combinator::Or)?;

                Ok(Self::regroup(kept, Filter::Or))
            }
            Filter::Cond(cond) => self.classify(cond, ctx),
            raw @ Filter::Raw(_) => Ok(Some(raw)),
        }
    }

    fn walk_group(
        &mut self,
        children: Vec<Filter>,
        ctx: Combinator,
    ) -> Result<Vec<Filter>, RewriteError> {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if let Some(child) = self.walk(child, ctx)? {
                kept.push(child);
            }
        }

        Ok(kept)
    }

    /// Emptied groups vanish and single survivors shed their wrapper, so
    /// the rebuilt tree never carries nesting the extraction hollowed out.
    fn regroup(mut kept: Vec<Filter>, wrap: fn(Vec<Filter>) -> Filter) -> Option<Filter> {
        match kept.len() {
            0 => None,
            1 => kept.pop(),
            _ => Some(wrap(kept)),
        }
    }

    /// Routes one condition leaf: dotted properties join the include group
    /// of their association, real columns stay relational, everything else
    /// becomes a virtual filter.
    fn classify(&mut self, cond: Cond, ctx: Combinator) -> Result<Option<Filter>, RewriteError> {
        let shape = self.shape;

        if let Some((name, rest)) = cond.property.split_once('.') {
            let Some(association) = shape.association(name) else {
                return Err(RewriteError::UnknownAssociation {
                    entity: shape.entity().to_string(),
                    association: name.to_string(),
                });
            };
            if rest.contains('.') {
                return Err(RewriteError::NestedPath {
                    property: cond.property,
                });
            }

            self.stats.include_leaves += 1;
            self.groups
                .entry(name.to_string())
                .or_insert_with(|| IncludeGroup::new(name, &association.target))
                .push(ctx, Cond::new(rest, cond.test));

            return Ok(None);
        }

        if shape.has_column(&cond.property) {
            self.stats.kept_leaves += 1;

            return Ok(Some(Filter::Cond(cond)));
        }

        // Last write wins when the same virtual property appears twice.
        self.stats.virtual_leaves += 1;
        self.virtuals.insert(cond.property, cond.test);

        Ok(None)
    }
}
