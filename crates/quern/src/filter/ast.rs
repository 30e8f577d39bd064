//! Pure, shape-agnostic representation of caller filters. Leaves may name
//! real columns, dotted `Association.Property` paths, or virtual
//! properties; this layer does not classify them. All interpretation
//! happens in later passes:
//!
//! - pre-query rewrite (column / include / virtual split)
//! - engine execution of the relational remainder
//! - post-fetch matching of the virtual remainder

use crate::value::Value;
use std::ops::{BitAnd, BitOr};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

///
/// Test
///
/// The predicate applied to one property.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Test {
    /// Bare literal; equality against the property.
    Value(Value),
    /// Explicit comparison operator.
    Cmp(CompareOp, Value),
    /// `%`-wrapped substring pattern.
    Like(String),
}

///
/// Cond
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cond {
    pub property: String,
    pub test: Test,
}

impl Cond {
    #[must_use]
    pub fn new(property: impl Into<String>, test: Test) -> Self {
        Self {
            property: property.into(),
            test,
        }
    }
}

///
/// Filter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    And(Vec<Self>),
    Or(Vec<Self>),
    Cond(Cond),
    /// Opaque engine expression; rewrite passes leave it in place.
    Raw(String),
}

impl Filter {
    #[must_use]
    pub const fn and(filters: Vec<Self>) -> Self {
        Self::And(filters)
    }

    #[must_use]
    pub const fn or(filters: Vec<Self>) -> Self {
        Self::Or(filters)
    }

    #[must_use]
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Bare-literal equality on a property.
    #[must_use]
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cond(Cond::new(property, Test::Value(value.into())))
    }

    #[must_use]
    pub fn ne(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(property, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(property, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(property, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(property, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(property, CompareOp::Gte, value)
    }

    /// Explicit comparison on a property.
    #[must_use]
    pub fn cmp(property: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Cond(Cond::new(property, Test::Cmp(op, value.into())))
    }

    /// `%`-wrapped substring pattern on a property.
    #[must_use]
    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Cond(Cond::new(property, Test::Like(pattern.into())))
    }

    /// Count condition leaves in the tree. Raw nodes are not leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter().map(Self::leaf_count).sum()
            }
            Self::Cond(_) => 1,
            Self::Raw(_) => 0,
        }
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitAnd for &Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Self::Output {
        Filter::And(vec![self.clone(), rhs.clone()])
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl BitOr for &Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Self::Output {
        Filter::Or(vec![self.clone(), rhs.clone()])
    }
}
