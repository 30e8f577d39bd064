use std::cmp::Ordering;

use crate::{
    error::MatchError,
    filter::Test,
    find::VirtualFilters,
    record::{FieldPresence, Record},
    value::{TextMode, Value},
};

///
/// MatchProgram
///
/// Compiled form of one virtual-filter map. Compilation validates every
/// test shape up front, so a malformed pattern aborts the find before
/// any row is read.
///

#[derive(Clone, Debug)]
pub struct MatchProgram {
    checks: Vec<Check>,
}

impl MatchProgram {
    pub fn compile(virtuals: &VirtualFilters) -> Result<Self, MatchError> {
        let mut checks = Vec::with_capacity(virtuals.len());
        for (property, test) in virtuals.iter() {
            checks.push(Check {
                op: compile_test(property, test)?,
                property: property.clone(),
            });
        }

        Ok(Self { checks })
    }

    /// True when every compiled check passes. A missing or differently
    /// typed row field fails its check rather than erroring.
    #[must_use]
    pub fn matches<R: Record>(&self, row: &R) -> bool {
        self.checks.iter().all(|check| check.matches(row))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Compiles and runs `virtuals` over `rows`, keeping the rows that match
/// every entry.
pub fn apply_virtual_filters<R: Record>(
    virtuals: &VirtualFilters,
    rows: &mut Vec<R>,
) -> Result<(), MatchError> {
    let program = MatchProgram::compile(virtuals)?;
    if !program.is_empty() {
        rows.retain(|row| program.matches(row));
    }

    Ok(())
}

///
/// Check
///
/// One virtual property paired with its compiled operation.
///

#[derive(Clone, Debug)]
struct Check {
    property: String,
    op: MatchOp,
}

#[derive(Clone, Debug)]
enum MatchOp {
    /// Case-insensitive text equality.
    TextEq(Value),
    /// Numeric equality under widening comparison.
    NumberEq(Value),
    /// Case-insensitive substring containment; the needle arrives already
    /// unwrapped from its `%` pair.
    Contains(Value),
}

impl Check {
    fn matches<R: Record>(&self, row: &R) -> bool {
        let FieldPresence::Present(value) = row.field(&self.property) else {
            return false;
        };

        match &self.op {
            MatchOp::TextEq(needle) => value.text_eq(needle, TextMode::Ci).unwrap_or(false),
            MatchOp::NumberEq(expected) => value
                .cmp_numeric(expected)
                .is_some_and(|ordering| ordering == Ordering::Equal),
            MatchOp::Contains(needle) => {
                value.text_contains(needle, TextMode::Ci).unwrap_or(false)
            }
        }
    }
}

fn compile_test(property: &str, test: &Test) -> Result<MatchOp, MatchError> {
    match test {
        Test::Value(expected @ Value::Text(_)) => Ok(MatchOp::TextEq(expected.clone())),
        Test::Value(value) if value.supports_numeric_coercion() => {
            Ok(MatchOp::NumberEq(value.clone()))
        }
        Test::Like(pattern) => {
            let needle = pattern
                .strip_prefix('%')
                .and_then(|rest| rest.strip_suffix('%'))
                .ok_or_else(|| MatchError::MalformedPattern {
                    property: property.to_string(),
                    pattern: pattern.clone(),
                })?;

            Ok(MatchOp::Contains(Value::text(needle)))
        }
        Test::Value(_) | Test::Cmp(..) => Err(MatchError::Unsupported {
            property: property.to_string(),
        }),
    }
}
