use std::cmp::Ordering;

use crate::{
    filter::{CompareOp, Cond, Filter, Test},
    record::{FieldPresence, Record},
    value::{Value, ValueMap},
};

/// Evaluate one relational filter against a row the way a strict engine
/// would: case-sensitive text, widening numeric comparisons, null and
/// missing fields never match.
pub(crate) fn eval(filter: &Filter, row: &ValueMap) -> bool {
    match filter {
        Filter::And(children) => children.iter().all(|child| eval(child, row)),
        Filter::Or(children) => children.iter().any(|child| eval(child, row)),
        Filter::Cond(cond) => eval_cond(cond, row),
        // Raw fragments are opaque engine text; here they match
        // everything.
        Filter::Raw(_) => true,
    }
}

fn eval_cond(cond: &Cond, row: &ValueMap) -> bool {
    let FieldPresence::Present(value) = row.field(&cond.property) else {
        return false;
    };
    if value.is_null() {
        return false;
    }

    match &cond.test {
        Test::Value(expected) => value_eq(&value, expected),
        Test::Cmp(op, expected) => {
            Value::strict_order_cmp(&value, expected)
                .is_some_and(|ordering| matches_op(*op, ordering))
        }
        Test::Like(pattern) => like_matches(&value, pattern),
    }
}

fn value_eq(left: &Value, right: &Value) -> bool {
    if left.supports_numeric_coercion() && right.supports_numeric_coercion() {
        left.cmp_numeric(right) == Some(Ordering::Equal)
    } else {
        left == right
    }
}

const fn matches_op(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => matches!(ordering, Ordering::Equal),
        CompareOp::Ne => !matches!(ordering, Ordering::Equal),
        CompareOp::Lt => matches!(ordering, Ordering::Less),
        CompareOp::Lte => !matches!(ordering, Ordering::Greater),
        CompareOp::Gt => matches!(ordering, Ordering::Greater),
        CompareOp::Gte => !matches!(ordering, Ordering::Less),
    }
}

// Leading and trailing `%` wildcards only; mid-string wildcards are not
// part of any test fixture.
fn like_matches(value: &Value, pattern: &str) -> bool {
    let Some(text) = value.as_text() else {
        return false;
    };

    let starts = pattern.starts_with('%');
    let ends = pattern.ends_with('%') && pattern.len() > 1;

    match (starts, ends) {
        (true, true) => text.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => text.ends_with(&pattern[1..]),
        (false, true) => text.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => text == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::row;

    #[test]
    fn text_comparison_is_case_sensitive() {
        let alice = row(&[("owner", Value::text("Alice"))]);

        assert!(eval(&Filter::eq("owner", "Alice"), &alice));
        assert!(!eval(&Filter::eq("owner", "alice"), &alice));
    }

    #[test]
    fn groups_combine_and_or() {
        let here = row(&[("a", Value::Int(1)), ("b", Value::Int(2))]);

        assert!(eval(
            &(Filter::eq("a", 1_i64) & Filter::eq("b", 2_i64)),
            &here
        ));
        assert!(eval(
            &(Filter::eq("a", 9_i64) | Filter::eq("b", 2_i64)),
            &here
        ));
        assert!(!eval(
            &(Filter::eq("a", 9_i64) & Filter::eq("b", 2_i64)),
            &here
        ));
    }

    #[test]
    fn comparisons_widen_numerics() {
        let here = row(&[("rank", Value::Uint(5))]);

        assert!(eval(&Filter::gt("rank", 4_i64), &here));
        assert!(eval(&Filter::lte("rank", 5.0_f64), &here));
        assert!(!eval(&Filter::lt("rank", -1_i64), &here));
    }

    #[test]
    fn incomparable_values_never_match() {
        let here = row(&[("rank", Value::text("five"))]);

        assert!(!eval(&Filter::gt("rank", 4_i64), &here));
        assert!(!eval(&Filter::ne("rank", 4_i64), &here));
    }

    #[test]
    fn null_and_missing_never_match() {
        let here = row(&[("gone", Value::Null)]);

        assert!(!eval(&Filter::eq("gone", 1_i64), &here));
        assert!(!eval(&Filter::eq("absent", 1_i64), &here));
    }

    #[test]
    fn like_wildcards_anchor_both_ends() {
        let here = row(&[("title", Value::text("write docs"))]);

        assert!(eval(&Filter::like("title", "%ite do%"), &here));
        assert!(eval(&Filter::like("title", "write%"), &here));
        assert!(eval(&Filter::like("title", "%docs"), &here));
        assert!(eval(&Filter::like("title", "write docs"), &here));
        assert!(!eval(&Filter::like("title", "%DOCS"), &here));
    }
}
