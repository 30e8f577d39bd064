use crate::value::{Value, ValueMap};

///
/// FieldPresence
///
/// Result of attempting to read a field from a row. This distinguishes
/// between a missing field and a present field whose value is `Null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldPresence {
    /// Field exists and has a value (including `Value::Null`).
    Present(Value),
    /// Field is not present on the row.
    Missing,
}

impl FieldPresence {
    /// Returns the value when present and non-null.
    #[must_use]
    pub fn live_value(&self) -> Option<&Value> {
        match self {
            Self::Present(value) if !value.is_null() => Some(value),
            _ => None,
        }
    }
}

///
/// Record
///
/// Abstraction over a row-like value that can expose fields by name.
/// This decouples post-fetch matching and sorting from concrete engine
/// row types.
///

pub trait Record {
    fn field(&self, name: &str) -> FieldPresence;
}

///
/// RecordMut
///
/// Rows that accept field writes. Only the detach path needs this: it
/// nulls a foreign key on a related row before deciding save-vs-destroy.
///

pub trait RecordMut: Record {
    fn set_field(&mut self, name: &str, value: Value);
}

impl Record for ValueMap {
    fn field(&self, name: &str) -> FieldPresence {
        match self.get(name) {
            Some(value) => FieldPresence::Present(value.clone()),
            None => FieldPresence::Missing,
        }
    }
}

impl RecordMut for ValueMap {
    fn set_field(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}
