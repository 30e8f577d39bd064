use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap, mem::discriminant};

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    Cs, // case-sensitive
    Ci, // case-insensitive
}

///
/// Float64
///
/// Total-order wrapper over `f64` so values stay `Eq`-comparable.
/// NaN is canonicalised on construction; all NaN payloads compare equal
/// to each other and sort after every other float. Negative zero equals
/// positive zero.
///

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Float64(f64);

impl Float64 {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(f64::NAN);
        }

        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    const fn canonical_bits(self) -> u64 {
        if self.0.is_nan() {
            return f64::NAN.to_bits();
        }
        if self.0 == 0.0 {
            return 0.0_f64.to_bits();
        }

        self.0.to_bits()
    }
}

impl PartialEq for Float64 {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for Float64 {}

impl PartialOrd for Float64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float64 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.canonical_bits() == other.canonical_bits() {
            return Ordering::Equal;
        }

        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Float64 {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

// Deserialization routes through `new` so foreign NaN payloads
// canonicalise like every other constructed value.
impl<'de> Deserialize<'de> for Float64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(Self::new)
    }
}

///
/// Value
///
/// Literal values carried by filter tests, sort comparisons, and loose
/// row payloads.
///
/// Null → the field's value is absent at the engine (i.e., SQL NULL).
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Text(String),
    Int(i64),
    Uint(u64),
    Float(Float64),
    Bool(bool),
    Null,
}

impl Value {
    /// Construct a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Construct a float value with canonical NaN handling.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Float(Float64::new(value))
    }

    /// Returns true if the value is Text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if the value is Null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value participates in numeric widening.
    #[must_use]
    pub const fn supports_numeric_coercion(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    const fn numeric_repr(&self) -> Option<NumericRepr> {
        match self {
            Self::Int(v) => Some(NumericRepr::I64(*v)),
            Self::Uint(v) => Some(NumericRepr::U64(*v)),
            Self::Float(v) => Some(NumericRepr::F64(v.get())),
            _ => None,
        }
    }

    /// Compare two values numerically under widening.
    ///
    /// Integer pairs compare exactly; any float operand widens both sides
    /// to `f64`. Returns `None` when either side is non-numeric or the
    /// comparison is undefined (NaN operand).
    #[must_use]
    pub fn cmp_numeric(&self, other: &Self) -> Option<Ordering> {
        let (left, right) = (self.numeric_repr()?, other.numeric_repr()?);

        match (left, right) {
            (NumericRepr::I64(a), NumericRepr::I64(b)) => Some(a.cmp(&b)),
            (NumericRepr::U64(a), NumericRepr::U64(b)) => Some(a.cmp(&b)),
            (NumericRepr::I64(a), NumericRepr::U64(b)) => Some(cmp_i64_u64(a, b)),
            (NumericRepr::U64(a), NumericRepr::I64(b)) => Some(cmp_i64_u64(b, a).reverse()),
            (a, b) => a.widen().partial_cmp(&b.widen()),
        }
    }

    /// Perform strict same-variant ordering, widening only across numerics.
    #[must_use]
    pub(crate) fn strict_order_cmp(left: &Self, right: &Self) -> Option<Ordering> {
        if discriminant(left) == discriminant(right) {
            return match (left, right) {
                (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
                (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
                (Self::Uint(a), Self::Uint(b)) => Some(a.cmp(b)),
                (Self::Float(a), Self::Float(b)) => Some(a.cmp(b)),
                (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
                (Self::Null, Self::Null) => Some(Ordering::Equal),
                _ => None,
            };
        }

        left.cmp_numeric(right)
    }

    pub(crate) const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Uint(_) => 3,
            Self::Float(_) => 4,
            Self::Text(_) => 5,
        }
    }

    /// Total canonical comparator used by the post-fetch sorter.
    #[must_use]
    pub(crate) fn canonical_cmp(left: &Self, right: &Self) -> Ordering {
        if let Some(ordering) = Self::strict_order_cmp(left, right) {
            return ordering;
        }

        left.canonical_rank().cmp(&right.canonical_rank())
    }

    /// Check text equality under the given text mode.
    #[must_use]
    pub fn text_eq(&self, other: &Self, mode: TextMode) -> Option<bool> {
        self.text_op(other, mode, |a, b| a == b)
    }

    /// Check whether `self` contains `other` under the given text mode.
    #[must_use]
    pub fn text_contains(&self, needle: &Self, mode: TextMode) -> Option<bool> {
        self.text_op(needle, mode, |a, b| a.contains(b))
    }

    fn text_op(
        &self,
        other: &Self,
        mode: TextMode,
        f: impl Fn(&str, &str) -> bool,
    ) -> Option<bool> {
        let (a, b) = (self.as_text()?, other.as_text()?);

        match mode {
            TextMode::Cs => Some(f(a, b)),
            TextMode::Ci => Some(f(&casefold(a), &casefold(b))),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(Float64::new(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

///
/// NumericRepr
///

#[derive(Clone, Copy, Debug)]
enum NumericRepr {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl NumericRepr {
    #[expect(clippy::cast_precision_loss)]
    const fn widen(self) -> f64 {
        match self {
            Self::I64(v) => v as f64,
            Self::U64(v) => v as f64,
            Self::F64(v) => v,
        }
    }
}

fn cmp_i64_u64(a: i64, b: u64) -> Ordering {
    u64::try_from(a).map_or(Ordering::Less, |a| a.cmp(&b))
}

/// Casefold text for case-insensitive comparison.
fn casefold(input: &str) -> String {
    if input.is_ascii() {
        return input.to_ascii_lowercase();
    }

    input.to_lowercase()
}

///
/// ValueMap
///
/// Ordered field-name → value map. The canonical loose representation for
/// row payloads and create/update values.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, IntoIterator, PartialEq, Serialize,
)]
#[into_iterator(owned, ref, ref_mut)]
pub struct ValueMap(BTreeMap<String, Value>);

impl ValueMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }
}

impl From<BTreeMap<String, Value>> for ValueMap {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
