//! Atomic predicate: `(field, operator, value)`.

use super::list::FilterList;
use super::op::Operator;
use crate::datum::Datum;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single server-side predicate.
///
/// On the wire a filter is the 3-element array `[field, operator, value]`.
/// Building one never performs I/O.
///
/// # Example
///
/// ```rust
/// use tablink::{Filter, Operator};
///
/// let single = Filter::new("status", "Active");
/// assert_eq!(single.operator(), Operator::Eq);
///
/// let many = Filter::new("#id", vec!["1", "2"]);
/// assert_eq!(many.operator(), Operator::In);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    op: Operator,
    value: Datum,
}

impl Filter {
    /// Create a filter, inferring the operator from the value:
    /// `in` for a sequence, `=` otherwise.
    pub fn new(field: impl Into<String>, value: impl Into<Datum>) -> Self {
        let value = value.into();
        let op = if value.is_sequence() {
            Operator::In
        } else {
            Operator::Eq
        };
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Create a filter with an explicit operator.
    pub fn with_operator(field: impl Into<String>, value: impl Into<Datum>, op: Operator) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &Datum {
        &self.value
    }

    /// Rewrite the field slot. Only field qualification does this.
    pub(crate) fn set_field(&mut self, field: String) {
        self.field = field;
    }

    /// Conjunction with another filter or filter list.
    pub fn and(&self, other: impl Into<FilterList>) -> FilterList {
        FilterList::from(self.clone()).and(other)
    }

    /// Disjunction with another filter or filter list.
    pub fn or(&self, other: impl Into<FilterList>) -> FilterList {
        FilterList::from(self.clone()).or(other)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.field)?;
        tuple.serialize_element(&self.op)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (field, op, value) = <(String, Operator, Datum)>::deserialize(deserializer)?;
        Ok(Filter { field, op, value })
    }
}
