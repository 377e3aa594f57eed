//! Datum - the JSON-like value exchanged with the remote service.
//!
//! A `Datum` is used in two places:
//!
//! - **Filter operands**: the `value` slot of a [`Filter`](crate::filter::Filter)
//! - **Result cells**: every value materialized into a
//!   [`ResultSet`](crate::selection::ResultSet) or an [`Entry`](crate::selection::Entry) read
//!
//! # Supported Types
//!
//! - **Null**: absent or empty field
//! - **Boolean**: true or false
//! - **Number**: integer or floating point, kept exactly as sent (integers
//!   stay integers on the wire)
//! - **String**: UTF-8 text (identifiers are always strings on the wire)
//! - **Array**: ordered sequence, e.g. the operand of an `in` filter
//! - **Object**: key-value map, used by structured single-record returns
//!
//! # Example
//!
//! ```rust
//! use tablink::Datum;
//!
//! let id = Datum::from("42");
//! let ids = Datum::from(vec!["1", "2"]);
//! assert!(ids.is_sequence());
//! assert_eq!(id.as_str(), Some("42"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Datum represents a single value on the wire.
///
/// Serialized untagged, so a `Datum` is byte-for-byte the JSON the
/// service sends and expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Datum>),
    Object(HashMap<String, Datum>),
}

impl Datum {
    /// Check if datum is null
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Check if datum is an ordered sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Datum::Array(_))
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Get as integer, if the number is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&Vec<Datum>> {
        match self {
            Datum::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as object
    pub fn as_object(&self) -> Option<&HashMap<String, Datum>> {
        match self {
            Datum::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Render without JSON quoting, for identifiers and terminal output.
    ///
    /// `Null` renders as the empty string.
    pub fn to_plain_string(&self) -> String {
        match self {
            Datum::Null => String::new(),
            Datum::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// Conversions
impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::Number(n.into())
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::Number(n.into())
    }
}

impl From<u64> for Datum {
    fn from(n: u64) -> Self {
        Datum::Number(n.into())
    }
}

/// NaN and infinities have no JSON form and become `Null`.
impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Datum::Number)
            .unwrap_or(Datum::Null)
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl From<&String> for Datum {
    fn from(s: &String) -> Self {
        Datum::String(s.clone())
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(items: Vec<T>) -> Self {
        Datum::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Datum>> From<&[T]> for Datum {
    fn from(items: &[T]) -> Self {
        Datum::Array(items.iter().cloned().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Datum {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Datum::Null,
            serde_json::Value::Bool(b) => Datum::Boolean(b),
            serde_json::Value::Number(n) => Datum::Number(n),
            serde_json::Value::String(s) => Datum::String(s),
            serde_json::Value::Array(arr) => {
                Datum::Array(arr.into_iter().map(Datum::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Datum::Object(obj.into_iter().map(|(k, v)| (k, Datum::from(v))).collect())
            }
        }
    }
}

impl From<Datum> for serde_json::Value {
    fn from(datum: Datum) -> Self {
        match datum {
            Datum::Null => serde_json::Value::Null,
            Datum::Boolean(b) => serde_json::Value::Bool(b),
            Datum::Number(n) => serde_json::Value::Number(n),
            Datum::String(s) => serde_json::Value::String(s),
            Datum::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Datum::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Boolean(b) => write!(f, "{}", b),
            Datum::Number(n) => write!(f, "{}", n),
            Datum::String(s) => write!(f, "\"{}\"", s),
            Datum::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Datum::Object(obj) => {
                write!(f, "{{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
