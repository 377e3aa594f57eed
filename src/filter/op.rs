//! Predicate operators understood by the remote evaluator.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operator slot of a [`Filter`](super::Filter).
///
/// The wire token is the string returned by [`Operator::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` - field equals the value.
    Eq,
    /// `>` - field is greater than the value.
    Gt,
    /// `<` - field is less than the value.
    Lt,
    /// `in` - field equals one of the values in a sequence.
    In,
    /// `has` - field contains the value.
    Has,
    /// `concat` - field is a list holding the value.
    Concat,
}

impl Operator {
    /// Wire token for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::In => "in",
            Operator::Has => "has",
            Operator::Concat => "concat",
        }
    }

    /// Parse a wire token.
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "=" => Ok(Operator::Eq),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            "in" => Ok(Operator::In),
            "has" => Ok(Operator::Has),
            "concat" => Ok(Operator::Concat),
            other => Err(Error::MalformedFilter(format!(
                "unknown operator '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Operator::from_token(&token).map_err(serde::de::Error::custom)
    }
}
