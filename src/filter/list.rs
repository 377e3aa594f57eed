//! Flat filter chains.
//!
//! A [`FilterList`] is the ordered alternation
//! `filter (join filter)*` that the remote evaluator accepts:
//!
//! ```json
//! [["shot_task.pipeline", "=", "comp"], "and", ["shot_task.shot.shot", "=", "sc001"]]
//! ```
//!
//! There is no grouping. Combining appends the join token and then the
//! operand's items, so `(a and b) or c` and `a and (b or c)` cannot be told
//! apart once built; precedence is whatever left-to-right order the server
//! applies to the chain.

use super::op::Operator;
use super::predicate::Filter;
use crate::datum::Datum;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Boolean join token between two filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Join {
    And,
    Or,
}

impl Join {
    pub fn as_str(self) -> &'static str {
        match self {
            Join::And => "and",
            Join::Or => "or",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Join::And),
            "or" => Some(Join::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One slot of a [`FilterList`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterItem {
    Filter(Filter),
    Join(Join),
}

impl FilterItem {
    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            FilterItem::Filter(filter) => Some(filter),
            FilterItem::Join(_) => None,
        }
    }
}

impl Serialize for FilterItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FilterItem::Filter(filter) => filter.serialize(serializer),
            FilterItem::Join(join) => serializer.serialize_str(join.as_str()),
        }
    }
}

/// Ordered, flat chain of filters and join tokens.
///
/// Always odd length, starting and ending with a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterList {
    items: Vec<FilterItem>,
}

impl FilterList {
    fn combine(&self, other: impl Into<FilterList>, join: Join) -> FilterList {
        let other = other.into();
        let mut items = Vec::with_capacity(self.items.len() + 1 + other.items.len());
        items.extend(self.items.iter().cloned());
        items.push(FilterItem::Join(join));
        items.extend(other.items);
        FilterList { items }
    }

    /// Conjunction: `self`, `"and"`, then `other`'s items.
    pub fn and(&self, other: impl Into<FilterList>) -> FilterList {
        self.combine(other, Join::And)
    }

    /// Disjunction: `self`, `"or"`, then `other`'s items.
    pub fn or(&self, other: impl Into<FilterList>) -> FilterList {
        self.combine(other, Join::Or)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[FilterItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterItem> {
        self.items.iter()
    }

    /// The filters of the chain, skipping join tokens.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.items.iter().filter_map(FilterItem::as_filter)
    }

    pub(crate) fn filters_mut(&mut self) -> impl Iterator<Item = &mut Filter> {
        self.items.iter_mut().filter_map(|item| match item {
            FilterItem::Filter(filter) => Some(filter),
            FilterItem::Join(_) => None,
        })
    }

    /// Decode the wire format.
    ///
    /// Accepts either a full chain or a single bare `[field, op, value]`
    /// triple. Anything else is a [`Error::MalformedFilter`].
    pub fn from_wire(value: &Value) -> Result<FilterList> {
        let arr = value.as_array().ok_or_else(|| {
            Error::MalformedFilter(format!("expected an array, got {}", value))
        })?;

        if arr.first().map(Value::is_string).unwrap_or(false) {
            return Ok(FilterList::from(Self::filter_from_wire(value)?));
        }

        if arr.len() % 2 == 0 {
            return Err(Error::MalformedFilter(format!(
                "filter chain must have odd length, got {}",
                arr.len()
            )));
        }

        let items = arr
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if i % 2 == 0 {
                    Self::filter_from_wire(item).map(FilterItem::Filter)
                } else {
                    item.as_str()
                        .and_then(Join::from_token)
                        .map(FilterItem::Join)
                        .ok_or_else(|| {
                            Error::MalformedFilter(format!(
                                "expected 'and' or 'or' at position {}, got {}",
                                i, item
                            ))
                        })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FilterList { items })
    }

    fn filter_from_wire(value: &Value) -> Result<Filter> {
        let triple = value
            .as_array()
            .filter(|arr| arr.len() == 3)
            .ok_or_else(|| {
                Error::MalformedFilter(format!("expected [field, operator, value], got {}", value))
            })?;

        let field = triple[0].as_str().ok_or_else(|| {
            Error::MalformedFilter(format!("field name must be a string, got {}", triple[0]))
        })?;
        let op = triple[1]
            .as_str()
            .ok_or_else(|| {
                Error::MalformedFilter(format!("operator must be a string, got {}", triple[1]))
            })
            .and_then(Operator::from_token)?;

        Ok(Filter::with_operator(
            field,
            Datum::from(triple[2].clone()),
            op,
        ))
    }
}

impl From<Filter> for FilterList {
    fn from(filter: Filter) -> Self {
        FilterList {
            items: vec![FilterItem::Filter(filter)],
        }
    }
}

impl From<&Filter> for FilterList {
    fn from(filter: &Filter) -> Self {
        FilterList::from(filter.clone())
    }
}

impl From<&FilterList> for FilterList {
    fn from(list: &FilterList) -> Self {
        list.clone()
    }
}

impl<'a> IntoIterator for &'a FilterList {
    type Item = &'a FilterItem;
    type IntoIter = std::slice::Iter<'a, FilterItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::fmt::Display for FilterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match item {
                FilterItem::Filter(filter) => write!(f, "{}", filter)?,
                FilterItem::Join(join) => write!(f, "{}", join)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FilterList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterList::from_wire(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_and_length_and_boundary() {
        let f1 = Filter::new("a", 1);
        let f2 = Filter::new("b", 2);
        let left = FilterList::from(f1.clone());

        let combined = left.and(f2.clone());

        assert_eq!(combined.len(), left.len() + 1 + FilterList::from(f2).len());
        assert_eq!(combined.items()[0], FilterItem::Filter(f1));
        let joins: Vec<_> = combined
            .iter()
            .filter(|item| matches!(item, FilterItem::Join(Join::And)))
            .collect();
        assert_eq!(joins.len(), 1);
        assert_eq!(combined.items()[1], FilterItem::Join(Join::And));
    }

    #[test]
    fn test_chain_is_flat() {
        let chain = Filter::new("a", 1)
            .and(Filter::new("b", 2))
            .or(Filter::new("c", 3).and(Filter::new("d", 4)));

        assert_eq!(chain.len(), 7);
        let wire = serde_json::to_value(&chain).unwrap();
        assert_eq!(
            wire,
            json!([
                ["a", "=", 1],
                "and",
                ["b", "=", 2],
                "or",
                ["c", "=", 3],
                "and",
                ["d", "=", 4]
            ])
        );
    }

    #[test]
    fn test_combination_does_not_mutate() {
        let left = FilterList::from(Filter::new("a", 1));
        let right = FilterList::from(Filter::new("b", 2));
        let _ = left.or(&right);
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_from_wire_chain() {
        let wire = json!([["key", "=", "value"], "or", ["#id", "in", ["1", "2"]]]);
        let list = FilterList::from_wire(&wire).unwrap();
        assert_eq!(list.len(), 3);
        let filters: Vec<_> = list.filters().collect();
        assert_eq!(filters[1].operator(), Operator::In);
        assert_eq!(filters[1].field(), "#id");
    }

    #[test]
    fn test_from_wire_bare_triple() {
        let list = FilterList::from_wire(&json!(["status", "=", "Y"])).unwrap();
        assert_eq!(list, FilterList::from(Filter::new("status", "Y")));
    }

    #[test]
    fn test_from_wire_rejects_malformed() {
        let cases = [
            json!("status"),
            json!([["a", "=", 1], "and"]),
            json!([["a", "=", 1], "xor", ["b", "=", 2]]),
            json!([["a", "=", 1], "and", "b"]),
            json!([["a", "~", 1]]),
            json!({"field": "a"}),
        ];
        for case in cases {
            let err = FilterList::from_wire(&case).unwrap_err();
            assert!(matches!(err, Error::MalformedFilter(_)), "{}", case);
        }
    }
}
