//! Field accessor used to build filters with named methods.

use super::op::Operator;
use super::predicate::Filter;
use crate::datum::Datum;

/// Handle for a logical column name.
///
/// Comparisons produce [`Filter`] values, never booleans. The accessor can
/// optionally carry its table so the resulting filter holds the
/// fully-qualified name already.
///
/// # Example
///
/// ```rust
/// use tablink::{Field, Operator};
///
/// let filter = Field::new("pipeline")
///     .eq("comp")
///     .and(Field::new("shot.shot").eq("sc001"));
/// assert_eq!(filter.len(), 3);
///
/// let solo = Field::new("artist").in_("solo");
/// assert_eq!(solo.operator(), Operator::In);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    table: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }

    /// Accessor bound to a table, built by [`Module::field_of`](crate::Module::field_of).
    pub fn in_table(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Some(table.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as written into filters: qualified when the accessor carries a
    /// table and the name is not already qualified or a system field.
    pub fn wire_name(&self) -> String {
        match &self.table {
            Some(table) if !is_qualified(&self.name) => format!("{}.{}", table, self.name),
            _ => self.name.clone(),
        }
    }

    fn build(&self, value: impl Into<Datum>, op: Operator) -> Filter {
        Filter::with_operator(self.wire_name(), value, op)
    }

    /// `=` filter, whatever the shape of the operand.
    pub fn eq(&self, value: impl Into<Datum>) -> Filter {
        self.build(value, Operator::Eq)
    }

    /// `>` filter.
    pub fn gt(&self, value: impl Into<Datum>) -> Filter {
        self.build(value, Operator::Gt)
    }

    /// `<` filter.
    pub fn lt(&self, value: impl Into<Datum>) -> Filter {
        self.build(value, Operator::Lt)
    }

    /// `in` filter. A scalar operand is wrapped into a one-element list.
    pub fn in_(&self, value: impl Into<Datum>) -> Filter {
        let value = match value.into() {
            seq @ Datum::Array(_) => seq,
            scalar => Datum::Array(vec![scalar]),
        };
        self.build(value, Operator::In)
    }

    /// `has` filter: the field contains one of the values.
    pub fn has(&self, value: impl Into<Datum>) -> Filter {
        self.build(value, Operator::Has)
    }

    /// `concat` filter: the field is a list holding the value.
    pub fn contains(&self, value: impl Into<Datum>) -> Filter {
        self.build(value, Operator::Concat)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Names holding a `.` or starting with `#` are already wire names.
pub(crate) fn is_qualified(name: &str) -> bool {
    name.contains('.') || name.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_ignores_operand_shape() {
        let field = Field::new("artist");
        let filter = field.eq(vec!["x", "y"]);
        assert_eq!(filter.operator(), Operator::Eq);
        assert_eq!(field.eq("x"), Filter::with_operator("artist", "x", Operator::Eq));
    }

    #[test]
    fn test_in_wraps_scalar() {
        let filter = Field::new("artist").in_("solo");
        assert_eq!(filter, Filter::with_operator("artist", vec!["solo"], Operator::In));

        let filter = Field::new("artist").in_(vec!["a", "b"]);
        assert_eq!(filter.value(), &Datum::from(vec!["a", "b"]));
    }

    #[test]
    fn test_named_builders() {
        let field = Field::new("frame");
        assert_eq!(field.gt(10).operator(), Operator::Gt);
        assert_eq!(field.lt(10).operator(), Operator::Lt);
        assert_eq!(field.has("a").operator(), Operator::Has);
        assert_eq!(field.contains("a").operator(), Operator::Concat);
    }

    #[test]
    fn test_integer_operand_wire_form() {
        let wire = serde_json::to_string(&Field::new("frame").gt(10)).unwrap();
        assert_eq!(wire, r#"["frame",">",10]"#);
    }

    #[test]
    fn test_bound_accessor_qualifies() {
        assert_eq!(Field::in_table("shot_task", "artist").wire_name(), "shot_task.artist");
        assert_eq!(Field::in_table("shot_task", "#id").wire_name(), "#id");
        assert_eq!(Field::in_table("shot_task", "shot.shot").wire_name(), "shot.shot");
    }
}
