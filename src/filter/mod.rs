//! Filter-expression DSL.
//!
//! Predicates are built locally and sent to the server as-is; nothing here
//! evaluates a filter.
//!
//! - **Operator** (`op.rs`): the six wire operators
//! - **Filter** (`predicate.rs`): one `(field, operator, value)` triple
//! - **FilterList** (`list.rs`): flat `filter (join filter)*` chain
//! - **Field** (`field.rs`): accessor with `eq`/`gt`/`lt`/`in_`/`has`/`contains`

pub mod field;
pub mod list;
pub mod op;
pub mod predicate;

pub use field::Field;
pub use list::{FilterItem, FilterList, Join};
pub use op::Operator;
pub use predicate::Filter;

pub(crate) use field::is_qualified;
