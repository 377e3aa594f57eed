//! Single-record handle.

use super::{HistoryQuery, Selection};
use crate::datum::Datum;
use crate::error::{Error, Result};
use crate::module::Module;

/// A selection of exactly one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    selection: Selection,
}

impl Entry {
    pub fn new(module: Module, id: impl Into<String>) -> Self {
        Self {
            selection: Selection::new(module, vec![id.into()]),
        }
    }

    pub fn id(&self) -> &str {
        &self.selection.ids()[0]
    }

    pub fn module(&self) -> &Module {
        self.selection.module()
    }

    pub fn as_selection(&self) -> &Selection {
        &self.selection
    }

    /// Values of `names` for this record, in the order asked.
    pub async fn get_fields<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Datum>> {
        let result = self.selection.get_fields(names).await?;
        result
            .into_rows()
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!(
                    "no row returned for {} '{}'",
                    self.module().name(),
                    self.id()
                ))
            })
    }

    pub async fn get_field(&self, name: &str) -> Result<Datum> {
        let mut row = self.get_fields(&[name]).await?;
        Ok(row.remove(0))
    }

    pub async fn set_fields<I, K, V>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Datum>,
    {
        self.selection.set_fields(values).await
    }

    pub async fn set_field(&self, name: &str, value: impl Into<Datum>) -> Result<()> {
        self.selection.set_field(name, value).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.selection.delete().await
    }

    pub fn history(&self) -> HistoryQuery<'_> {
        self.selection.history()
    }
}

impl From<Entry> for Selection {
    fn from(entry: Entry) -> Self {
        entry.selection
    }
}
