//! Selections: resolved identifier sets bound to a module.
//!
//! ```text
//! Module::filter ──→ Selection ──┬─→ get_fields / set_fields / delete
//!                                ├─→ history()   (HistoryQuery)
//!                                └─→ to_entry()  (Entry, guessing on duplicates)
//! ```
//!
//! A selection holds identifiers only. Every operation is one remote call
//! keyed by those identifiers, so results always describe the same records
//! the filter matched.

mod entry;
mod guess;
mod history;
mod result_set;

pub use entry::Entry;
pub use history::HistoryQuery;
pub use result_set::ResultSet;

use crate::client::{Request, Response};
use crate::datum::Datum;
use crate::error::{Error, Result};
use crate::model::FileBoxDetail;
use crate::module::Module;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Platform name sent with path lookups.
pub(crate) fn platform_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win",
        "macos" => "mac",
        _ => "linux",
    }
}

/// Ordered identifiers of records in one module.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    module: Module,
    ids: Vec<String>,
}

impl Selection {
    pub fn new(module: Module, ids: Vec<String>) -> Self {
        Self { module, ids }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    async fn call(&self, request: Request) -> Result<Response> {
        self.module
            .call(request.param("id_array", self.ids.clone()))
            .await
    }

    /// Fetch `names` for every selected record.
    ///
    /// One row per identifier, cells in the order of `names`. When the id
    /// field is among `names`, rows are put in selection order.
    #[instrument(skip(self, names), fields(module = %self.module.name(), ids = self.ids.len()))]
    pub async fn get_fields<S: AsRef<str>>(&self, names: &[S]) -> Result<ResultSet> {
        let columns: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        let qualified: Vec<String> = columns.iter().map(|n| self.module.field(n)).collect();

        let request = Request::new("c_orm", "get_in_id")
            .param("sign_array", qualified.clone())
            .param("order_sign_array", qualified.clone());
        let rows = self.call(request).await?.rows()?;
        if rows.len() != self.ids.len() {
            warn!(
                expected = self.ids.len(),
                received = rows.len(),
                "Row count differs from selection size"
            );
        }

        let id_field = self.module.field("id");
        let id_col = qualified.iter().position(|q| *q == id_field || q == "#id");
        let mut result = ResultSet::new(columns, qualified, rows)?;
        if let Some(col) = id_col {
            result.order_by_ids(col, &self.ids);
        }
        Ok(result)
    }

    /// Fetch a single field, one value per record.
    pub async fn get_field(&self, name: &str) -> Result<Vec<Datum>> {
        let result = self.get_fields(&[name]).await?;
        Ok(result.into_rows().into_iter().map(|mut row| row.remove(0)).collect())
    }

    /// Write `values` to every selected record.
    #[instrument(skip(self, values), fields(module = %self.module.name(), ids = self.ids.len()))]
    pub async fn set_fields<I, K, V>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Datum>,
    {
        let data: Map<String, Value> = values
            .into_iter()
            .map(|(k, v)| {
                let value: Datum = v.into();
                (self.module.field(k.as_ref()), Value::from(value))
            })
            .collect();
        debug!(fields = data.len(), "Setting fields");

        let request = Request::new("c_orm", "set_in_id").param("sign_data_array", data);
        self.call(request).await?;
        Ok(())
    }

    pub async fn set_field(&self, name: &str, value: impl Into<Datum>) -> Result<()> {
        self.set_fields([(name, value)]).await
    }

    /// Delete every selected record.
    #[instrument(skip(self), fields(module = %self.module.name(), ids = self.ids.len()))]
    pub async fn delete(&self) -> Result<()> {
        self.call(Request::new("c_orm", "del_in_id")).await?;
        debug!("Deleted");
        Ok(())
    }

    /// History of the selected records.
    pub fn history(&self) -> HistoryQuery<'_> {
        HistoryQuery::new(self)
    }

    /// One entry per identifier, in order. No I/O.
    pub fn to_entries(&self) -> Vec<Entry> {
        self.ids
            .iter()
            .map(|id| Entry::new(self.module.clone(), id.clone()))
            .collect()
    }

    /// Collapse to one entry.
    ///
    /// Exactly one identifier converts without I/O. Several identifiers are
    /// narrowed by assignment: records assigned to `account_id` first, then
    /// records assigned to someone else, then unassigned ones.
    pub async fn to_entry(&self, account_id: &str) -> Result<Entry> {
        match self.ids.len() {
            0 => Err(Error::EmptyMatch {
                module: self.module.name().to_string(),
            }),
            1 => Ok(Entry::new(self.module.clone(), self.ids[0].clone())),
            n => {
                warn!(
                    module = %self.module.name(),
                    matches = n,
                    "Filter matched several records, guessing"
                );
                guess::guess_best_match(self, account_id).await
            }
        }
    }

    /// Resolved folder paths for `signs`.
    pub async fn get_path<S: AsRef<str>>(&self, signs: &[S]) -> Result<HashMap<String, Datum>> {
        let signs: Vec<&str> = signs.iter().map(|s| s.as_ref()).collect();
        let request = Request::new("c_folder", "get_replace_path_in_sign")
            .param("sign_array", signs)
            .param("task_id_array", self.ids.clone())
            .param("os", platform_os());
        self.call(request).await?.object()
    }

    /// Filebox settings for `sign`, taken from the first selected record.
    pub async fn get_filebox(&self, sign: &str) -> Result<FileBoxDetail> {
        let task_id = self.ids.first().ok_or_else(|| Error::EmptyMatch {
            module: self.module.name().to_string(),
        })?;
        let request = Request::new("c_file", "filebox_get_one_with_sign")
            .param("sign", sign)
            .param("task_id", task_id.as_str())
            .param("os", platform_os());
        let detail = self.call(request).await?.object()?;
        FileBoxDetail::from_map(&detail)
    }
}
