//! History of a selection.

use super::Selection;
use crate::error::Result;
use crate::filter::{Filter, FilterList};
use crate::model::HistoryInfo;

/// History queries scoped to the identifiers of one selection.
///
/// `get` and `count` build their filter the same way, so for any extra
/// filter `count(f)` equals `get(f).len()` on a consistent server.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    selection: &'a Selection,
}

impl<'a> HistoryQuery<'a> {
    pub(crate) fn new(selection: &'a Selection) -> Self {
        Self { selection }
    }

    /// `#task_id in ids`, and-ed with `extra` when given.
    pub fn filters(&self, extra: Option<FilterList>) -> FilterList {
        let scope = Filter::new("#task_id", self.selection.ids().to_vec());
        match extra {
            Some(extra) => scope.and(extra),
            None => scope.into(),
        }
    }

    pub async fn get(&self, extra: Option<FilterList>) -> Result<Vec<HistoryInfo>> {
        self.selection
            .module()
            .get_history(self.filters(extra))
            .await
    }

    pub async fn count(&self, extra: Option<FilterList>) -> Result<u64> {
        self.selection
            .module()
            .count_history(self.filters(extra))
            .await
    }
}
