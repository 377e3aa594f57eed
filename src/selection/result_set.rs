//! Tabular field-fetch results.

use crate::datum::Datum;
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::ops::Index;

/// Rows returned by a field fetch.
///
/// Columns are named both by the names the caller asked for and by their
/// qualified wire names; either works for lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    qualified: Vec<String>,
    rows: Vec<Vec<Datum>>,
}

impl ResultSet {
    /// Build from raw rows, checking every row has one cell per column.
    pub fn new(columns: Vec<String>, qualified: Vec<String>, rows: Vec<Vec<Datum>>) -> Result<Self> {
        debug_assert_eq!(columns.len(), qualified.len());
        if let Some(bad) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(Error::UnexpectedResponse(format!(
                "row has {} cells, expected {} ({})",
                bad.len(),
                columns.len(),
                columns.join(", ")
            )));
        }
        Ok(Self {
            columns,
            qualified,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Datum>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Datum]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Datum>> {
        self.rows.iter()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.qualified.iter().position(|c| c == name))
    }

    /// Cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Datum> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Every value of column `name`, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Datum>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[col].clone()).collect())
    }

    /// Sorted unique values of column `name`, rendered as plain strings.
    pub fn distinct(&self, name: &str) -> Option<Vec<String>> {
        let col = self.column_index(name)?;
        let values: BTreeSet<String> = self
            .rows
            .iter()
            .map(|row| row[col].to_plain_string())
            .collect();
        Some(values.into_iter().collect())
    }

    pub fn into_rows(self) -> Vec<Vec<Datum>> {
        self.rows
    }

    /// Stable reorder so column `col` follows `ids`. Unknown ids go last.
    pub(crate) fn order_by_ids(&mut self, col: usize, ids: &[String]) {
        let rank: HashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        self.rows.sort_by_key(|row| {
            rank.get(row[col].to_plain_string().as_str())
                .copied()
                .unwrap_or(usize::MAX)
        });
    }
}

impl Index<usize> for ResultSet {
    type Output = [Datum];

    fn index(&self, index: usize) -> &[Datum] {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Vec<Datum>;
    type IntoIter = std::slice::Iter<'a, Vec<Datum>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
