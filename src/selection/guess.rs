//! Picking one record out of several matches.

use super::{Entry, Selection};
use crate::datum::Datum;
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// Rank of a record for `account_id`: 0 assigned to them, 1 assigned to
/// someone else, 2 unassigned.
///
/// `assigned` is a comma separated account list; blank items are ignored.
pub(crate) fn priority(assigned: &Datum, account_id: &str) -> u8 {
    let assigned = assigned.to_plain_string();
    let mut accounts = assigned.split(',').map(str::trim).filter(|a| !a.is_empty()).peekable();
    if accounts.peek().is_none() {
        return 2;
    }
    if accounts.any(|a| a == account_id) {
        0
    } else {
        1
    }
}

/// Index of the best candidate. Ties keep the earliest position.
pub(crate) fn best_match(assignments: &[Datum], account_id: &str) -> Option<usize> {
    assignments
        .iter()
        .enumerate()
        .min_by_key(|(i, assigned)| (priority(assigned, account_id), *i))
        .map(|(i, _)| i)
}

pub(crate) async fn guess_best_match(selection: &Selection, account_id: &str) -> Result<Entry> {
    let data = selection.get_fields(&["id", "account_id"]).await?;
    let by_id: HashMap<String, Datum> = data
        .iter()
        .map(|row| (row[0].to_plain_string(), row[1].clone()))
        .collect();

    // records missing from the reply count as unassigned
    let assignments: Vec<Datum> = selection
        .ids()
        .iter()
        .map(|id| by_id.get(id).cloned().unwrap_or(Datum::Null))
        .collect();

    let index = best_match(&assignments, account_id).ok_or_else(|| Error::EmptyMatch {
        module: selection.module().name().to_string(),
    })?;
    let entries = selection.to_entries();
    let chosen = entries[index].clone();
    debug!(id = %chosen.id(), candidates = entries.len(), "Picked best match");
    Ok(chosen)
}
