//! Record types decoded from response rows.
//!
//! Each [`Record`] names the wire fields it requests, in order, and is
//! decoded positionally from one row of the reply.

use crate::datum::Datum;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A row-decoded record type.
pub trait Record: Sized {
    /// Wire field names, in row order.
    const FIELDS: &'static [&'static str];

    fn from_row(row: Vec<Datum>) -> Result<Self>;
}

fn expect_width(row: &[Datum], width: usize, record: &str) -> Result<()> {
    if row.len() != width {
        return Err(Error::UnexpectedResponse(format!(
            "{} row has {} cells, expected {}",
            record,
            row.len(),
            width
        )));
    }
    Ok(())
}

fn text(row: &[Datum], i: usize) -> String {
    row[i].to_plain_string()
}

/// Pipeline information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub id: String,
    pub name: String,
    pub module: String,
}

impl Record for PipelineInfo {
    const FIELDS: &'static [&'static str] = &["#id", "name", "module"];

    fn from_row(row: Vec<Datum>) -> Result<Self> {
        expect_width(&row, Self::FIELDS.len(), "PipelineInfo")?;
        Ok(Self {
            id: text(&row, 0),
            name: text(&row, 1),
            module: text(&row, 2),
        })
    }
}

/// History record of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryInfo {
    pub id: String,
    pub task_id: String,
    pub account_id: String,
    pub step: String,
    pub status: String,
    pub file: String,
    pub text: String,
    pub create_by: String,
    pub time: String,
}

impl Record for HistoryInfo {
    const FIELDS: &'static [&'static str] = &[
        "#id",
        "#task_id",
        "#account_id",
        "step",
        "status",
        "file",
        "text",
        "create_by",
        "time",
    ];

    fn from_row(row: Vec<Datum>) -> Result<Self> {
        expect_width(&row, Self::FIELDS.len(), "HistoryInfo")?;
        Ok(Self {
            id: text(&row, 0),
            task_id: text(&row, 1),
            account_id: text(&row, 2),
            step: text(&row, 3),
            status: text(&row, 4),
            file: text(&row, 5),
            text: text(&row, 6),
            create_by: text(&row, 7),
            time: text(&row, 8),
        })
    }
}

/// Filebox settings, decoded from a mapping rather than a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBoxDetail {
    pub path: String,
    pub classify: String,
    pub title: String,
    pub sign: String,
    pub color: String,
    pub rule: Vec<String>,
    pub rule_view: Vec<String>,
    pub is_submit: bool,
    pub is_move_old_to_history: bool,
    pub is_move_same_to_history: bool,
    pub is_in_history_add_version: bool,
    pub is_in_history_add_datetime: bool,
    pub is_cover_disable: bool,
    pub is_msg_to_first_qc: bool,
}

fn detail_field<'a>(map: &'a HashMap<String, Datum>, key: &str) -> Result<&'a Datum> {
    map.get(key)
        .ok_or_else(|| Error::UnexpectedResponse(format!("filebox detail is missing '{}'", key)))
}

impl FileBoxDetail {
    pub fn from_map(map: &HashMap<String, Datum>) -> Result<Self> {
        let text = |key: &str| detail_field(map, key).map(Datum::to_plain_string);
        let list = |key: &str| {
            detail_field(map, key).map(|d| {
                d.as_array()
                    .map(|items| items.iter().map(Datum::to_plain_string).collect::<Vec<_>>())
                    .unwrap_or_default()
            })
        };
        // "Y" is set, "N" and "" are unset
        let flag = |key: &str| detail_field(map, key).map(|d| d.as_str() == Some("Y"));

        Ok(Self {
            path: text("path")?,
            classify: text("classify")?,
            title: text("title")?,
            sign: text("sign")?,
            color: text("color")?,
            rule: list("rule")?,
            rule_view: list("rule_view")?,
            is_submit: flag("is_submit")?,
            is_move_old_to_history: flag("is_move_old_to_history")?,
            is_move_same_to_history: flag("is_move_same_to_history")?,
            is_in_history_add_version: flag("is_in_history_add_version")?,
            is_in_history_add_datetime: flag("is_in_history_add_datetime")?,
            is_cover_disable: flag("is_cover_disable")?,
            is_msg_to_first_qc: flag("is_msg_to_first_qc")?,
        })
    }
}
