//! In-memory stand-in for the remote service, driven through `MockTransport`.

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tablink::error::{Error, Result};
use tablink::{Client, FilterList, MockTransport, Operator, Request, Response};

struct Record {
    db: String,
    module: String,
    id: String,
    fields: HashMap<String, String>,
}

struct History {
    id: String,
    task_id: String,
    step: String,
    status: String,
}

/// Tables keyed by database and module, plus one shared history table.
///
/// `get_in_id` answers in reverse id order, so callers cannot rely on the
/// reply order.
#[derive(Default)]
pub struct FakeServer {
    records: Mutex<Vec<Record>>,
    history: Mutex<Vec<History>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, db: &str, module: &str, id: &str, fields: &[(&str, &str)]) {
        self.records.lock().push(Record {
            db: db.to_string(),
            module: module.to_string(),
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }

    pub fn add_history(&self, task_id: &str, step: &str, status: &str) {
        let mut history = self.history.lock();
        let id = format!("h{}", history.len() + 1);
        history.push(History {
            id,
            task_id: task_id.to_string(),
            step: step.to_string(),
            status: status.to_string(),
        });
    }

    pub fn count(&self, db: &str, module: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.db == db && r.module == module)
            .count()
    }

    /// Transport answering from this server, and a client over it.
    pub fn client(self: &Arc<Self>) -> (Arc<MockTransport>, Client) {
        let server = Arc::clone(self);
        let transport = Arc::new(MockTransport::with_handler(move |req| server.handle(req)));
        let client = Client::new(transport.clone())
            .with_token("test-token")
            .with_account_id("carol");
        (transport, client)
    }

    fn handle(&self, req: &Request) -> Result<Response> {
        let db = param_str(req, "db");
        let module = param_str(req, "module");
        match (req.controller.as_str(), req.method.as_str()) {
            ("c_orm", "get_with_filter") => {
                let filters = FilterList::from_wire(param(req, "sign_filter_array")?)?;
                let records = self.records.lock();
                let ids: Vec<Value> = records
                    .iter()
                    .filter(|r| r.db == db && r.module == module)
                    .filter(|r| matches(&module, &filters, |name| record_value(r, name)))
                    .map(|r| json!([r.id]))
                    .collect();
                Ok(Response::ok(Value::Array(ids)))
            }
            ("c_orm", "get_in_id") => {
                let ids = string_list(param(req, "id_array")?);
                let signs = string_list(param(req, "sign_array")?);
                let records = self.records.lock();
                let rows: Vec<Value> = ids
                    .iter()
                    .rev()
                    .filter_map(|id| {
                        records
                            .iter()
                            .find(|r| r.db == db && r.module == module && &r.id == id)
                    })
                    .map(|r| {
                        let cells: Vec<Value> = signs
                            .iter()
                            .map(|s| json!(record_value(r, &local_name(&module, s))))
                            .collect();
                        Value::Array(cells)
                    })
                    .collect();
                Ok(Response::ok(Value::Array(rows)))
            }
            ("c_orm", "set_in_id") => {
                let ids = string_list(param(req, "id_array")?);
                let data = param(req, "sign_data_array")?
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let mut records = self.records.lock();
                for record in records
                    .iter_mut()
                    .filter(|r| r.db == db && r.module == module && ids.contains(&r.id))
                {
                    for (key, value) in &data {
                        let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                        record.fields.insert(local_name(&module, key), value);
                    }
                }
                Ok(Response::ok(Value::Bool(true)))
            }
            ("c_orm", "del_in_id") => {
                let ids = string_list(param(req, "id_array")?);
                self.records
                    .lock()
                    .retain(|r| !(r.db == db && r.module == module && ids.contains(&r.id)));
                Ok(Response::ok(Value::Bool(true)))
            }
            ("c_history", "get_with_filter") => {
                let rows: Vec<Value> = self
                    .matching_history(&module, param(req, "filter_array")?)?
                    .into_iter()
                    .map(|h| {
                        json!([
                            h.0, h.1, "a1", h.2, h.3, "", "", "carol", "2024-03-01 10:00:00"
                        ])
                    })
                    .collect();
                Ok(Response::ok(Value::Array(rows)))
            }
            ("c_history", "count_with_filter") => {
                let count = self
                    .matching_history(&module, param(req, "filter_array")?)?
                    .len();
                // the service sends counts as strings
                Ok(Response::ok(json!(count.to_string())))
            }
            (controller, method) => Ok(Response {
                data: json!(format!("unknown method {}.{}", controller, method)),
                code: 0,
                kind: "json".to_string(),
            }),
        }
    }

    fn matching_history(
        &self,
        module: &str,
        filters: &Value,
    ) -> Result<Vec<(String, String, String, String)>> {
        let filters = FilterList::from_wire(filters)?;
        Ok(self
            .history
            .lock()
            .iter()
            .filter(|h| {
                matches(module, &filters, |name| match name {
                    "id" => Some(h.id.clone()),
                    "task_id" => Some(h.task_id.clone()),
                    "step" => Some(h.step.clone()),
                    "status" => Some(h.status.clone()),
                    _ => None,
                })
            })
            .map(|h| (h.id.clone(), h.task_id.clone(), h.step.clone(), h.status.clone()))
            .collect())
    }
}

fn param<'a>(req: &'a Request, key: &str) -> Result<&'a Value> {
    req.get(key)
        .ok_or_else(|| Error::Transport(format!("missing parameter '{}'", key)))
}

fn param_str(req: &Request, key: &str) -> String {
    req.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Column name inside the table: `#task_id` → `task_id`, `shot_task.artist` → `artist`.
fn local_name(module: &str, wire: &str) -> String {
    let name = wire.strip_prefix('#').unwrap_or(wire);
    name.strip_prefix(&format!("{}.", module))
        .unwrap_or(name)
        .to_string()
}

fn record_value(record: &Record, name: &str) -> Option<String> {
    if name == "id" {
        Some(record.id.clone())
    } else {
        record.fields.get(name).cloned()
    }
}

/// Conjunction of every filter; join tokens are assumed to be `and`.
fn matches<F>(module: &str, filters: &FilterList, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    filters.filters().all(|filter| {
        let Some(actual) = lookup(&local_name(module, filter.field())) else {
            return false;
        };
        match filter.operator() {
            Operator::Eq => filter.value().to_plain_string() == actual,
            Operator::In => filter
                .value()
                .as_array()
                .map(|items| items.iter().any(|v| v.to_plain_string() == actual))
                .unwrap_or(false),
            _ => false,
        }
    })
}
