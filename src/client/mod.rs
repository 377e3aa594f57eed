//! Remote call plumbing.
//!
//! # Architecture
//!
//! ```text
//! Client (token, account id)
//!   └─→ Transport (trait)          one request in, one response out
//!        ├─→ HttpTransport          JSON over HTTP (reqwest)
//!        └─→ MockTransport          in-memory, for tests
//! ```
//!
//! A call is addressed by a controller and a method name; everything else
//! travels as named parameters. The [`Module`](crate::Module) layer adds the
//! `db`, `module` and `token` parameters, so nothing below it knows about
//! tables.
//!
//! Responses carry `data` (rows, a bare list, a scalar or a mapping) and a
//! status `code`; `1` is success. [`Client::call`] turns any other code into
//! [`Error::Transport`] and never retries.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use crate::config::ClientConfig;
use crate::database::Database;
use crate::datum::Datum;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Status code the service uses for success.
pub const CODE_SUCCESS: i64 = 1;

/// A single remote call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub controller: String,
    pub method: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            method: method.into(),
            params: Map::new(),
        }
    }

    /// Set a named parameter, replacing any previous value.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Set a named parameter only if it is not present yet.
    pub fn default_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params
            .entry(key.to_string())
            .or_insert_with(|| value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Reply envelope of a remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: Value,
    pub code: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Response {
    /// Successful JSON response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            code: CODE_SUCCESS,
            kind: "json".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }

    /// Tabular data: a list of rows, each a list of cells.
    ///
    /// `null` and the empty string both mean "no rows".
    pub fn rows(&self) -> Result<Vec<Vec<Datum>>> {
        match &self.data {
            Value::Null => Ok(Vec::new()),
            Value::String(s) if s.is_empty() => Ok(Vec::new()),
            Value::Array(rows) => rows
                .iter()
                .map(|row| match row {
                    Value::Array(cells) => Ok(cells.iter().cloned().map(Datum::from).collect()),
                    other => Err(Error::UnexpectedResponse(format!(
                        "expected a row array, got {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(Error::UnexpectedResponse(format!(
                "expected rows, got {}",
                other
            ))),
        }
    }

    /// Identifier list: the first cell of every row, or a bare list of ids.
    pub fn ids(&self) -> Result<Vec<String>> {
        let items = match &self.data {
            Value::Null => return Ok(Vec::new()),
            Value::String(s) if s.is_empty() => return Ok(Vec::new()),
            Value::Array(items) => items,
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "expected an id list, got {}",
                    other
                )))
            }
        };

        items
            .iter()
            .map(|item| {
                let cell = match item {
                    Value::Array(cells) => cells.first().unwrap_or(&Value::Null),
                    other => other,
                };
                match cell {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(Error::UnexpectedResponse(format!(
                        "expected an identifier, got {}",
                        other
                    ))),
                }
            })
            .collect()
    }

    /// Scalar count, sent either as a number or a numeric string.
    pub fn count(&self) -> Result<u64> {
        match &self.data {
            Value::Number(n) => n.as_u64().ok_or_else(|| {
                Error::UnexpectedResponse(format!("expected a non-negative count, got {}", n))
            }),
            Value::String(s) => s.trim().parse().map_err(|_| {
                Error::UnexpectedResponse(format!("expected a count, got '{}'", s))
            }),
            other => Err(Error::UnexpectedResponse(format!(
                "expected a count, got {}",
                other
            ))),
        }
    }

    /// Structured single-record data.
    pub fn object(&self) -> Result<HashMap<String, Datum>> {
        match &self.data {
            Value::Object(obj) => Ok(obj
                .iter()
                .map(|(k, v)| (k.clone(), Datum::from(v.clone())))
                .collect()),
            other => Err(Error::UnexpectedResponse(format!(
                "expected a mapping, got {}",
                other
            ))),
        }
    }

    /// Boolean flag, tolerant of the `"Y"`/`"N"` spelling.
    pub fn flag(&self) -> bool {
        match &self.data {
            Value::Bool(b) => *b,
            Value::String(s) => matches!(s.as_str(), "Y" | "y" | "true" | "1"),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            _ => false,
        }
    }
}

/// Transport collaborator: delivers one request and returns the reply.
///
/// Implementations report network, authentication and remote rejection
/// failures as [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: Request) -> Result<Response>;
}

/// Authenticated handle on the remote service.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    account_id: Option<String>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
            account_id: None,
        }
    }

    /// Client talking HTTP to the configured server.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            config.server_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        let mut client = Self::new(Arc::new(transport));
        client.token = config.token.clone();
        client.account_id = config.account_id.clone();
        Ok(client)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Account id of the caller, used to break ties between duplicate matches.
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn database(&self, name: impl Into<String>) -> Database {
        Database::new(name, self.clone())
    }

    /// Send a request, mapping non-success codes to [`Error::Transport`].
    pub async fn call(&self, request: Request) -> Result<Response> {
        let controller = request.controller.clone();
        let method = request.method.clone();
        debug!(
            controller = %controller,
            method = %method,
            module = request.get("module").and_then(serde_json::Value::as_str).unwrap_or(""),
            "Remote call"
        );

        let request = match &self.token {
            Some(token) => request.default_param("token", token.as_str()),
            None => request,
        };

        let response = self.transport.call(request).await?;
        if !response.is_success() {
            warn!(
                controller = %controller,
                method = %method,
                code = response.code,
                "Remote call rejected"
            );
            return Err(Error::Transport(format!(
                "{}.{} failed with code {}: {}",
                controller, method, response.code, response.data
            )));
        }
        Ok(response)
    }
}
