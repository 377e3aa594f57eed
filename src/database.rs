//! Database handle.

use crate::client::{Client, Request, Response};
use crate::error::Result;
use crate::module::Module;

/// A named database on the remote service.
///
/// Cheap to clone; holds no connection state of its own.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    client: Client,
}

impl Database {
    pub fn new(name: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Table context for `name`. No I/O.
    pub fn module(&self, name: impl Into<String>) -> Module {
        Module::new(name, self.clone())
    }

    /// Call with the `db` parameter set to this database.
    pub async fn call(&self, request: Request) -> Result<Response> {
        self.client
            .call(request.param("db", self.name.as_str()))
            .await
    }
}
