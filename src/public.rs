//! Modules of the shared `public` database.

use crate::client::Client;
use crate::datum::Datum;
use crate::error::Result;
use crate::filter::Filter;
use crate::module::Module;
use crate::selection::Selection;

/// Database holding projects and accounts.
pub const PUBLIC_DATABASE: &str = "public";

/// A `public` table with a notion of "active" records and a display field.
#[derive(Debug, Clone)]
pub struct PublicModule {
    module: Module,
    active_filter: Filter,
    name_field: String,
}

impl PublicModule {
    pub fn new(
        client: &Client,
        name: impl Into<String>,
        active_filter: Filter,
        name_field: impl Into<String>,
    ) -> Self {
        Self {
            module: client.database(PUBLIC_DATABASE).module(name),
            active_filter,
            name_field: name_field.into(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn name_field(&self) -> &str {
        &self.name_field
    }

    /// Every active record.
    pub async fn all(&self) -> Result<Selection> {
        self.module.filter(&self.active_filter).await
    }

    /// Display names of every active record.
    pub async fn names(&self) -> Result<Vec<String>> {
        let names = self.all().await?.get_field(&self.name_field).await?;
        Ok(names.iter().map(Datum::to_plain_string).collect())
    }
}

/// Active projects, named by `full_name`.
pub fn project(client: &Client) -> PublicModule {
    PublicModule::new(client, "project", Filter::new("status", "Active"), "full_name")
}

/// Active accounts, named by `name`.
pub fn account(client: &Client) -> PublicModule {
    PublicModule::new(client, "account", Filter::new("status", "Y"), "name")
}
