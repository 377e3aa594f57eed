//! Module (database table) context.
//!
//! A [`Module`] is where DSL-level field names become wire-level names:
//! every query path calls [`Module::format_filters`] or [`Module::field`]
//! before anything is sent.
//!
//! # Qualification
//!
//! ```text
//! artist      → shot_task.artist
//! shot.shot   → shot.shot          (already qualified)
//! #id         → #id                (system field)
//! ```

use crate::client::{Request, Response};
use crate::database::Database;
use crate::error::Result;
use crate::filter::{is_qualified, Field, FilterList};
use crate::model::{HistoryInfo, PipelineInfo, Record};
use crate::selection::Selection;
use serde_json::Value;
use tracing::{debug, instrument};

/// A table on the remote service.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    database: Database,
    token: Option<String>,
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.database.name() == other.database.name()
    }
}

impl Module {
    pub fn new(name: impl Into<String>, database: Database) -> Self {
        Self {
            name: name.into(),
            database,
            token: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Use `token` for calls on this module instead of the client's.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or_else(|| self.database.client().token())
    }

    /// Full wire name for `name` in this table.
    pub fn field(&self, name: &str) -> String {
        if is_qualified(name) {
            name.to_string()
        } else {
            format!("{}.{}", self.name, name)
        }
    }

    /// Field accessor bound to this table.
    pub fn field_of(&self, name: impl Into<String>) -> Field {
        Field::in_table(self.name.clone(), name)
    }

    /// Copy of `filters` with every filter's field name qualified.
    ///
    /// Join tokens are left alone and the caller's list is never touched.
    pub fn format_filters(&self, filters: impl Into<FilterList>) -> FilterList {
        let mut formatted = filters.into();
        for filter in formatted.filters_mut() {
            let qualified = self.field(filter.field());
            filter.set_field(qualified);
        }
        formatted
    }

    /// Call with the `module` parameter (and this module's token) set.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let request = request.param("module", self.name.as_str());
        let request = match &self.token {
            Some(token) => request.default_param("token", token.as_str()),
            None => request,
        };
        self.database.call(request).await
    }

    /// Selection over explicit identifiers. No I/O.
    pub fn select<I, S>(&self, ids: I) -> Selection
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::new(self.clone(), ids.into_iter().map(Into::into).collect())
    }

    /// Resolve `filters` to the matching identifiers.
    ///
    /// One remote call requesting only the id field. An empty match is an
    /// empty selection, not an error.
    #[instrument(skip(self, filters), fields(module = %self.name))]
    pub async fn filter(&self, filters: impl Into<FilterList>) -> Result<Selection> {
        let filters = self.format_filters(filters);
        debug!(filters = %filters, "Resolving filter");

        let request = Request::new("c_orm", "get_with_filter")
            .param("sign_array", vec![self.field("id")])
            .param("sign_filter_array", serde_json::to_value(&filters)?);
        let ids = self.call(request).await?.ids()?;

        debug!(matched = ids.len(), "Filter resolved");
        Ok(Selection::new(self.clone(), ids))
    }

    /// All pipelines of this module.
    #[instrument(skip(self), fields(module = %self.name))]
    pub async fn pipelines(&self) -> Result<Vec<PipelineInfo>> {
        let request = Request::new("c_pipeline", "get_with_module")
            .param("field_array", PipelineInfo::FIELDS.to_vec());
        self.call(request)
            .await?
            .rows()?
            .into_iter()
            .map(PipelineInfo::from_row)
            .collect()
    }

    /// History records matching `filters`.
    #[instrument(skip(self, filters), fields(module = %self.name))]
    pub async fn get_history(&self, filters: impl Into<FilterList>) -> Result<Vec<HistoryInfo>> {
        self.get_records("c_history", "get_with_filter", filters).await
    }

    /// Number of history records matching `filters`.
    #[instrument(skip(self, filters), fields(module = %self.name))]
    pub async fn count_history(&self, filters: impl Into<FilterList>) -> Result<u64> {
        let filters = self.format_filters(filters);
        let request = Request::new("c_history", "count_with_filter")
            .param("filter_array", serde_json::to_value(&filters)?);
        self.call(request).await?.count()
    }

    async fn get_records<R: Record>(
        &self,
        controller: &str,
        method: &str,
        filters: impl Into<FilterList>,
    ) -> Result<Vec<R>> {
        let filters = self.format_filters(filters);
        let request = Request::new(controller, method)
            .param("field_array", R::FIELDS.to_vec())
            .param("filter_array", serde_json::to_value(&filters)?);
        self.call(request)
            .await?
            .rows()?
            .into_iter()
            .map(R::from_row)
            .collect()
    }

    /// Whether the current account holds permission `name`.
    pub async fn has_permission(&self, name: &str) -> Result<bool> {
        let request =
            Request::new("c_permission", "has_permission").param("permission_name", name);
        Ok(self.call(request).await?.flag())
    }

    /// Modules joined to this one, as returned by the server.
    pub async fn join_module_list(&self) -> Result<Value> {
        let request = Request::new("c_module", "get_join_module_list");
        Ok(self.call(request).await?.data)
    }

    /// Module-level setting `field`, as returned by the server.
    pub async fn get(&self, field: &str) -> Result<Value> {
        let request = Request::new("c_module", "get_one_with_module").param("field", field);
        Ok(self.call(request).await?.data)
    }

    /// Store `data` as the current account's page data for this module.
    pub async fn set_data_with_mypage(&self, data: impl Into<Value>) -> Result<()> {
        let request = Request::new("c_page", "set_data_with_my_page").param("show_data", data);
        self.call(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Client, MockTransport};
    use crate::filter::{Filter, FilterItem};
    use serde_json::json;
    use std::sync::Arc;

    fn module() -> (Arc<MockTransport>, Module) {
        let transport = Arc::new(MockTransport::new());
        let client = Client::new(transport.clone()).with_token("token-1");
        (transport, client.database("dummy_db").module("shot_task"))
    }

    #[test]
    fn test_field_qualification() {
        let (_, module) = module();
        assert_eq!(module.field("artist"), "shot_task.artist");
        assert_eq!(module.field("shot.shot"), "shot.shot");
        assert_eq!(module.field("#id"), "#id");
        assert_eq!(module.field("#task_id"), "#task_id");

        let qualified = module.field("artist");
        assert_eq!(module.field(&qualified), qualified);
    }

    #[test]
    fn test_format_filters_copies() {
        let (_, module) = module();
        let original = Filter::new("key", "value").and(Filter::new("#id", vec!["1"]));

        let formatted = module.format_filters(&original);

        let fields: Vec<_> = formatted.filters().map(|f| f.field().to_string()).collect();
        assert_eq!(fields, vec!["shot_task.key", "#id"]);
        assert!(matches!(formatted.items()[1], FilterItem::Join(_)));
        // caller's list untouched
        assert_eq!(original.filters().next().unwrap().field(), "key");
    }

    #[tokio::test]
    async fn test_filter_request() -> Result<()> {
        let (transport, module) = module();
        transport.push_data(json!([["0"], ["1"]]));

        let selection = module.filter(Filter::new("key", "value")).await?;

        assert_eq!(selection.ids(), ["0", "1"]);
        let request = transport.last_request().unwrap();
        assert_eq!(request.controller, "c_orm");
        assert_eq!(request.method, "get_with_filter");
        assert_eq!(request.get("db"), Some(&json!("dummy_db")));
        assert_eq!(request.get("module"), Some(&json!("shot_task")));
        assert_eq!(request.get("token"), Some(&json!("token-1")));
        assert_eq!(request.get("sign_array"), Some(&json!(["shot_task.id"])));
        assert_eq!(
            request.get("sign_filter_array"),
            Some(&json!([["shot_task.key", "=", "value"]]))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_empty_match() -> Result<()> {
        let (transport, module) = module();
        transport.push_data(json!(null));

        let selection = module.filter(Filter::new("key", "missing")).await?;
        assert!(selection.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_module_token_overrides_client() -> Result<()> {
        let (transport, module) = module();
        let module = module.with_token("Sayori");
        assert_eq!(module.token(), Some("Sayori"));

        module.join_module_list().await?;
        let request = transport.last_request().unwrap();
        assert_eq!(request.get("token"), Some(&json!("Sayori")));
        Ok(())
    }

    #[test]
    fn test_select_is_local() {
        let (transport, module) = module();
        let selection = module.select(["0"]);
        assert_eq!(selection, module.select(vec!["0".to_string()]));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pipelines() -> Result<()> {
        let (transport, module) = module();
        transport.push_data(json!([["p1", "comp", "shot"], ["p2", "light", "shot"]]));

        let pipelines = module.pipelines().await?;
        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[1].name, "light");
        let request = transport.last_request().unwrap();
        assert_eq!(request.get("field_array"), Some(&json!(["#id", "name", "module"])));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_module_setting() -> Result<()> {
        let (transport, module) = module();
        transport.push_data(json!("shot_task_setting"));

        assert_eq!(module.get("pipeline_id").await?, json!("shot_task_setting"));
        let request = transport.last_request().unwrap();
        assert_eq!(request.controller, "c_module");
        assert_eq!(request.method, "get_one_with_module");
        assert_eq!(request.get("field"), Some(&json!("pipeline_id")));
        assert_eq!(request.get("module"), Some(&json!("shot_task")));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_data_with_mypage() -> Result<()> {
        let (transport, module) = module();
        module
            .set_data_with_mypage(json!({"sort": ["shot_task.artist"]}))
            .await?;

        let request = transport.last_request().unwrap();
        assert_eq!(request.controller, "c_page");
        assert_eq!(request.method, "set_data_with_my_page");
        assert_eq!(
            request.get("show_data"),
            Some(&json!({"sort": ["shot_task.artist"]}))
        );
        assert_eq!(request.get("db"), Some(&json!("dummy_db")));
        Ok(())
    }

    #[tokio::test]
    async fn test_has_permission() -> Result<()> {
        let (transport, module) = module();
        transport.push_data(json!("Y"));
        assert!(module.has_permission("delete_task").await?);
        assert_eq!(
            transport.last_request().unwrap().get("permission_name"),
            Some(&json!("delete_task"))
        );
        Ok(())
    }
}
