//! Table definitions
//!
//! A [`TableDefinition`] is built once from configuration and then shared
//! read-only (behind an `Arc`) by every request that names it.

pub mod registry;

pub use registry::TableRegistry;

use crate::config::TableConfig;
use crate::core::error::{ExecutionError, ProcessError, ProcessResult, ValidationError};
use crate::core::request::{Arg, ProcessRequest, UploadFile, cloud_key};
use crate::core::runtime::ProcessRuntime;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;

/// Table layout
///
/// Only `primary` is interpreted here; the rest is UI layout kept verbatim
/// for the settings builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Primary key column
    pub primary: String,

    #[serde(flatten)]
    pub ui: Map<String, Value>,
}

/// The named action slots of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Setting,
    Search,
    Get,
    Save,
    Create,
    Find,
    Insert,
    Update,
    UpdateWhere,
    UpdateIn,
    Delete,
    DeleteWhere,
    DeleteIn,
    Download,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Setting => "setting",
            ActionKind::Search => "search",
            ActionKind::Get => "get",
            ActionKind::Save => "save",
            ActionKind::Create => "create",
            ActionKind::Find => "find",
            ActionKind::Insert => "insert",
            ActionKind::Update => "update",
            ActionKind::UpdateWhere => "update_where",
            ActionKind::UpdateIn => "update_in",
            ActionKind::Delete => "delete",
            ActionKind::DeleteWhere => "delete_where",
            ActionKind::DeleteIn => "delete_in",
            ActionKind::Download => "download",
        }
    }

    /// Model process backing this action when the table binds a model
    fn model_method(&self) -> Option<&'static str> {
        match self {
            ActionKind::Search => Some("Paginate"),
            ActionKind::Get => Some("Get"),
            ActionKind::Save => Some("Save"),
            ActionKind::Create => Some("Create"),
            ActionKind::Find => Some("Find"),
            ActionKind::Insert => Some("Insert"),
            ActionKind::Update => Some("Update"),
            ActionKind::UpdateWhere | ActionKind::UpdateIn => Some("UpdateWhere"),
            ActionKind::Delete => Some("Delete"),
            ActionKind::DeleteWhere | ActionKind::DeleteIn => Some("DeleteWhere"),
            ActionKind::Setting | ActionKind::Download => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One action handler: the process that implements it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub process: Option<String>,
}

impl Action {
    pub fn process(name: impl Into<String>) -> Self {
        Self {
            process: Some(name.into()),
        }
    }

    /// Run the action's process with `request`
    ///
    /// A missing or unresolvable process is a 400. Errors raised by the
    /// process propagate unchanged when they are already a `ProcessError`.
    pub async fn exec(
        &self,
        kind: ActionKind,
        table: &str,
        runtime: &dyn ProcessRuntime,
        request: ProcessRequest,
    ) -> ProcessResult<Value> {
        let name = self.process.as_deref().ok_or_else(|| {
            ProcessError::from(ValidationError::ProcessReference {
                table: table.to_string(),
                scope: None,
                message: format!("{} action has no process", kind),
            })
        })?;

        let process = runtime.process_of(name).map_err(|e| {
            ProcessError::from(ValidationError::ProcessReference {
                table: table.to_string(),
                scope: None,
                message: e.to_string(),
            })
        })?;

        process
            .exec(request)
            .await
            .map_err(|e| ProcessError::from_collaborator(table, e))
    }
}

/// All action handlers of a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSet {
    pub setting: Action,
    pub search: Action,
    pub get: Action,
    pub save: Action,
    pub create: Action,
    pub find: Action,
    pub insert: Action,
    pub update: Action,
    pub update_where: Action,
    pub update_in: Action,
    pub delete: Action,
    pub delete_where: Action,
    pub delete_in: Action,
    pub download: Action,
}

impl ActionSet {
    pub fn get(&self, kind: ActionKind) -> &Action {
        match kind {
            ActionKind::Setting => &self.setting,
            ActionKind::Search => &self.search,
            ActionKind::Get => &self.get,
            ActionKind::Save => &self.save,
            ActionKind::Create => &self.create,
            ActionKind::Find => &self.find,
            ActionKind::Insert => &self.insert,
            ActionKind::Update => &self.update,
            ActionKind::UpdateWhere => &self.update_where,
            ActionKind::UpdateIn => &self.update_in,
            ActionKind::Delete => &self.delete,
            ActionKind::DeleteWhere => &self.delete_where,
            ActionKind::DeleteIn => &self.delete_in,
            ActionKind::Download => &self.download,
        }
    }

    fn get_mut(&mut self, kind: ActionKind) -> &mut Action {
        match kind {
            ActionKind::Setting => &mut self.setting,
            ActionKind::Search => &mut self.search,
            ActionKind::Get => &mut self.get,
            ActionKind::Save => &mut self.save,
            ActionKind::Create => &mut self.create,
            ActionKind::Find => &mut self.find,
            ActionKind::Insert => &mut self.insert,
            ActionKind::Update => &mut self.update,
            ActionKind::UpdateWhere => &mut self.update_where,
            ActionKind::UpdateIn => &mut self.update_in,
            ActionKind::Delete => &mut self.delete,
            ActionKind::DeleteWhere => &mut self.delete_where,
            ActionKind::DeleteIn => &mut self.delete_in,
            ActionKind::Download => &mut self.download,
        }
    }

    /// Fill every CRUD slot without a process with `models.<model>.<Method>`
    pub fn bind_model(&mut self, model: &str) {
        for kind in [
            ActionKind::Search,
            ActionKind::Get,
            ActionKind::Save,
            ActionKind::Create,
            ActionKind::Find,
            ActionKind::Insert,
            ActionKind::Update,
            ActionKind::UpdateWhere,
            ActionKind::UpdateIn,
            ActionKind::Delete,
            ActionKind::DeleteWhere,
            ActionKind::DeleteIn,
        ] {
            let Some(method) = kind.model_method() else {
                continue;
            };
            let action = self.get_mut(kind);
            if action.process.is_none() {
                action.process = Some(format!("models.{}.{}", model, method));
            }
        }
    }
}

/// An extension point bound to a UI path and a method name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudProperty {
    #[serde(default)]
    pub name: Option<String>,

    /// Component type (e.g. `Select`, `Upload`)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    pub xpath: String,

    pub method: String,

    /// Process executed for this property
    pub process: String,
}

impl CloudProperty {
    /// `xpath.$method`
    pub fn key(&self) -> String {
        cloud_key(&self.xpath, &self.method)
    }

    /// Execute as a query. The process receives `[query]`.
    pub async fn exec_query(
        &self,
        runtime: &dyn ProcessRuntime,
        request: &ProcessRequest,
        query: Map<String, Value>,
    ) -> anyhow::Result<Value> {
        let process = runtime.process_of(&self.process)?;
        process
            .exec(request.derive(vec![Arg::Value(Value::Object(query))]))
            .await
    }

    /// Execute as an upload. The process receives `[file]`.
    pub async fn exec_upload(
        &self,
        runtime: &dyn ProcessRuntime,
        request: &ProcessRequest,
        file: UploadFile,
    ) -> anyhow::Result<Value> {
        let process = runtime.process_of(&self.process)?;
        process.exec(request.derive(vec![Arg::File(file)])).await
    }
}

/// A loaded table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub id: String,
    pub name: String,
    pub layout: Layout,
    pub action: ActionSet,
    /// Cloud properties keyed by `xpath.$method`
    pub cprops: HashMap<String, CloudProperty>,
}

impl TableDefinition {
    pub fn from_config(config: TableConfig) -> Self {
        let mut action = config.action;
        if let Some(model) = &config.bind {
            action.bind_model(model);
        }

        let cprops = config
            .cloud_props
            .into_iter()
            .map(|prop| (prop.key(), prop))
            .collect();

        Self {
            name: config.name.unwrap_or_else(|| config.id.clone()),
            id: config.id,
            layout: config.layout,
            action,
            cprops,
        }
    }

    /// Primary key column
    pub fn primary(&self) -> &str {
        &self.layout.primary
    }

    /// Exact, case-sensitive lookup
    pub fn cloud_property(&self, key: &str) -> Option<&CloudProperty> {
        self.cprops.get(key)
    }

    /// Wrap an extension failure as a 500 carrying its message
    pub(crate) fn execution_error(&self, err: anyhow::Error) -> ProcessError {
        ExecutionError {
            table: self.id.clone(),
            scope: None,
            message: err.to_string(),
        }
        .into()
    }
}

/// Builds the UI settings of a table
#[async_trait]
pub trait XgenBuilder: Send + Sync {
    async fn xgen(&self, table: &TableDefinition) -> anyhow::Result<Value>;
}

/// Settings straight from the configured layout
pub struct LayoutXgen;

#[async_trait]
impl XgenBuilder for LayoutXgen {
    async fn xgen(&self, table: &TableDefinition) -> anyhow::Result<Value> {
        Ok(json!({
            "name": table.name,
            "primary": table.layout.primary,
            "layout": table.layout.ui,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ExecutionError;
    use crate::core::runtime::ProcessTable;

    fn config(yaml: &str) -> TableConfig {
        serde_yaml::from_str(yaml).expect("valid table config")
    }

    #[test]
    fn test_bind_model_fills_missing_actions() {
        let table = TableDefinition::from_config(config(
            r#"
id: pet
bind: pet
layout: { primary: id }
action:
  search: { process: scripts.pet.Search }
"#,
        ));
        assert_eq!(
            table.action.search.process.as_deref(),
            Some("scripts.pet.Search")
        );
        assert_eq!(table.action.get.process.as_deref(), Some("models.pet.Get"));
        assert_eq!(
            table.action.delete_in.process.as_deref(),
            Some("models.pet.DeleteWhere")
        );
        assert!(table.action.setting.process.is_none());
        assert!(table.action.download.process.is_none());
    }

    #[test]
    fn test_cprops_keyed_by_xpath_and_method() {
        let table = TableDefinition::from_config(config(
            r#"
id: pet
layout: { primary: id }
cloud_props:
  - { xpath: a.b, method: Save, process: p.save }
"#,
        ));
        assert!(table.cloud_property("a.b.$Save").is_some());
        assert!(table.cloud_property("a.b.$save").is_none());
    }

    #[test]
    fn test_name_defaults_to_id() {
        let table = TableDefinition::from_config(config("id: pet\nlayout: { primary: id }"));
        assert_eq!(table.name, "pet");
        assert_eq!(table.primary(), "id");
    }

    #[tokio::test]
    async fn test_action_without_process_is_400() {
        let runtime = ProcessTable::new();
        let err = Action::default()
            .exec(ActionKind::Find, "pet", &runtime, ProcessRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_action_error_propagates_as_is() {
        let runtime = ProcessTable::new().with_fn("models.pet.Find", |_| {
            Err(anyhow::Error::new(ProcessError::from(ExecutionError {
                table: "pet".to_string(),
                scope: None,
                message: "record not found".to_string(),
            })))
        });
        let err = Action::process("models.pet.Find")
            .exec(ActionKind::Find, "pet", &runtime, ProcessRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "record not found");
    }

    #[tokio::test]
    async fn test_layout_xgen() {
        let table = TableDefinition::from_config(config(
            "id: pet\nname: Pets\nlayout: { primary: id, table: { rows: 10 } }",
        ));
        let setting = LayoutXgen.xgen(&table).await.expect("xgen succeeds");
        assert_eq!(setting["name"], "Pets");
        assert_eq!(setting["layout"]["table"]["rows"], 10);
    }
}
