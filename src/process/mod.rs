//! Table processes
//!
//! Every external operation (`search`, `download`, `component`, ...) is a
//! [`TableOperation`] served by an [`OperationHandler`]. The
//! [`ProcessRegistry`] maps operation names to handlers; it is filled once at
//! startup and only read afterwards.
//!
//! Handlers share a [`TableContext`] holding the loaded tables and the
//! external collaborators (process runtime, claims validator, settings
//! builder, download policy).

pub mod action;
pub mod component;
pub mod download;
pub mod rewrite;

pub use action::{ActionDispatcher, SettingHandler, XgenHandler};
pub use component::{ComponentHandler, UploadHandler};
pub use download::{DownloadGuard, DownloadPolicy, ext_name};
pub use rewrite::IdListRewriter;

use crate::core::auth::ClaimsValidator;
use crate::core::error::{ConfigError, ProcessLookupError, ProcessResult};
use crate::core::request::ProcessRequest;
use crate::core::runtime::ProcessRuntime;
use crate::table::{ActionKind, TableRegistry, XgenBuilder};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The operations exposed for tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperation {
    Setting,
    Xgen,
    Component,
    Upload,
    Download,
    Search,
    Get,
    Find,
    Save,
    Create,
    Insert,
    Update,
    UpdateWhere,
    UpdateIn,
    Delete,
    DeleteWhere,
    DeleteIn,
}

impl TableOperation {
    pub const ALL: [TableOperation; 17] = [
        TableOperation::Setting,
        TableOperation::Xgen,
        TableOperation::Component,
        TableOperation::Upload,
        TableOperation::Download,
        TableOperation::Search,
        TableOperation::Get,
        TableOperation::Find,
        TableOperation::Save,
        TableOperation::Create,
        TableOperation::Insert,
        TableOperation::Update,
        TableOperation::UpdateWhere,
        TableOperation::UpdateIn,
        TableOperation::Delete,
        TableOperation::DeleteWhere,
        TableOperation::DeleteIn,
    ];

    /// Operation name as registered (without namespace)
    pub fn as_str(&self) -> &'static str {
        match self {
            TableOperation::Setting => "setting",
            TableOperation::Xgen => "xgen",
            TableOperation::Component => "component",
            TableOperation::Upload => "upload",
            TableOperation::Download => "download",
            TableOperation::Search => "search",
            TableOperation::Get => "get",
            TableOperation::Find => "find",
            TableOperation::Save => "save",
            TableOperation::Create => "create",
            TableOperation::Insert => "insert",
            TableOperation::Update => "update",
            TableOperation::UpdateWhere => "updatewhere",
            TableOperation::UpdateIn => "updatein",
            TableOperation::Delete => "delete",
            TableOperation::DeleteWhere => "deletewhere",
            TableOperation::DeleteIn => "deletein",
        }
    }

    /// Action slot this operation forwards to, if any
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            TableOperation::Setting => Some(ActionKind::Setting),
            TableOperation::Search => Some(ActionKind::Search),
            TableOperation::Get => Some(ActionKind::Get),
            TableOperation::Find => Some(ActionKind::Find),
            TableOperation::Save => Some(ActionKind::Save),
            TableOperation::Create => Some(ActionKind::Create),
            TableOperation::Insert => Some(ActionKind::Insert),
            TableOperation::Update => Some(ActionKind::Update),
            TableOperation::UpdateWhere => Some(ActionKind::UpdateWhere),
            TableOperation::UpdateIn => Some(ActionKind::UpdateIn),
            TableOperation::Delete => Some(ActionKind::Delete),
            TableOperation::DeleteWhere => Some(ActionKind::DeleteWhere),
            TableOperation::DeleteIn => Some(ActionKind::DeleteIn),
            TableOperation::Download => Some(ActionKind::Download),
            TableOperation::Xgen | TableOperation::Component | TableOperation::Upload => None,
        }
    }

    /// The handler serving this operation
    pub fn handler(&self) -> Arc<dyn OperationHandler> {
        match self {
            TableOperation::Setting => Arc::new(SettingHandler),
            TableOperation::Xgen => Arc::new(XgenHandler),
            TableOperation::Component => Arc::new(ComponentHandler),
            TableOperation::Upload => Arc::new(UploadHandler),
            TableOperation::Download => Arc::new(DownloadGuard),
            TableOperation::UpdateIn => Arc::new(IdListRewriter::update_in()),
            TableOperation::DeleteIn => Arc::new(IdListRewriter::delete_in()),
            TableOperation::Search => Arc::new(ActionDispatcher::new(*self, ActionKind::Search)),
            TableOperation::Get => Arc::new(ActionDispatcher::new(*self, ActionKind::Get)),
            TableOperation::Find => Arc::new(ActionDispatcher::new(*self, ActionKind::Find)),
            TableOperation::Save => Arc::new(ActionDispatcher::new(*self, ActionKind::Save)),
            TableOperation::Create => Arc::new(ActionDispatcher::new(*self, ActionKind::Create)),
            TableOperation::Insert => Arc::new(ActionDispatcher::new(*self, ActionKind::Insert)),
            TableOperation::Update => Arc::new(ActionDispatcher::new(*self, ActionKind::Update)),
            TableOperation::UpdateWhere => {
                Arc::new(ActionDispatcher::new(*self, ActionKind::UpdateWhere))
            }
            TableOperation::Delete => Arc::new(ActionDispatcher::new(*self, ActionKind::Delete)),
            TableOperation::DeleteWhere => {
                Arc::new(ActionDispatcher::new(*self, ActionKind::DeleteWhere))
            }
        }
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared state available to every handler
pub struct TableContext {
    /// Loaded tables
    pub tables: Arc<TableRegistry>,

    /// Engine running actions, cloud properties and downloads
    pub runtime: Arc<dyn ProcessRuntime>,

    /// Bearer-token validator for downloads
    pub claims: Arc<dyn ClaimsValidator>,

    /// UI settings builder for `xgen`
    pub xgen: Arc<dyn XgenBuilder>,

    /// Download allow-list and default process
    pub download: DownloadPolicy,
}

/// Serves one table operation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value>;
}

/// Operation name → handler
#[derive(Default)]
pub struct ProcessRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl ProcessRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry holding every [`TableOperation`], optionally under `namespace`
    ///
    /// With namespace `widgets.table`, `search` is registered as
    /// `widgets.table.search`.
    pub fn with_table_operations(namespace: Option<&str>) -> Self {
        let mut registry = Self::new();
        for operation in TableOperation::ALL {
            let name = match namespace {
                Some(ns) => format!("{}.{}", ns, operation.as_str()),
                None => operation.as_str().to_string(),
            };
            registry.handlers.insert(name, operation.handler());
        }
        registry
    }

    /// Register a handler under `name`
    ///
    /// Names are unique; registering a name twice fails.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn OperationHandler>,
    ) -> ProcessResult<()> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(ConfigError::Duplicate {
                kind: "process".to_string(),
                name,
            }
            .into());
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Run the handler registered under `name`
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: &TableContext,
        request: ProcessRequest,
    ) -> ProcessResult<Value> {
        let handler = self.handlers.get(name).ok_or_else(|| ProcessLookupError {
            name: name.to_string(),
        })?;

        tracing::debug!(process = %name, args = request.args.len(), "dispatching table process");
        handler.handle(ctx, request).await
    }

    /// Get all registered names
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }
}
