//! Process host for transport-agnostic exposure
//!
//! `ProcessHost` owns the loaded tables, the collaborators and the process
//! registry. Exposures (REST today) hold it behind an `Arc` and call
//! [`ProcessHost::dispatch`]; nothing in the host knows about HTTP.

use crate::core::error::ProcessResult;
use crate::core::request::ProcessRequest;
use crate::process::{ProcessRegistry, TableContext};
use serde_json::Value;

/// Host context containing everything needed to run table processes
///
/// Built once by [`ServerBuilder`](super::ServerBuilder) and read-only
/// afterwards, so it can be shared freely between request tasks.
pub struct ProcessHost {
    /// Tables and collaborators shared by every handler
    pub context: TableContext,

    /// Operation name → handler
    pub registry: ProcessRegistry,
}

impl ProcessHost {
    pub fn new(context: TableContext, registry: ProcessRegistry) -> Self {
        Self { context, registry }
    }

    /// Run the process registered under `name`
    pub async fn dispatch(&self, name: &str, request: ProcessRequest) -> ProcessResult<Value> {
        self.registry.dispatch(name, &self.context, request).await
    }

    /// Registered process names, sorted
    pub fn process_names(&self) -> Vec<&str> {
        let mut names = self.registry.names();
        names.sort_unstable();
        names
    }

    /// Loaded table ids, sorted
    pub fn table_ids(&self) -> Vec<&str> {
        let mut ids = self.context.tables.table_ids();
        ids.sort_unstable();
        ids
    }
}
