//! Pass-through operations: CRUD actions, `setting` and `xgen`

use super::{OperationHandler, TableContext, TableOperation};
use crate::core::error::{ExecutionError, ProcessError, ProcessResult};
use crate::core::request::ProcessRequest;
use crate::table::ActionKind;
use async_trait::async_trait;
use serde_json::Value;

/// Forwards the request verbatim to the table's action of the same name
pub struct ActionDispatcher {
    operation: TableOperation,
    kind: ActionKind,
}

impl ActionDispatcher {
    pub fn new(operation: TableOperation, kind: ActionKind) -> Self {
        Self { operation, kind }
    }
}

#[async_trait]
impl OperationHandler for ActionDispatcher {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let table = ctx.tables.resolve(self.operation.as_str(), &request)?;
        table
            .action
            .get(self.kind)
            .exec(self.kind, &table.id, ctx.runtime.as_ref(), request)
            .await
    }
}

/// `setting`: appends the table id once more before forwarding
///
/// The settings process expects the table name both at position 0 and as
/// the trailing argument.
pub struct SettingHandler;

#[async_trait]
impl OperationHandler for SettingHandler {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let operation = TableOperation::Setting.as_str();
        let table = ctx.tables.resolve(operation, &request)?;

        let mut request = request;
        let table_arg = request.args[0].clone();
        request.args.push(table_arg);

        table
            .action
            .setting
            .exec(ActionKind::Setting, &table.id, ctx.runtime.as_ref(), request)
            .await
    }
}

/// `xgen`: UI settings from the settings builder
pub struct XgenHandler;

#[async_trait]
impl OperationHandler for XgenHandler {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let table = ctx
            .tables
            .resolve(TableOperation::Xgen.as_str(), &request)?;
        ctx.xgen.xgen(&table).await.map_err(|e| {
            ProcessError::from(ExecutionError {
                table: table.id.clone(),
                scope: None,
                message: e.to_string(),
            })
        })
    }
}
