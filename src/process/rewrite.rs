//! `updatein` / `deletein`: identifier lists rewritten to `primary IN (...)`

use super::{OperationHandler, TableContext, TableOperation};
use crate::core::error::ProcessResult;
use crate::core::query::QueryParam;
use crate::core::request::{Arg, IdListRequest, ProcessRequest};
use crate::table::ActionKind;
use async_trait::async_trait;
use serde_json::Value;

/// Replaces argument 1 (`"1,2,3"`) with a [`QueryParam`] holding a single
/// `primary in ["1","2","3"]` condition, then forwards to the action.
pub struct IdListRewriter {
    operation: TableOperation,
    kind: ActionKind,
    arity: usize,
}

impl IdListRewriter {
    /// `[table, ids, payload]`
    pub fn update_in() -> Self {
        Self {
            operation: TableOperation::UpdateIn,
            kind: ActionKind::UpdateIn,
            arity: 3,
        }
    }

    /// `[table, ids]`
    pub fn delete_in() -> Self {
        Self {
            operation: TableOperation::DeleteIn,
            kind: ActionKind::DeleteIn,
            arity: 2,
        }
    }
}

#[async_trait]
impl OperationHandler for IdListRewriter {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let operation = self.operation.as_str();
        let parsed = IdListRequest::parse(operation, &request, self.arity)?;
        let table = ctx.tables.get(&parsed.table)?;

        let mut request = request;
        request.args[1] = Arg::Query(QueryParam::primary_in(table.primary(), &parsed.ids));

        table
            .action
            .get(self.kind)
            .exec(self.kind, &table.id, ctx.runtime.as_ref(), request)
            .await
    }
}
