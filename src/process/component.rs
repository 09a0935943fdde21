//! Cloud property operations: `component` and `upload`
//!
//! Both resolve `xpath.$method` against the table's cloud properties. The
//! lookup is exact; `a.b.$save` never matches a property registered as
//! `a.b.$Save`.

use super::{OperationHandler, TableContext, TableOperation};
use crate::core::error::{ProcessResult, ValidationError};
use crate::core::request::{ComponentRequest, ProcessRequest, UploadRequest};
use crate::table::{CloudProperty, TableDefinition};
use async_trait::async_trait;
use serde_json::Value;

fn cloud_property<'a>(table: &'a TableDefinition, key: String) -> ProcessResult<&'a CloudProperty> {
    match table.cloud_property(&key) {
        Some(prop) => Ok(prop),
        None => Err(ValidationError::ComponentNotFound {
            table: table.id.clone(),
            key,
        }
        .into()),
    }
}

/// `component`: run a cloud property as a query
pub struct ComponentHandler;

#[async_trait]
impl OperationHandler for ComponentHandler {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let parsed = ComponentRequest::parse(TableOperation::Component.as_str(), &request)?;
        let table = ctx.tables.get(&parsed.table)?;
        let prop = cloud_property(&table, parsed.key())?;

        prop.exec_query(ctx.runtime.as_ref(), &request, parsed.query)
            .await
            .map_err(|e| table.execution_error(e))
    }
}

/// `upload`: run a cloud property with an uploaded file
pub struct UploadHandler;

#[async_trait]
impl OperationHandler for UploadHandler {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let parsed = UploadRequest::parse(TableOperation::Upload.as_str(), &request)?;
        let table = ctx.tables.get(&parsed.table)?;
        let prop = cloud_property(&table, parsed.key())?;
        let file = parsed.upload_file()?.clone();

        prop.exec_upload(ctx.runtime.as_ref(), &request, file)
            .await
            .map_err(|e| table.execution_error(e))
    }
}
