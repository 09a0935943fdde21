//! `download`: extension allow-list and bearer-token gate in front of the
//! download process
//!
//! The gates run in a fixed order and each one is terminal:
//! extension check, token extraction, token validation, process resolution,
//! execution. The extension check runs before anything looks at the token.

use super::{OperationHandler, TableContext, TableOperation};
use crate::config::DownloadConfig;
use crate::core::auth::bearer_token;
use crate::core::error::{
    AuthError, ExecutionError, ProcessError, ProcessResult, ValidationError,
};
use crate::core::request::{Arg, DownloadRequest, ProcessRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

/// Which files may be downloaded and which process serves them by default
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    allowed_extensions: HashSet<String>,
    default_process: String,
}

impl DownloadPolicy {
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.iter().cloned().collect(),
            default_process: config.default_process.clone(),
        }
    }

    /// Exact, case-sensitive match
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }

    pub fn default_process(&self) -> &str {
        &self.default_process
    }
}

/// Extension of `path`: the text after the last `.` of the final segment
///
/// `"a/b.tar.gz"` gives `"gz"`, `"README"` gives `""`.
pub fn ext_name(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rfind('.') {
        Some(idx) => &file[idx + 1..],
        None => "",
    }
}

/// Serves `download`
pub struct DownloadGuard;

#[async_trait]
impl OperationHandler for DownloadGuard {
    async fn handle(&self, ctx: &TableContext, request: ProcessRequest) -> ProcessResult<Value> {
        let parsed = DownloadRequest::parse(TableOperation::Download.as_str(), &request)?;
        let table = ctx.tables.get(&parsed.table)?;

        let extension = ext_name(&parsed.file);
        if !ctx.download.allows(extension) {
            return Err(AuthError::ExtensionDenied {
                table: table.id.clone(),
                field: parsed.field,
                extension: extension.to_string(),
            }
            .into());
        }

        let Some(token) = bearer_token(&parsed.token) else {
            return Err(AuthError::NoPermission {
                table: table.id.clone(),
                field: parsed.field,
            }
            .into());
        };
        let claims = ctx.claims.validate(token).await?;

        let name = table
            .action
            .download
            .process
            .as_deref()
            .unwrap_or_else(|| ctx.download.default_process());

        let process = ctx.runtime.process_of(name).map_err(|e| {
            tracing::error!("[download] {}.{} {}", table.id, parsed.field, e);
            ValidationError::ProcessReference {
                table: table.id.clone(),
                scope: Some(parsed.field.clone()),
                message: e.to_string(),
            }
        })?;

        let call = ProcessRequest {
            args: vec![Arg::from(parsed.file.as_str())],
            global: request.global,
            sid: Some(claims.sid),
        };

        process.exec(call).await.map_err(|e| {
            tracing::error!("[download] {}.{} {}", table.id, parsed.field, e);
            ProcessError::from(ExecutionError {
                table: table.id.clone(),
                scope: Some(parsed.field.clone()),
                message: e.to_string(),
            })
        })
    }
}
