//! # table-process
//!
//! Dispatch and authorization layer for table processes.
//!
//! A table is configured once (layout, primary key, actions, cloud
//! properties) and then driven through named operations such as `search`,
//! `deletein`, `component` or `download`. Each operation resolves the table
//! from argument 0, applies its own argument handling and forwards to a
//! process run by an external [`ProcessRuntime`](crate::core::ProcessRuntime).
//!
//! ## Features
//!
//! - **Pass-through CRUD**: `search`, `find`, `save`, ... forward the request unchanged
//! - **Identifier lists**: `updatein` / `deletein` turn `"1,2,3"` into `primary IN (...)`
//! - **Cloud properties**: `component` / `upload` resolve `xpath.$method` extension points
//! - **Guarded downloads**: extension allow-list, then bearer-token validation
//! - **Typed errors**: every failure maps to a 400, 403, 404 or 500 response
//! - **Configuration-Based**: tables and download policy come from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use table_process::prelude::*;
//!
//! let runtime = ProcessTable::new()
//!     .with_fn("models.pet.Paginate", |req| Ok(json!({"data": [], "args": req.args.len()})));
//!
//! ServerBuilder::new()
//!     .with_config_file("tables.yaml")?
//!     .with_runtime(runtime)
//!     .with_claims_validator(StaticClaimsValidator::new().with_token("t", AuthClaims::new("sid")))
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod process;
pub mod server;
pub mod table;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthClaims, ClaimsValidator, StaticClaimsValidator, bearer_token},
        error::{
            AuthError, ConfigError, ErrorResponse, ExecutionError, ProcessError,
            ProcessLookupError, ProcessResult, TableError, ValidationError,
        },
        query::{QueryParam, QueryWhere},
        request::{Arg, ProcessRequest, UploadFile},
        runtime::{Process, ProcessRuntime, ProcessTable},
    };

    // === Tables ===
    pub use crate::table::{
        Action, ActionKind, ActionSet, CloudProperty, Layout, LayoutXgen, TableDefinition,
        TableRegistry, XgenBuilder,
    };

    // === Processes ===
    pub use crate::process::{
        DownloadPolicy, OperationHandler, ProcessRegistry, TableContext, TableOperation,
    };

    // === Config ===
    pub use crate::config::{DownloadConfig, TableConfig, TablesConfig};

    // === Server ===
    pub use crate::server::{ProcessHost, RestExposure, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
