//! Core types shared by every table operation

pub mod auth;
pub mod error;
pub mod query;
pub mod request;
pub mod runtime;

pub use auth::{AuthClaims, ClaimsValidator, StaticClaimsValidator, bearer_token};
pub use error::{
    AuthError, ConfigError, ErrorResponse, ExecutionError, ProcessError, ProcessLookupError,
    ProcessResult, TableError, ValidationError,
};
pub use query::{QueryParam, QueryWhere};
pub use request::{
    Arg, ComponentRequest, DownloadRequest, IdListRequest, ProcessRequest, UploadFile,
    UploadRequest, cloud_key,
};
pub use runtime::{Process, ProcessRuntime, ProcessTable};
