//! Typed error handling for table processes
//!
//! Every failure surfaced by a table process is a [`ProcessError`]. The
//! category decides the HTTP status the caller sees:
//!
//! - [`ProcessError::Process`]: the operation name is not registered (404)
//! - [`TableError`]: the table identifier is unknown (404)
//! - [`ValidationError`]: wrong arity, malformed argument, unknown key (400)
//! - [`AuthError`]: disallowed extension, missing or invalid token (403)
//! - [`ExecutionError`]: failure inside an action, extension or download process (500)
//! - [`ConfigError`]: configuration could not be loaded (500)
//!
//! # Example
//!
//! ```rust,ignore
//! match host.dispatch("download", request).await {
//!     Ok(value) => println!("{value}"),
//!     Err(ProcessError::Auth(AuthError::ExtensionDenied { extension, .. })) => {
//!         println!(".{extension} files cannot be downloaded");
//!     }
//!     Err(e) => eprintln!("{} {}", e.status_code(), e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for table processes
#[derive(Debug)]
pub enum ProcessError {
    /// Operation name is not registered
    Process(ProcessLookupError),

    /// Table-resolution errors
    Table(TableError),

    /// Arity and argument errors
    Validation(ValidationError),

    /// Authorization errors
    Auth(AuthError),

    /// Failures inside an external collaborator
    Execution(ExecutionError),

    /// Configuration errors
    Config(ConfigError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Process(e) => write!(f, "{}", e),
            ProcessError::Table(e) => write!(f, "{}", e),
            ProcessError::Validation(e) => write!(f, "{}", e),
            ProcessError::Auth(e) => write!(f, "{}", e),
            ProcessError::Execution(e) => write!(f, "{}", e),
            ProcessError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Process(e) => Some(e),
            ProcessError::Table(e) => Some(e),
            ProcessError::Validation(e) => Some(e),
            ProcessError::Auth(e) => Some(e),
            ProcessError::Execution(e) => Some(e),
            ProcessError::Config(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ProcessError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProcessError::Process(_) => StatusCode::NOT_FOUND,
            ProcessError::Table(_) => StatusCode::NOT_FOUND,
            ProcessError::Validation(_) => StatusCode::BAD_REQUEST,
            ProcessError::Auth(_) => StatusCode::FORBIDDEN,
            ProcessError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProcessError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ProcessError::Process(_) => "PROCESS_NOT_FOUND",
            ProcessError::Table(_) => "TABLE_NOT_FOUND",
            ProcessError::Validation(e) => e.error_code(),
            ProcessError::Auth(e) => e.error_code(),
            ProcessError::Execution(_) => "EXECUTION_FAILED",
            ProcessError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Wrap a collaborator failure.
    ///
    /// A `ProcessError` carried inside the `anyhow::Error` is returned unchanged;
    /// anything else becomes an [`ExecutionError`] scoped to `table`.
    pub fn from_collaborator(table: &str, err: anyhow::Error) -> Self {
        match err.downcast::<ProcessError>() {
            Ok(process_err) => process_err,
            Err(other) => ProcessError::Execution(ExecutionError {
                table: table.to_string(),
                scope: None,
                message: other.to_string(),
            }),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ProcessError::Table(TableError::NotFound { table }) => {
                Some(serde_json::json!({ "table": table }))
            }
            ProcessError::Validation(ValidationError::ComponentNotFound { table, key }) => {
                Some(serde_json::json!({ "table": table, "key": key }))
            }
            ProcessError::Auth(AuthError::ExtensionDenied {
                table,
                field,
                extension,
            }) => Some(serde_json::json!({
                "table": table,
                "field": field,
                "extension": extension
            })),
            ProcessError::Auth(AuthError::NoPermission { table, field }) => {
                Some(serde_json::json!({ "table": table, "field": field }))
            }
            ProcessError::Execution(ExecutionError { table, scope, .. }) => {
                Some(serde_json::json!({ "table": table, "scope": scope }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Process lookup
// =============================================================================

/// The requested operation name has no registered handler
#[derive(Debug)]
pub struct ProcessLookupError {
    pub name: String,
}

impl fmt::Display for ProcessLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process '{}' not found", self.name)
    }
}

impl std::error::Error for ProcessLookupError {}

impl From<ProcessLookupError> for ProcessError {
    fn from(err: ProcessLookupError) -> Self {
        ProcessError::Process(err)
    }
}

// =============================================================================
// Table Errors
// =============================================================================

/// Errors related to table resolution
#[derive(Debug)]
pub enum TableError {
    /// No table with this identifier is loaded
    NotFound { table: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NotFound { table } => write!(f, "Table '{}' not found", table),
        }
    }
}

impl std::error::Error for TableError {}

impl From<TableError> for ProcessError {
    fn from(err: TableError) -> Self {
        ProcessError::Table(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to request arguments
#[derive(Debug)]
pub enum ValidationError {
    /// Fewer arguments than the operation requires
    ArgumentCount {
        process: String,
        expected: usize,
        got: usize,
    },

    /// An argument has the wrong shape
    InvalidArgument {
        process: String,
        position: usize,
        message: String,
    },

    /// No cloud property is registered under the key
    ComponentNotFound { table: String, key: String },

    /// The upload argument is not an uploaded file
    UploadParameters { table: String, value: String },

    /// A process reference could not be resolved
    ProcessReference {
        table: String,
        scope: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ArgumentCount {
                process,
                expected,
                got,
            } => {
                write!(
                    f,
                    "{} requires at least {} arguments, got {}",
                    process, expected, got
                )
            }
            ValidationError::InvalidArgument {
                process,
                position,
                message,
            } => {
                write!(f, "{} argument {}: {}", process, position, message)
            }
            ValidationError::ComponentNotFound { key, .. } => {
                write!(f, "{} does not exist", key)
            }
            ValidationError::UploadParameters { value, .. } => {
                write!(f, "parameters error: {}", value)
            }
            ValidationError::ProcessReference {
                table,
                scope,
                message,
            } => match scope {
                Some(scope) => write!(f, "[download] {}.{} {}", table, scope, message),
                None => write!(f, "{}: {}", table, message),
            },
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::ArgumentCount { .. } => "ARGUMENT_COUNT",
            ValidationError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ValidationError::ComponentNotFound { .. } => "COMPONENT_NOT_FOUND",
            ValidationError::UploadParameters { .. } => "PARAMETERS_ERROR",
            ValidationError::ProcessReference { .. } => "PROCESS_REFERENCE",
        }
    }
}

impl From<ValidationError> for ProcessError {
    fn from(err: ValidationError) -> Self {
        ProcessError::Validation(err)
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors related to download authorization
#[derive(Debug)]
pub enum AuthError {
    /// The file extension is not on the download allow-list
    ExtensionDenied {
        table: String,
        field: String,
        extension: String,
    },

    /// No bearer token was supplied
    NoPermission { table: String, field: String },

    /// The claims validator rejected the token
    InvalidToken { message: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ExtensionDenied {
                table,
                field,
                extension,
            } => write!(f, "{}.{} .{} file does not allow", table, field, extension),
            AuthError::NoPermission { table, field } => {
                write!(f, "{}.{} No permission", table, field)
            }
            AuthError::InvalidToken { message } => write!(f, "Invalid token: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ExtensionDenied { .. } => "EXTENSION_DENIED",
            AuthError::NoPermission { .. } => "NO_PERMISSION",
            AuthError::InvalidToken { .. } => "INVALID_TOKEN",
        }
    }
}

impl From<AuthError> for ProcessError {
    fn from(err: AuthError) -> Self {
        ProcessError::Auth(err)
    }
}

// =============================================================================
// Execution Errors
// =============================================================================

/// A collaborator (action engine, extension, download process) failed
#[derive(Debug)]
pub struct ExecutionError {
    pub table: String,
    /// Field or key the failure is scoped to
    pub scope: Option<String>,
    pub message: String,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "[download] {}.{} {}", self.table, scope, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<ExecutionError> for ProcessError {
    fn from(err: ExecutionError) -> Self {
        ProcessError::Execution(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Two entries claim the same name
    Duplicate { kind: String, name: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::Duplicate { kind, name } => {
                write!(f, "Duplicate {} '{}'", kind, name)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ProcessError {
    fn from(err: ConfigError) -> Self {
        ProcessError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for ProcessError {
    fn from(err: serde_yaml::Error) -> Self {
        ProcessError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for table processes
pub type ProcessResult<T> = Result<T, ProcessError>;

// =============================================================================
// Tests
// =============================================================================
