//! Process requests and their arguments
//!
//! A [`ProcessRequest`] is what every table operation receives: an ordered list
//! of [`Arg`]s plus the caller's global context and session id. Argument 0 is
//! always the table identifier. Operations with a fixed positional contract
//! parse the request once into a typed struct ([`ComponentRequest`],
//! [`UploadRequest`], [`DownloadRequest`], [`IdListRequest`]) and work with
//! named fields from then on.

use crate::core::error::{ProcessResult, ValidationError};
use crate::core::query::QueryParam;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A file received through a multipart upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadFile {
    /// Original file name as sent by the client
    pub name: String,

    /// Location of the temporary copy on disk
    pub temp_file: String,

    /// Size in bytes
    pub size: u64,

    /// MIME part headers
    #[serde(default)]
    pub header: HashMap<String, Vec<String>>,
}

/// One positional argument of a process request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    /// Plain JSON value
    Value(Value),

    /// Typed upload
    File(UploadFile),

    /// Structured query (produced by identifier-list rewriting)
    Query(QueryParam),
}

impl Arg {
    /// Borrow as a string if this is a JSON string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Borrow as an uploaded file
    pub fn as_file(&self) -> Option<&UploadFile> {
        match self {
            Arg::File(file) => Some(file),
            _ => None,
        }
    }

    /// JSON rendering of the argument
    pub fn to_json(&self) -> Value {
        match self {
            Arg::Value(v) => v.clone(),
            Arg::File(file) => serde_json::to_value(file).unwrap_or(Value::Null),
            Arg::Query(query) => serde_json::to_value(query).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(Value::String(s)) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(Value::String(value))
    }
}

impl From<UploadFile> for Arg {
    fn from(file: UploadFile) -> Self {
        Arg::File(file)
    }
}

impl From<QueryParam> for Arg {
    fn from(query: QueryParam) -> Self {
        Arg::Query(query)
    }
}

/// An inbound request: positional arguments plus caller context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRequest {
    /// Positional arguments; index 0 is the table identifier
    pub args: Vec<Arg>,

    /// Global context shared with every process the request triggers
    pub global: Map<String, Value>,

    /// Session id of the caller, if known
    pub sid: Option<String>,
}

impl ProcessRequest {
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            args,
            global: Map::new(),
            sid: None,
        }
    }

    pub fn with_global(mut self, global: Map<String, Value>) -> Self {
        self.global = global;
        self
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// A request for a downstream process that inherits this request's
    /// global context and session
    pub fn derive(&self, args: Vec<Arg>) -> Self {
        Self {
            args,
            global: self.global.clone(),
            sid: self.sid.clone(),
        }
    }

    /// Fail unless at least `n` arguments are present
    pub fn validate_arg_nums(&self, process: &str, n: usize) -> ProcessResult<()> {
        if self.args.len() < n {
            return Err(ValidationError::ArgumentCount {
                process: process.to_string(),
                expected: n,
                got: self.args.len(),
            }
            .into());
        }
        Ok(())
    }

    /// String argument at `position`
    pub fn arg_string(&self, process: &str, position: usize) -> ProcessResult<&str> {
        self.validate_arg_nums(process, position + 1)?;
        self.args[position].as_str().ok_or_else(|| {
            ValidationError::InvalidArgument {
                process: process.to_string(),
                position,
                message: format!("expected a string, got {}", self.args[position]),
            }
            .into()
        })
    }

    /// The table identifier (argument 0)
    pub fn table_id(&self, process: &str) -> ProcessResult<&str> {
        self.arg_string(process, 0)
    }
}

/// `component`: `[table, xpath, method, query?]`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRequest {
    pub table: String,
    pub xpath: String,
    pub method: String,
    pub query: Map<String, Value>,
}

impl ComponentRequest {
    pub fn parse(process: &str, request: &ProcessRequest) -> ProcessResult<Self> {
        request.validate_arg_nums(process, 3)?;
        let query = match request.args.get(3) {
            None | Some(Arg::Value(Value::Null)) => Map::new(),
            Some(Arg::Value(Value::Object(map))) => map.clone(),
            Some(other) => {
                return Err(ValidationError::InvalidArgument {
                    process: process.to_string(),
                    position: 3,
                    message: format!("expected a query object, got {}", other),
                }
                .into());
            }
        };

        Ok(Self {
            table: request.arg_string(process, 0)?.to_string(),
            xpath: request.arg_string(process, 1)?.to_string(),
            method: request.arg_string(process, 2)?.to_string(),
            query,
        })
    }

    /// Cloud property key, `xpath.$method`
    pub fn key(&self) -> String {
        cloud_key(&self.xpath, &self.method)
    }
}

/// `upload`: `[table, xpath, method, file]`
///
/// `file` stays untyped until the cloud property has been resolved; see
/// [`UploadRequest::upload_file`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub table: String,
    pub xpath: String,
    pub method: String,
    pub file: Arg,
}

impl UploadRequest {
    pub fn parse(process: &str, request: &ProcessRequest) -> ProcessResult<Self> {
        request.validate_arg_nums(process, 4)?;
        Ok(Self {
            table: request.arg_string(process, 0)?.to_string(),
            xpath: request.arg_string(process, 1)?.to_string(),
            method: request.arg_string(process, 2)?.to_string(),
            file: request.args[3].clone(),
        })
    }

    pub fn key(&self) -> String {
        cloud_key(&self.xpath, &self.method)
    }

    /// The uploaded file, or a "parameters error" naming the offending value
    pub fn upload_file(&self) -> ProcessResult<&UploadFile> {
        self.file.as_file().ok_or_else(|| {
            ValidationError::UploadParameters {
                table: self.table.clone(),
                value: self.file.to_string(),
            }
            .into()
        })
    }
}

/// `download`: `[table, field, file, token]`
///
/// A token that is not a string (usually `null` when no header was sent)
/// reads as empty, so it fails the token gate rather than parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub table: String,
    pub field: String,
    pub file: String,
    pub token: String,
}

impl DownloadRequest {
    pub fn parse(process: &str, request: &ProcessRequest) -> ProcessResult<Self> {
        request.validate_arg_nums(process, 4)?;
        Ok(Self {
            table: request.arg_string(process, 0)?.to_string(),
            field: request.arg_string(process, 1)?.to_string(),
            file: request.arg_string(process, 2)?.to_string(),
            token: request.args[3].as_str().unwrap_or_default().to_string(),
        })
    }
}

/// `updatein` / `deletein`: `[table, ids, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct IdListRequest {
    pub table: String,
    /// Comma-separated identifiers, unparsed
    pub ids: String,
}

impl IdListRequest {
    pub fn parse(process: &str, request: &ProcessRequest, arity: usize) -> ProcessResult<Self> {
        request.validate_arg_nums(process, arity)?;
        Ok(Self {
            table: request.arg_string(process, 0)?.to_string(),
            ids: request.arg_string(process, 1)?.to_string(),
        })
    }
}

/// Composite cloud property key. Exact and case-sensitive.
pub fn cloud_key(xpath: &str, method: &str) -> String {
    format!("{}.${}", xpath, method)
}
