//! Routes for calling table processes over HTTP
//!
//! - `GET /processes` lists registered process names
//! - `POST /processes/{name}` runs one process

use super::host::ProcessHost;
use crate::core::request::{Arg, ProcessRequest};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the id assigned to each call
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSON body of `POST /processes/{name}`
#[derive(Debug, Default, Deserialize)]
pub struct ProcessCall {
    #[serde(default)]
    pub args: Vec<Value>,

    #[serde(default)]
    pub global: Map<String, Value>,

    #[serde(default)]
    pub sid: Option<String>,
}

impl From<ProcessCall> for ProcessRequest {
    fn from(call: ProcessCall) -> Self {
        ProcessRequest {
            args: call.args.into_iter().map(Arg::Value).collect(),
            global: call.global,
            sid: call.sid,
        }
    }
}

pub fn build_process_routes(host: Arc<ProcessHost>) -> Router {
    Router::new()
        .route("/processes", get(list_processes))
        .route("/processes/{name}", post(run_process))
        .with_state(host)
}

async fn list_processes(State(host): State<Arc<ProcessHost>>) -> Json<Value> {
    Json(json!({
        "processes": host.process_names(),
        "tables": host.table_ids(),
    }))
}

async fn run_process(
    State(host): State<Arc<ProcessHost>>,
    Path(name): Path<String>,
    Json(call): Json<ProcessCall>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("process", request_id = %request_id, process = %name);

    let result = host
        .dispatch(&name, ProcessRequest::from(call))
        .instrument(span)
        .await;

    let mut response = match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                process = %name,
                code = err.error_code(),
                "{}",
                err
            );
            err.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
