//! REST exposure
//!
//! Consumes a `ProcessHost` and produces an Axum `Router`. The host stays
//! transport-agnostic; everything HTTP-specific lives here and in
//! [`router`](crate::server::router).

use super::super::host::ProcessHost;
use crate::server::router::build_process_routes;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// The router holds health routes, the process routes and any custom
    /// routes, wrapped in request tracing. `cors` adds a permissive CORS
    /// layer.
    pub fn build_router(host: Arc<ProcessHost>, custom_routes: Vec<Router>, cors: bool) -> Router {
        let mut app = Self::health_routes().merge(build_process_routes(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        if cors {
            app = app.layer(CorsLayer::permissive());
        }

        app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "table-process"
        }))
    }
}
