//! Response construction.
//!
//! # Responsibilities
//! - Map not-found results and invocation errors to HTTP statuses
//! - Describe a resolved destination for the introspection method
//!
//! # Design Decisions
//! - Not found → 404, argument mismatch → 400, handler failure → 500
//! - Error bodies are JSON so clients can tell the failure kinds apart

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::error::{InvocationError, NotFound};
use crate::routing::{Destination, Router};

/// Methods advertised on introspection responses.
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS";

pub fn ok(value: Value) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

pub fn not_found(not_found: &NotFound) -> Response {
    let body = json!({
        "error": not_found.to_string(),
        "kind": not_found.kind,
        "reason": not_found.reason,
        "path": not_found.path,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

pub fn invocation_error(err: &InvocationError) -> Response {
    let status = match err {
        InvocationError::BadRequest(_) => StatusCode::BAD_REQUEST,
        InvocationError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// Describe `destination` instead of invoking it.
pub fn introspection(router: &Router, destination: &Destination, format: Option<&str>) -> Response {
    let operation = destination.operation();
    let body = json!({
        "operation": operation.name(),
        "path": router.path_to(destination.operation_id()).ok(),
        "uri": router.uri_for(destination.operation_id()).ok(),
        "template": router.template_path_for(destination.operation_id()).ok(),
        "signature": operation.signature(),
        "format": format,
    });
    let mut response = ok(body);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}
