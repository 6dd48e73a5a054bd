//! Runtime middleware, e.g. panic handling.

use axum::body::{Bytes, Full};
use http::{header, Response, StatusCode};
use serde_json::json;
use std::any::Any;

/// Convert a panic caught by [tower_http::catch_panic::CatchPanicLayer]
/// into a JSONAPI-formatted 500 response.
pub fn catch_panic(err: Box<dyn Any + Send + 'static>) -> Response<Full<Bytes>> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    tracing::error!(%details, "Service panicked");

    let body = json!({
        "errors": [{
            "status": "500",
            "title": "Internal Server Error",
            "detail": details,
        }]
    });

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::from(body.to_string()))
        .expect("building a static panic response cannot fail")
}
