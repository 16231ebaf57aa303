//! Response helpers for hosts serving rendered markup through axum.

mod error;

pub use error::ErrorReport;

use axum::{
    body::Body,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::TryStreamExt;
use tracing::warn;

use crate::application::render::RenderStream;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A complete `200 OK` HTML response.
pub fn html_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, HTML_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// A chunked `200 OK` HTML response fed by `stream`.
///
/// Headers are sent before the first chunk, so a render error cannot change
/// the status any more; it aborts the body instead.
pub fn stream_response(stream: RenderStream) -> Response {
    let chunks = stream
        .into_async()
        .map_ok(Bytes::from)
        .inspect_err(|err| {
            warn!(
                target = "canopy::http::stream_response",
                kind = err.kind(),
                error = %err,
                "aborting streamed response"
            );
        });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, HTML_CONTENT_TYPE)
        .body(Body::from_stream(chunks))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
