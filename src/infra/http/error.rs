use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::application::{adapters::AdapterError, render::RenderError};

const PUBLIC_MESSAGE: &str = "Internal server error";

/// Error detail attached to a response as an extension. It never reaches the
/// body; logging middleware can pick it up from the response.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    /// Capture `error` and its whole `source()` chain.
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let report = ErrorReport::from_error("infra::http::adapter_error", status, &self);
        error!(
            target = "canopy::http::adapter_error",
            error = %report.messages.join(": "),
            "rendering for response failed"
        );
        let mut response = (status, PUBLIC_MESSAGE).into_response();
        report.attach(&mut response);
        response
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        AdapterError::from(self).into_response()
    }
}
