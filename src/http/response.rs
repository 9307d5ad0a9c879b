//! Error responses.
//!
//! # Responsibilities
//! - Convert handler errors into HTTP responses
//! - Convert caught panics into 500 responses
//! - Tag both with a [`HandlerError`] extension for the span middleware
//!
//! # Design Decisions
//! - Body is `{"message": ...}` JSON
//! - 5xx bodies use the canonical reason; the detail only goes to the span and logs

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error detail attached to a response, read by the tracing middleware.
#[derive(Debug, Clone)]
pub struct HandlerError(Arc<str>);

impl HandlerError {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by request handlers.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let public = if self.status.is_server_error() {
            self.status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_owned()
        } else {
            self.message.clone()
        };

        let mut response = (self.status, Json(json!({ "message": public }))).into_response();
        response
            .extensions_mut()
            .insert(HandlerError::new(self.message));
        response
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };

    HttpError::internal(format!("handler panicked: {detail}")).into_response()
}
