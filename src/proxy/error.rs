// Per-request proxy errors and their JSON rendering
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Caller sent an unusable envelope. Never reaches upstream.
    #[error("{0}")]
    ClientInput(String),

    /// Server secrets missing. Never reaches upstream.
    #[error("{0}")]
    Configuration(String),

    /// Transport failure, timeout or non-2xx upstream reply.
    #[error("{message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
        details: Option<Value>,
    },
}

/// Normalized error body returned to callers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub result_ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ClientInput(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Render with the original call target attached.
    pub fn into_response_for(self, path: &str, method: &str) -> Response {
        let status = self.status();
        let mut body = self.into_body();
        body.path = Some(path.to_string());
        body.method = Some(method.to_string());
        (status, Json(body)).into_response()
    }

    fn into_body(self) -> ErrorBody {
        let (message, details) = match self {
            Self::ClientInput(message) | Self::Configuration(message) => (message, None),
            Self::Upstream {
                message, details, ..
            } => (message, details),
        };
        ErrorBody {
            result_ok: false,
            message,
            details,
            path: None,
            method: None,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}
