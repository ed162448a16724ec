use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Code attached to the fault recorded for an invalid method name.
pub const INVALID_METHOD_FAULT_CODE: i32 = 634;

#[derive(Debug, Error)]
pub enum JsonRpcError {
    #[error("invalid method name: {0}")]
    InvalidMethod(Fault),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid response: id {actual} does not match request id {expected}")]
    ResponseIdMismatch { expected: String, actual: String },
    #[error("unable to connect to {target}: {message}")]
    Connection { target: String, message: String },
    #[error("{status} {message}")]
    HttpStatus { status: u16, message: String },
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
    #[error("client was dropped before the proxy call")]
    ClientReleased,
    #[error("unable to read request: {0}")]
    Ingest(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A locally held error descriptor that does not interrupt control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub code: i32,
    pub message: String,
    pub encoding: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            encoding: encoding.into(),
        }
    }

    pub fn invalid_method(method: &str, encoding: &str) -> Self {
        Self::new(
            INVALID_METHOD_FAULT_CODE,
            format!("Invalid method name (\"{method}\")"),
            encoding,
        )
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl JsonRpcError {
    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// JSON-RPC 2.0 error code used when this error is reported back to a peer.
    pub fn rpc_code(&self) -> i32 {
        match self {
            Self::MalformedRequest(_) => -32700,
            Self::InvalidRequest(_) | Self::InvalidMethod(_) | Self::Ingest(_) => -32600,
            _ => -32603,
        }
    }
}

impl IntoResponse for JsonRpcError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "Parse error"),
            Self::InvalidRequest(_) | Self::InvalidMethod(_) | Self::Ingest(_) => {
                (StatusCode::BAD_REQUEST, "Invalid Request")
            }
            _ => {
                tracing::error!(error = %self, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        (
            status,
            Json(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": self.rpc_code(),
                    "message": message,
                    "data": self.to_string()
                }
            })),
        )
            .into_response()
    }
}
