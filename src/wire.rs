//! JSON wire format shared by the dispatcher and the client.
//!
//! Requests travel as `{"endpoint": .., "token": .., "payload": ..}` with the
//! token omitted for public endpoints. Responses are either
//! `{"result": ..}` or `{"error": {"kind": .., "message": .., "status": ..}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// A request naming an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Endpoint name
    pub endpoint: String,
    /// Credential token, present only for authenticated endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Endpoint input
    #[serde(default)]
    pub payload: Value,
}

impl Request {
    /// Request for a public endpoint
    pub fn new(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            payload,
        }
    }

    /// Attach a credential token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Classification of failures carried over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request text was not a valid request
    InvalidRequest,
    UnknownEndpoint,
    InvalidInput,
    TokenRequired,
    AuthenticationFailed,
    HandlerFailure,
    InvalidOutput,
    TransportFailure,
    /// Misconfigured registry or handler set
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest | ErrorKind::InvalidInput => 400,
            ErrorKind::TokenRequired | ErrorKind::AuthenticationFailed => 401,
            ErrorKind::UnknownEndpoint => 404,
            ErrorKind::TransportFailure => 502,
            ErrorKind::HandlerFailure | ErrorKind::InvalidOutput | ErrorKind::Internal => 500,
        }
    }
}

/// Error object inside an error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    pub status: u16,
}

/// Successful response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub result: Value,
}

/// Error response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Response (either success or error)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

/// Create a success response
pub fn success(result: Value) -> Response {
    Response::Success(SuccessResponse { result })
}

/// Create an error response from a crate error
pub fn error(error: &Error) -> Response {
    let kind = error.kind();
    Response::Error(ErrorResponse {
        error: ErrorBody {
            kind,
            message: error.to_string(),
            status: kind.status(),
        },
    })
}

/// Create an invalid request response
pub fn invalid_request(message: &str) -> Response {
    Response::Error(ErrorResponse {
        error: ErrorBody {
            kind: ErrorKind::InvalidRequest,
            message: format!("Invalid request: {}", message),
            status: ErrorKind::InvalidRequest.status(),
        },
    })
}
