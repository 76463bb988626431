//! Typed request dispatch for single-endpoint RPC APIs.
//!
//! A [`Registry`] declares named endpoints with an input shape, an output
//! shape and whether authentication is required. On the server side a
//! [`Dispatcher`] validates each request, authenticates it when the endpoint
//! demands it and invokes the matching handler. On the client side a
//! [`Client`] builds correctly shaped requests and sends them through an
//! abstract [`Transport`].

use std::error::Error as StdError;
use std::fmt;

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod echo;
pub mod endpoint;
pub mod handler;
pub mod logging;
pub mod registry;
pub mod shape;
pub mod wire;

// Re-export key types
pub use auth::{AuthError, Authenticator};
pub use client::{Client, LoopbackTransport, Transport, TransportError, call};
pub use config::DispatchOptions;
pub use dispatch::{Dispatcher, handle, validate_output};
pub use endpoint::{Access, AuthKind, Authenticated, Endpoint, EndpointDeclaration, Public};
pub use handler::{Handler, HandlerError, HandlerSet};
pub use registry::{Registry, RegistryBuilder};
pub use shape::{Shape, ValidationError, Validator};
pub use wire::{ErrorKind, Request};

/// Custom error type for the library
#[derive(Debug)]
pub enum Error {
    /// No endpoint with this name is registered
    UnknownEndpoint(String),
    /// The payload was rejected by the endpoint's input shape
    InvalidInput(ValidationError),
    /// An authenticated endpoint was called without a token
    TokenRequired(String),
    /// The authenticator rejected the token
    AuthenticationFailed(AuthError),
    /// The handler itself failed
    HandlerFailure(HandlerError),
    /// The output did not match the endpoint's output shape
    InvalidOutput(ValidationError),
    /// The transport reported a non-success outcome
    TransportFailure(TransportError),
    /// Two endpoints were registered under the same name
    DuplicateEndpoint(String),
    /// Two handlers were registered under the same name
    DuplicateHandler(String),
    /// A registered endpoint has no handler
    MissingHandler(String),
    /// A handler exists for a name the registry does not know
    UnregisteredHandler(String),
    /// A handler's access kind differs from its endpoint's declaration
    HandlerKindMismatch {
        endpoint: String,
        declared: AuthKind,
        provided: AuthKind,
    },
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
}

impl Error {
    /// Wire classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownEndpoint(_) => ErrorKind::UnknownEndpoint,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::TokenRequired(_) => ErrorKind::TokenRequired,
            Error::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Error::HandlerFailure(_) => ErrorKind::HandlerFailure,
            Error::InvalidOutput(_) => ErrorKind::InvalidOutput,
            Error::TransportFailure(_) => ErrorKind::TransportFailure,
            Error::Json(_) => ErrorKind::InvalidRequest,
            Error::DuplicateEndpoint(_)
            | Error::DuplicateHandler(_)
            | Error::MissingHandler(_)
            | Error::UnregisteredHandler(_)
            | Error::HandlerKindMismatch { .. } => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownEndpoint(name) => write!(f, "Unknown endpoint: {}", name),
            Error::InvalidInput(err) => write!(f, "Invalid input: {}", err),
            Error::TokenRequired(name) => write!(f, "Token required for endpoint: {}", name),
            Error::AuthenticationFailed(err) => write!(f, "Authentication failed: {}", err),
            Error::HandlerFailure(err) => write!(f, "Handler failed: {}", err),
            Error::InvalidOutput(err) => write!(f, "Invalid output: {}", err),
            Error::TransportFailure(err) => write!(f, "Transport failure: {}", err),
            Error::DuplicateEndpoint(name) => write!(f, "Duplicate endpoint: {}", name),
            Error::DuplicateHandler(name) => write!(f, "Duplicate handler: {}", name),
            Error::MissingHandler(name) => write!(f, "No handler for endpoint: {}", name),
            Error::UnregisteredHandler(name) => {
                write!(f, "Handler for unregistered endpoint: {}", name)
            }
            Error::HandlerKindMismatch {
                endpoint,
                declared,
                provided,
            } => write!(
                f,
                "Endpoint {} is declared {} but its handler is {}",
                endpoint, declared, provided
            ),
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidInput(err) | Error::InvalidOutput(err) => Some(err),
            Error::AuthenticationFailed(err) => Some(err),
            Error::HandlerFailure(err) => Some(err),
            Error::TransportFailure(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// Type alias for library results
pub type Result<T> = std::result::Result<T, Error>;
