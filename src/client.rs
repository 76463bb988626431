//! Client-side calls over an abstract transport.
//!
//! The free [`call`] function works on endpoint names and JSON payloads and
//! uses the registry to decide whether a token travels with the request.
//! [`Client`] adds typed methods: public endpoints can only be called through
//! [`Client::call`] and authenticated ones only through
//! [`Client::call_authenticated`], so a missing token is a compile error.

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::dispatch::Dispatcher;
use crate::endpoint::{AuthKind, Authenticated, Endpoint, Public};
use crate::logging::{debug, trace};
use crate::registry::Registry;
use crate::shape::ValidationError;
use crate::wire::{Request, Response};
use crate::{Error, Result};

/// Non-success outcome reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Status code, if the transport has one
    pub status: Option<u16>,
    /// Raw response body or a description of the failure
    pub body: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {}: {}", status, self.body),
            None => write!(f, "{}", self.body),
        }
    }
}

impl StdError for TransportError {}

/// Moves a request to wherever the dispatcher runs.
///
/// [`LoopbackTransport`] is the in-process implementation. An HTTP transport
/// would POST the serialized [`Request`] as a JSON body and return the parsed
/// response body on success; any non-success status becomes a
/// [`TransportError`] with that status and the raw response text as `body`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw result value
    async fn send(&self, request: Request) -> std::result::Result<Value, TransportError>;
}

/// Build a correctly shaped request for `endpoint` and send it.
///
/// The token is attached only when the registry marks the endpoint as
/// authenticated; an authenticated endpoint without a token fails with
/// [`Error::TokenRequired`] before anything is sent.
pub async fn call<T>(
    transport: &T,
    registry: &Registry,
    endpoint: &str,
    token: Option<&str>,
    payload: Value,
) -> Result<Value>
where
    T: Transport + ?Sized,
{
    let declaration = registry
        .get(endpoint)
        .ok_or_else(|| Error::UnknownEndpoint(endpoint.to_string()))?;

    let request = match declaration.auth {
        AuthKind::Public => Request::new(endpoint, payload),
        AuthKind::Authenticated => {
            let token = token.ok_or_else(|| Error::TokenRequired(endpoint.to_string()))?;
            Request::new(endpoint, payload).with_token(token)
        }
    };

    debug!("Sending request for '{}'", endpoint);
    transport.send(request).await.map_err(|e| {
        debug!("Transport failure for '{}': {}", endpoint, e);
        Error::TransportFailure(e)
    })
}

/// Typed client bound to a transport and registry
pub struct Client<T> {
    transport: T,
    registry: Arc<Registry>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, registry: Arc<Registry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Call a public endpoint
    pub async fn call<E>(&self, endpoint: E, input: E::Input) -> Result<E::Output>
    where
        E: Endpoint<Access = Public>,
    {
        self.send_typed(&endpoint, None, input).await
    }

    /// Call an authenticated endpoint with a token
    pub async fn call_authenticated<E>(
        &self,
        endpoint: E,
        token: &str,
        input: E::Input,
    ) -> Result<E::Output>
    where
        E: Endpoint<Access = Authenticated>,
    {
        self.send_typed(&endpoint, Some(token), input).await
    }

    /// Call an endpoint by name with a raw JSON payload
    pub async fn call_raw(&self, endpoint: &str, token: Option<&str>, payload: Value) -> Result<Value> {
        call(&self.transport, &self.registry, endpoint, token, payload).await
    }

    async fn send_typed<E: Endpoint>(
        &self,
        endpoint: &E,
        token: Option<&str>,
        input: E::Input,
    ) -> Result<E::Output> {
        let payload = serde_json::to_value(input)?;
        let result = self.call_raw(endpoint.name(), token, payload).await?;
        trace!("Decoding response for '{}': {}", endpoint.name(), result);

        serde_json::from_value(result).map_err(|e| Error::InvalidOutput(ValidationError::from(e)))
    }
}

/// Transport that hands requests, as JSON text, to an in-process dispatcher
pub struct LoopbackTransport<A: Authenticator> {
    dispatcher: Arc<Dispatcher<A>>,
}

impl<A: Authenticator> LoopbackTransport<A> {
    pub fn new(dispatcher: Arc<Dispatcher<A>>) -> Self {
        Self { dispatcher }
    }
}

impl<A: Authenticator> Clone for LoopbackTransport<A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

#[async_trait]
impl<A: Authenticator> Transport for LoopbackTransport<A> {
    async fn send(&self, request: Request) -> std::result::Result<Value, TransportError> {
        let body = serde_json::to_string(&request)
            .map_err(|e| TransportError::new(None, format!("Failed to encode request: {}", e)))?;

        let raw = self
            .dispatcher
            .dispatch(&body)
            .await
            .map_err(|e| TransportError::new(Some(500), e.to_string()))?;

        match serde_json::from_str::<Response>(&raw) {
            Ok(Response::Success(success)) => Ok(success.result),
            Ok(Response::Error(error)) => Err(TransportError::new(Some(error.error.status), raw)),
            Err(_) => Err(TransportError::new(Some(500), raw)),
        }
    }
}
