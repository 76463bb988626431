//! Endpoint handlers and the handler set.
//!
//! A handler's signature depends on its endpoint's [`AuthKind`]: public
//! handlers take the validated input only, authenticated handlers take the
//! caller identity first. [`Handler`] stores either shape behind a tag so the
//! dispatcher can match on it.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::endpoint::{AuthKind, Authenticated, Endpoint, Public};
use crate::shape::{Shape, ValidationError};
use crate::{Error, Result};

/// Failure raised by a handler itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for HandlerError {}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::new(message)
    }
}

/// Boxed future returned by every stored handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Handler for a public endpoint
pub type PublicHandlerFn = Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Handler for an authenticated endpoint
pub type AuthenticatedHandlerFn<I> = Box<dyn Fn(I, Value) -> HandlerFuture + Send + Sync>;

/// A stored handler, tagged by the access it expects
pub enum Handler<I> {
    Public(PublicHandlerFn),
    Authenticated(AuthenticatedHandlerFn<I>),
}

impl<I: Send + 'static> Handler<I> {
    /// Wrap an untyped public handler operating on JSON values
    pub fn public_fn<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, HandlerError>> + Send + 'static,
    {
        let handler_fn: PublicHandlerFn = Box::new(move |payload: Value| {
            let fut = handler(payload);
            Box::pin(async move { fut.await.map_err(Error::HandlerFailure) })
        });
        Handler::Public(handler_fn)
    }

    /// Wrap an untyped authenticated handler operating on JSON values
    pub fn authenticated_fn<F, Fut>(handler: F) -> Self
    where
        F: Fn(I, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, HandlerError>> + Send + 'static,
    {
        let handler_fn: AuthenticatedHandlerFn<I> = Box::new(move |identity: I, payload: Value| {
            let fut = handler(identity, payload);
            Box::pin(async move { fut.await.map_err(Error::HandlerFailure) })
        });
        Handler::Authenticated(handler_fn)
    }
}

impl<I> Handler<I> {
    /// The access kind this handler was built for
    pub fn kind(&self) -> AuthKind {
        match self {
            Handler::Public(_) => AuthKind::Public,
            Handler::Authenticated(_) => AuthKind::Authenticated,
        }
    }
}

impl<I> fmt::Debug for Handler<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.kind())
    }
}

/// Mapping from endpoint name to handler
pub struct HandlerSet<I> {
    handlers: BTreeMap<String, Handler<I>>,
    /// Input types of handlers registered through a typed endpoint
    inputs: BTreeMap<String, Shape>,
}

impl<I> Default for HandlerSet<I> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
            inputs: BTreeMap::new(),
        }
    }
}

impl<I: Send + 'static> HandlerSet<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a name
    pub fn insert(&mut self, name: &str, handler: Handler<I>) -> Result<&mut Self> {
        if self.handlers.contains_key(name) {
            return Err(Error::DuplicateHandler(name.to_string()));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(self)
    }

    /// Register the handler for a public endpoint
    pub fn public<E, F, Fut>(&mut self, endpoint: E, handler: F) -> Result<&mut Self>
    where
        E: Endpoint<Access = Public>,
        F: Fn(E::Input) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = std::result::Result<E::Output, HandlerError>> + Send + 'static,
    {
        let handler_fn: PublicHandlerFn = Box::new(move |payload: Value| {
            let handler = handler.clone();

            Box::pin(async move {
                let input: E::Input = decode(payload)?;
                let output = handler(input).await.map_err(Error::HandlerFailure)?;
                encode(output)
            })
        });

        self.insert(endpoint.name(), Handler::Public(handler_fn))?;
        self.inputs
            .insert(endpoint.name().to_string(), Shape::of::<E::Input>());
        Ok(self)
    }

    /// Register the handler for an authenticated endpoint
    pub fn authenticated<E, F, Fut>(&mut self, endpoint: E, handler: F) -> Result<&mut Self>
    where
        E: Endpoint<Access = Authenticated>,
        F: Fn(I, E::Input) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = std::result::Result<E::Output, HandlerError>> + Send + 'static,
    {
        let handler_fn: AuthenticatedHandlerFn<I> = Box::new(move |identity: I, payload: Value| {
            let handler = handler.clone();

            Box::pin(async move {
                let input: E::Input = decode(payload)?;
                let output = handler(identity, input).await.map_err(Error::HandlerFailure)?;
                encode(output)
            })
        });

        self.insert(endpoint.name(), Handler::Authenticated(handler_fn))?;
        self.inputs
            .insert(endpoint.name().to_string(), Shape::of::<E::Input>());
        Ok(self)
    }
}

impl<I> HandlerSet<I> {
    pub fn get(&self, name: &str) -> Option<&Handler<I>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Input shape required by a typed handler, on top of the registry's
    pub fn input_shape(&self, name: &str) -> Option<&Shape> {
        self.inputs.get(name)
    }

    /// Registered names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Convert an already validated payload into the handler's input type
fn decode<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(ValidationError::from(e)))
}

/// Serialize a handler output back into JSON
fn encode<T: Serialize>(output: T) -> Result<Value> {
    Ok(serde_json::to_value(output)?)
}
