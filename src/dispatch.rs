//! Server-side request dispatch.
//!
//! [`handle`] is the protocol core. For one request it runs, strictly in
//! order: registry lookup, input validation, the authorization gate (token
//! presence, then the authenticator) and finally exactly one handler call.
//! [`Dispatcher`] owns the pieces, checks that they agree with each other at
//! construction time, and serves the JSON wire format.

use serde_json::Value;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::DispatchOptions;
use crate::handler::{Handler, HandlerSet};
use crate::logging::{debug, trace};
use crate::registry::Registry;
use crate::wire::{self, Request};
use crate::{Error, Result};

/// Dispatch a single request.
///
/// The authenticator is called at most once and only for authenticated
/// endpoints that received a token; the handler is called at most once and
/// only after every earlier stage succeeded. Tokens sent to public endpoints
/// are ignored.
pub async fn handle<A>(
    registry: &Registry,
    authenticator: &A,
    handlers: &HandlerSet<A::Identity>,
    request: Request,
) -> Result<Value>
where
    A: Authenticator + ?Sized,
{
    let Request {
        endpoint,
        token,
        payload,
    } = request;

    let Some(declaration) = registry.get(&endpoint) else {
        debug!("Rejecting request for unknown endpoint '{}'", endpoint);
        return Err(Error::UnknownEndpoint(endpoint));
    };

    let Some(handler) = handlers.get(&endpoint) else {
        return Err(Error::MissingHandler(endpoint));
    };

    if handler.kind() != declaration.auth {
        return Err(Error::HandlerKindMismatch {
            endpoint,
            declared: declaration.auth,
            provided: handler.kind(),
        });
    }

    let input = declaration
        .input
        .validate(payload)
        .and_then(|input| match handlers.input_shape(&endpoint) {
            Some(shape) => shape.validate(input),
            None => Ok(input),
        })
        .map_err(|reason| {
            debug!("Invalid input for '{}': {}", endpoint, reason);
            Error::InvalidInput(reason)
        })?;
    trace!("Validated input for '{}': {}", endpoint, input);

    match handler {
        Handler::Public(handler) => {
            debug!("Invoking public endpoint '{}'", endpoint);
            handler(input).await
        }
        Handler::Authenticated(handler) => {
            let Some(token) = token else {
                debug!("Missing token for authenticated endpoint '{}'", endpoint);
                return Err(Error::TokenRequired(endpoint));
            };

            let identity = authenticator.authenticate(&token).await.map_err(|reason| {
                debug!("Authentication failed for '{}': {}", endpoint, reason);
                Error::AuthenticationFailed(reason)
            })?;

            debug!("Invoking authenticated endpoint '{}'", endpoint);
            handler(identity, input).await
        }
    }
}

/// Check a handler's output against the endpoint's declared output shape.
///
/// This is separate from [`handle`]; [`Dispatcher`] runs it only when
/// [`DispatchOptions::validate_output`] is set.
pub fn validate_output(registry: &Registry, endpoint: &str, output: Value) -> Result<Value> {
    let declaration = registry
        .get(endpoint)
        .ok_or_else(|| Error::UnknownEndpoint(endpoint.to_string()))?;

    declaration.output.validate(output).map_err(Error::InvalidOutput)
}

/// Verify that every registered endpoint has a handler of the matching kind
/// and that no handler exists for an unregistered name.
pub fn check_handlers<I>(registry: &Registry, handlers: &HandlerSet<I>) -> Result<()> {
    for (name, declaration) in registry.iter() {
        let handler = handlers
            .get(name)
            .ok_or_else(|| Error::MissingHandler(name.to_string()))?;

        if handler.kind() != declaration.auth {
            return Err(Error::HandlerKindMismatch {
                endpoint: name.to_string(),
                declared: declaration.auth,
                provided: handler.kind(),
            });
        }
    }

    if let Some(extra) = handlers.names().find(|name| !registry.contains(name)) {
        return Err(Error::UnregisteredHandler(extra.to_string()));
    }

    Ok(())
}

/// Request dispatcher owning a registry, an authenticator and handlers
pub struct Dispatcher<A: Authenticator> {
    registry: Arc<Registry>,
    authenticator: A,
    handlers: HandlerSet<A::Identity>,
    options: DispatchOptions,
}

impl<A: Authenticator> Dispatcher<A> {
    /// Create a dispatcher, failing if the handler set and registry disagree
    pub fn new(
        registry: Arc<Registry>,
        authenticator: A,
        handlers: HandlerSet<A::Identity>,
    ) -> Result<Self> {
        check_handlers(&registry, &handlers)?;

        debug!(
            "Dispatcher ready with {} endpoints: {}",
            registry.len(),
            registry.names().collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            registry,
            authenticator,
            handlers,
            options: DispatchOptions::default(),
        })
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Dispatch a request, applying the configured options
    pub async fn handle(&self, mut request: Request) -> Result<Value> {
        if self.options.empty_token_is_absent && request.token.as_deref() == Some("") {
            request.token = None;
        }

        let endpoint = request.endpoint.clone();
        let output = handle(&self.registry, &self.authenticator, &self.handlers, request).await?;

        if self.options.validate_output {
            validate_output(&self.registry, &endpoint, output)
        } else {
            Ok(output)
        }
    }

    /// Dispatch a request given as JSON text and render the JSON response.
    ///
    /// Protocol failures become error responses; only a failure to render the
    /// response itself is returned as `Err`.
    pub async fn dispatch(&self, request_str: &str) -> Result<String> {
        let response = match serde_json::from_str::<Request>(request_str) {
            Ok(request) => match self.handle(request).await {
                Ok(result) => wire::success(result),
                Err(e) => wire::error(&e),
            },
            Err(e) => {
                debug!("Malformed request: {}", e);
                wire::invalid_request(&e.to_string())
            }
        };

        Ok(serde_json::to_string(&response)?)
    }
}
