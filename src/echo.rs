//! Sample API with one authenticated and one public endpoint.
//!
//! Used by the demos and tests, and a compact example of wiring a registry,
//! an authenticator and handlers together.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::Result;
use crate::auth::{AuthError, Authenticator};
use crate::dispatch::Dispatcher;
use crate::endpoint::{Authenticated, Endpoint, Public};
use crate::handler::{HandlerError, HandlerSet};
use crate::registry::Registry;

/// Input of both endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    pub msg: String,
}

/// Output of both endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reply {
    pub reply: String,
}

/// Identity produced by [`verify_token`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
}

/// Echo endpoint that requires a token
#[derive(Debug, Clone, Copy)]
pub struct AuthEndpoint;

impl Endpoint for AuthEndpoint {
    type Access = Authenticated;
    type Input = Message;
    type Output = Reply;

    fn name(&self) -> &'static str {
        "authEndpoint"
    }
}

/// Echo endpoint open to everyone
#[derive(Debug, Clone, Copy)]
pub struct PublicEndpoint;

impl Endpoint for PublicEndpoint {
    type Access = Public;
    type Input = Message;
    type Output = Reply;

    fn name(&self) -> &'static str {
        "publicEndpoint"
    }
}

/// Accepts the single token "valid"
pub async fn verify_token(token: String) -> std::result::Result<User, AuthError> {
    if token == "valid" {
        Ok(User {
            id: "user1".to_string(),
        })
    } else {
        Err(AuthError::new("Invalid token"))
    }
}

pub async fn auth_reply(user: User, input: Message) -> std::result::Result<Reply, HandlerError> {
    Ok(Reply {
        reply: format!("auth: {} - {}", user.id, input.msg),
    })
}

pub async fn public_reply(input: Message) -> std::result::Result<Reply, HandlerError> {
    Ok(Reply {
        reply: format!("public: {}", input.msg),
    })
}

/// Registry holding both echo endpoints
pub fn registry() -> Result<Registry> {
    Ok(Registry::builder()
        .endpoint(AuthEndpoint)?
        .endpoint(PublicEndpoint)?
        .build())
}

/// Handlers for both echo endpoints
pub fn handlers() -> Result<HandlerSet<User>> {
    let mut handlers: HandlerSet<User> = HandlerSet::new();
    handlers
        .authenticated(AuthEndpoint, auth_reply)?
        .public(PublicEndpoint, public_reply)?;
    Ok(handlers)
}

/// Authenticator backed by [`verify_token`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAuthenticator;

#[async_trait]
impl Authenticator for EchoAuthenticator {
    type Identity = User;

    async fn authenticate(&self, token: &str) -> std::result::Result<User, AuthError> {
        verify_token(token.to_string()).await
    }
}

/// Dispatcher for the echo API
pub fn create_echo_dispatcher() -> Result<Dispatcher<EchoAuthenticator>> {
    Dispatcher::new(Arc::new(registry()?), EchoAuthenticator, handlers()?)
}
