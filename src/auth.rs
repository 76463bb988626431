//! Token verification boundary.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

/// Reason an authenticator rejected a token, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for AuthError {}

impl From<String> for AuthError {
    fn from(message: String) -> Self {
        AuthError { message }
    }
}

impl From<&str> for AuthError {
    fn from(message: &str) -> Self {
        AuthError::new(message)
    }
}

/// Resolves a credential token into a caller identity.
///
/// Invalid or expired tokens must fail; there is no "anonymous" identity.
/// Timeouts, if any, belong to the implementation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The identity handed to authenticated handlers
    type Identity: Send + 'static;

    async fn authenticate(&self, token: &str) -> Result<Self::Identity, AuthError>;
}

/// Any `Fn(String) -> impl Future<Output = Result<I, AuthError>>` is an authenticator
#[async_trait]
impl<F, Fut, I> Authenticator for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<I, AuthError>> + Send + 'static,
    I: Send + 'static,
{
    type Identity = I;

    async fn authenticate(&self, token: &str) -> Result<I, AuthError> {
        self(token.to_string()).await
    }
}
