//! Endpoint declarations and the typed endpoint trait.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

use crate::shape::Shape;

/// Whether an endpoint requires an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    /// Handler receives the validated input only
    Public,
    /// Handler receives the caller identity and the validated input
    Authenticated,
}

impl AuthKind {
    pub fn requires_auth(self) -> bool {
        matches!(self, AuthKind::Authenticated)
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::Public => write!(f, "public"),
            AuthKind::Authenticated => write!(f, "authenticated"),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Public {}
    impl Sealed for super::Authenticated {}
}

/// Type-level access marker carried by a typed [`Endpoint`]
pub trait Access: sealed::Sealed + Send + Sync + 'static {
    const KIND: AuthKind;
}

/// Marker for endpoints callable without a token
pub enum Public {}

/// Marker for endpoints that require a token
pub enum Authenticated {}

impl Access for Public {
    const KIND: AuthKind = AuthKind::Public;
}

impl Access for Authenticated {
    const KIND: AuthKind = AuthKind::Authenticated;
}

/// Immutable declaration of a single endpoint
#[derive(Debug, Clone)]
pub struct EndpointDeclaration {
    /// Shape the request payload must satisfy
    pub input: Shape,
    /// Shape of the handler's output
    pub output: Shape,
    /// Authentication requirement
    pub auth: AuthKind,
}

impl EndpointDeclaration {
    pub fn new(input: Shape, output: Shape, auth: AuthKind) -> Self {
        Self {
            input,
            output,
            auth,
        }
    }

    pub fn auth_required(&self) -> bool {
        self.auth.requires_auth()
    }
}

/// A statically typed endpoint.
///
/// Implemented by unit structs so that endpoints can be passed by value to
/// handler registration and to the client. The `Access` marker decides which
/// handler signature and which client method are accepted for the endpoint.
pub trait Endpoint: Send + Sync + 'static {
    /// Either [`Public`] or [`Authenticated`]
    type Access: Access;

    /// The request payload type
    type Input: Serialize + DeserializeOwned + JsonSchema + Send + 'static;

    /// The response type
    type Output: Serialize + DeserializeOwned + JsonSchema + Send + 'static;

    /// The name the endpoint is registered under
    fn name(&self) -> &'static str;

    /// Declaration derived from the associated types
    fn declaration(&self) -> EndpointDeclaration {
        EndpointDeclaration::new(
            Shape::of::<Self::Input>(),
            Shape::of::<Self::Output>(),
            <Self::Access as Access>::KIND,
        )
    }
}
