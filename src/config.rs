//! Dispatcher options.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Options applied by a [`Dispatcher`](crate::dispatch::Dispatcher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Check handler output against the endpoint's declared output shape
    pub validate_output: bool,

    /// Treat an empty-string token as no token at all.
    ///
    /// On by default, so `""` on an authenticated endpoint fails with
    /// `TokenRequired` and the authenticator is never called. Turn it off to
    /// hand `""` to the authenticator like any other token, which usually
    /// rejects it as `AuthenticationFailed`.
    pub empty_token_is_absent: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            validate_output: false,
            empty_token_is_absent: true,
        }
    }
}

impl DispatchOptions {
    /// Parse options from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_output_validation(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }
}
