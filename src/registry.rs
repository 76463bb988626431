//! Registry of endpoint declarations, ordered by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::endpoint::{AuthKind, Endpoint, EndpointDeclaration};
use crate::shape::Shape;
use crate::{Error, Result};

/// Schema description of a registered endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSchema {
    /// Endpoint name
    pub name: String,
    /// Whether a token must accompany requests
    pub auth_required: bool,
    /// JSON schema of the input payload
    pub input_schema: Value,
    /// JSON schema of the output
    pub output_schema: Value,
}

/// Immutable mapping from endpoint name to its declaration
#[derive(Debug, Clone, Default)]
pub struct Registry {
    endpoints: BTreeMap<String, EndpointDeclaration>,
}

impl Registry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up an endpoint declaration by name
    pub fn get(&self, name: &str) -> Option<&EndpointDeclaration> {
        self.endpoints.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// All endpoint names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointDeclaration)> {
        self.endpoints.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Describe every endpoint with its input and output schemas
    pub fn describe(&self) -> Vec<EndpointSchema> {
        self.iter()
            .map(|(name, decl)| EndpointSchema {
                name: name.to_string(),
                auth_required: decl.auth_required(),
                input_schema: decl.input.schema().clone(),
                output_schema: decl.output.schema().clone(),
            })
            .collect()
    }

    /// Get all endpoint descriptions as JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.describe()).unwrap_or(Value::Null)
    }
}

/// Builder that rejects duplicate endpoint names
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    endpoints: BTreeMap<String, EndpointDeclaration>,
}

impl RegistryBuilder {
    /// Register an endpoint from its parts
    pub fn register(
        mut self,
        name: &str,
        input: Shape,
        output: Shape,
        auth: AuthKind,
    ) -> Result<Self> {
        self.insert(name, EndpointDeclaration::new(input, output, auth))?;
        Ok(self)
    }

    /// Register a typed endpoint
    pub fn endpoint<E: Endpoint>(mut self, endpoint: E) -> Result<Self> {
        self.insert(endpoint.name(), endpoint.declaration())?;
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            endpoints: self.endpoints,
        }
    }

    fn insert(&mut self, name: &str, declaration: EndpointDeclaration) -> Result<()> {
        if self.endpoints.contains_key(name) {
            return Err(Error::DuplicateEndpoint(name.to_string()));
        }
        self.endpoints.insert(name.to_string(), declaration);
        Ok(())
    }
}
