//! Declarative shapes for endpoint input and output
//!
//! A [`Shape`] pairs a JSON schema (used for documentation) with a
//! [`Validator`] that accepts, and possibly normalizes, a JSON value.

use schemars::{JsonSchema, schema_for};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Structured reason a value was rejected by a validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Human readable diagnostic
    pub message: String,
    /// Location of the offending value, when the validator knows it
    pub path: Option<String>,
}

impl ValidationError {
    /// Create a validation error without a location
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Attach the location of the offending value
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (at {})", self.message, path),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for ValidationError {}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::new(err.to_string())
    }
}

/// Checks a value against a shape.
///
/// Implementations must be deterministic and free of side effects.
pub trait Validator: Send + Sync {
    /// Accept the value (possibly normalized) or return the reason it was rejected
    fn validate(&self, value: Value) -> Result<Value, ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(Value) -> Result<Value, ValidationError> + Send + Sync,
{
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        self(value)
    }
}

/// Validator backed by a serde type: the value must deserialize into `T`.
///
/// The accepted value is `T` serialized back, so defaults are filled in.
pub struct SerdeValidator<T>(PhantomData<fn() -> T>);

impl<T> SerdeValidator<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator for SerdeValidator<T>
where
    T: Serialize + DeserializeOwned,
{
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let typed: T = serde_json::from_value(value)?;
        Ok(serde_json::to_value(typed)?)
    }
}

/// Accepts every value unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyValue;

impl Validator for AnyValue {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }
}

/// Declared shape of an endpoint's input or output
#[derive(Clone)]
pub struct Shape {
    schema: Value,
    validator: Arc<dyn Validator>,
}

impl Shape {
    /// Shape with an explicit schema document and validator
    pub fn new(schema: Value, validator: impl Validator + 'static) -> Self {
        Self {
            schema,
            validator: Arc::new(validator),
        }
    }

    /// Shape derived from a serde type, with its schema generated by schemars
    pub fn of<T>() -> Self
    where
        T: JsonSchema + Serialize + DeserializeOwned + 'static,
    {
        Self::new(generate_schema::<T>(), SerdeValidator::<T>::new())
    }

    /// Shape that accepts any JSON value
    pub fn any() -> Self {
        Self::new(Value::Bool(true), AnyValue)
    }

    /// The JSON schema document describing this shape
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate a value against this shape
    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        self.validator.validate(value)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape").field("schema", &self.schema).finish()
    }
}

/// Generate the JSON schema for a type that implements JsonSchema
pub fn generate_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    serde_json::to_value(&schema).unwrap_or(Value::Null)
}
