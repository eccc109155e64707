//! The `{ "status": ..., "data": ... }` wrapper every billing operation returns.
//!
//! Failures never travel on a language-level error channel across the tool
//! boundary; they are encoded as `status = "error"` with a `data.message`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Envelope<T, E = ErrorData> {
    Success(T),
    Error(E),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
}

impl ErrorData {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<&DomainError> for ErrorData {
    fn from(error: &DomainError) -> Self {
        Self::new(error.to_string())
    }
}

impl<T, E> Envelope<T, E> {
    pub fn status(&self) -> EnvelopeStatus {
        match self {
            Self::Success(_) => EnvelopeStatus::Success,
            Self::Error(_) => EnvelopeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Success(_) => None,
            Self::Error(data) => Some(data),
        }
    }
}

impl<T> Envelope<T> {
    pub fn failure(error: &DomainError) -> Self {
        Self::Error(ErrorData::from(error))
    }

    pub fn message(&self) -> Option<&str> {
        self.error().map(|data| data.message.as_str())
    }
}

impl<T> From<Result<T, DomainError>> for Envelope<T> {
    fn from(result: Result<T, DomainError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::failure(&error),
        }
    }
}

impl<T: Serialize, E: Serialize> Envelope<T, E> {
    /// Serializes to JSON; a payload that cannot be serialized becomes an error envelope.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|error| {
            json!({
                "status": "error",
                "data": { "message": format!("response serialization failed: {error}") },
            })
        })
    }
}
