//! Error taxonomy shared by the cache, engine and client layers

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum EstateError {
    /// The request never reached the server or never came back
    #[error("Network error: {0}")]
    Network(String),

    /// Local input was malformed and was never dispatched
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected a create/update/delete
    #[error("Mutation rejected: {0}")]
    Mutation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EstateError {
    pub fn not_found(what: &str, id: &str) -> Self {
        EstateError::NotFound(format!("{} {:?}", what, id))
    }

    /// Only network failures are worth a silent retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, EstateError::Network(_))
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            EstateError::Network(_) => "network",
            EstateError::Validation(_) => "validation",
            EstateError::NotFound(_) => "not_found",
            EstateError::Mutation(_) => "mutation",
            EstateError::Decode(_) => "decode",
            EstateError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for EstateError {
    fn from(err: serde_json::Error) -> Self {
        EstateError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EstateError>;

/// `{ok, data, error}` envelope handed to views instead of raw errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EstateError>,
}

impl<T> Outcome<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: EstateError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<T> {
        match (self.data, self.error) {
            (Some(data), None) if self.ok => Ok(data),
            (_, Some(error)) => Err(error),
            _ => Err(EstateError::Decode(
                "outcome carries neither data nor error".to_string(),
            )),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Outcome::success(data),
            Err(error) => Outcome::failure(error),
        }
    }
}
