//! Error types for booth-auth.

use thiserror::Error;

use crate::auth::error::{AuthError, ErrorKind, Failure};
use crate::auth::manager::AccessError;

/// Primary error type for configuration and command-level operations.
#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Token store error: {0}")]
    Auth(#[from] AuthError),

    #[error("Authorization failed ({kind}): {message}")]
    Authorization { kind: ErrorKind, message: String },
}

impl BoothError {
    /// The authorization error kind, when this error came from the network flow.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Authorization { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<Failure> for BoothError {
    fn from(failure: Failure) -> Self {
        Self::Authorization {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

impl From<AccessError> for BoothError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::Authorization(failure) => failure.into(),
            AccessError::Store(err) => err.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BoothError>;
