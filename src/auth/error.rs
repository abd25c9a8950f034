use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Classification of a failed authorization operation.
///
/// The string forms (`ERR_NETWORK`, ...) are stable and safe to show in logs
/// or persist next to a failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum ErrorKind {
    /// Anything not otherwise classified, including unexpected HTTP statuses.
    #[strum(serialize = "ERR_UNKNOWN")]
    Unknown,
    /// No response was obtained (connection refused, DNS, TLS, timeout).
    #[strum(serialize = "ERR_NETWORK")]
    Network,
    /// Malformed request or response, or an application-level rejection.
    #[strum(serialize = "ERR_PROTOCOL")]
    Protocol,
    /// The client id, client secret or refresh token was rejected.
    #[strum(serialize = "ERR_CREDENTIALS")]
    Credentials,
    /// The user explicitly declined the grant.
    #[strum(serialize = "ERR_AUTH_FAILED")]
    AuthFailed,
    /// The device code lapsed locally before the server answered.
    #[strum(serialize = "ERR_TIMEOUT")]
    Timeout,
    /// The session was aborted or superseded by a newer one.
    #[strum(serialize = "ERR_CANCELLED")]
    Cancelled,
}

/// What a caller should do after a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Discard the stored token and run the device flow again.
    Reauthorize,
    /// Stop and show the failure to a human.
    SurfaceToUser,
    /// Transient; the same operation can be retried later.
    RetryLater,
}

impl ErrorKind {
    /// Decision rule for a failure, given whether a token existed beforehand.
    pub fn recovery(self, had_token: bool) -> Recovery {
        match self {
            Self::Credentials | Self::Protocol if had_token => Recovery::Reauthorize,
            Self::Credentials | Self::Protocol | Self::AuthFailed => Recovery::SurfaceToUser,
            Self::Network | Self::Unknown | Self::Timeout | Self::Cancelled => {
                Recovery::RetryLater
            }
        }
    }
}

/// Terminal failure of a network operation: a machine-readable kind plus the
/// server's own description where one was available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "authorization cancelled")
    }
}

impl From<reqwest::Error> for Failure {
    fn from(error: reqwest::Error) -> Self {
        Self::network(error.to_string())
    }
}

/// Storage and (de)serialization errors for persisted tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Invalid token record: {0}")]
    Deserialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
