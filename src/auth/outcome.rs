use super::error::{ErrorKind, Failure};
use super::token::Token;

/// State transition reported to the caller through a
/// [`NotificationSink`](super::notify::NotificationSink).
///
/// For one authorization session the order is: at most one
/// `VerificationRequired`, zero or more `Waiting`, then exactly one `Success`
/// or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Show `user_code` and `verification_url` to the user.
    VerificationRequired {
        user_code: String,
        verification_url: String,
        expires_in: u64,
    },
    /// The user has not completed verification yet.
    Waiting,
    Success { token: Token },
    Failed { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failed { .. })
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Failed {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

impl From<Result<Token, Failure>> for Outcome {
    fn from(result: Result<Token, Failure>) -> Self {
        match result {
            Ok(token) => Self::Success { token },
            Err(failure) => failure.into(),
        }
    }
}
