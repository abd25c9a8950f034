use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::{AuthError, Failure, Recovery};
use super::service::DeviceAuthorizer;
use super::store::TokenStore;
use super::token::Token;

/// Why [`AccessManager::ensure_access`] gave up.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Authorization(#[from] Failure),
    #[error(transparent)]
    Store(#[from] AuthError),
}

/// How a usable token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSource {
    /// The stored token was refreshed.
    Refreshed,
    /// A device flow ran because no usable token was stored.
    Authorized,
    /// The stored token was rejected and a device flow replaced it.
    Reauthorized,
}

/// Keeps one persisted token usable: refresh when possible, fall back to the
/// device flow when the stored token is gone or rejected.
///
/// Outcomes still reach the authorizer's sink, so a UI bound to the sink sees
/// the verification prompt during a fallback.
pub struct AccessManager {
    authorizer: DeviceAuthorizer,
    store: Arc<dyn TokenStore>,
    profile: String,
}

impl AccessManager {
    pub fn new(authorizer: DeviceAuthorizer, store: Arc<dyn TokenStore>) -> Self {
        Self {
            authorizer,
            store,
            profile: "default".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Stored token, treating an unreadable record as no token at all.
    pub fn stored_token(&self) -> Result<Option<Token>, AuthError> {
        match self.store.load(&self.profile) {
            Err(AuthError::Deserialization(reason)) => {
                warn!(profile = %self.profile, %reason, "ignoring unreadable stored token");
                Ok(None)
            }
            other => other,
        }
    }

    /// Return a token with a fresh access token, saving whatever changed.
    pub async fn ensure_access(
        &self,
        cancel: CancellationToken,
    ) -> Result<(Token, AccessSource), AccessError> {
        let Some(stored) = self.stored_token()? else {
            info!(profile = %self.profile, "no stored token; starting device authorization");
            let token = self.authorize(cancel).await?;
            return Ok((token, AccessSource::Authorized));
        };

        match self.authorizer.refresh_token(&stored).await {
            Ok(token) => {
                self.store.save(&self.profile, &token)?;
                Ok((token, AccessSource::Refreshed))
            }
            Err(failure) => match failure.kind.recovery(true) {
                Recovery::Reauthorize => {
                    warn!(
                        profile = %self.profile,
                        kind = %failure.kind,
                        "stored token rejected; reauthorizing"
                    );
                    self.store.clear(&self.profile)?;
                    let token = self.authorize(cancel).await?;
                    Ok((token, AccessSource::Reauthorized))
                }
                Recovery::SurfaceToUser | Recovery::RetryLater => Err(failure.into()),
            },
        }
    }

    /// Forget the stored token.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.store.clear(&self.profile)
    }

    async fn authorize(&self, cancel: CancellationToken) -> Result<Token, AccessError> {
        let token = self.authorizer.authorize(cancel).await?;
        self.store.save(&self.profile, &token)?;
        Ok(token)
    }
}
