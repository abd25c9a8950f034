use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use super::client::DeviceAuthClient;
use super::error::Failure;
use super::notify::NotificationSink;
use super::outcome::Outcome;
use super::scheduler::PollScheduler;
use super::token::Token;

/// Identifier attached to every log line of one authorization session.
pub type SessionId = Uuid;

/// Handle for an authorization session running on the tokio runtime.
///
/// Outcomes are delivered through the authorizer's sink; the handle only
/// offers cancellation and the terminal result.
#[derive(Debug)]
pub struct AuthorizationHandle {
    session_id: SessionId,
    cancel: CancellationToken,
    result_rx: oneshot::Receiver<Result<Token, Failure>>,
}

impl AuthorizationHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Stop the session at its next sleep boundary. It then reports a single
    /// `ERR_CANCELLED` failure.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the terminal result of the session.
    pub async fn wait(self) -> Result<Token, Failure> {
        self.result_rx
            .await
            .unwrap_or_else(|_| Err(Failure::cancelled()))
    }
}

/// Entry points of the device authorization flow.
///
/// Every outcome is reported once through the sink supplied at construction.
/// Starting a new authorization cancels the one still running, so at most one
/// device grant is live per authorizer. A superseded session reports nothing
/// further; only its handle sees the `ERR_CANCELLED` result.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use booth_auth::auth::{ChannelSink, Credentials, DeviceAuthClient, DeviceAuthorizer, Outcome};
///
/// # async fn run() {
/// let creds = Credentials::new("client-id", "client-secret", ["https://picasaweb.google.com/data/"]);
/// let (sink, mut outcomes) = ChannelSink::channel();
/// let authorizer = DeviceAuthorizer::new(DeviceAuthClient::new(creds), Arc::new(sink));
/// let _handle = authorizer.request_authorization();
/// while let Some(outcome) = outcomes.recv().await {
///     if let Outcome::VerificationRequired { user_code, verification_url, .. } = &outcome {
///         println!("Visit {verification_url} and enter {user_code}");
///     }
///     if outcome.is_terminal() {
///         break;
///     }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct DeviceAuthorizer {
    client: Arc<DeviceAuthClient>,
    sink: Arc<dyn NotificationSink>,
    active: Arc<Mutex<Option<ActiveSession>>>,
}

/// The session whose outcomes currently reach the sink.
struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DeviceAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthorizer")
            .field("client", &self.client)
            .field("sink", &"..")
            .finish()
    }
}

impl DeviceAuthorizer {
    pub fn new(client: DeviceAuthClient, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            client: Arc::new(client),
            sink,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn client(&self) -> &DeviceAuthClient {
        &self.client
    }

    /// Start a device authorization session in the background.
    ///
    /// Returns immediately; must be called from within a tokio runtime.
    pub fn request_authorization(&self) -> AuthorizationHandle {
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.supersede(session_id, cancel.clone());
        let (result_tx, result_rx) = oneshot::channel();

        let authorizer = self.clone();
        let session_cancel = cancel.clone();
        let span = tracing::info_span!("device_authorization", session_id = %session_id);
        tokio::spawn(
            async move {
                let result = authorizer.run_session(session_id, &session_cancel).await;
                let _ = result_tx.send(result);
            }
            .instrument(span),
        );

        AuthorizationHandle {
            session_id,
            cancel,
            result_rx,
        }
    }

    /// Run a device authorization session on the current task.
    ///
    /// Like [`request_authorization`](Self::request_authorization) but the
    /// caller supplies the cancellation token and awaits the result itself.
    pub async fn authorize(&self, cancel: CancellationToken) -> Result<Token, Failure> {
        let session_id = Uuid::new_v4();
        self.supersede(session_id, cancel.clone());
        self.run_session(session_id, &cancel)
            .instrument(tracing::info_span!("device_authorization", session_id = %session_id))
            .await
    }

    /// Obtain a new access token for an existing token.
    ///
    /// Reports `Success` or `Failed` through the sink and returns the same
    /// result. The input token is never modified; on success the caller
    /// replaces its current token with the returned one.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token, Failure> {
        let result = self.client.refresh(token).await;
        match &result {
            Ok(_) => info!("access token refreshed"),
            Err(failure) => info!(kind = %failure.kind, "token refresh failed"),
        }
        self.sink.notify(result.clone().into());
        result
    }

    async fn run_session(
        &self,
        session_id: SessionId,
        cancel: &CancellationToken,
    ) -> Result<Token, Failure> {
        let notify = move |outcome: Outcome| self.notify(session_id, outcome);

        // A session superseded before it started never sends its request.
        let requested = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Failure::cancelled()),
            requested = self.client.request_device_code() => requested,
        };
        let mut grant = match requested {
            Ok(grant) => grant,
            Err(failure) => {
                info!(kind = %failure.kind, "authorization request failed");
                notify(failure.clone().into());
                return Err(failure);
            }
        };

        notify(Outcome::VerificationRequired {
            user_code: grant.user_code.clone(),
            verification_url: grant.verification_url.clone(),
            expires_in: grant.expires_in_secs,
        });

        let mut scheduler = PollScheduler::new();
        scheduler
            .run(&self.client, &mut grant, &notify, cancel)
            .await
    }

    /// Forward `outcome` unless a newer session has replaced `session_id`.
    fn notify(&self, session_id: SessionId, outcome: Outcome) {
        let current = match self.active.lock() {
            Ok(guard) => guard.as_ref().map(|active| active.id),
            Err(poisoned) => poisoned.into_inner().as_ref().map(|active| active.id),
        };
        if current == Some(session_id) {
            self.sink.notify(outcome);
        } else {
            debug!(%session_id, "session superseded; outcome dropped");
        }
    }

    /// Make `session_id` the live session, cancelling the previous one.
    fn supersede(&self, session_id: SessionId, cancel: CancellationToken) {
        let next = ActiveSession {
            id: session_id,
            cancel,
        };
        let previous = match self.active.lock() {
            Ok(mut guard) => guard.replace(next),
            Err(poisoned) => poisoned.into_inner().replace(next),
        };
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }
}
