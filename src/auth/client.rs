//! The three network operations of the device authorization grant and the
//! classification of their responses.
//!
//! Every operation makes exactly one POST with a form-encoded body and never
//! retries. Results are classified here; deciding what to do next is left to
//! [`PollScheduler`](super::scheduler::PollScheduler) and
//! [`DeviceAuthorizer`](super::service::DeviceAuthorizer).

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::credentials::Credentials;
use super::device_code::{DeviceGrant, PollStep};
use super::error::{ErrorKind, Failure};
use super::token::Token;

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/device/code";
pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
pub const DEVICE_GRANT_TYPE: &str = "http://oauth.net/grant_type/device/1.0";
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

/// Used when the authorization response omits `interval` or sends 0.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// HTTP client for the authorization, poll and refresh endpoints.
///
/// # Example
/// ```no_run
/// use booth_auth::auth::{Credentials, DeviceAuthClient};
///
/// # async fn run() {
/// let creds = Credentials::new("client-id", "client-secret", ["https://picasaweb.google.com/data/"]);
/// let client = DeviceAuthClient::new(creds);
/// match client.request_device_code().await {
///     Ok(grant) => println!("Visit {} and enter {}", grant.verification_url, grant.user_code),
///     Err(failure) => eprintln!("{failure}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceAuthClient {
    http: reqwest::Client,
    credentials: Credentials,
    authorization_url: String,
    token_url: String,
    refresh_url: String,
}

impl DeviceAuthClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            refresh_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = url.into();
        self
    }

    /// Endpoint used for polling. Refreshes use it too unless
    /// [`with_refresh_url`](Self::with_refresh_url) is set afterwards.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.refresh_url = url.clone();
        self.token_url = url;
        self
    }

    pub fn with_refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = url.into();
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Ask the authorization endpoint for a device code.
    ///
    /// - 200: a fresh [`DeviceGrant`]
    /// - 400: `ERR_PROTOCOL` with the server's error code
    /// - 401: `ERR_CREDENTIALS` with the server's error code
    /// - other statuses: `ERR_UNKNOWN`; transport failures: `ERR_NETWORK`
    pub async fn request_device_code(&self) -> Result<DeviceGrant, Failure> {
        let scope = self.credentials.scope_string();
        let (status, body) = self
            .post_form(
                &self.authorization_url,
                &[
                    ("client_id", self.credentials.client_id.as_str()),
                    ("scope", scope.as_str()),
                ],
            )
            .await?;
        debug!(status = status.as_u16(), "authorization request answered");

        match status {
            StatusCode::OK => {
                let payload: DeviceCodeResponse = parse_success(&body, "authorization")?;
                Ok(DeviceGrant::new(
                    payload.device_code,
                    payload.user_code,
                    payload.verification_url,
                    payload.expires_in,
                    payload
                        .interval
                        .filter(|secs| *secs > 0)
                        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
                ))
            }
            StatusCode::BAD_REQUEST => Err(Failure::new(
                ErrorKind::Protocol,
                ErrorBody::parse(&body).code(status),
            )),
            StatusCode::UNAUTHORIZED => Err(Failure::new(
                ErrorKind::Credentials,
                ErrorBody::parse(&body).code(status),
            )),
            _ => Err(Failure::new(
                ErrorKind::Unknown,
                ErrorBody::parse(&body).describe(status),
            )),
        }
    }

    /// Ask the token endpoint whether the user has completed verification.
    ///
    /// A 400 `authorization_pending` is the expected steady state and maps to
    /// [`PollStep::Pending`]. A 429 maps to [`PollStep::SlowDown`]; the caller
    /// applies the backoff to the grant.
    pub async fn poll(&self, grant: &DeviceGrant) -> PollStep {
        let response = self
            .post_form(
                &self.token_url,
                &[
                    ("client_id", self.credentials.client_id.as_str()),
                    ("client_secret", self.credentials.client_secret.as_str()),
                    ("code", grant.device_code.as_str()),
                    ("grant_type", DEVICE_GRANT_TYPE),
                ],
            )
            .await;
        let (status, body) = match response {
            Ok(answer) => answer,
            Err(failure) => return PollStep::Failed(failure),
        };
        debug!(status = status.as_u16(), "poll answered");

        match status {
            StatusCode::OK => match parse_token_response(&body) {
                Ok(payload) => match payload.refresh_token.filter(|value| !value.is_empty()) {
                    Some(refresh_token) => PollStep::Authorized {
                        token: Token::issued(
                            refresh_token,
                            payload.token_type,
                            payload.access_token,
                            payload.expires_in,
                        ),
                    },
                    None => PollStep::Failed(Failure::protocol(
                        "token response is missing refresh_token",
                    )),
                },
                Err(failure) => PollStep::Failed(failure),
            },
            StatusCode::BAD_REQUEST => {
                let error = ErrorBody::parse(&body);
                if error.error.as_deref() == Some(AUTHORIZATION_PENDING) {
                    PollStep::Pending
                } else {
                    PollStep::Failed(Failure::protocol(error.describe(status)))
                }
            }
            StatusCode::FORBIDDEN => PollStep::Failed(Failure::new(
                ErrorKind::AuthFailed,
                format!(
                    "{}: User cancelled authorization",
                    ErrorBody::parse(&body).code(status)
                ),
            )),
            StatusCode::TOO_MANY_REQUESTS => PollStep::SlowDown,
            _ => PollStep::Failed(Failure::new(
                ErrorKind::Unknown,
                ErrorBody::parse(&body).describe(status),
            )),
        }
    }

    /// Exchange the token's refresh token for a new access token.
    ///
    /// Returns a new [`Token`]; the input is left untouched whatever happens.
    pub async fn refresh(&self, token: &Token) -> Result<Token, Failure> {
        if token.refresh_token.is_empty() {
            return Err(Failure::new(
                ErrorKind::Credentials,
                "token has no refresh token",
            ));
        }
        let (status, body) = self
            .post_form(
                &self.refresh_url,
                &[
                    ("refresh_token", token.refresh_token.as_str()),
                    ("client_id", self.credentials.client_id.as_str()),
                    ("client_secret", self.credentials.client_secret.as_str()),
                    ("grant_type", REFRESH_GRANT_TYPE),
                ],
            )
            .await?;
        debug!(status = status.as_u16(), "refresh answered");

        match status {
            StatusCode::OK => {
                let payload = parse_token_response(&body)?;
                Ok(token.refreshed(
                    payload.access_token,
                    payload.token_type,
                    payload.expires_in,
                    payload.refresh_token,
                ))
            }
            StatusCode::UNAUTHORIZED => Err(Failure::new(
                ErrorKind::Credentials,
                ErrorBody::parse(&body).code(status),
            )),
            StatusCode::BAD_REQUEST => Err(Failure::protocol(
                ErrorBody::parse(&body).describe(status),
            )),
            _ => Err(Failure::new(
                ErrorKind::Unknown,
                ErrorBody::parse(&body).describe(status),
            )),
        }
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String), Failure> {
        let resp = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(alias = "verification_uri")]
    verification_url: String,
    expires_in: u64,
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    /// Bodies that are not JSON error objects yield an empty `ErrorBody`.
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The server's error code, or the HTTP status when there is none.
    fn code(&self, status: StatusCode) -> String {
        match self.error.as_deref() {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => format!("HTTP {status}"),
        }
    }

    /// `<code>: <description>`, degrading to whichever parts exist.
    fn describe(&self, status: StatusCode) -> String {
        let code = self.code(status);
        match self.error_description.as_deref() {
            Some(description) if !description.is_empty() => format!("{code}: {description}"),
            _ => code,
        }
    }
}

fn parse_success<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, Failure> {
    serde_json::from_str(body)
        .map_err(|err| Failure::protocol(format!("invalid {what} response: {err}")))
}

fn parse_token_response(body: &str) -> Result<TokenResponse, Failure> {
    parse_success(body, "token")
}
