#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use booth_auth::auth::{
    AuthError, Credentials, DeviceAuthClient, DeviceAuthorizer, NotificationSink, Outcome, Token,
    TokenStore,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUTHORIZATION_PATH: &str = "/o/oauth2/device/code";
pub const TOKEN_PATH: &str = "/oauth2/v4/token";
pub const SCOPE: &str = "https://picasaweb.google.com/data/";

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, Token>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, profile: &str, token: Token) {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .insert(profile.to_string(), token);
    }

    pub fn get(&self, profile: &str) -> Option<Token> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .get(profile)
            .cloned()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self, profile: &str) -> Result<Option<Token>, AuthError> {
        Ok(self.get(profile))
    }

    fn save(&self, profile: &str, token: &Token) -> Result<(), AuthError> {
        self.seed(profile, token.clone());
        Ok(())
    }

    fn clear(&self, profile: &str) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .remove(profile);
        Ok(())
    }
}

/// Sink that keeps every outcome in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    outcomes: Mutex<Vec<Outcome>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().expect("sink lock poisoned").clone()
    }

    pub fn waiting_count(&self) -> usize {
        self.outcomes()
            .iter()
            .filter(|outcome| matches!(outcome, Outcome::Waiting))
            .count()
    }

    pub fn terminal(&self) -> Vec<Outcome> {
        self.outcomes()
            .into_iter()
            .filter(Outcome::is_terminal)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, outcome: Outcome) {
        self.outcomes
            .lock()
            .expect("sink lock poisoned")
            .push(outcome);
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("booth-client.apps", "booth-secret", [SCOPE])
}

/// Client whose endpoints all point at `server`.
///
/// Idle pooling is disabled so no background timer exists while tests run
/// with paused time.
pub fn client(server: &MockServer) -> DeviceAuthClient {
    client_at(&server.uri())
}

pub fn client_at(base: &str) -> DeviceAuthClient {
    let http = reqwest::Client::builder()
        .pool_idle_timeout(None)
        .build()
        .expect("http client");
    DeviceAuthClient::new(credentials())
        .with_http_client(http)
        .with_authorization_url(format!("{base}{AUTHORIZATION_PATH}"))
        .with_token_url(format!("{base}{TOKEN_PATH}"))
}

pub fn authorizer(server: &MockServer, sink: Arc<RecordingSink>) -> DeviceAuthorizer {
    DeviceAuthorizer::new(client(server), sink)
}

/// Base URL of a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn device_code(interval: u64, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "device_code": "4/device-code",
        "user_code": "GQVQ-JKEC",
        "verification_url": "https://www.google.com/device",
        "expires_in": expires_in,
        "interval": interval
    }))
}

pub async fn mount_device_code(server: &MockServer, interval: u64, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path(AUTHORIZATION_PATH))
        .respond_with(device_code(interval, expires_in))
        .mount(server)
        .await;
}

pub fn pending() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": "authorization_pending",
        "error_description": "Precondition Required"
    }))
}

pub fn granted() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "ya29.granted",
        "refresh_token": "1//granted-refresh",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}
