//! Configuration system (layered: defaults < config file < env).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::client::DeviceAuthClient;
use crate::auth::credentials::Credentials;
use crate::auth::store::{default_booth_dir, FileTokenStore, TokenStoreConfig};
use crate::error::{BoothError, Result};

/// Settings for the device flow and token storage.
///
/// Inline `client_id`/`client_secret` win over `credentials_file`.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoothConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub scopes: Vec<String>,
    pub profile: Option<String>,
    pub token_dir: Option<PathBuf>,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
}

impl fmt::Debug for BoothConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoothConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| ".."))
            .field("credentials_file", &self.credentials_file)
            .field("scopes", &self.scopes)
            .field("profile", &self.profile)
            .field("token_dir", &self.token_dir)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl BoothConfig {
    /// `~/.booth-auth/config.toml`.
    pub fn default_path() -> PathBuf {
        default_booth_dir().join("config.toml")
    }

    /// Load every layer. An explicit `path` must exist; the default path is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_env())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            BoothError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `BOOTH_*` variables from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = get("BOOTH_CLIENT_ID") {
            self.client_id = Some(value);
        }
        if let Some(value) = get("BOOTH_CLIENT_SECRET") {
            self.client_secret = Some(value);
        }
        if let Some(value) = get("BOOTH_CREDENTIALS_FILE") {
            self.credentials_file = Some(PathBuf::from(value));
        }
        if let Some(value) = get("BOOTH_SCOPES") {
            self.scopes = value.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = get("BOOTH_PROFILE") {
            self.profile = Some(value);
        }
        if let Some(value) = get("BOOTH_TOKEN_DIR") {
            self.token_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("BOOTH_AUTHORIZATION_URL") {
            self.authorization_url = Some(value);
        }
        if let Some(value) = get("BOOTH_TOKEN_URL") {
            self.token_url = Some(value);
        }
        self
    }

    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }

    pub fn token_dir(&self) -> PathBuf {
        self.token_dir
            .clone()
            .unwrap_or_else(TokenStoreConfig::default_dir)
    }

    /// Resolve the client registration.
    pub fn credentials(&self) -> Result<Credentials> {
        if self.scopes.is_empty() {
            return Err(BoothError::Configuration(
                "no scopes configured (set `scopes` or BOOTH_SCOPES)".to_string(),
            ));
        }
        match (&self.client_id, &self.client_secret, &self.credentials_file) {
            (Some(id), Some(secret), _) => {
                Ok(Credentials::new(id.clone(), secret.clone(), self.scopes.clone()))
            }
            (_, _, Some(path)) => {
                Credentials::from_client_secrets_file(path, self.scopes.clone())
            }
            _ => Err(BoothError::Configuration(
                "no client credentials (set client_id and client_secret, or credentials_file)"
                    .to_string(),
            )),
        }
    }

    /// A client for the configured endpoints.
    pub fn client(&self) -> Result<DeviceAuthClient> {
        let mut client = DeviceAuthClient::new(self.credentials()?);
        if let Some(url) = &self.authorization_url {
            client = client.with_authorization_url(url.clone());
        }
        if let Some(url) = &self.token_url {
            client = client.with_token_url(url.clone());
        }
        Ok(client)
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(TokenStoreConfig::new(self.token_dir()))
    }
}
