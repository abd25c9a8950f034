use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::BoothError;

/// Client registration used for every request. Never persisted by this crate.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Scopes as transmitted on the wire: space-joined, in order, duplicates
    /// dropped.
    pub fn scope_string(&self) -> String {
        let mut seen: Vec<&str> = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            let scope = scope.trim();
            if !scope.is_empty() && !seen.contains(&scope) {
                seen.push(scope);
            }
        }
        seen.join(" ")
    }

    /// Load a client-secrets file as downloaded from the provider's developer
    /// console (`{"installed": {"client_id": .., "client_secret": ..}}`).
    pub fn from_client_secrets_file(
        path: impl AsRef<Path>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, BoothError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            BoothError::Configuration(format!(
                "cannot read credentials file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_client_secrets_json(&raw, scopes)
    }

    pub fn from_client_secrets_json(
        raw: &str,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, BoothError> {
        let file: ClientSecretsFile = serde_json::from_str(raw)?;
        let section = file.installed.or(file.web).ok_or_else(|| {
            BoothError::Configuration(
                "credentials file has no \"installed\" or \"web\" section".to_string(),
            )
        })?;
        if section.client_id.is_empty() || section.client_secret.is_empty() {
            return Err(BoothError::Configuration(
                "credentials file has an empty client_id or client_secret".to_string(),
            ));
        }
        Ok(Self::new(section.client_id, section.client_secret, scopes))
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecretsSection>,
    web: Option<ClientSecretsSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsSection {
    client_id: String,
    client_secret: String,
}
