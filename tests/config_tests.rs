//! Tests for configuration loading.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use booth_auth::auth::client::{DEFAULT_AUTHORIZATION_URL, DEFAULT_TOKEN_URL};
use booth_auth::config::BoothConfig;
use booth_auth::error::BoothError;
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 8] = [
    "BOOTH_CLIENT_ID",
    "BOOTH_CLIENT_SECRET",
    "BOOTH_CREDENTIALS_FILE",
    "BOOTH_SCOPES",
    "BOOTH_PROFILE",
    "BOOTH_TOKEN_DIR",
    "BOOTH_AUTHORIZATION_URL",
    "BOOTH_TOKEN_URL",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_config_env() -> EnvGuard {
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    guard
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn load_reads_explicit_file() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        client_id = "booth-client.apps"
        client_secret = "booth-secret"
        scopes = ["https://picasaweb.google.com/data/"]
        profile = "lobby"
        "#,
    );

    let config = BoothConfig::load(Some(&path)).unwrap();

    assert_eq!(config.profile(), "lobby");
    let creds = config.credentials().unwrap();
    assert_eq!(creds.client_id, "booth-client.apps");
    assert_eq!(creds.scope_string(), "https://picasaweb.google.com/data/");
}

#[test]
fn environment_overrides_file() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        client_id = "file-client"
        client_secret = "file-secret"
        scopes = ["scope-from-file"]
        "#,
    );
    std::env::set_var("BOOTH_CLIENT_ID", "env-client");
    std::env::set_var("BOOTH_SCOPES", "scope-a scope-b");
    std::env::set_var("BOOTH_TOKEN_DIR", dir.path().join("tokens"));

    let config = BoothConfig::load(Some(&path)).unwrap();

    let creds = config.credentials().unwrap();
    assert_eq!(creds.client_id, "env-client");
    assert_eq!(creds.client_secret, "file-secret");
    assert_eq!(creds.scope_string(), "scope-a scope-b");
    assert_eq!(config.token_dir(), dir.path().join("tokens"));
}

#[test]
fn credentials_file_from_environment() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();
    let secrets = dir.path().join("client_secret.json");
    fs::write(
        &secrets,
        r#"{"installed": {"client_id": "installed-id", "client_secret": "installed-secret"}}"#,
    )
    .unwrap();
    let path = write_config(&dir, "scopes = [\"https://picasaweb.google.com/data/\"]");
    std::env::set_var("BOOTH_CREDENTIALS_FILE", &secrets);

    let config = BoothConfig::load(Some(&path)).unwrap();

    assert_eq!(config.credentials().unwrap().client_id, "installed-id");
}

#[test]
fn missing_explicit_file_is_configuration_error() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();

    let err = BoothConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();

    assert!(matches!(err, BoothError::Configuration(_)));
}

#[test]
fn malformed_file_is_toml_error() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "scopes = \"not-a-list\"");

    let err = BoothConfig::load(Some(&path)).unwrap_err();

    assert!(matches!(err, BoothError::Toml(_)));
}

#[test]
fn client_requires_credentials() {
    let _lock = env_lock_guard();
    let _env = clear_config_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "scopes = [\"https://picasaweb.google.com/data/\"]");

    let config = BoothConfig::load(Some(&path)).unwrap();

    assert!(matches!(config.client(), Err(BoothError::Configuration(_))));
}

#[test]
fn default_endpoints_are_the_provider_ones() {
    assert_eq!(
        DEFAULT_AUTHORIZATION_URL,
        "https://accounts.google.com/o/oauth2/device/code"
    );
    assert_eq!(DEFAULT_TOKEN_URL, "https://www.googleapis.com/oauth2/v4/token");
}

#[test]
fn default_path_lives_in_booth_dir() {
    let path = BoothConfig::default_path();
    assert!(path.ends_with(".booth-auth/config.toml"));
}
