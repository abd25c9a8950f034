//! CLI auth command handlers for login, refresh, status, and logout.

use std::sync::Arc;

use crate::auth::error::{AuthError, Failure, Recovery};
use crate::auth::notify::ChannelSink;
use crate::auth::outcome::Outcome;
use crate::auth::service::DeviceAuthorizer;
use crate::auth::store::TokenStore;
use crate::config::BoothConfig;
use crate::error::{BoothError, Result};

use super::ProfileArgs;

fn profile<'a>(config: &'a BoothConfig, args: &'a ProfileArgs) -> &'a str {
    args.profile.as_deref().unwrap_or_else(|| config.profile())
}

/// Handle `booth-auth auth login`.
pub async fn handle_login(config: &BoothConfig, args: &ProfileArgs) -> Result<()> {
    let profile = profile(config, args);
    let store = config.token_store();
    let (sink, mut outcomes) = ChannelSink::channel();
    let authorizer = DeviceAuthorizer::new(config.client()?, Arc::new(sink));
    let handle = authorizer.request_authorization();

    loop {
        let outcome = tokio::select! {
            outcome = outcomes.recv() => outcome,
            _ = tokio::signal::ctrl_c() => {
                handle.abort();
                outcomes.recv().await
            }
        };
        match outcome {
            Some(Outcome::VerificationRequired {
                user_code,
                verification_url,
                expires_in,
            }) => {
                println!("Visit:      {verification_url}");
                println!("Enter code: {user_code}");
                println!("Waiting for authorization (code valid for {expires_in}s)...");
            }
            Some(Outcome::Waiting) => {}
            Some(Outcome::Success { token }) => {
                store.save(profile, &token)?;
                println!("Authorized. Token saved to {}", store.token_path(profile).display());
                return Ok(());
            }
            Some(Outcome::Failed { kind, message }) => {
                return Err(BoothError::Authorization { kind, message });
            }
            None => break,
        }
    }

    handle.wait().await?;
    Ok(())
}

/// Handle `booth-auth auth refresh`.
pub async fn handle_refresh(config: &BoothConfig, args: &ProfileArgs) -> Result<()> {
    let profile = profile(config, args);
    let store = config.token_store();
    let token = store.load(profile)?.ok_or(AuthError::NotLoggedIn)?;

    let client = config.client()?;
    let refreshed = match client.refresh(&token).await {
        Ok(refreshed) => refreshed,
        Err(failure) => {
            if let Some(hint) = refresh_hint(&failure) {
                eprintln!("{hint}");
            }
            return Err(failure.into());
        }
    };
    store.save(profile, &refreshed)?;

    match refreshed.expires_at {
        Some(expires) => println!(
            "Access token refreshed (expires {})",
            expires.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Access token refreshed"),
    }
    Ok(())
}

/// Next step for the user after a failed refresh of a stored token.
fn refresh_hint(failure: &Failure) -> Option<&'static str> {
    match failure.kind.recovery(true) {
        Recovery::Reauthorize => {
            Some("The stored token was rejected. Run `booth-auth auth login` to authorize again.")
        }
        Recovery::RetryLater => Some("Refresh did not reach a verdict; try again later."),
        Recovery::SurfaceToUser => None,
    }
}

/// Handle `booth-auth auth status`.
pub async fn handle_status(config: &BoothConfig, args: &ProfileArgs) -> Result<()> {
    let profile = profile(config, args);
    let store = config.token_store();
    let path = store.token_path(profile);

    match store.load(profile) {
        Ok(Some(token)) => {
            println!("Profile {profile}: authorized ({} token)", token.token_type);
            println!("  Stored at {}", path.display());
        }
        Ok(None) => println!("Profile {profile}: not authorized"),
        Err(AuthError::Deserialization(reason)) => {
            println!("Profile {profile}: stored token unreadable ({reason})");
            println!("  Run `booth-auth auth login` to replace {}", path.display());
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Handle `booth-auth auth logout`.
pub async fn handle_logout(config: &BoothConfig, args: &ProfileArgs) -> Result<()> {
    let profile = profile(config, args);
    config.token_store().clear(profile)?;
    println!("Logged out profile {profile}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::ErrorKind;

    #[test]
    fn rejected_refresh_points_to_login() {
        for kind in [ErrorKind::Credentials, ErrorKind::Protocol] {
            let hint = refresh_hint(&Failure::new(kind, "invalid_grant")).unwrap();
            assert!(hint.contains("booth-auth auth login"), "{kind}");
        }
    }

    #[test]
    fn transient_refresh_failure_suggests_retry() {
        let hint = refresh_hint(&Failure::network("connection refused")).unwrap();
        assert!(!hint.contains("login"));
    }

    #[test]
    fn denied_refresh_has_no_hint() {
        assert_eq!(refresh_hint(&Failure::new(ErrorKind::AuthFailed, "denied")), None);
    }
}
