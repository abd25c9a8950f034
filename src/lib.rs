//! booth-auth: OAuth2 device authorization for kiosk photobooths.
//!
//! A booth has no keyboard, so it obtains API access with the device flow:
//! the user is shown a short code and a URL, authorizes on a phone, and the
//! booth polls until the grant arrives. The refresh token is persisted and
//! exchanged for fresh access tokens on later runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use booth_auth::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> booth_auth::error::Result<()> {
//! let config = BoothConfig::load(None)?;
//! let authorizer = DeviceAuthorizer::new(config.client()?, Arc::new(NullSink));
//! let manager = AccessManager::new(authorizer, Arc::new(config.token_store()))
//!     .with_profile(config.profile());
//! let (token, _source) = manager.ensure_access(CancellationToken::new()).await?;
//! println!("{:?}", token.authorization_header());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
