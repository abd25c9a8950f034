//! Convenience re-exports for common use.

pub use crate::auth::{
    AccessManager, AccessSource, AuthorizationHandle, ChannelSink, Credentials,
    DeviceAuthClient, DeviceAuthorizer, ErrorKind, Failure, FileTokenStore, NotificationSink,
    NullSink, Outcome, Token, TokenStore,
};
pub use crate::config::BoothConfig;
pub use crate::error::{BoothError, Result};
