//! OAuth2 device authorization client and token lifecycle.

pub mod client;
pub mod credentials;
pub mod device_code;
pub mod error;
pub mod manager;
pub mod notify;
pub mod outcome;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod token;

pub use client::DeviceAuthClient;
pub use credentials::Credentials;
pub use device_code::{DeviceGrant, PollStep};
pub use error::{AuthError, ErrorKind, Failure, Recovery};
pub use manager::{AccessError, AccessManager, AccessSource};
pub use notify::{ChannelSink, NotificationSink, NullSink};
pub use outcome::Outcome;
pub use scheduler::{PollScheduler, SchedulerState};
pub use service::{AuthorizationHandle, DeviceAuthorizer, SessionId};
pub use store::{FileTokenStore, TokenStore, TokenStoreConfig};
pub use token::Token;
