use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

use super::error::Failure;
use super::token::{expiry_from_now, Token};

/// Seconds added to the poll interval each time the server rate-limits us.
pub const BACKOFF_INCREMENT_SECS: u64 = 2;

/// Shortest pause between two polls.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Server-issued state for one authorization session.
///
/// Lives from a successful authorization request until polling reaches a
/// terminal outcome. `interval_secs` grows by [`BACKOFF_INCREMENT_SECS`] on
/// every rate-limited poll.
///
/// # Example
/// ```
/// use booth_auth::auth::DeviceGrant;
///
/// let mut grant = DeviceGrant::new("device-code", "ABCD-EFGH", "https://www.google.com/device", 1800, 5);
/// grant.back_off();
/// assert_eq!(grant.interval_secs, 7);
/// ```
#[derive(Debug, Clone)]
pub struct DeviceGrant {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in_secs: u64,
    pub interval_secs: u64,
    /// Number of rate-limit backoffs applied so far.
    pub backoffs: u32,
    pub expires_at: DateTime<Utc>,
    deadline: Instant,
}

impl DeviceGrant {
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_url: impl Into<String>,
        expires_in_secs: u64,
        interval_secs: u64,
    ) -> Self {
        let deadline = Instant::now()
            .checked_add(Duration::from_secs(expires_in_secs))
            .unwrap_or_else(far_future);
        Self {
            device_code: device_code.into(),
            user_code: user_code.into(),
            verification_url: verification_url.into(),
            expires_in_secs,
            interval_secs,
            backoffs: 0,
            expires_at: expiry_from_now(expires_in_secs),
            deadline,
        }
    }

    /// Pause before the next poll, never shorter than
    /// [`MIN_POLL_INTERVAL_SECS`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Slow down after a rate-limit response.
    pub fn back_off(&mut self) {
        self.interval_secs = self.interval_secs.saturating_add(BACKOFF_INCREMENT_SECS);
        self.backoffs += 1;
    }

    /// Whether the device code has lapsed locally.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

/// Classified result of a single poll request.
#[derive(Debug, Clone)]
pub enum PollStep {
    /// The user has not finished verification yet.
    Pending,
    /// The server rate-limited the poll; slow down and try again.
    SlowDown,
    /// The user granted access.
    Authorized { token: Token },
    /// Terminal failure; polling stops.
    Failed(Failure),
}
