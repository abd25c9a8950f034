//! Sequential poll loop for one device authorization session.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::DeviceAuthClient;
use super::device_code::{DeviceGrant, PollStep};
use super::error::{ErrorKind, Failure};
use super::notify::NotificationSink;
use super::outcome::Outcome;
use super::token::Token;

/// Lifecycle of a [`PollScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
    Succeeded,
    Failed,
}

/// Drives `poll()` until the server returns a non-pending answer.
///
/// Each cycle sleeps for the grant's current interval, then polls once:
/// pending answers are reported as [`Outcome::Waiting`] and polling goes on;
/// rate-limit answers widen the interval silently; anything else is terminal
/// and reported exactly once. The sleep races the cancellation token, and the
/// grant's local deadline is checked before every poll, so the loop always
/// terminates even if the server never does.
#[derive(Debug)]
pub struct PollScheduler {
    state: SchedulerState,
    polls: u32,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            polls: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of poll requests issued so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub async fn run(
        &mut self,
        client: &DeviceAuthClient,
        grant: &mut DeviceGrant,
        sink: &dyn NotificationSink,
        cancel: &CancellationToken,
    ) -> Result<Token, Failure> {
        if self.state != SchedulerState::Idle {
            return Err(Failure::new(
                ErrorKind::Unknown,
                "poll scheduler already ran",
            ));
        }
        self.state = SchedulerState::Polling;
        info!(
            interval_secs = grant.interval_secs,
            expires_in = grant.expires_in_secs,
            "polling for device authorization"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return self.fail(sink, Failure::cancelled());
                }
                _ = tokio::time::sleep_until(next_poll_at(grant)) => {}
            }

            if grant.is_expired() {
                return self.fail(
                    sink,
                    Failure::new(
                        ErrorKind::Timeout,
                        format!(
                            "device code expired after {}s without a server answer",
                            grant.expires_in_secs
                        ),
                    ),
                );
            }

            self.polls += 1;
            match client.poll(grant).await {
                PollStep::Pending => {
                    debug!(poll = self.polls, "authorization pending");
                    sink.notify(Outcome::Waiting);
                }
                PollStep::SlowDown => {
                    grant.back_off();
                    debug!(
                        poll = self.polls,
                        interval_secs = grant.interval_secs,
                        "rate limited; slowing down"
                    );
                }
                PollStep::Authorized { token } => {
                    self.state = SchedulerState::Succeeded;
                    info!(polls = self.polls, "device authorization granted");
                    sink.notify(Outcome::Success {
                        token: token.clone(),
                    });
                    return Ok(token);
                }
                PollStep::Failed(failure) => return self.fail(sink, failure),
            }
        }
    }

    fn fail(&mut self, sink: &dyn NotificationSink, failure: Failure) -> Result<Token, Failure> {
        self.state = SchedulerState::Failed;
        warn!(kind = %failure.kind, polls = self.polls, "device authorization failed");
        sink.notify(failure.clone().into());
        Err(failure)
    }
}

/// One interval from now, but never later than the grant's deadline.
fn next_poll_at(grant: &DeviceGrant) -> Instant {
    Instant::now()
        .checked_add(grant.interval())
        .map_or(grant.deadline(), |at| at.min(grant.deadline()))
}
