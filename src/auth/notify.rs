//! Delivery of [`Outcome`] values to the caller.
//!
//! The preferred sink is [`ChannelSink`]: outcomes are posted onto a tokio
//! channel and the caller's event loop drains the receiver on its own thread.
//! Closures are accepted too, but they run on the worker task.

use tokio::sync::mpsc;

use super::outcome::Outcome;

/// Receives exactly one call per outcome, in order, with no buffering.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, outcome: Outcome);
}

impl<F> NotificationSink for F
where
    F: Fn(Outcome) + Send + Sync + ?Sized,
{
    fn notify(&self, outcome: Outcome) {
        (self)(outcome)
    }
}

/// Sink that forwards outcomes onto an unbounded mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Outcome>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Outcome>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver the caller's event loop should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, outcome: Outcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("outcome receiver dropped; notification discarded");
        }
    }
}

/// Sink that drops everything, for callers that only use return values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _outcome: Outcome) {}
}
