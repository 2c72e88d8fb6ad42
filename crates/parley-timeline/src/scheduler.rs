//! Reply scheduling: a delayed-callback primitive and the reply state machine

use parley_types::MessageId;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A callback that runs once after a delay unless cancelled first
///
/// Dropping the handle cancels the callback. Once the callback has started it
/// runs to completion.
#[derive(Debug)]
pub struct DelayedTask {
    token: CancellationToken,
}

impl DelayedTask {
    /// Spawn `callback` on the current tokio runtime, to run after `delay`
    pub fn spawn<F>(delay: Duration, callback: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => callback.await,
            }
        });

        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Where the simulated reply is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyPhase {
    /// Ready to accept a new reply request
    #[default]
    Idle,
    /// Peer is "typing"; `reserved` is the id set aside for the reply
    Pending { reserved: MessageId },
    /// Reply delivered; requests are dropped until the cooldown ends
    Cooldown,
}

/// At-most-one-in-flight reply state machine
///
/// Requests that arrive outside [`ReplyPhase::Idle`] are dropped, not queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyScheduler {
    phase: ReplyPhase,
}

impl ReplyScheduler {
    pub fn phase(&self) -> ReplyPhase {
        self.phase
    }

    /// Idle -> Pending. Returns false (and changes nothing) in any other phase.
    pub fn try_begin(&mut self, reserved: MessageId) -> bool {
        if self.phase != ReplyPhase::Idle {
            return false;
        }
        self.phase = ReplyPhase::Pending { reserved };
        true
    }

    /// Pending -> Cooldown, yielding the reserved id
    pub fn complete(&mut self) -> Option<MessageId> {
        match self.phase {
            ReplyPhase::Pending { reserved } => {
                self.phase = ReplyPhase::Cooldown;
                Some(reserved)
            }
            ReplyPhase::Idle | ReplyPhase::Cooldown => None,
        }
    }

    /// Cooldown -> Idle
    pub fn release(&mut self) {
        if self.phase == ReplyPhase::Cooldown {
            self.phase = ReplyPhase::Idle;
        }
    }

    /// Typing indicator state
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, ReplyPhase::Pending { .. })
    }

    pub fn is_throttled(&self) -> bool {
        self.phase == ReplyPhase::Cooldown
    }

    /// Drop back to Idle regardless of phase
    pub fn reset(&mut self) {
        self.phase = ReplyPhase::Idle;
    }
}
