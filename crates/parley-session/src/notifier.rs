use parking_lot::Mutex;
use tracing::{error, info};

/// Transient user-facing notifications ("toasts")
///
/// Fire-and-forget: callers never inspect a result.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Notifier that writes to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(target: "parley::toast", "{}", message);
    }

    fn notify_error(&self, message: &str) {
        error!(target: "parley::toast", "{}", message);
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Notifier that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Error(msg) => Some(msg.clone()),
                Notification::Success(_) => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Success(msg) => Some(msg.clone()),
                Notification::Error(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.seen.lock().push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.seen.lock().push(Notification::Error(message.to_string()));
    }
}
