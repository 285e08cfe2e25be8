//! User-facing notice seam.
//!
//! The host application owns notice presentation (status bar, toast,
//! terminal). The orchestration logic only emits messages through
//! [`Notifier`]; [`LogNotifier`] forwards them to the tracing pipeline
//! when no richer presentation exists.

use std::sync::Mutex;

use tracing::info;

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier forwarding notices to `tracing`.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(target: "pagesmith::notice", "{message}");
    }
}

/// Notifier that records every message, for assertions in tests and
/// for hosts that batch notices.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
