//! Short-lived user notices.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{error, info};

/// Display time for progress messages ("Loading preview…").
pub const TRANSIENT: Duration = Duration::from_secs(2);

/// Display time for results and errors.
pub const RESULT: Duration = Duration::from_secs(3);

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    /// Progress or success.
    Info,
    /// Something the user has to act on.
    Error,
}

/// A message the host shows for a limited time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
    /// How long the host keeps it visible.
    pub duration: Duration,
}

impl Notice {
    /// An informational notice shown for `duration`.
    pub fn info(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            duration,
        }
    }

    /// An error notice, shown for [`RESULT`].
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            duration: RESULT,
        }
    }
}

/// Where notices go. Hosts implement this with their toast/message API.
pub trait Notifier: Send + Sync {
    /// Show `notice` to the user.
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(message = %notice.message, "notice"),
            NoticeLevel::Error => error!(message = %notice.message, "notice"),
        }
    }
}

/// Keeps every notice in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages only, for terse assertions.
    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_use_result_duration() {
        let notice = Notice::error("boom");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.duration, RESULT);
        assert_eq!(notice.level.to_string(), "error");
    }

    #[test]
    fn memory_notifier_keeps_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notice::info("first", TRANSIENT));
        notifier.notify(Notice::error("second"));
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }
}
