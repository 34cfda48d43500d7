//! Test and helper mocks for profile_core

use profile_traits::{Notification, NotificationCode, NotificationSink};
use std::sync::Mutex;

/// Sink that keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn codes(&self) -> Vec<NotificationCode> {
        self.sent().into_iter().map(|n| n.code).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, notification: Notification) {
        match self.sent.lock() {
            Ok(mut g) => g.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
