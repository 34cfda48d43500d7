//! Notification sinks shipped with the engine.

use profile_traits::{Notification, NotificationSink, Severity};

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn send(&self, _notification: Notification) {}
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn send(&self, n: Notification) {
        match n.severity {
            Severity::Urgent => {
                tracing::error!(code = n.code.as_str(), message = %n.message, "notification");
            }
            Severity::Normal => {
                tracing::warn!(code = n.code.as_str(), message = %n.message, "notification");
            }
            Severity::Low => {
                tracing::info!(code = n.code.as_str(), message = %n.message, "notification");
            }
        }
    }
}
