//! Collaborator seams for the profile engine.
//!
//! The engine never talks to a UI, a message bus, or the OS clock directly.
//! It reads time through [`WallClock`] and publishes user-facing corrections
//! through [`NotificationSink`].
pub mod clock;

pub use clock::{FixedClock, SystemClock, WallClock, ZonedClock};

/// Stable identifiers for notifications emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationCode {
    BasalProfileNotAlignedToHours,
    MinimalBasalValueReplaced,
    MaximumBasalValueReplaced,
}

impl NotificationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasalProfileNotAlignedToHours => "basal_profile_not_aligned_to_hours",
            Self::MinimalBasalValueReplaced => "minimal_basal_value_replaced",
            Self::MaximumBasalValueReplaced => "maximum_basal_value_replaced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Normal,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub code: NotificationCode,
    pub message: String,
    pub severity: Severity,
}

/// Fire-and-forget delivery of user-facing notifications.
pub trait NotificationSink {
    fn send(&self, notification: Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &T {
    fn send(&self, notification: Notification) {
        (**self).send(notification);
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn send(&self, notification: Notification) {
        (**self).send(notification);
    }
}
