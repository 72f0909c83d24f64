use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn generated(success_count: u32) -> Self {
        Notification {
            level: NotificationLevel::Success,
            message: format!("Timetable generated: {} of 3 algorithms succeeded", success_count),
        }
    }

    pub fn start_failed(reason: impl std::fmt::Display) -> Self {
        Notification {
            level: NotificationLevel::Error,
            message: format!("Failed to start timetable generation: {}", reason),
        }
    }
}

/// Receives the notifications of a [`GenerationController`](crate::tracking::GenerationController).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}
