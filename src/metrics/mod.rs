//! Metric names and recording helpers for the notification service.
//!
//! Recording goes through the `metrics` facade; nothing is captured until a
//! recorder such as [`logging_recorder::LoggingRecorder`] is installed.

pub mod logging_recorder;

use crate::core::DeleteReason;

pub const NOTIFICATIONS_PUBLISHED: &str = "notifications_published_total";
pub const NOTIFICATIONS_REMOVED: &str = "notifications_removed_total";
pub const SUBSCRIBER_EVENTS: &str = "subscriber_events_total";
pub const ACTIVE_NOTIFICATIONS: &str = "active_notifications";

pub fn record_published() {
    metrics::counter!(NOTIFICATIONS_PUBLISHED).increment(1);
}

pub fn record_removed(reason: DeleteReason, count: usize) {
    metrics::counter!(NOTIFICATIONS_REMOVED, "reason" => reason.as_str()).increment(count as u64);
}

pub fn record_subscriber_event(kind: &'static str) {
    metrics::counter!(SUBSCRIBER_EVENTS, "kind" => kind).increment(1);
}

pub fn set_active(count: usize) {
    metrics::gauge!(ACTIVE_NOTIFICATIONS).set(count as f64);
}
