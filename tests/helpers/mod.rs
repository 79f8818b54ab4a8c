#![allow(dead_code)]
pub mod app;
pub mod recording_subscriber;

use ansd::NotificationRequest;

/// A basic-text request as the acceptance suites publish it.
pub fn basic_request(id: i32, label: &str) -> NotificationRequest {
    NotificationRequest::basic(id, "test_title", "test_text").with_label(label)
}
