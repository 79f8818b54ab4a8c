//! A simple subscriber that logs every event it receives.
//!
//! Attached by the application when `service.log_events` is on; also handy
//! for watching the service while debugging.

use crate::core::{NotificationSortingMap, SubscribeCallbackData, Subscriber};
use crate::dnd::DoNotDisturbDate;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl LoggingSubscriber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscriber for LoggingSubscriber {
    async fn on_consume(&self, data: SubscribeCallbackData) {
        let request = &data.request;
        info!(
            hash_code = %request.hash_code,
            bundle = %request.creator_bundle_name,
            id = request.id,
            label = %request.label,
            "Notification consumed"
        );
    }

    async fn on_cancel(&self, data: SubscribeCallbackData) {
        let request = &data.request;
        info!(
            hash_code = %request.hash_code,
            bundle = %request.creator_bundle_name,
            reason = ?data.reason,
            "Notification cancelled"
        );
    }

    async fn on_update(&self, sorting_map: NotificationSortingMap) {
        info!(active = sorting_map.len(), "Notification sorting updated");
    }

    async fn on_connect(&self) {
        info!("LoggingSubscriber connected.");
    }

    async fn on_disconnect(&self) {
        info!("LoggingSubscriber disconnected.");
    }

    async fn on_do_not_disturb_date_change(&self, date: DoNotDisturbDate) {
        info!(?date, "Do-not-disturb date changed");
    }
}
