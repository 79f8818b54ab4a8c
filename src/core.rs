//! Core domain types and the subscriber contract of the notification service.
//!
//! Wire-facing types serialize with camelCase field names so their JSON shape
//! matches the data objects callers already exchange.

use crate::dnd::DoNotDisturbDate;
use crate::error::{NotificationError, Result};
use crate::slots::{NotificationSlot, SlotType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies a bundle, optionally narrowed to one uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BundleOption {
    pub bundle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i32>,
}

impl BundleOption {
    pub fn new(bundle: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
            uid: None,
        }
    }

    pub fn with_uid(bundle: impl Into<String>, uid: i32) -> Self {
        Self {
            bundle: bundle.into(),
            uid: Some(uid),
        }
    }

    /// A missing uid matches any uid of the bundle.
    pub fn matches(&self, bundle: &str, uid: i32) -> bool {
        self.bundle == bundle && self.uid.map_or(true, |u| u == uid)
    }
}

/// Identity of a notification inside its creator bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub id: i32,
    #[serde(default)]
    pub label: String,
}

impl NotificationKey {
    pub fn new(id: i32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "NOTIFICATION_CONTENT_BASIC_TEXT")]
    BasicText,
    #[serde(rename = "NOTIFICATION_CONTENT_LONG_TEXT")]
    LongText,
    #[serde(rename = "NOTIFICATION_CONTENT_PICTURE")]
    Picture,
    #[serde(rename = "NOTIFICATION_CONTENT_CONVERSATION")]
    Conversation,
    #[serde(rename = "NOTIFICATION_CONTENT_MULTILINE")]
    MultiLine,
    #[serde(rename = "NOTIFICATION_CONTENT_MEDIA")]
    Media,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicContent {
    pub title: String,
    pub text: String,
    pub additional_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LongTextContent {
    pub title: String,
    pub text: String,
    pub additional_text: String,
    pub long_text: String,
    pub brief_text: String,
    pub expanded_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MultiLineContent {
    pub title: String,
    pub text: String,
    pub additional_text: String,
    pub brief_text: String,
    pub long_title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PictureContent {
    pub title: String,
    pub text: String,
    pub additional_text: String,
    pub brief_text: String,
    pub expanded_title: String,
    /// Location of the picture; the service never loads it.
    pub picture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationContent {
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal: Option<BasicContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_text: Option<LongTextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_line: Option<MultiLineContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<PictureContent>,
}

impl NotificationContent {
    pub fn basic(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::BasicText,
            normal: Some(BasicContent {
                title: title.into(),
                text: text.into(),
                additional_text: String::new(),
            }),
            ..Default::default()
        }
    }

    /// The payload matching `content_type` must be present with a non-empty
    /// title and text.
    pub fn validate(&self) -> Result<()> {
        let (title, text) = match self.content_type {
            ContentType::BasicText | ContentType::Conversation | ContentType::Media => {
                self.normal.as_ref().map(|c| (&c.title, &c.text))
            }
            ContentType::LongText => self.long_text.as_ref().map(|c| (&c.title, &c.text)),
            ContentType::MultiLine => self.multi_line.as_ref().map(|c| (&c.title, &c.text)),
            ContentType::Picture => self.picture.as_ref().map(|c| (&c.title, &c.text)),
        }
        .ok_or_else(|| {
            NotificationError::InvalidParam(format!(
                "content of type {:?} has no matching payload",
                self.content_type
            ))
        })?;

        if title.is_empty() || text.is_empty() {
            return Err(NotificationError::InvalidParam(
                "content title and text must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A notification as submitted by its creator and echoed to subscribers.
///
/// `hash_code`, `creator_bundle_name` and `creator_uid` are assigned by the
/// service on publish; values supplied by the caller are overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationRequest {
    pub content: NotificationContent,
    pub id: i32,
    pub slot_type: SlotType,
    pub is_ongoing: bool,
    pub is_unremovable: bool,
    pub delivery_time: i64,
    pub tap_dismissed: bool,
    pub auto_deleted_time: i64,
    pub color: u32,
    pub color_enabled: bool,
    pub is_alert_once: bool,
    pub is_stopwatch: bool,
    pub is_count_down: bool,
    pub progress_value: u32,
    pub progress_max_value: u32,
    pub is_indeterminate: bool,
    pub status_bar_text: String,
    pub is_floating_icon: bool,
    pub label: String,
    pub badge_icon_style: i32,
    pub show_delivery_time: bool,
    pub hash_code: String,
    pub creator_bundle_name: String,
    pub creator_uid: i32,
}

impl Default for NotificationRequest {
    fn default() -> Self {
        Self {
            content: NotificationContent::default(),
            id: 0,
            slot_type: SlotType::default(),
            is_ongoing: false,
            is_unremovable: false,
            delivery_time: 0,
            tap_dismissed: true,
            auto_deleted_time: 0,
            color: 0,
            color_enabled: false,
            is_alert_once: false,
            is_stopwatch: false,
            is_count_down: false,
            progress_value: 0,
            progress_max_value: 0,
            is_indeterminate: false,
            status_bar_text: String::new(),
            is_floating_icon: false,
            label: String::new(),
            badge_icon_style: 0,
            show_delivery_time: false,
            hash_code: String::new(),
            creator_bundle_name: String::new(),
            creator_uid: 0,
        }
    }
}

impl NotificationRequest {
    /// A basic-text request, the shape most callers publish.
    pub fn basic(id: i32, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            content: NotificationContent::basic(title, text),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_slot_type(mut self, slot_type: SlotType) -> Self {
        self.slot_type = slot_type;
        self
    }

    pub fn key(&self) -> NotificationKey {
        NotificationKey::new(self.id, self.label.clone())
    }
}

/// Restricts which notifications a subscriber receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeInfo {
    /// When non-empty, only notifications created by these bundles are delivered.
    pub bundle_names: Vec<String>,
}

impl SubscribeInfo {
    pub fn for_bundles<I, S>(bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bundle_names: bundles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, bundle: &str) -> bool {
        self.bundle_names.is_empty() || self.bundle_names.iter().any(|b| b == bundle)
    }
}

/// Why a notification left the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeleteReason {
    /// Removed by hash code or by key through the system API.
    CancelReasonDelete,
    /// Removed by `remove_all`.
    CancelAllReasonDelete,
    /// Cancelled by the owning application.
    AppCancelReasonDelete,
    /// Cancelled by the owning application's `cancel_all`.
    AppCancelAllReasonDelete,
}

impl DeleteReason {
    pub fn code(self) -> i32 {
        match self {
            Self::CancelReasonDelete => 2,
            Self::CancelAllReasonDelete => 3,
            Self::AppCancelReasonDelete => 8,
            Self::AppCancelAllReasonDelete => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CancelReasonDelete => "cancel",
            Self::CancelAllReasonDelete => "cancel_all",
            Self::AppCancelReasonDelete => "app_cancel",
            Self::AppCancelAllReasonDelete => "app_cancel_all",
        }
    }
}

/// Presentation state of one stored notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSorting {
    pub hash_code: String,
    pub slot: NotificationSlot,
    pub ranking: u64,
    pub is_display_badge: bool,
    pub is_hidden_notification: bool,
}

/// Sortings of every stored notification, with `hash_codes` in ranking order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSortingMap {
    pub sortings: HashMap<String, NotificationSorting>,
    pub hash_codes: Vec<String>,
}

impl NotificationSortingMap {
    pub fn get(&self, hash_code: &str) -> Option<&NotificationSorting> {
        self.sortings.get(hash_code)
    }

    pub fn len(&self) -> usize {
        self.hash_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash_codes.is_empty()
    }
}

/// Payload of `on_consume` and `on_cancel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeCallbackData {
    pub request: NotificationRequest,
    pub sorting_map: NotificationSortingMap,
    /// Set on `on_cancel` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DeleteReason>,
}

// =============================================================================
// Subscriber Trait
// =============================================================================

/// Receives notification events from the service.
///
/// Every callback runs on the subscriber's own dispatch task, in the order the
/// service produced the events, so a callback may call back into the service.
/// All methods default to no-ops.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// A notification was published or republished.
    async fn on_consume(&self, _data: SubscribeCallbackData) {}

    /// A notification was removed or cancelled.
    async fn on_cancel(&self, _data: SubscribeCallbackData) {}

    /// The set of stored notifications or their presentation changed.
    async fn on_update(&self, _sorting_map: NotificationSortingMap) {}

    async fn on_connect(&self) {}

    async fn on_disconnect(&self) {}

    async fn on_do_not_disturb_date_change(&self, _date: DoNotDisturbDate) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "id": 1,
            "label": "0100",
            "content": {
                "contentType": "NOTIFICATION_CONTENT_BASIC_TEXT",
                "normal": {"title": "test_title", "text": "test_text"}
            }
        }"#;
        let request: NotificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.id, 1);
        assert_eq!(request.label, "0100");
        assert!(request.tap_dismissed);
        assert_eq!(request.slot_type, SlotType::OtherTypes);
        assert!(request.content.validate().is_ok());
    }

    #[test]
    fn test_content_requires_matching_payload() {
        let mut content = NotificationContent::basic("title", "text");
        content.content_type = ContentType::LongText;
        assert!(matches!(
            content.validate(),
            Err(NotificationError::InvalidParam(_))
        ));

        let empty_title = NotificationContent::basic("", "text");
        assert!(empty_title.validate().is_err());
    }

    #[test]
    fn test_bundle_option_without_uid_matches_any_uid() {
        let option = BundleOption::new("com.example.a");
        assert!(option.matches("com.example.a", 100));
        assert!(option.matches("com.example.a", 200));
        assert!(!option.matches("com.example.b", 100));

        let narrowed = BundleOption::with_uid("com.example.a", 100);
        assert!(narrowed.matches("com.example.a", 100));
        assert!(!narrowed.matches("com.example.a", 200));
    }

    #[test]
    fn test_subscribe_info_filter() {
        assert!(SubscribeInfo::default().accepts("anything"));
        let info = SubscribeInfo::for_bundles(["com.example.a"]);
        assert!(info.accepts("com.example.a"));
        assert!(!info.accepts("com.example.b"));
    }
}
