//! Slots, do-not-disturb and the per-bundle switches.

mod helpers;

use ansd::dnd::{DoNotDisturbDate, DoNotDisturbType};
use ansd::slots::{NotificationSlot, SlotLevel, SlotType};
use ansd::{BundleOption, NotificationError};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use helpers::app::{TestApp, TestAppBuilder, APP_BUNDLE, APP_UID, OTHER_BUNDLE};
use helpers::basic_request;
use helpers::recording_subscriber::{Event, RecordingSubscriber};
use std::time::Duration;

#[tokio::test]
async fn test_publish_creates_default_slot() {
    let app = TestApp::start().await;
    assert!(app.client.get_slots().await.unwrap().is_empty());

    let request = basic_request(1, "").with_slot_type(SlotType::SocialCommunication);
    app.client.publish(request).await.unwrap();

    let slots = app.client.get_slots().await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].slot_type, SlotType::SocialCommunication);
    assert_eq!(slots[0].level, SlotLevel::High);
    assert!(slots[0].vibration_enabled);

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_slot_lifecycle() {
    let app = TestApp::start().await;

    let mut custom = NotificationSlot::for_type(SlotType::ContentInformation);
    custom.desc = "news".to_string();
    custom.level = SlotLevel::High;
    app.client.add_slot(custom.clone()).await.unwrap();

    // Adding by type keeps the customised slot.
    app.client
        .add_slot_by_type(SlotType::ContentInformation)
        .await
        .unwrap();
    let stored = app
        .client
        .get_slot(SlotType::ContentInformation)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, custom);

    app.client
        .add_slots(vec![
            NotificationSlot::for_type(SlotType::ServiceInformation),
            NotificationSlot::for_type(SlotType::UnknownType),
        ])
        .await
        .unwrap();
    let types: Vec<SlotType> = app
        .client
        .get_slots()
        .await
        .unwrap()
        .iter()
        .map(|slot| slot.slot_type)
        .collect();
    assert_eq!(
        types,
        vec![
            SlotType::ServiceInformation,
            SlotType::ContentInformation,
            SlotType::OtherTypes
        ]
    );

    app.client
        .remove_slot(SlotType::ServiceInformation)
        .await
        .unwrap();
    let err = app
        .client
        .remove_slot(SlotType::ServiceInformation)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 1_600_005);

    assert_eq!(app.client.remove_all_slots().await.unwrap(), 2);
    assert!(app
        .client
        .get_slot(SlotType::ContentInformation)
        .await
        .unwrap()
        .is_none());

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_slots_by_bundle_are_system_apis() {
    let app = TestApp::start().await;
    let option = BundleOption::with_uid(APP_BUNDLE, APP_UID);
    app.client
        .add_slot_by_type(SlotType::ServiceInformation)
        .await
        .unwrap();

    assert_eq!(
        app.system
            .get_slot_num_by_bundle(option.clone())
            .await
            .unwrap(),
        1
    );
    let err = app
        .client
        .get_slots_by_bundle(option.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::NotSystemApp(_)));

    let mut louder = NotificationSlot::for_type(SlotType::ServiceInformation);
    louder.level = SlotLevel::High;
    app.system
        .set_slot_by_bundle(option.clone(), louder)
        .await
        .unwrap();
    let slots = app.system.get_slots_by_bundle(option.clone()).await.unwrap();
    assert_eq!(slots[0].level, SlotLevel::High);

    // Only slots the bundle already has can be set.
    let err = app
        .system
        .set_slot_by_bundle(
            option,
            NotificationSlot::for_type(SlotType::SocialCommunication),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::SlotNotFound(_)));

    assert_eq!(
        app.system
            .get_slot_num_by_bundle(BundleOption::new(OTHER_BUNDLE))
            .await
            .unwrap(),
        0
    );

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_dnd_set_get_and_broadcast() {
    let app = TestApp::start().await;
    let subscriber = RecordingSubscriber::new();
    app.subscribe(subscriber.clone()).await;

    assert!(app.client.support_do_not_disturb_mode().await.unwrap());
    assert_eq!(
        app.client.get_do_not_disturb_date().await.unwrap(),
        DoNotDisturbDate::none()
    );

    let begin = Utc.with_ymd_and_hms(2026, 3, 14, 22, 0, 42).unwrap();
    let end = begin + ChronoDuration::hours(8);
    let date = DoNotDisturbDate::new(DoNotDisturbType::Daily, begin, end);

    let err = app
        .client
        .set_do_not_disturb_date(date)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 202);

    app.system.set_do_not_disturb_date(date).await.unwrap();
    let stored = app.client.get_do_not_disturb_date().await.unwrap();
    assert_eq!(stored.dnd_type, DoNotDisturbType::Daily);
    assert_eq!(
        stored.begin,
        Utc.with_ymd_and_hms(2026, 3, 14, 22, 0, 0).unwrap()
    );

    subscriber
        .wait_for_event(&Event::DndChange(stored))
        .await;

    // An inverted once window is rejected and leaves the stored date alone.
    let inverted = DoNotDisturbDate::new(DoNotDisturbType::Once, end, begin);
    let err = app
        .system
        .set_do_not_disturb_date(inverted)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 401);
    assert_eq!(app.client.get_do_not_disturb_date().await.unwrap(), stored);

    app.system
        .set_do_not_disturb_date(DoNotDisturbDate::new(DoNotDisturbType::None, begin, end))
        .await
        .unwrap();
    assert_eq!(
        app.client.get_do_not_disturb_date().await.unwrap(),
        DoNotDisturbDate::none()
    );

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_active_dnd_hides_notifications_in_sortings() {
    let app = TestApp::start().await;
    let subscriber = RecordingSubscriber::new();
    app.subscribe(subscriber.clone()).await;

    let now = Utc::now();
    let window = DoNotDisturbDate::new(
        DoNotDisturbType::Clearly,
        now - ChronoDuration::hours(1),
        now + ChronoDuration::hours(1),
    );
    app.system.set_do_not_disturb_date(window).await.unwrap();

    let hash = app.client.publish(basic_request(1, "")).await.unwrap();
    let consumed = subscriber.wait_for_consumed(1).await;
    assert!(consumed[0].sorting_map.get(&hash).unwrap().is_hidden_notification);

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_dnd_unsupported() {
    let app = TestAppBuilder::new()
        .with_config(|config| config.dnd.supported = false)
        .start()
        .await;

    assert!(!app.client.support_do_not_disturb_mode().await.unwrap());
    let err = app.client.get_do_not_disturb_date().await.unwrap_err();
    assert!(matches!(err, NotificationError::Unsupported(_)));
    let err = app
        .system
        .set_do_not_disturb_date(DoNotDisturbDate::none())
        .await
        .unwrap_err();
    assert_eq!(err.code(), 801);

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_disabled_bundle_cannot_publish() {
    let app = TestApp::start().await;
    let option = BundleOption::new(APP_BUNDLE);

    assert!(app.client.is_notification_enabled(None).await.unwrap());
    app.system
        .enable_notification(option.clone(), false)
        .await
        .unwrap();
    assert!(!app.client.is_notification_enabled(None).await.unwrap());
    assert!(!app
        .system
        .is_notification_enabled(Some(option.clone()))
        .await
        .unwrap());

    let err = app.client.publish(basic_request(1, "")).await.unwrap_err();
    assert_eq!(err.code(), 1_600_004);
    assert!(app.other.publish(basic_request(1, "")).await.is_ok());

    // Asking about another bundle is reserved to system apps.
    let err = app
        .other
        .is_notification_enabled(Some(option.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 202);

    app.system.enable_notification(option, true).await.unwrap();
    assert!(app.client.publish(basic_request(1, "")).await.is_ok());

    app.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_badge_switch_updates_sortings() {
    let app = TestApp::start().await;
    let subscriber = RecordingSubscriber::new();
    app.subscribe(subscriber.clone()).await;

    let hash = app.client.publish(basic_request(1, "")).await.unwrap();
    let consumed = subscriber.wait_for_consumed(1).await;
    assert!(consumed[0].sorting_map.get(&hash).unwrap().is_display_badge);

    app.system
        .display_badge(BundleOption::new(APP_BUNDLE), false)
        .await
        .unwrap();
    assert!(!app.client.is_badge_displayed(None).await.unwrap());

    let hash_for_wait = hash.clone();
    subscriber
        .wait_until(Duration::from_secs(5), move |events| {
            events.iter().any(|e| match e {
                Event::Update(map) => map
                    .get(&hash_for_wait)
                    .is_some_and(|sorting| !sorting.is_display_badge),
                _ => false,
            })
        })
        .await;

    app.shutdown(Duration::from_secs(5)).await;
}
