#![allow(dead_code)]
//! A subscriber that records every event it receives.

use ansd::dnd::DoNotDisturbDate;
use ansd::{NotificationSortingMap, SubscribeCallbackData, Subscriber};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect,
    Consume(SubscribeCallbackData),
    Cancel(SubscribeCallbackData),
    Update(NotificationSortingMap),
    DndChange(DoNotDisturbDate),
    Disconnect,
}

pub type ConsumeHook = Box<dyn Fn(SubscribeCallbackData) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<Event>>,
    notifier: Notify,
    consume_hook: Option<ConsumeHook>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Runs `hook` after recording each `on_consume`, on the dispatch task.
    pub fn with_consume_hook(hook: ConsumeHook) -> Arc<Self> {
        Arc::new(Self {
            consume_hook: Some(hook),
            ..Default::default()
        })
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.notifier.notify_one();
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn consumed(&self) -> Vec<SubscribeCallbackData> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Consume(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<SubscribeCallbackData> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Cancel(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn dnd_changes(&self) -> Vec<DoNotDisturbDate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::DndChange(date) => Some(date),
                _ => None,
            })
            .collect()
    }

    /// Waits until `condition` holds over the recorded events.
    pub async fn wait_until<F>(&self, timeout_duration: Duration, condition: F)
    where
        F: Fn(&[Event]) -> bool,
    {
        let wait_future = async {
            loop {
                {
                    let events = self.events.lock().unwrap();
                    if condition(&events) {
                        return;
                    }
                }
                self.notifier.notified().await;
            }
        };

        tokio::time::timeout(timeout_duration, wait_future)
            .await
            .expect("Timed out waiting for subscriber events");
    }

    pub async fn wait_for_consumed(&self, count: usize) -> Vec<SubscribeCallbackData> {
        self.wait_until(Duration::from_secs(5), |events| {
            events.iter().filter(|e| matches!(e, Event::Consume(_))).count() >= count
        })
        .await;
        self.consumed()
    }

    pub async fn wait_for_cancelled(&self, count: usize) -> Vec<SubscribeCallbackData> {
        self.wait_until(Duration::from_secs(5), |events| {
            events.iter().filter(|e| matches!(e, Event::Cancel(_))).count() >= count
        })
        .await;
        self.cancelled()
    }

    pub async fn wait_for_event(&self, expected: &Event) {
        self.wait_until(Duration::from_secs(5), |events| events.contains(expected))
            .await;
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    async fn on_consume(&self, data: SubscribeCallbackData) {
        self.record(Event::Consume(data.clone()));
        if let Some(hook) = &self.consume_hook {
            hook(data).await;
        }
    }

    async fn on_cancel(&self, data: SubscribeCallbackData) {
        self.record(Event::Cancel(data));
    }

    async fn on_update(&self, sorting_map: NotificationSortingMap) {
        self.record(Event::Update(sorting_map));
    }

    async fn on_connect(&self) {
        self.record(Event::Connect);
    }

    async fn on_disconnect(&self) {
        self.record(Event::Disconnect);
    }

    async fn on_do_not_disturb_date_change(&self, date: DoNotDisturbDate) {
        self.record(Event::DndChange(date));
    }
}
