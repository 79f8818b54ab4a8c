//! Per-subscriber event delivery.
//!
//! Each subscriber owns an unbounded FIFO channel drained by its own dispatch
//! task, so callbacks never run on the service actor and a slow subscriber
//! never delays the others. The queue has no upper bound: a stalled subscriber
//! keeps every pending event in memory, and a warning is logged each time its
//! backlog grows by another [`DEEP_QUEUE_WARNING`] events.

use crate::core::{NotificationSortingMap, SubscribeCallbackData, SubscribeInfo, Subscriber};
use crate::dnd::DoNotDisturbDate;
use crate::error::{NotificationError, Result};
use crate::metrics;
use crate::task_manager::TaskManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Backlog size at which a subscriber queue is reported as deep.
pub const DEEP_QUEUE_WARNING: usize = 1024;

/// One queued callback invocation.
#[derive(Debug, Clone)]
pub enum SubscriberEvent {
    Connect,
    Consume(SubscribeCallbackData),
    Cancel(SubscribeCallbackData),
    Update(NotificationSortingMap),
    DoNotDisturbDateChange(DoNotDisturbDate),
    Disconnect,
}

impl SubscriberEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Consume(_) => "consume",
            Self::Cancel(_) => "cancel",
            Self::Update(_) => "update",
            Self::DoNotDisturbDateChange(_) => "dnd_change",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Subscriber identity is the allocation behind the `Arc`.
pub fn same_subscriber(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Sending half of a subscriber queue, with the number of undelivered events.
struct EventQueue {
    tx: mpsc::UnboundedSender<SubscriberEvent>,
    depth: Arc<AtomicUsize>,
}

impl EventQueue {
    fn send(&self, event: SubscriberEvent) {
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        // The receiver only closes once the dispatch task is gone.
        if self.tx.send(event).is_err() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            debug!("Dispatch task already stopped; dropping event");
            return;
        }
        if depth % DEEP_QUEUE_WARNING == 0 {
            warn!(depth, "Subscriber queue is deep; the subscriber is not keeping up");
        }
    }
}

struct Subscription {
    subscriber: Arc<dyn Subscriber>,
    info: SubscribeInfo,
    queue: EventQueue,
}

/// The set of registered subscribers and their event queues.
pub struct SubscriberRegistry {
    subscriptions: Vec<Subscription>,
    task_manager: TaskManager,
}

impl SubscriberRegistry {
    pub fn new(task_manager: TaskManager) -> Self {
        Self {
            subscriptions: Vec::new(),
            task_manager,
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Registers `subscriber` and queues `on_connect`. An already registered
    /// subscriber only has its filter replaced.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber>, info: SubscribeInfo) {
        if let Some(existing) = self
            .subscriptions
            .iter_mut()
            .find(|s| same_subscriber(&s.subscriber, &subscriber))
        {
            debug!(bundles = ?info.bundle_names, "Replacing subscriber filter");
            existing.info = info;
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        self.task_manager.spawn(
            "SubscriberDispatch",
            run_dispatch(subscriber.clone(), rx, depth.clone()),
        );
        let queue = EventQueue { tx, depth };
        queue.send(SubscriberEvent::Connect);
        self.subscriptions.push(Subscription {
            subscriber,
            info,
            queue,
        });
        info!(subscribers = self.subscriptions.len(), "Subscriber registered");
    }

    /// Queues `on_disconnect` and closes the subscriber's queue. Events
    /// already queued are still delivered.
    pub fn unsubscribe(&mut self, subscriber: &Arc<dyn Subscriber>) -> Result<()> {
        let position = self
            .subscriptions
            .iter()
            .position(|s| same_subscriber(&s.subscriber, subscriber))
            .ok_or_else(|| {
                NotificationError::InvalidParam("subscriber is not registered".to_string())
            })?;
        let subscription = self.subscriptions.remove(position);
        subscription.queue.send(SubscriberEvent::Disconnect);
        info!(subscribers = self.subscriptions.len(), "Subscriber removed");
        Ok(())
    }

    pub fn notify_consume(&self, data: &SubscribeCallbackData) {
        self.notify_matching(&data.request.creator_bundle_name, || {
            SubscriberEvent::Consume(data.clone())
        });
    }

    pub fn notify_cancel(&self, data: &SubscribeCallbackData) {
        self.notify_matching(&data.request.creator_bundle_name, || {
            SubscriberEvent::Cancel(data.clone())
        });
    }

    pub fn notify_update(&self, sorting_map: &NotificationSortingMap) {
        for subscription in &self.subscriptions {
            subscription.queue.send(SubscriberEvent::Update(sorting_map.clone()));
        }
    }

    pub fn notify_dnd_change(&self, date: DoNotDisturbDate) {
        for subscription in &self.subscriptions {
            subscription.queue.send(SubscriberEvent::DoNotDisturbDateChange(date));
        }
    }

    /// Disconnects every subscriber.
    pub fn disconnect_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.queue.send(SubscriberEvent::Disconnect);
        }
    }

    fn notify_matching<F>(&self, bundle: &str, event: F)
    where
        F: Fn() -> SubscriberEvent,
    {
        for subscription in &self.subscriptions {
            if subscription.info.accepts(bundle) {
                subscription.queue.send(event());
            }
        }
    }
}

/// Delivers queued events to one subscriber, in order, until its queue closes.
async fn run_dispatch(
    subscriber: Arc<dyn Subscriber>,
    mut rx: mpsc::UnboundedReceiver<SubscriberEvent>,
    depth: Arc<AtomicUsize>,
) {
    while let Some(event) = rx.recv().await {
        depth.fetch_sub(1, Ordering::Relaxed);
        metrics::record_subscriber_event(event.kind());
        match event {
            SubscriberEvent::Connect => subscriber.on_connect().await,
            SubscriberEvent::Consume(data) => subscriber.on_consume(data).await,
            SubscriberEvent::Cancel(data) => subscriber.on_cancel(data).await,
            SubscriberEvent::Update(map) => subscriber.on_update(map).await,
            SubscriberEvent::DoNotDisturbDateChange(date) => {
                subscriber.on_do_not_disturb_date_change(date).await
            }
            SubscriberEvent::Disconnect => {
                subscriber.on_disconnect().await;
                break;
            }
        }
    }
    debug!("Subscriber dispatch task finished.");
}
