//! The caller-facing API, bound to one installed bundle.
//!
//! Every operation is an `async fn` returning [`Result`]. The operations that
//! also exist in callback form have a `*_callback` variant that runs the
//! operation on the Tokio runtime and hands the result to a closure; use
//! [`result_code`](crate::error::result_code) to read it as a numeric code.

use crate::core::{BundleOption, NotificationKey, NotificationRequest, SubscribeInfo, Subscriber};
use crate::dnd::DoNotDisturbDate;
use crate::error::Result;
use crate::service::ServiceHandle;
use crate::slots::{NotificationSlot, SlotType};
use std::future::Future;
use std::sync::Arc;

/// Runs `operation` in the background and passes its result to `callback`.
fn spawn_callback<T, Fut, F>(operation: Fut, callback: F)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    F: FnOnce(Result<T>) + Send + 'static,
{
    tokio::spawn(async move {
        callback(operation.await);
    });
}

#[derive(Clone, Debug)]
pub struct NotificationClient {
    bundle: String,
    service: ServiceHandle,
}

impl NotificationClient {
    pub(crate) fn new(bundle: impl Into<String>, service: ServiceHandle) -> Self {
        Self {
            bundle: bundle.into(),
            service,
        }
    }

    /// The bundle every call is made on behalf of.
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        self.subscribe_with_info(subscriber, None).await
    }

    pub async fn subscribe_with_info(
        &self,
        subscriber: Arc<dyn Subscriber>,
        info: Option<SubscribeInfo>,
    ) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.subscribe(&caller, subscriber, info))
            .await
    }

    pub fn subscribe_callback<F>(&self, subscriber: Arc<dyn Subscriber>, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.subscribe(subscriber).await }, callback);
    }

    pub async fn unsubscribe(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.unsubscribe(&caller, &subscriber))
            .await
    }

    pub fn unsubscribe_callback<F>(&self, subscriber: Arc<dyn Subscriber>, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.unsubscribe(subscriber).await }, callback);
    }

    // =========================================================================
    // Publish, cancel, remove
    // =========================================================================

    /// Publishes `request` and returns its hash code.
    pub async fn publish(&self, request: NotificationRequest) -> Result<String> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.publish(&caller, request))
            .await
    }

    pub fn publish_callback<F>(&self, request: NotificationRequest, callback: F)
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.publish(request).await }, callback);
    }

    pub async fn cancel(&self, id: i32, label: Option<String>) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.cancel(&caller, id, label.as_deref()))
            .await
    }

    pub fn cancel_callback<F>(&self, id: i32, label: Option<String>, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.cancel(id, label).await }, callback);
    }

    /// Cancels every notification of this bundle and returns how many there were.
    pub async fn cancel_all(&self) -> Result<usize> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.cancel_all(&caller))
            .await
    }

    pub fn cancel_all_callback<F>(&self, callback: F)
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.cancel_all().await }, callback);
    }

    pub async fn remove(&self, hash_code: impl Into<String>) -> Result<()> {
        let caller = self.bundle.clone();
        let hash_code = hash_code.into();
        self.service
            .call(move |state| state.remove(&caller, &hash_code))
            .await
    }

    pub fn remove_callback<F>(&self, hash_code: impl Into<String>, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        let hash_code = hash_code.into();
        spawn_callback(async move { client.remove(hash_code).await }, callback);
    }

    pub async fn remove_by_key(&self, option: BundleOption, key: NotificationKey) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.remove_by_key(&caller, &option, &key))
            .await
    }

    pub fn remove_by_key_callback<F>(&self, option: BundleOption, key: NotificationKey, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.remove_by_key(option, key).await }, callback);
    }

    /// Removes every notification of `option`'s bundle, or every notification
    /// when `option` is `None`. Returns how many were removed.
    pub async fn remove_all(&self, option: Option<BundleOption>) -> Result<usize> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.remove_all(&caller, option.as_ref()))
            .await
    }

    pub fn remove_all_callback<F>(&self, option: Option<BundleOption>, callback: F)
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let client = self.clone();
        spawn_callback(async move { client.remove_all(option).await }, callback);
    }

    // =========================================================================
    // Active notifications
    // =========================================================================

    pub async fn get_active_notifications(&self) -> Result<Vec<NotificationRequest>> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_active_notifications(&caller))
            .await
    }

    pub async fn get_active_notification_count(&self) -> Result<usize> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_active_notification_count(&caller))
            .await
    }

    pub async fn get_all_active_notifications(&self) -> Result<Vec<NotificationRequest>> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_all_active_notifications(&caller))
            .await
    }

    // =========================================================================
    // Slots
    // =========================================================================

    pub async fn add_slot(&self, slot: NotificationSlot) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.add_slot(&caller, slot))
            .await
    }

    pub async fn add_slot_by_type(&self, slot_type: SlotType) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.add_slot_by_type(&caller, slot_type))
            .await
    }

    pub async fn add_slots(&self, slots: Vec<NotificationSlot>) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.add_slots(&caller, slots))
            .await
    }

    pub async fn get_slot(&self, slot_type: SlotType) -> Result<Option<NotificationSlot>> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_slot(&caller, slot_type))
            .await
    }

    pub async fn get_slots(&self) -> Result<Vec<NotificationSlot>> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_slots(&caller))
            .await
    }

    pub async fn remove_slot(&self, slot_type: SlotType) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.remove_slot(&caller, slot_type))
            .await
    }

    pub async fn remove_all_slots(&self) -> Result<usize> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.remove_all_slots(&caller))
            .await
    }

    pub async fn set_slot_by_bundle(&self, option: BundleOption, slot: NotificationSlot) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.set_slot_by_bundle(&caller, &option, slot))
            .await
    }

    pub async fn get_slots_by_bundle(&self, option: BundleOption) -> Result<Vec<NotificationSlot>> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_slots_by_bundle(&caller, &option))
            .await
    }

    pub async fn get_slot_num_by_bundle(&self, option: BundleOption) -> Result<usize> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_slot_num_by_bundle(&caller, &option))
            .await
    }

    // =========================================================================
    // Do-not-disturb
    // =========================================================================

    pub async fn set_do_not_disturb_date(&self, date: DoNotDisturbDate) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.set_do_not_disturb_date(&caller, date))
            .await
    }

    pub async fn get_do_not_disturb_date(&self) -> Result<DoNotDisturbDate> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.get_do_not_disturb_date(&caller))
            .await
    }

    pub async fn support_do_not_disturb_mode(&self) -> Result<bool> {
        self.service
            .call(|state| Ok(state.support_do_not_disturb_mode()))
            .await
    }

    // =========================================================================
    // Switches
    // =========================================================================

    pub async fn enable_notification(&self, option: BundleOption, enable: bool) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.enable_notification(&caller, &option, enable))
            .await
    }

    pub async fn is_notification_enabled(&self, option: Option<BundleOption>) -> Result<bool> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.is_notification_enabled(&caller, option.as_ref()))
            .await
    }

    pub async fn display_badge(&self, option: BundleOption, enable: bool) -> Result<()> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.display_badge(&caller, &option, enable))
            .await
    }

    pub async fn is_badge_displayed(&self, option: Option<BundleOption>) -> Result<bool> {
        let caller = self.bundle.clone();
        self.service
            .call(move |state| state.is_badge_displayed(&caller, option.as_ref()))
            .await
    }
}
