//! State owned by the service actor and every operation on it.
//!
//! Operations run one at a time on the actor task. Subscriber callbacks are
//! only queued here; delivery happens on the dispatch tasks.

use crate::bundles::{BundleInfo, BundleRegistry};
use crate::config::Config;
use crate::core::{
    BundleOption, DeleteReason, NotificationKey, NotificationRequest, NotificationSorting,
    NotificationSortingMap, SubscribeCallbackData, SubscribeInfo, Subscriber,
};
use crate::dnd::DoNotDisturbDate;
use crate::error::{NotificationError, Result};
use crate::metrics;
use crate::notification::dispatcher::SubscriberRegistry;
use crate::slots::{NotificationSlot, SlotRegistry, SlotType};
use crate::store::{generate_hash_code, NotificationRecord, NotificationStore, Selector};
use crate::task_manager::TaskManager;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The behavioral knobs of the service, taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub max_active_per_bundle: usize,
    pub enforce_unremovable: bool,
    pub dnd_supported: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_active_per_bundle: config.service.max_active_per_bundle,
            enforce_unremovable: config.service.enforce_unremovable,
            dnd_supported: config.dnd.supported,
        }
    }
}

pub struct ServiceState {
    settings: ServiceSettings,
    store: NotificationStore,
    slots: SlotRegistry,
    bundles: BundleRegistry,
    dnd: DoNotDisturbDate,
    subscribers: SubscriberRegistry,
}

impl ServiceState {
    pub fn new(settings: ServiceSettings, task_manager: TaskManager) -> Self {
        Self {
            settings,
            store: NotificationStore::new(),
            slots: SlotRegistry::new(),
            bundles: BundleRegistry::new(),
            dnd: DoNotDisturbDate::none(),
            subscribers: SubscriberRegistry::new(task_manager),
        }
    }

    // =========================================================================
    // Bundles & subscriptions
    // =========================================================================

    /// Installs or reinstalls a bundle. Reinstalling under a new uid cancels
    /// the notifications published under the old one.
    pub fn install_bundle(&mut self, info: BundleInfo) {
        info!(bundle = %info.bundle, uid = info.uid, system_app = info.system_app, "Installing bundle");
        let stale_uid = self
            .bundles
            .get(&info.bundle)
            .ok()
            .map(|old| old.uid)
            .filter(|&old_uid| old_uid != info.uid);
        let stale = stale_uid.map(|uid| BundleOption::with_uid(info.bundle.clone(), uid));
        self.bundles.install(info);

        if let Some(option) = stale {
            let removed = self.store.remove_where(&Selector::Bundle(option), |_| false);
            self.finish_removal(removed, DeleteReason::CancelAllReasonDelete);
        }
    }

    pub fn bundle_info(&self, bundle: &str) -> Result<BundleInfo> {
        self.bundles.get(bundle).cloned()
    }

    /// Registers a subscriber without a caller check. Used for subscribers
    /// the application itself attaches.
    pub fn register_subscriber(&mut self, subscriber: Arc<dyn Subscriber>, info: SubscribeInfo) {
        self.subscribers.subscribe(subscriber, info);
    }

    pub fn subscribe(
        &mut self,
        caller: &str,
        subscriber: Arc<dyn Subscriber>,
        info: Option<SubscribeInfo>,
    ) -> Result<()> {
        self.bundles.require_system(caller)?;
        self.register_subscriber(subscriber, info.unwrap_or_default());
        Ok(())
    }

    pub fn unsubscribe(&mut self, caller: &str, subscriber: &Arc<dyn Subscriber>) -> Result<()> {
        self.bundles.require_system(caller)?;
        self.subscribers.unsubscribe(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // =========================================================================
    // Publish
    // =========================================================================

    /// Stores `request` for `caller` and queues `on_consume` for every
    /// matching subscriber. Returns the assigned hash code.
    pub fn publish(&mut self, caller: &str, mut request: NotificationRequest) -> Result<String> {
        let uid = self.bundles.get(caller)?.uid;
        if !request.creator_bundle_name.is_empty() && request.creator_bundle_name != caller {
            return Err(NotificationError::PermissionDenied(format!(
                "{} cannot publish on behalf of {}",
                caller, request.creator_bundle_name
            )));
        }
        request.content.validate()?;
        if !self.bundles.is_enabled(caller) {
            return Err(NotificationError::NotificationDisabled(caller.to_string()));
        }

        let hash_code = generate_hash_code(uid, caller, &request.label, request.id);
        let limit = self.settings.max_active_per_bundle;
        let own = Selector::Bundle(BundleOption::with_uid(caller, uid));
        if !self.store.contains(&hash_code) && self.store.count(&own) >= limit {
            warn!(bundle = caller, limit, "Active notification limit reached");
            return Err(NotificationError::ActiveLimitExceeded {
                bundle: caller.to_string(),
                limit,
            });
        }

        let slot = self.slots.resolve_for_publish(caller, request.slot_type);
        request.creator_bundle_name = caller.to_string();
        request.creator_uid = uid;
        request.hash_code = hash_code.clone();

        let replaced = self.store.insert(request.clone(), slot);
        metrics::record_published();
        metrics::set_active(self.store.len());
        info!(
            bundle = caller,
            id = request.id,
            label = %request.label,
            hash_code = %hash_code,
            replaced,
            "Notification published"
        );

        let sorting_map = self.sorting_map();
        self.subscribers.notify_consume(&SubscribeCallbackData {
            request,
            sorting_map: sorting_map.clone(),
            reason: None,
        });
        self.subscribers.notify_update(&sorting_map);
        Ok(hash_code)
    }

    // =========================================================================
    // Removal & cancellation
    // =========================================================================

    pub fn remove(&mut self, caller: &str, hash_code: &str) -> Result<()> {
        self.bundles.require_system(caller)?;
        if hash_code.is_empty() {
            return Err(NotificationError::InvalidParam(
                "hash code must not be empty".to_string(),
            ));
        }
        let record = self
            .store
            .get(hash_code)
            .ok_or_else(|| NotificationError::NotificationNotFound(hash_code.to_string()))?;
        self.check_removable(record)?;

        let removed = self
            .store
            .remove_where(&Selector::HashCode(hash_code.to_string()), |_| false);
        self.finish_removal(removed, DeleteReason::CancelReasonDelete);
        Ok(())
    }

    pub fn remove_by_key(
        &mut self,
        caller: &str,
        option: &BundleOption,
        key: &NotificationKey,
    ) -> Result<()> {
        self.bundles.require_system(caller)?;
        self.bundles.resolve(option)?;
        let selector = Selector::Key {
            option: option.clone(),
            key: key.clone(),
        };
        let record = self.store.select(&selector).into_iter().next().ok_or_else(|| {
            NotificationError::NotificationNotFound(format!(
                "{} id={} label={}",
                option.bundle, key.id, key.label
            ))
        })?;
        self.check_removable(record)?;

        let removed = self.store.remove_where(&selector, |_| false);
        self.finish_removal(removed, DeleteReason::CancelReasonDelete);
        Ok(())
    }

    /// Removes every notification of `option`'s bundle, or every stored
    /// notification when no option is given. Returns how many were removed.
    pub fn remove_all(&mut self, caller: &str, option: Option<&BundleOption>) -> Result<usize> {
        self.bundles.require_system(caller)?;
        let selector = match option {
            Some(option) => {
                self.bundles.resolve(option)?;
                Selector::Bundle(option.clone())
            }
            None => Selector::All,
        };
        let enforce = self.settings.enforce_unremovable;
        let removed = self
            .store
            .remove_where(&selector, |record| enforce && record.request.is_unremovable);
        Ok(self.finish_removal(removed, DeleteReason::CancelAllReasonDelete))
    }

    /// Cancels one of the caller's own notifications. Owners may always
    /// cancel, unremovable or not.
    pub fn cancel(&mut self, caller: &str, id: i32, label: Option<&str>) -> Result<()> {
        let uid = self.bundles.get(caller)?.uid;
        let key = NotificationKey::new(id, label.unwrap_or_default());
        let selector = Selector::Key {
            option: BundleOption::with_uid(caller, uid),
            key,
        };
        let removed = self.store.remove_where(&selector, |_| false);
        if removed.is_empty() {
            return Err(NotificationError::NotificationNotFound(format!(
                "{} id={} label={}",
                caller,
                id,
                label.unwrap_or_default()
            )));
        }
        self.finish_removal(removed, DeleteReason::AppCancelReasonDelete);
        Ok(())
    }

    pub fn cancel_all(&mut self, caller: &str) -> Result<usize> {
        let uid = self.bundles.get(caller)?.uid;
        let removed = self
            .store
            .remove_where(&Selector::Bundle(BundleOption::with_uid(caller, uid)), |_| false);
        Ok(self.finish_removal(removed, DeleteReason::AppCancelAllReasonDelete))
    }

    fn check_removable(&self, record: &NotificationRecord) -> Result<()> {
        if self.settings.enforce_unremovable && record.request.is_unremovable {
            return Err(NotificationError::Unremovable(record.hash_code().to_string()));
        }
        Ok(())
    }

    /// Queues one `on_cancel` per removed record, then a single `on_update`.
    fn finish_removal(&self, removed: Vec<NotificationRecord>, reason: DeleteReason) -> usize {
        if removed.is_empty() {
            debug!(reason = reason.as_str(), "Nothing to remove");
            return 0;
        }

        let sorting_map = self.sorting_map();
        for record in &removed {
            info!(
                bundle = record.bundle(),
                hash_code = record.hash_code(),
                reason = reason.as_str(),
                "Notification removed"
            );
            self.subscribers.notify_cancel(&SubscribeCallbackData {
                request: record.request.clone(),
                sorting_map: sorting_map.clone(),
                reason: Some(reason),
            });
        }
        self.subscribers.notify_update(&sorting_map);

        metrics::record_removed(reason, removed.len());
        metrics::set_active(self.store.len());
        removed.len()
    }

    // =========================================================================
    // Active notification queries
    // =========================================================================

    pub fn get_active_notifications(&self, caller: &str) -> Result<Vec<NotificationRequest>> {
        let uid = self.bundles.get(caller)?.uid;
        Ok(self.requests(&Selector::Bundle(BundleOption::with_uid(caller, uid))))
    }

    pub fn get_active_notification_count(&self, caller: &str) -> Result<usize> {
        self.get_active_notifications(caller).map(|active| active.len())
    }

    pub fn get_all_active_notifications(&self, caller: &str) -> Result<Vec<NotificationRequest>> {
        self.bundles.require_system(caller)?;
        Ok(self.requests(&Selector::All))
    }

    fn requests(&self, selector: &Selector) -> Vec<NotificationRequest> {
        self.store
            .select(selector)
            .into_iter()
            .map(|record| record.request.clone())
            .collect()
    }

    /// The presentation state of every stored notification.
    pub fn sorting_map(&self) -> NotificationSortingMap {
        let dnd_active = self.dnd.is_active_at(Utc::now());
        let mut map = NotificationSortingMap::default();
        for record in self.store.select(&Selector::All) {
            let sorting = NotificationSorting {
                hash_code: record.hash_code().to_string(),
                slot: record.slot.clone(),
                ranking: record.ranking,
                is_display_badge: record.slot.badge_flag
                    && self.bundles.is_badge_displayed(record.bundle()),
                is_hidden_notification: dnd_active && !record.slot.bypass_dnd,
            };
            map.hash_codes.push(sorting.hash_code.clone());
            map.sortings.insert(sorting.hash_code.clone(), sorting);
        }
        map
    }

    // =========================================================================
    // Slots
    // =========================================================================

    pub fn add_slot(&mut self, caller: &str, slot: NotificationSlot) -> Result<()> {
        self.bundles.get(caller)?;
        self.slots.add_slot(caller, slot);
        Ok(())
    }

    pub fn add_slot_by_type(&mut self, caller: &str, slot_type: SlotType) -> Result<()> {
        self.bundles.get(caller)?;
        self.slots.add_slot_by_type(caller, slot_type);
        Ok(())
    }

    pub fn add_slots(&mut self, caller: &str, slots: Vec<NotificationSlot>) -> Result<()> {
        self.bundles.get(caller)?;
        for slot in slots {
            self.slots.add_slot(caller, slot);
        }
        Ok(())
    }

    pub fn get_slot(&self, caller: &str, slot_type: SlotType) -> Result<Option<NotificationSlot>> {
        self.bundles.get(caller)?;
        Ok(self.slots.get_slot(caller, slot_type).cloned())
    }

    pub fn get_slots(&self, caller: &str) -> Result<Vec<NotificationSlot>> {
        self.bundles.get(caller)?;
        Ok(self.slots.get_slots(caller))
    }

    pub fn remove_slot(&mut self, caller: &str, slot_type: SlotType) -> Result<()> {
        self.bundles.get(caller)?;
        self.slots.remove_slot(caller, slot_type).map(|_| ())
    }

    pub fn remove_all_slots(&mut self, caller: &str) -> Result<usize> {
        self.bundles.get(caller)?;
        Ok(self.slots.remove_all_slots(caller))
    }

    pub fn set_slot_by_bundle(
        &mut self,
        caller: &str,
        option: &BundleOption,
        slot: NotificationSlot,
    ) -> Result<()> {
        self.bundles.require_system(caller)?;
        let bundle = self.bundles.resolve(option)?.bundle.clone();
        self.slots.update_slot(&bundle, slot)
    }

    pub fn get_slots_by_bundle(
        &self,
        caller: &str,
        option: &BundleOption,
    ) -> Result<Vec<NotificationSlot>> {
        self.bundles.require_system(caller)?;
        let info = self.bundles.resolve(option)?;
        Ok(self.slots.get_slots(&info.bundle))
    }

    pub fn get_slot_num_by_bundle(&self, caller: &str, option: &BundleOption) -> Result<usize> {
        self.bundles.require_system(caller)?;
        let info = self.bundles.resolve(option)?;
        Ok(self.slots.slot_count(&info.bundle))
    }

    // =========================================================================
    // Do-not-disturb
    // =========================================================================

    pub fn set_do_not_disturb_date(&mut self, caller: &str, date: DoNotDisturbDate) -> Result<()> {
        self.bundles.require_system(caller)?;
        self.require_dnd_support()?;
        self.dnd = date.normalize()?;
        info!(dnd_type = ?self.dnd.dnd_type, begin = %self.dnd.begin, end = %self.dnd.end, "Do-not-disturb date set");

        self.subscribers.notify_dnd_change(self.dnd);
        self.subscribers.notify_update(&self.sorting_map());
        Ok(())
    }

    pub fn get_do_not_disturb_date(&self, caller: &str) -> Result<DoNotDisturbDate> {
        self.bundles.get(caller)?;
        self.require_dnd_support()?;
        Ok(self.dnd)
    }

    pub fn support_do_not_disturb_mode(&self) -> bool {
        self.settings.dnd_supported
    }

    fn require_dnd_support(&self) -> Result<()> {
        if self.settings.dnd_supported {
            Ok(())
        } else {
            Err(NotificationError::Unsupported("do-not-disturb".to_string()))
        }
    }

    // =========================================================================
    // Switches
    // =========================================================================

    pub fn enable_notification(
        &mut self,
        caller: &str,
        option: &BundleOption,
        enable: bool,
    ) -> Result<()> {
        self.bundles.require_system(caller)?;
        let bundle = self.bundles.resolve(option)?.bundle.clone();
        self.bundles.set_enabled(&bundle, enable)?;
        info!(bundle = %bundle, enable, "Notification switch changed");
        Ok(())
    }

    /// Without an option the caller asks about itself; asking about another
    /// bundle is a system API.
    pub fn is_notification_enabled(
        &self,
        caller: &str,
        option: Option<&BundleOption>,
    ) -> Result<bool> {
        let bundle = self.switch_target(caller, option)?;
        Ok(self.bundles.is_enabled(&bundle))
    }

    pub fn display_badge(&mut self, caller: &str, option: &BundleOption, enable: bool) -> Result<()> {
        self.bundles.require_system(caller)?;
        let bundle = self.bundles.resolve(option)?.bundle.clone();
        self.bundles.set_badge_displayed(&bundle, enable)?;
        info!(bundle = %bundle, enable, "Badge switch changed");
        self.subscribers.notify_update(&self.sorting_map());
        Ok(())
    }

    pub fn is_badge_displayed(&self, caller: &str, option: Option<&BundleOption>) -> Result<bool> {
        let bundle = self.switch_target(caller, option)?;
        Ok(self.bundles.is_badge_displayed(&bundle))
    }

    fn switch_target(&self, caller: &str, option: Option<&BundleOption>) -> Result<String> {
        let own = self.bundles.get(caller)?;
        match option {
            None => Ok(own.bundle.clone()),
            Some(option) if option.bundle == caller => {
                Ok(self.bundles.resolve(option)?.bundle.clone())
            }
            Some(option) => {
                self.bundles.require_system(caller)?;
                Ok(self.bundles.resolve(option)?.bundle.clone())
            }
        }
    }

    /// Disconnects every subscriber. Called once when the actor stops.
    pub fn shutdown(&mut self) {
        info!(
            subscribers = self.subscribers.len(),
            active = self.store.len(),
            "Notification service shutting down"
        );
        self.subscribers.disconnect_all();
    }
}
