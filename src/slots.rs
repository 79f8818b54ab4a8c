//! Notification slots: per-bundle channel settings keyed by slot type.

use crate::error::{NotificationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The category a notification is published under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotType {
    UnknownType,
    SocialCommunication,
    ServiceInformation,
    ContentInformation,
    #[default]
    OtherTypes,
}

impl SlotType {
    pub fn code(self) -> u32 {
        match self {
            Self::UnknownType => 0,
            Self::SocialCommunication => 1,
            Self::ServiceInformation => 2,
            Self::ContentInformation => 3,
            Self::OtherTypes => 0xFFFF,
        }
    }

    /// Slots are never stored under `UnknownType`; it folds into `OtherTypes`.
    pub fn normalized(self) -> Self {
        match self {
            Self::UnknownType => Self::OtherTypes,
            other => other,
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownType => "UNKNOWN_TYPE",
            Self::SocialCommunication => "SOCIAL_COMMUNICATION",
            Self::ServiceInformation => "SERVICE_INFORMATION",
            Self::ContentInformation => "CONTENT_INFORMATION",
            Self::OtherTypes => "OTHER_TYPES",
        };
        f.write_str(name)
    }
}

/// Importance of a slot. Serialized as its numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlotLevel {
    None,
    Min,
    Low,
    Default,
    High,
}

impl SlotLevel {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Min => 1,
            Self::Low => 2,
            Self::Default => 3,
            Self::High => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Min),
            2 => Some(Self::Low),
            3 => Some(Self::Default),
            4 => Some(Self::High),
            _ => None,
        }
    }
}

impl Serialize for SlotLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for SlotLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        SlotLevel::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid slot level {}", code)))
    }
}

/// Settings applied to every notification published under a slot type.
///
/// Deserialization starts from [`NotificationSlot::for_type`] and overlays the
/// fields that are present, so `{"type": "SERVICE_INFORMATION", "level": 4}`
/// yields the service-information defaults with a raised level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "SlotSpec")]
pub struct NotificationSlot {
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub level: SlotLevel,
    pub desc: String,
    pub badge_flag: bool,
    pub bypass_dnd: bool,
    pub lockscreen_visibility: i32,
    pub vibration_enabled: bool,
    pub sound: String,
    pub light_enabled: bool,
    pub light_color: u32,
    pub vibration_values: Vec<i64>,
}

impl NotificationSlot {
    /// The slot created when a bundle adds or publishes under `slot_type`
    /// without configuring it.
    pub fn for_type(slot_type: SlotType) -> Self {
        let slot_type = slot_type.normalized();
        let (level, lockscreen_visibility, vibration_enabled) = match slot_type {
            SlotType::SocialCommunication => (SlotLevel::High, 2, true),
            SlotType::ServiceInformation => (SlotLevel::Default, 2, true),
            SlotType::ContentInformation => (SlotLevel::Low, 3, false),
            SlotType::OtherTypes | SlotType::UnknownType => (SlotLevel::Min, 3, false),
        };
        Self {
            slot_type,
            level,
            desc: String::new(),
            badge_flag: true,
            bypass_dnd: false,
            lockscreen_visibility,
            vibration_enabled,
            sound: String::new(),
            light_enabled: false,
            light_color: 0,
            vibration_values: Vec::new(),
        }
    }
}

/// Wire shape of a slot where everything except the type is optional.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotSpec {
    #[serde(rename = "type")]
    slot_type: SlotType,
    level: Option<SlotLevel>,
    desc: Option<String>,
    badge_flag: Option<bool>,
    bypass_dnd: Option<bool>,
    lockscreen_visibility: Option<i32>,
    vibration_enabled: Option<bool>,
    sound: Option<String>,
    light_enabled: Option<bool>,
    light_color: Option<u32>,
    vibration_values: Option<Vec<i64>>,
}

impl From<SlotSpec> for NotificationSlot {
    fn from(input: SlotSpec) -> Self {
        let base = NotificationSlot::for_type(input.slot_type);
        Self {
            slot_type: base.slot_type,
            level: input.level.unwrap_or(base.level),
            desc: input.desc.unwrap_or(base.desc),
            badge_flag: input.badge_flag.unwrap_or(base.badge_flag),
            bypass_dnd: input.bypass_dnd.unwrap_or(base.bypass_dnd),
            lockscreen_visibility: input
                .lockscreen_visibility
                .unwrap_or(base.lockscreen_visibility),
            vibration_enabled: input.vibration_enabled.unwrap_or(base.vibration_enabled),
            sound: input.sound.unwrap_or(base.sound),
            light_enabled: input.light_enabled.unwrap_or(base.light_enabled),
            light_color: input.light_color.unwrap_or(base.light_color),
            vibration_values: input.vibration_values.unwrap_or(base.vibration_values),
        }
    }
}

/// Slots of every bundle, ordered by type within a bundle.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: HashMap<String, BTreeMap<SlotType, NotificationSlot>>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `slot`, replacing any existing slot of the same type.
    pub fn add_slot(&mut self, bundle: &str, mut slot: NotificationSlot) {
        slot.slot_type = slot.slot_type.normalized();
        self.slots
            .entry(bundle.to_string())
            .or_default()
            .insert(slot.slot_type, slot);
    }

    /// Inserts the default slot for `slot_type` unless the bundle already has one.
    pub fn add_slot_by_type(&mut self, bundle: &str, slot_type: SlotType) {
        let slot_type = slot_type.normalized();
        self.slots
            .entry(bundle.to_string())
            .or_default()
            .entry(slot_type)
            .or_insert_with(|| NotificationSlot::for_type(slot_type));
    }

    pub fn get_slot(&self, bundle: &str, slot_type: SlotType) -> Option<&NotificationSlot> {
        self.slots
            .get(bundle)
            .and_then(|slots| slots.get(&slot_type.normalized()))
    }

    pub fn get_slots(&self, bundle: &str) -> Vec<NotificationSlot> {
        self.slots
            .get(bundle)
            .map(|slots| slots.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn slot_count(&self, bundle: &str) -> usize {
        self.slots.get(bundle).map_or(0, BTreeMap::len)
    }

    pub fn remove_slot(&mut self, bundle: &str, slot_type: SlotType) -> Result<NotificationSlot> {
        let slot_type = slot_type.normalized();
        let removed = self
            .slots
            .get_mut(bundle)
            .and_then(|slots| slots.remove(&slot_type));
        if self.slots.get(bundle).is_some_and(BTreeMap::is_empty) {
            self.slots.remove(bundle);
        }
        removed.ok_or_else(|| NotificationError::SlotNotFound(format!("{} of {}", slot_type, bundle)))
    }

    pub fn remove_all_slots(&mut self, bundle: &str) -> usize {
        self.slots.remove(bundle).map_or(0, |slots| slots.len())
    }

    /// Replaces an existing slot. Fails if the bundle never added that type.
    pub fn update_slot(&mut self, bundle: &str, mut slot: NotificationSlot) -> Result<()> {
        slot.slot_type = slot.slot_type.normalized();
        match self
            .slots
            .get_mut(bundle)
            .and_then(|slots| slots.get_mut(&slot.slot_type))
        {
            Some(existing) => {
                *existing = slot;
                Ok(())
            }
            None => Err(NotificationError::SlotNotFound(format!(
                "{} of {}",
                slot.slot_type, bundle
            ))),
        }
    }

    /// Returns the slot a notification is published under, creating the
    /// default one on first use.
    pub fn resolve_for_publish(&mut self, bundle: &str, slot_type: SlotType) -> NotificationSlot {
        self.add_slot_by_type(bundle, slot_type);
        self.get_slot(bundle, slot_type)
            .cloned()
            .unwrap_or_else(|| NotificationSlot::for_type(slot_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = "com.example.slots";

    #[test]
    fn test_defaults_per_type() {
        let service = NotificationSlot::for_type(SlotType::ServiceInformation);
        assert_eq!(service.slot_type.code(), 2);
        assert_eq!(service.level.code(), 3);
        assert_eq!(service.lockscreen_visibility, 2);
        assert!(service.vibration_enabled);
        assert!(service.badge_flag);
        assert!(!service.bypass_dnd);

        let social = NotificationSlot::for_type(SlotType::SocialCommunication);
        assert_eq!(social.level.code(), 4);
        assert!(social.vibration_enabled);

        let content = NotificationSlot::for_type(SlotType::ContentInformation);
        assert_eq!(content.level.code(), 2);
        assert_eq!(content.lockscreen_visibility, 3);
        assert!(!content.vibration_enabled);

        let unknown = NotificationSlot::for_type(SlotType::UnknownType);
        assert_eq!(unknown.slot_type.code(), 65535);
        assert_eq!(unknown.level.code(), 1);
    }

    #[test]
    fn test_adding_same_type_twice_keeps_one_slot() {
        let mut registry = SlotRegistry::new();
        registry.add_slot_by_type(BUNDLE, SlotType::ServiceInformation);
        registry.add_slot_by_type(BUNDLE, SlotType::ServiceInformation);
        assert_eq!(registry.slot_count(BUNDLE), 1);

        registry.add_slot_by_type(BUNDLE, SlotType::UnknownType);
        registry.add_slot_by_type(BUNDLE, SlotType::OtherTypes);
        assert_eq!(registry.slot_count(BUNDLE), 2);
    }

    #[test]
    fn test_update_requires_existing_slot() {
        let mut registry = SlotRegistry::new();
        let mut slot = NotificationSlot::for_type(SlotType::OtherTypes);
        slot.level = SlotLevel::High;

        let err = registry.update_slot(BUNDLE, slot.clone()).unwrap_err();
        assert!(matches!(err, NotificationError::SlotNotFound(_)));
        assert!(registry.get_slots(BUNDLE).is_empty());

        registry.add_slot_by_type(BUNDLE, SlotType::OtherTypes);
        registry.update_slot(BUNDLE, slot).unwrap();
        assert_eq!(
            registry.get_slot(BUNDLE, SlotType::OtherTypes).unwrap().level,
            SlotLevel::High
        );
    }

    #[test]
    fn test_remove_missing_slot_fails() {
        let mut registry = SlotRegistry::new();
        assert!(registry.remove_slot(BUNDLE, SlotType::ContentInformation).is_err());

        registry.add_slot_by_type(BUNDLE, SlotType::ContentInformation);
        assert!(registry.remove_slot(BUNDLE, SlotType::ContentInformation).is_ok());
        assert_eq!(registry.slot_count(BUNDLE), 0);
    }

    #[test]
    fn test_partial_slot_deserializes_over_type_defaults() {
        let slot: NotificationSlot =
            serde_json::from_str(r#"{"type": "SERVICE_INFORMATION", "level": 4}"#).unwrap();
        assert_eq!(slot.level, SlotLevel::High);
        assert!(slot.vibration_enabled);
        assert_eq!(slot.lockscreen_visibility, 2);
    }

    #[test]
    fn test_publish_creates_default_slot() {
        let mut registry = SlotRegistry::new();
        let slot = registry.resolve_for_publish(BUNDLE, SlotType::SocialCommunication);
        assert_eq!(slot.level, SlotLevel::High);
        assert_eq!(registry.slot_count(BUNDLE), 1);
    }
}
