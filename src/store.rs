//! Storage of published notifications, keyed by hash code.

use crate::core::{BundleOption, NotificationKey, NotificationRequest};
use crate::slots::NotificationSlot;
use std::collections::HashMap;

/// A stored notification with the slot it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub request: NotificationRequest,
    pub slot: NotificationSlot,
    /// Publish order; a republish takes a new ranking.
    pub ranking: u64,
}

impl NotificationRecord {
    pub fn hash_code(&self) -> &str {
        &self.request.hash_code
    }

    pub fn bundle(&self) -> &str {
        &self.request.creator_bundle_name
    }
}

/// Picks the records a removal or query applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    HashCode(String),
    Key {
        option: BundleOption,
        key: NotificationKey,
    },
    Bundle(BundleOption),
    All,
}

impl Selector {
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        let request = &record.request;
        match self {
            Self::HashCode(hash) => request.hash_code == *hash,
            Self::Key { option, key } => {
                option.matches(&request.creator_bundle_name, request.creator_uid)
                    && request.id == key.id
                    && request.label == key.label
            }
            Self::Bundle(option) => {
                option.matches(&request.creator_bundle_name, request.creator_uid)
            }
            Self::All => true,
        }
    }
}

/// Derives the hash code of a notification from its identity.
///
/// Deterministic, so republishing the same identity lands on the same record.
/// Strings are length-prefixed so no two identities share an input.
pub fn generate_hash_code(uid: i32, bundle: &str, label: &str, id: i32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&uid.to_le_bytes());
    for field in [bundle, label] {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(&id.to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

#[derive(Debug, Default)]
pub struct NotificationStore {
    records: HashMap<String, NotificationRecord>,
    next_ranking: u64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a request whose `hash_code` is already assigned. Returns `true`
    /// when an existing record was replaced.
    pub fn insert(&mut self, request: NotificationRequest, slot: NotificationSlot) -> bool {
        let ranking = self.next_ranking;
        self.next_ranking += 1;
        let record = NotificationRecord {
            request,
            slot,
            ranking,
        };
        self.records
            .insert(record.request.hash_code.clone(), record)
            .is_some()
    }

    pub fn get(&self, hash_code: &str) -> Option<&NotificationRecord> {
        self.records.get(hash_code)
    }

    pub fn contains(&self, hash_code: &str) -> bool {
        self.records.contains_key(hash_code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching `selector`, in ranking order.
    pub fn select(&self, selector: &Selector) -> Vec<&NotificationRecord> {
        let mut selected: Vec<_> = self
            .records
            .values()
            .filter(|record| selector.matches(record))
            .collect();
        selected.sort_by_key(|record| record.ranking);
        selected
    }

    /// Removes every record matching `selector` for which `keep` is false,
    /// returning them in ranking order.
    pub fn remove_where<F>(&mut self, selector: &Selector, keep: F) -> Vec<NotificationRecord>
    where
        F: Fn(&NotificationRecord) -> bool,
    {
        let hashes: Vec<String> = self
            .select(selector)
            .into_iter()
            .filter(|record| !keep(*record))
            .map(|record| record.request.hash_code.clone())
            .collect();
        hashes
            .iter()
            .filter_map(|hash| self.records.remove(hash))
            .collect()
    }

    pub fn count(&self, selector: &Selector) -> usize {
        self.records
            .values()
            .filter(|record| selector.matches(record))
            .count()
    }
}
