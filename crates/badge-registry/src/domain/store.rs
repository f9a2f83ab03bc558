//! # Record and Metadata Storage
//!
//! `RecordStore` is the arena of badge records (position = id) together with
//! the two derived lookup tables. Every mutation goes through one of three
//! methods that update the arena and both indexes together.
//!
//! `MetaStore` is attached storage keyed by `(id, key)`. It does not follow
//! the record lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{BadgeRecord, BadgeStatus};
use super::value_objects::{Address, BadgeId, BadgeName};

/// Badge arena plus address and name indexes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStore {
    records: Vec<BadgeRecord>,
    by_address: BTreeMap<Address, BadgeId>,
    by_name: BTreeMap<BadgeName, BadgeId>,
    active: u64,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next `insert` will allocate.
    pub fn next_id(&self) -> BadgeId {
        self.records.len() as BadgeId
    }

    /// Number of records not tombstoned.
    pub fn active_count(&self) -> u64 {
        self.active
    }

    /// Any record ever issued, active or tombstoned.
    pub fn get(&self, id: BadgeId) -> Option<&BadgeRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get(i))
    }

    /// Active record only.
    pub fn get_active(&self, id: BadgeId) -> Option<&BadgeRecord> {
        self.get(id).filter(|r| r.is_active())
    }

    /// Index lookup by address.
    pub fn id_by_address(&self, address: &Address) -> Option<BadgeId> {
        self.by_address.get(address).copied()
    }

    /// Index lookup by name.
    pub fn id_by_name(&self, name: &BadgeName) -> Option<BadgeId> {
        self.by_name.get(name).copied()
    }

    /// Check if an active badge is bound to `address`.
    pub fn address_taken(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Check if an active badge carries `name`.
    pub fn name_taken(&self, name: &BadgeName) -> bool {
        self.by_name.contains_key(name)
    }

    /// All records in id order.
    pub fn records(&self) -> &[BadgeRecord] {
        &self.records
    }

    /// Address index entries.
    pub fn address_index(&self) -> impl Iterator<Item = (&Address, &BadgeId)> {
        self.by_address.iter()
    }

    /// Name index entries.
    pub fn name_index(&self) -> impl Iterator<Item = (&BadgeName, &BadgeId)> {
        self.by_name.iter()
    }

    /// Append a new active record and index it.
    ///
    /// The caller has already checked that neither key is taken.
    pub(crate) fn insert(&mut self, address: Address, name: BadgeName, owner: Address) -> BadgeId {
        debug_assert!(!self.address_taken(&address));
        debug_assert!(!self.name_taken(&name));

        let id = self.next_id();
        self.by_address.insert(address, id);
        self.by_name.insert(name.clone(), id);
        self.records.push(BadgeRecord::new(id, address, name, owner));
        self.active += 1;
        id
    }

    /// Move an active record to a free address. Returns the old address.
    pub(crate) fn rebind_address(&mut self, id: BadgeId, new_address: Address) -> Option<Address> {
        debug_assert!(!self.address_taken(&new_address));

        let record = self.slot_mut(id).filter(|r| r.is_active())?;
        let old = std::mem::replace(&mut record.address, new_address);
        self.by_address.remove(&old);
        self.by_address.insert(new_address, id);
        Some(old)
    }

    /// Retire an active record and drop both index entries.
    pub(crate) fn tombstone(&mut self, id: BadgeId) -> Option<BadgeRecord> {
        let record = self.slot_mut(id).filter(|r| r.is_active())?;
        record.status = BadgeStatus::Tombstoned;
        let retired = record.clone();

        self.by_address.remove(&retired.address);
        self.by_name.remove(&retired.name);
        self.active -= 1;
        Some(retired)
    }

    fn slot_mut(&mut self, id: BadgeId) -> Option<&mut BadgeRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get_mut(i))
    }
}

/// Per-badge key/value metadata, last write wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaStore {
    entries: BTreeMap<(BadgeId, String), String>,
}

impl MetaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw read, regardless of the badge's lifecycle.
    pub fn get(&self, id: BadgeId, key: &str) -> Option<&str> {
        self.entries
            .get(&(id, key.to_owned()))
            .map(String::as_str)
    }

    /// Overwrite `(id, key)`.
    pub(crate) fn set(&mut self, id: BadgeId, key: String, value: String) {
        self.entries.insert((id, key), value);
    }

    /// Every entry stored for `id`, in key order.
    pub fn entries_for(&self, id: BadgeId) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .range((id, String::new())..)
            .take_while(move |((entry_id, _), _)| *entry_id == id)
            .map(|((_, k), v)| (k.as_str(), v.as_str()))
    }

    /// Distinct ids that carry at least one entry.
    pub fn ids(&self) -> impl Iterator<Item = BadgeId> + '_ {
        let mut last = None;
        self.entries.keys().filter_map(move |(id, _)| {
            if last == Some(*id) {
                None
            } else {
                last = Some(*id);
                Some(*id)
            }
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
