//! # Event Schema
//!
//! Append-only log of everything observers may react to. One entry per
//! successful mutating call that emits; `set_fee` and `drain` emit nothing.
//!
//! | Event | Emitted by |
//! |-------|------------|
//! | `Registered` | `register` |
//! | `AddressChanged` | `set_address` |
//! | `MetaChanged` | `set_meta` |
//! | `Unregistered` | `unregister` |
//! | `NewOwner` | `set_owner` |

use crate::domain::value_objects::{Address, BadgeId, BadgeName};
use serde::{Deserialize, Serialize};

/// Registry event payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A badge was created.
    Registered {
        /// New badge id.
        id: BadgeId,
        /// Bound address.
        address: Address,
        /// Registered name.
        name: BadgeName,
    },
    /// A badge was moved to a new address.
    AddressChanged {
        /// Badge id.
        id: BadgeId,
        /// New address.
        address: Address,
    },
    /// A metadata entry was written.
    MetaChanged {
        /// Badge id.
        id: BadgeId,
        /// Metadata key.
        key: String,
        /// New value.
        value: String,
    },
    /// A badge was retired by the admin.
    Unregistered {
        /// Retired id.
        id: BadgeId,
        /// Name it carried.
        name: BadgeName,
    },
    /// Registry administration changed hands.
    NewOwner {
        /// Previous admin.
        old: Address,
        /// New admin.
        current: Address,
    },
}

impl RegistryEvent {
    /// Topic name, stable across versions.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Registered { .. } => topics::REGISTERED,
            Self::AddressChanged { .. } => topics::ADDRESS_CHANGED,
            Self::MetaChanged { .. } => topics::META_CHANGED,
            Self::Unregistered { .. } => topics::UNREGISTERED,
            Self::NewOwner { .. } => topics::NEW_OWNER,
        }
    }
}

/// A sequenced log entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0 with no gaps.
    pub seq: u64,
    /// Payload.
    pub event: RegistryEvent,
}

/// Append-only event log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub(crate) fn emit(&mut self, event: RegistryEvent) -> u64 {
        let seq = self.entries.len() as u64;
        tracing::debug!(seq, topic = event.topic(), "event emitted");
        self.entries.push(EventRecord { seq, event });
        seq
    }

    /// Every entry with `seq >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    /// Entries whose payload has the given topic.
    pub fn with_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a EventRecord> {
        self.entries.iter().filter(move |r| r.event.topic() == topic)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last entry, if any.
    pub fn last(&self) -> Option<&EventRecord> {
        self.entries.last()
    }
}

/// Event topics.
pub mod topics {
    /// Badge created.
    pub const REGISTERED: &str = "badge_registry.registered";

    /// Badge address changed.
    pub const ADDRESS_CHANGED: &str = "badge_registry.address_changed";

    /// Badge metadata written.
    pub const META_CHANGED: &str = "badge_registry.meta_changed";

    /// Badge retired.
    pub const UNREGISTERED: &str = "badge_registry.unregistered";

    /// Admin changed.
    pub const NEW_OWNER: &str = "badge_registry.new_owner";
}
