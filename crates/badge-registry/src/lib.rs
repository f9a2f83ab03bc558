//! # Badge Registry
//!
//! Pay-to-register registry of named badges bound to addresses.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Anyone registers a badge by paying the current fee; the badge binds one
//!   address and one name, both unique among active badges.
//! - Badge owners rebind the address and attach key/value metadata.
//! - The admin unregisters badges, sets the fee, hands over administration
//!   and drains collected fees.
//!
//! ## Lookups
//!
//! | Operation | Miss |
//! |-----------|------|
//! | `badge_by_id` | `RecordNotFound` |
//! | `get_meta` | `RecordNotFound` / `MetaNotFound` |
//! | `badge_by_address` | `InvariantViolation` |
//! | `badge_by_name` | `InvariantViolation` |
//!
//! Ids are never reused. Unregistering frees the address and name, but the
//! badge's metadata stays stored.
//!
//! ## Telemetry
//!
//! The service logs through `tracing` and updates the Prometheus metrics of
//! `badge-telemetry`. Hosts install both with
//! `badge_telemetry::init_telemetry(&TelemetryConfig::from_env())` before
//! calling [`RegistryService::open`].
//!
//! ## Module Structure
//!
//! ```text
//! badge-registry/
//! ├── domain/      # Records, indexes, metadata, admin state, engine, invariants
//! ├── ports/       # BadgeRegistryApi + FundsTransfer, CommandJournal
//! ├── adapters/    # InMemoryLedger, InMemoryJournal, FileJournal
//! ├── commands     # Mutations as journaled data
//! ├── events       # Event log and topics
//! ├── replay       # Rebuild from a journal
//! └── service      # Async, serialized front
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod replay;
pub mod service;

// Re-exports
pub use adapters::{FileJournal, InMemoryJournal, InMemoryLedger};
pub use commands::{CommandOutcome, RegistryCommand};
pub use config::{RegistryConfig, ONE_ETHER};
pub use domain::{
    check_all_invariants, Address, AdminState, Amount, BadgeByAddress, BadgeById, BadgeByName,
    BadgeId, BadgeName, BadgeRecord, BadgeStatus, InvariantBreach, InvariantCheckResult,
    MetaStore, RecordStore, RegistryEngine, RegistryError, RegistryState, MAX_NAME_LEN, U256,
};
pub use errors::{JournalError, ServiceError};
pub use events::{EventLog, EventRecord, RegistryEvent};
pub use ports::{BadgeRegistryApi, CommandJournal, FundsTransfer, JournalRecord};
pub use replay::{in_doubt_drains, replay, SettledTransfer};
pub use service::{RegistryService, ServiceStats};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::adapters::{InMemoryJournal, InMemoryLedger};
    pub use crate::config::RegistryConfig;
    pub use crate::domain::{Address, Amount, BadgeId, BadgeName, RegistryEngine, RegistryError};
    pub use crate::errors::ServiceError;
    pub use crate::events::RegistryEvent;
    pub use crate::ports::{BadgeRegistryApi, FundsTransfer};
    pub use crate::service::RegistryService;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
