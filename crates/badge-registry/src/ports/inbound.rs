//! # Driving Ports (API - Inbound)
//!
//! The operation surface of the registry. Every call acts on behalf of an
//! explicit `caller`; there is no ambient sender.
//!
//! Lookups come in two flavors: `badge_by_id` and `get_meta` report a missing
//! record as `RecordNotFound`, while `badge_by_address` and `badge_by_name`
//! treat an index miss as `InvariantViolation`.

use crate::domain::entities::{BadgeByAddress, BadgeById, BadgeByName};
use crate::domain::errors::RegistryError;
use crate::domain::value_objects::{Address, Amount, BadgeId, BadgeName};
use crate::errors::ServiceError;
use crate::events::EventRecord;
use async_trait::async_trait;

/// Badge registry API - driving port.
#[async_trait]
pub trait BadgeRegistryApi: Send + Sync {
    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Create a badge owned by `caller`, paying `paid`.
    async fn register(
        &self,
        caller: Address,
        address: Address,
        name: BadgeName,
        paid: Amount,
    ) -> Result<BadgeId, ServiceError>;

    /// Rebind badge `id` (badge owner only).
    async fn set_address(
        &self,
        caller: Address,
        id: BadgeId,
        new_address: Address,
    ) -> Result<(), ServiceError>;

    /// Write a metadata entry (badge owner only).
    async fn set_meta(
        &self,
        caller: Address,
        id: BadgeId,
        key: String,
        value: String,
    ) -> Result<(), ServiceError>;

    /// Retire badge `id` (admin only).
    async fn unregister(&self, caller: Address, id: BadgeId) -> Result<(), ServiceError>;

    /// Hand administration to `new_owner` (admin only).
    async fn set_owner(&self, caller: Address, new_owner: Address) -> Result<(), ServiceError>;

    /// Change the registration fee (admin only).
    async fn set_fee(&self, caller: Address, fee: Amount) -> Result<(), ServiceError>;

    /// Pay the balance out to the admin (admin only).
    async fn drain(&self, caller: Address) -> Result<Amount, ServiceError>;

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Active badge by id.
    async fn badge_by_id(&self, id: BadgeId) -> Result<BadgeById, RegistryError>;

    /// Active badge by bound address.
    async fn badge_by_address(&self, address: Address) -> Result<BadgeByAddress, RegistryError>;

    /// Active badge by name.
    async fn badge_by_name(&self, name: BadgeName) -> Result<BadgeByName, RegistryError>;

    /// Metadata of an active badge.
    async fn get_meta(&self, id: BadgeId, key: &str) -> Result<String, RegistryError>;

    /// Number of active badges.
    async fn active_count(&self) -> u64;

    /// Current registration fee.
    async fn current_fee(&self) -> Amount;

    /// Current admin.
    async fn current_admin(&self) -> Address;

    /// Fees held, not yet drained.
    async fn balance(&self) -> Amount;

    /// Id the next registration will receive.
    async fn next_id(&self) -> BadgeId;

    /// Events with `seq >= from`.
    async fn events_since(&self, from: u64) -> Vec<EventRecord>;
}
