//! # Registry Engine
//!
//! Synchronous state machine over records, metadata, admin state and the
//! event log. Every operation validates all of its preconditions before it
//! touches anything, so a rejected call leaves the state exactly as it was.
//!
//! Authorization is two flat predicates: `ensure_owner` for badge-owner
//! operations and `ensure_admin` for registry-wide ones.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tracing::{debug, error, info};

use super::entities::{AdminState, BadgeByAddress, BadgeById, BadgeByName, BadgeRecord};
use super::errors::RegistryError;
use super::invariants::{check_all_invariants, InvariantCheckResult};
use super::store::{MetaStore, RecordStore};
use super::value_objects::{Address, Amount, BadgeId, BadgeName};
use crate::commands::{CommandOutcome, RegistryCommand};
use crate::config::RegistryConfig;
use crate::events::{EventLog, EventRecord, RegistryEvent};
use crate::ports::outbound::FundsTransfer;

/// Everything the registry persists. Encoding is deterministic: every map is
/// ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Badge arena and indexes.
    pub records: RecordStore,
    /// Attached metadata.
    pub meta: MetaStore,
    /// Admin and treasury.
    pub admin: AdminState,
    /// Emitted events.
    pub events: EventLog,
}

impl RegistryState {
    /// Empty state with the given admin and fee.
    pub fn new(admin: Address, fee: Amount) -> Self {
        Self {
            records: RecordStore::new(),
            meta: MetaStore::new(),
            admin: AdminState::new(admin, fee),
            events: EventLog::new(),
        }
    }
}

/// The registry state machine.
#[derive(Clone, Debug)]
pub struct RegistryEngine {
    state: RegistryState,
    verify_invariants: bool,
    breaches_seen: u64,
}

impl RegistryEngine {
    /// Create an engine from configuration.
    pub fn new(config: &RegistryConfig) -> Self {
        info!(
            admin = ?config.initial_admin,
            fee = %config.default_fee,
            "badge registry initialized"
        );
        Self {
            state: RegistryState::new(config.initial_admin, config.default_fee),
            verify_invariants: config.verify_invariants,
            breaches_seen: 0,
        }
    }

    /// Restore an engine from a saved state.
    pub fn from_state(state: RegistryState, verify_invariants: bool) -> Self {
        Self {
            state,
            verify_invariants,
            breaches_seen: 0,
        }
    }

    /// Read-only view of the whole state.
    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a badge owned by `caller`.
    pub fn register(
        &mut self,
        caller: Address,
        address: Address,
        name: BadgeName,
        paid: Amount,
    ) -> Result<BadgeId, RegistryError> {
        self.check_register(&address, &name, paid)?;

        self.state.admin.credit(paid)?;
        let id = self.state.records.insert(address, name.clone(), caller);
        self.state
            .events
            .emit(RegistryEvent::Registered { id, address, name: name.clone() });

        info!(id, address = ?address, name = %name, owner = ?caller, "badge registered");
        self.after_commit("register");
        Ok(id)
    }

    /// Bind badge `id` to `new_address`.
    pub fn set_address(
        &mut self,
        caller: Address,
        id: BadgeId,
        new_address: Address,
    ) -> Result<(), RegistryError> {
        self.check_set_address(&caller, id, &new_address)?;

        let old = self
            .state
            .records
            .rebind_address(id, new_address)
            .ok_or(RegistryError::RecordNotFound(id))?;
        self.state.events.emit(RegistryEvent::AddressChanged {
            id,
            address: new_address,
        });

        info!(id, old = ?old, new = ?new_address, "badge address changed");
        self.after_commit("set_address");
        Ok(())
    }

    /// Write `(id, key) = value`.
    pub fn set_meta(
        &mut self,
        caller: Address,
        id: BadgeId,
        key: String,
        value: String,
    ) -> Result<(), RegistryError> {
        self.ensure_owner(&caller, id)?;

        self.state.meta.set(id, key.clone(), value.clone());
        debug!(id, key = %key, "badge metadata set");
        self.state
            .events
            .emit(RegistryEvent::MetaChanged { id, key, value });

        self.after_commit("set_meta");
        Ok(())
    }

    /// Retire badge `id`. Its metadata stays stored.
    pub fn unregister(&mut self, caller: Address, id: BadgeId) -> Result<(), RegistryError> {
        self.check_unregister(&caller, id)?;

        let retired = self
            .state
            .records
            .tombstone(id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        self.state.events.emit(RegistryEvent::Unregistered {
            id,
            name: retired.name.clone(),
        });

        info!(id, name = %retired.name, "badge unregistered");
        self.after_commit("unregister");
        Ok(())
    }

    /// Hand administration to `new_owner`.
    pub fn set_owner(&mut self, caller: Address, new_owner: Address) -> Result<(), RegistryError> {
        self.ensure_admin(&caller)?;

        let old = std::mem::replace(&mut self.state.admin.owner, new_owner);
        self.state.events.emit(RegistryEvent::NewOwner {
            old,
            current: new_owner,
        });

        info!(old = ?old, current = ?new_owner, "registry admin changed");
        self.after_commit("set_owner");
        Ok(())
    }

    /// Replace the registration fee.
    pub fn set_fee(&mut self, caller: Address, fee: Amount) -> Result<(), RegistryError> {
        self.ensure_admin(&caller)?;

        let old = std::mem::replace(&mut self.state.admin.fee, fee);
        info!(old = %old, new = %fee, "registration fee changed");
        self.after_commit("set_fee");
        Ok(())
    }

    /// Pay the whole balance to the admin through `transfer`.
    ///
    /// The balance is zeroed only once the transfer succeeded. An empty
    /// balance succeeds without calling the oracle.
    pub fn drain(
        &mut self,
        caller: Address,
        transfer: &mut dyn FundsTransfer,
    ) -> Result<Amount, RegistryError> {
        self.ensure_admin(&caller)?;

        let amount = self.state.admin.balance;
        if amount.is_zero() {
            debug!("drain with empty balance");
            return Ok(Amount::zero());
        }

        transfer
            .transfer(caller, amount)
            .map_err(RegistryError::TransferFailed)?;
        let drained = self.state.admin.take_balance();

        info!(to = ?caller, amount = %drained, "registry balance drained");
        self.after_commit("drain");
        Ok(drained)
    }

    // =========================================================================
    // COMMAND DISPATCH
    // =========================================================================

    /// Run every precondition of `command` without changing anything.
    ///
    /// A command that passes `check` can only fail in `apply` if it is a
    /// drain and the transfer is refused.
    pub fn check(&self, command: &RegistryCommand) -> Result<(), RegistryError> {
        match command {
            RegistryCommand::Register {
                address, name, paid, ..
            } => self.check_register(address, name, *paid),
            RegistryCommand::SetAddress {
                caller, id, address,
            } => self.check_set_address(caller, *id, address),
            RegistryCommand::SetMeta { caller, id, .. } => self.ensure_owner(caller, *id),
            RegistryCommand::Unregister { caller, id } => self.check_unregister(caller, *id),
            RegistryCommand::SetOwner { caller, .. }
            | RegistryCommand::SetFee { caller, .. }
            | RegistryCommand::Drain { caller } => self.ensure_admin(caller),
        }
    }

    /// Apply `command`.
    pub fn apply(
        &mut self,
        command: RegistryCommand,
        transfer: &mut dyn FundsTransfer,
    ) -> Result<CommandOutcome, RegistryError> {
        match command {
            RegistryCommand::Register {
                caller,
                address,
                name,
                paid,
            } => self
                .register(caller, address, name, paid)
                .map(CommandOutcome::Registered),
            RegistryCommand::SetAddress {
                caller,
                id,
                address,
            } => self
                .set_address(caller, id, address)
                .map(|()| CommandOutcome::Applied),
            RegistryCommand::SetMeta {
                caller,
                id,
                key,
                value,
            } => self
                .set_meta(caller, id, key, value)
                .map(|()| CommandOutcome::Applied),
            RegistryCommand::Unregister { caller, id } => self
                .unregister(caller, id)
                .map(|()| CommandOutcome::Applied),
            RegistryCommand::SetOwner { caller, new_owner } => self
                .set_owner(caller, new_owner)
                .map(|()| CommandOutcome::Applied),
            RegistryCommand::SetFee { caller, fee } => self
                .set_fee(caller, fee)
                .map(|()| CommandOutcome::Applied),
            RegistryCommand::Drain { caller } => {
                self.drain(caller, transfer).map(CommandOutcome::Drained)
            }
        }
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Badge by id. Tombstoned and never-issued ids are `RecordNotFound`.
    pub fn badge_by_id(&self, id: BadgeId) -> Result<BadgeById, RegistryError> {
        self.state
            .records
            .get_active(id)
            .map(BadgeById::from)
            .ok_or(RegistryError::RecordNotFound(id))
    }

    /// Badge by bound address. A miss is an `InvariantViolation`.
    pub fn badge_by_address(&self, address: &Address) -> Result<BadgeByAddress, RegistryError> {
        let id = self.state.records.id_by_address(address).ok_or_else(|| {
            RegistryError::InvariantViolation(format!("address index has no entry for {address:?}"))
        })?;
        let record = self.indexed_record(id, |r| r.address == *address)?;
        Ok(BadgeByAddress::from(record))
    }

    /// Badge by name. A miss is an `InvariantViolation`.
    pub fn badge_by_name(&self, name: &BadgeName) -> Result<BadgeByName, RegistryError> {
        let id = self.state.records.id_by_name(name).ok_or_else(|| {
            RegistryError::InvariantViolation(format!("name index has no entry for {name:?}"))
        })?;
        let record = self.indexed_record(id, |r| r.name == *name)?;
        Ok(BadgeByName::from(record))
    }

    /// Metadata of an active badge.
    pub fn get_meta(&self, id: BadgeId, key: &str) -> Result<String, RegistryError> {
        if self.state.records.get_active(id).is_none() {
            return Err(RegistryError::RecordNotFound(id));
        }
        self.state
            .meta
            .get(id, key)
            .map(str::to_owned)
            .ok_or_else(|| RegistryError::MetaNotFound {
                id,
                key: key.to_owned(),
            })
    }

    /// Raw metadata read that ignores the badge lifecycle. Entries of
    /// unregistered badges are still here.
    pub fn retained_meta(&self, id: BadgeId, key: &str) -> Option<&str> {
        self.state.meta.get(id, key)
    }

    /// Number of active badges.
    pub fn active_count(&self) -> u64 {
        self.state.records.active_count()
    }

    /// Current registration fee.
    pub fn current_fee(&self) -> Amount {
        self.state.admin.fee
    }

    /// Current admin.
    pub fn current_admin(&self) -> Address {
        self.state.admin.owner
    }

    /// Fees held, not yet drained.
    pub fn balance(&self) -> Amount {
        self.state.admin.balance
    }

    /// Id the next registration will receive.
    pub fn next_id(&self) -> BadgeId {
        self.state.records.next_id()
    }

    /// Events with `seq >= from`.
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.state.events.since(from)
    }

    /// Commits after which the invariant check failed. Always zero when
    /// verification is off.
    pub fn breaches_seen(&self) -> u64 {
        self.breaches_seen
    }

    /// Run every invariant check against the current state.
    pub fn verify(&self) -> InvariantCheckResult {
        check_all_invariants(&self.state)
    }

    /// Keccak-256 over the encoded state. Equal states give equal roots.
    pub fn state_root(&self) -> Result<[u8; 32], RegistryError> {
        let bytes = bincode::serialize(&self.state).map_err(|e| {
            error!(error = %e, "state encoding failed");
            RegistryError::InvariantViolation(format!("state encoding failed: {e}"))
        })?;
        let mut hasher = Keccak256::new();
        hasher.update(&bytes);
        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        Ok(root)
    }

    // =========================================================================
    // PRECONDITIONS
    // =========================================================================

    fn ensure_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if self.state.admin.is_admin(caller) {
            Ok(())
        } else {
            Err(RegistryError::NotAdmin { caller: *caller })
        }
    }

    fn ensure_owner(&self, caller: &Address, id: BadgeId) -> Result<(), RegistryError> {
        let record = self
            .state
            .records
            .get_active(id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        if record.owner == *caller {
            Ok(())
        } else {
            Err(RegistryError::NotOwner {
                id,
                caller: *caller,
            })
        }
    }

    fn check_register(
        &self,
        address: &Address,
        name: &BadgeName,
        paid: Amount,
    ) -> Result<(), RegistryError> {
        let fee = self.state.admin.fee;
        if paid < fee {
            return Err(RegistryError::InsufficientFee {
                required: fee,
                paid,
            });
        }
        if self.state.records.address_taken(address) || self.state.records.name_taken(name) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.state.admin.check_credit(paid)?;
        Ok(())
    }

    fn check_set_address(
        &self,
        caller: &Address,
        id: BadgeId,
        new_address: &Address,
    ) -> Result<(), RegistryError> {
        self.ensure_owner(caller, id)?;
        if self.state.records.address_taken(new_address) {
            return Err(RegistryError::AddressTaken(*new_address));
        }
        Ok(())
    }

    fn check_unregister(&self, caller: &Address, id: BadgeId) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        if self.state.records.get_active(id).is_none() {
            return Err(RegistryError::RecordNotFound(id));
        }
        Ok(())
    }

    fn indexed_record(
        &self,
        id: BadgeId,
        matches_key: impl Fn(&BadgeRecord) -> bool,
    ) -> Result<&BadgeRecord, RegistryError> {
        self.state
            .records
            .get_active(id)
            .filter(|r| matches_key(r))
            .ok_or_else(|| {
                RegistryError::InvariantViolation(format!(
                    "index entry points at badge {id}, which does not carry the key"
                ))
            })
    }

    fn after_commit(&mut self, operation: &'static str) {
        if !self.verify_invariants {
            return;
        }
        if let InvariantCheckResult::Invalid(breaches) = check_all_invariants(&self.state) {
            self.breaches_seen += 1;
            error!(operation, breaches = ?breaches, "registry invariants broken after commit");
        }
    }
}
