//! # Domain Invariants
//!
//! Structural properties of a registry state that every accepted operation
//! must preserve:
//!
//! - Index agreement: each active record is reachable from both indexes, and
//!   each index entry points at an active record carrying that key.
//! - Uniqueness: no two active records share an address or a name.
//! - Id permanence: record ids equal their arena position.
//! - Active count matches the number of active records.
//! - Fee conservation: `balance == collected - drained`.
//! - Metadata is only attached to ids that were issued.

use std::collections::BTreeSet;

use super::engine::RegistryState;
use super::value_objects::BadgeId;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Both indexes agree with the arena.
#[must_use]
pub fn check_index_agreement(state: &RegistryState) -> bool {
    let records = &state.records;
    let forward = records.records().iter().filter(|r| r.is_active()).all(|r| {
        records.id_by_address(&r.address) == Some(r.id) && records.id_by_name(&r.name) == Some(r.id)
    });
    let by_address = records
        .address_index()
        .all(|(address, id)| records.get_active(*id).is_some_and(|r| r.address == *address));
    let by_name = records
        .name_index()
        .all(|(name, id)| records.get_active(*id).is_some_and(|r| r.name == *name));
    forward && by_address && by_name
}

/// No two active records share an address or a name.
#[must_use]
pub fn check_uniqueness(state: &RegistryState) -> bool {
    let mut addresses = BTreeSet::new();
    let mut names = BTreeSet::new();
    state
        .records
        .records()
        .iter()
        .filter(|r| r.is_active())
        .all(|r| addresses.insert(r.address) && names.insert(r.name.clone()))
}

/// Ids are arena positions, so an id can never be handed out twice.
#[must_use]
pub fn check_id_permanence(state: &RegistryState) -> bool {
    state
        .records
        .records()
        .iter()
        .enumerate()
        .all(|(pos, r)| BadgeId::try_from(pos).is_ok_and(|id| id == r.id))
}

/// The cached active count is exact.
#[must_use]
pub fn check_active_count(state: &RegistryState) -> bool {
    let counted = state.records.records().iter().filter(|r| r.is_active()).count();
    u64::try_from(counted).is_ok_and(|c| c == state.records.active_count())
}

/// `balance == total_collected - total_drained`.
#[must_use]
pub fn check_fee_conservation(state: &RegistryState) -> bool {
    let admin = &state.admin;
    admin
        .total_collected
        .checked_sub(admin.total_drained)
        .is_some_and(|expected| expected == admin.balance)
}

/// Metadata never refers to an id beyond the arena.
#[must_use]
pub fn check_meta_attachment(state: &RegistryState) -> bool {
    let next = state.records.next_id();
    state.meta.ids().all(|id| id < next)
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(state: &RegistryState) -> InvariantCheckResult {
    let mut breaches = Vec::new();

    if !check_index_agreement(state) {
        breaches.push(InvariantBreach::IndexDisagreement);
    }
    if !check_uniqueness(state) {
        breaches.push(InvariantBreach::DuplicateKey);
    }
    if !check_id_permanence(state) {
        breaches.push(InvariantBreach::IdMismatch);
    }
    if !check_active_count(state) {
        breaches.push(InvariantBreach::ActiveCountDrift {
            cached: state.records.active_count(),
        });
    }
    if !check_fee_conservation(state) {
        breaches.push(InvariantBreach::FeeImbalance);
    }
    if !check_meta_attachment(state) {
        breaches.push(InvariantBreach::OrphanMeta);
    }

    if breaches.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(breaches)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants broken.
    Invalid(Vec<InvariantBreach>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A specific broken invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantBreach {
    /// An index entry and the arena disagree.
    IndexDisagreement,
    /// Two active records share a key.
    DuplicateKey,
    /// A record sits at the wrong arena position.
    IdMismatch,
    /// The cached active count is wrong.
    ActiveCountDrift {
        /// Value held by the store
        cached: u64,
    },
    /// Balance does not equal collected minus drained.
    FeeImbalance,
    /// Metadata attached to an id that was never issued.
    OrphanMeta,
}

impl std::fmt::Display for InvariantBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexDisagreement => write!(f, "index and record arena disagree"),
            Self::DuplicateKey => write!(f, "duplicate address or name among active badges"),
            Self::IdMismatch => write!(f, "record id differs from its position"),
            Self::ActiveCountDrift { cached } => {
                write!(f, "active count {cached} does not match records")
            }
            Self::FeeImbalance => write!(f, "balance differs from collected minus drained"),
            Self::OrphanMeta => write!(f, "metadata attached to an unissued id"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
