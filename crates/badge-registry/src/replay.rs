//! # Journal Replay
//!
//! Rebuilds a registry by re-applying journaled commands in order. Commands
//! with a matching `Abort` record are skipped. A drain is only re-applied when
//! a `Settled` record says its funds moved; a drain with neither marker is in
//! doubt and the balance is kept. The same records always give the same state
//! root and event log.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::domain::engine::RegistryEngine;
use crate::domain::errors::RegistryError;
use crate::domain::value_objects::{Address, Amount};
use crate::ports::outbound::{FundsTransfer, JournalRecord};

/// Payment oracle for recovery: only drains with a `Settled` record are
/// replayed, and their funds already moved, so every transfer is accepted
/// without side effects.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettledTransfer;

impl FundsTransfer for SettledTransfer {
    fn transfer(&mut self, _to: Address, _amount: Amount) -> Result<(), String> {
        Ok(())
    }
}

fn markers(records: &[JournalRecord]) -> (BTreeSet<u64>, BTreeSet<u64>) {
    let mut aborted = BTreeSet::new();
    let mut settled = BTreeSet::new();
    for record in records {
        match record {
            JournalRecord::Abort { seq, .. } => {
                aborted.insert(*seq);
            }
            JournalRecord::Settled { seq } => {
                settled.insert(*seq);
            }
            JournalRecord::Command { .. } => {}
        }
    }
    (aborted, settled)
}

/// Journaled drains that were neither settled nor aborted: the process
/// stopped between journaling the drain and recording its outcome.
pub fn in_doubt_drains(records: &[JournalRecord]) -> Vec<u64> {
    let (aborted, settled) = markers(records);
    records
        .iter()
        .filter_map(|r| match r {
            JournalRecord::Command { seq, command }
                if command.is_drain() && !aborted.contains(seq) && !settled.contains(seq) =>
            {
                Some(*seq)
            }
            _ => None,
        })
        .collect()
}

/// Replay `records` on a fresh engine built from `config`.
///
/// A command that is not aborted but fails again means the journal and the
/// rules disagree; that is reported as `InvariantViolation`.
pub fn replay(
    config: &RegistryConfig,
    records: &[JournalRecord],
    transfer: &mut dyn FundsTransfer,
) -> Result<RegistryEngine, RegistryError> {
    let (aborted, settled) = markers(records);

    let mut engine = RegistryEngine::new(config);
    let mut applied = 0u64;
    let mut in_doubt = 0u64;

    for record in records {
        let JournalRecord::Command { seq, command } = record else {
            continue;
        };
        if aborted.contains(seq) {
            debug!(seq, operation = command.name(), "skipping aborted command");
            continue;
        }
        if command.is_drain() && !settled.contains(seq) {
            in_doubt += 1;
            warn!(seq, "drain has no recorded outcome, keeping the balance");
            continue;
        }
        engine.apply(command.clone(), transfer).map_err(|e| {
            RegistryError::InvariantViolation(format!(
                "journaled command {seq} ({}) failed on replay: {e}",
                command.name()
            ))
        })?;
        applied += 1;
    }

    info!(
        applied,
        aborted = aborted.len(),
        in_doubt,
        active = engine.active_count(),
        "journal replayed"
    );
    Ok(engine)
}
