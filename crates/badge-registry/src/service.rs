//! # Badge Registry Service
//!
//! Async front of the registry. All calls are serialized behind one lock
//! that covers the engine, the payment oracle, the journal and the stats.
//!
//! ## Write path
//!
//! 1. `engine.check(command)`: a rejected command is never journaled.
//! 2. Journal append. If it fails the state is untouched.
//! 3. `engine.apply(command)`. Only a drain can fail here (transfer refused);
//!    it gets an `Abort` record so replay skips it.
//! 4. A drain that paid out gets a `Settled` record so replay applies it.
//!
//! If the `Abort` or `Settled` record cannot be written the service halts:
//! reads keep working, mutations fail with `ServiceError::Halted`.

use crate::adapters::{FileJournal, InMemoryJournal};
use crate::commands::{CommandOutcome, RegistryCommand};
use crate::config::RegistryConfig;
use crate::domain::engine::RegistryEngine;
use crate::domain::entities::{BadgeByAddress, BadgeById, BadgeByName};
use crate::domain::errors::RegistryError;
use crate::domain::invariants::InvariantCheckResult;
use crate::domain::value_objects::{Address, Amount, BadgeId, BadgeName};
use crate::errors::{JournalError, ServiceError};
use crate::events::EventRecord;
use crate::ports::inbound::BadgeRegistryApi;
use crate::ports::outbound::{CommandJournal, FundsTransfer, JournalRecord};
use crate::replay::{in_doubt_drains, replay, SettledTransfer};

use async_trait::async_trait;
use badge_telemetry::metrics::{
    record_rejection, HistogramTimer, ACTIVE_BADGES, DRAINED, FEES_COLLECTED, JOURNAL_APPENDS,
    REGISTRATIONS, UNREGISTRATIONS,
};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Statistics for the registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Mutations that were applied.
    pub operations_applied: u64,
    /// Mutations that were rejected, including refused drains.
    pub operations_rejected: u64,
    /// Commits after which the invariant check failed.
    pub invariant_violations: u64,
    /// Journal appends that failed.
    pub journal_failures: u64,
    /// Journaled drains found without an outcome on startup.
    pub in_doubt_drains: u64,
    /// Fees credited since the service started.
    pub fees_collected: Amount,
    /// Funds drained since the service started.
    pub total_drained: Amount,
}

struct ServiceInner<L, J> {
    engine: RegistryEngine,
    ledger: L,
    journal: J,
    stats: ServiceStats,
    halted: Option<String>,
}

impl<L: FundsTransfer, J: CommandJournal> ServiceInner<L, J> {
    fn reject(&mut self, operation: &'static str, err: &RegistryError) {
        self.stats.operations_rejected += 1;
        record_rejection(operation, err.kind());
        if err.is_recoverable() {
            warn!(operation, error = %err, "operation rejected");
        } else {
            error!(operation, error = %err, "operation failed on an invariant");
        }
    }

    fn record_applied(&mut self, command: &RegistryCommand, outcome: &CommandOutcome) {
        self.stats.operations_applied += 1;
        self.stats.invariant_violations = self.engine.breaches_seen();

        // Both totals are bounded by the engine's overflow-checked treasury.
        match (command, outcome) {
            (RegistryCommand::Register { paid, .. }, _) => {
                REGISTRATIONS.inc();
                FEES_COLLECTED.inc_by(as_metric(*paid));
                self.stats.fees_collected = self.stats.fees_collected.saturating_add(*paid);
            }
            (RegistryCommand::Unregister { .. }, _) => UNREGISTRATIONS.inc(),
            (_, CommandOutcome::Drained(amount)) => {
                DRAINED.inc_by(as_metric(*amount));
                self.stats.total_drained = self.stats.total_drained.saturating_add(*amount);
            }
            _ => {}
        }
        ACTIVE_BADGES.set(self.engine.active_count() as f64);
    }

    fn execute(&mut self, command: RegistryCommand) -> Result<CommandOutcome, ServiceError> {
        let operation = command.name();

        if let Some(reason) = &self.halted {
            warn!(operation, reason = %reason, "mutation refused, service halted");
            return Err(ServiceError::Halted(reason.clone()));
        }

        if let Err(e) = self.engine.check(&command) {
            self.reject(operation, &e);
            return Err(e.into());
        }

        let seq = self.journal.next_seq();
        let record = JournalRecord::Command {
            seq,
            command: command.clone(),
        };
        if let Err(e) = self.journal.append(record) {
            self.stats.journal_failures += 1;
            error!(operation, seq, error = %e, "journal append failed");
            return Err(e.into());
        }
        JOURNAL_APPENDS.inc();

        match self.engine.apply(command.clone(), &mut self.ledger) {
            Ok(outcome) => {
                if command.is_drain() {
                    self.mark(JournalRecord::Settled { seq });
                }
                self.record_applied(&command, &outcome);
                Ok(outcome)
            }
            Err(e) => {
                self.reject(operation, &e);
                self.mark(JournalRecord::Abort {
                    seq,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Journal the outcome of command `seq`. On failure the live state and
    /// the journal disagree, so the service halts.
    fn mark(&mut self, record: JournalRecord) {
        let seq = record.seq();
        match self.journal.append(record) {
            Ok(()) => JOURNAL_APPENDS.inc(),
            Err(e) => self.halt(seq, &e),
        }
    }

    fn halt(&mut self, seq: u64, cause: &JournalError) {
        self.stats.journal_failures += 1;
        error!(seq, error = %cause, "outcome of command could not be journaled, halting");
        self.halted = Some(format!("outcome of command {seq} not journaled: {cause}"));
    }
}

/// Amounts are exported to Prometheus in wei as `f64`. Large values lose
/// precision, never magnitude.
fn as_metric(amount: Amount) -> f64 {
    amount.to_string().parse().unwrap_or(f64::MAX)
}

/// The badge registry service.
pub struct RegistryService<L: FundsTransfer, J: CommandJournal> {
    inner: Mutex<ServiceInner<L, J>>,
}

impl<L: FundsTransfer> RegistryService<L, Box<dyn CommandJournal>> {
    /// Open a service with the journal named by `config`: a file journal when
    /// `journal_path` is set, otherwise an in-memory one.
    pub fn open(config: &RegistryConfig, ledger: L) -> Result<Self, ServiceError> {
        let journal: Box<dyn CommandJournal> = match &config.journal_path {
            Some(path) => Box::new(FileJournal::open(path)?),
            None => Box::new(InMemoryJournal::new()),
        };
        Self::new(config, ledger, journal)
    }
}

impl<L: FundsTransfer, J: CommandJournal> RegistryService<L, J> {
    /// Create a service, rebuilding state from whatever `journal` already
    /// holds.
    pub fn new(config: &RegistryConfig, ledger: L, journal: J) -> Result<Self, ServiceError> {
        let records = journal.records()?;
        let engine = replay(config, &records, &mut SettledTransfer)?;
        ACTIVE_BADGES.set(engine.active_count() as f64);

        let in_doubt = in_doubt_drains(&records);
        if !in_doubt.is_empty() {
            error!(
                seqs = ?in_doubt,
                "drains without a recorded outcome, balance kept; reconcile with the payment ledger"
            );
        }

        info!(
            recovered = records.len(),
            next_seq = journal.next_seq(),
            "badge registry service started"
        );

        Ok(Self {
            inner: Mutex::new(ServiceInner {
                engine,
                ledger,
                journal,
                stats: ServiceStats {
                    in_doubt_drains: in_doubt.len() as u64,
                    ..ServiceStats::default()
                },
                halted: None,
            }),
        })
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.inner.lock().await.stats.clone()
    }

    /// Keccak-256 root of the current state.
    pub async fn state_root(&self) -> Result<[u8; 32], RegistryError> {
        self.inner.lock().await.engine.state_root()
    }

    /// Why mutations are refused, if the service halted.
    pub async fn halted(&self) -> Option<String> {
        self.inner.lock().await.halted.clone()
    }

    /// Every journal record, in order.
    pub async fn journal_records(&self) -> Result<Vec<JournalRecord>, ServiceError> {
        Ok(self.inner.lock().await.journal.records()?)
    }

    /// Run every invariant check now.
    pub async fn verify(&self) -> InvariantCheckResult {
        self.inner.lock().await.engine.verify()
    }

    /// Submit an already-built command.
    #[instrument(skip(self, command), fields(operation = command.name(), caller = ?command.caller()))]
    pub async fn execute(&self, command: RegistryCommand) -> Result<CommandOutcome, ServiceError> {
        let _timer = HistogramTimer::for_operation(command.name());
        self.inner.lock().await.execute(command)
    }
}

fn unexpected(outcome: CommandOutcome) -> ServiceError {
    RegistryError::InvariantViolation(format!("unexpected command outcome {outcome:?}")).into()
}

#[async_trait]
impl<L: FundsTransfer, J: CommandJournal> BadgeRegistryApi for RegistryService<L, J> {
    async fn register(
        &self,
        caller: Address,
        address: Address,
        name: BadgeName,
        paid: Amount,
    ) -> Result<BadgeId, ServiceError> {
        let command = RegistryCommand::Register {
            caller,
            address,
            name,
            paid,
        };
        match self.execute(command).await? {
            CommandOutcome::Registered(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    async fn set_address(
        &self,
        caller: Address,
        id: BadgeId,
        new_address: Address,
    ) -> Result<(), ServiceError> {
        self.execute(RegistryCommand::SetAddress {
            caller,
            id,
            address: new_address,
        })
        .await
        .map(drop)
    }

    async fn set_meta(
        &self,
        caller: Address,
        id: BadgeId,
        key: String,
        value: String,
    ) -> Result<(), ServiceError> {
        self.execute(RegistryCommand::SetMeta {
            caller,
            id,
            key,
            value,
        })
        .await
        .map(drop)
    }

    async fn unregister(&self, caller: Address, id: BadgeId) -> Result<(), ServiceError> {
        self.execute(RegistryCommand::Unregister { caller, id })
            .await
            .map(drop)
    }

    async fn set_owner(&self, caller: Address, new_owner: Address) -> Result<(), ServiceError> {
        self.execute(RegistryCommand::SetOwner { caller, new_owner })
            .await
            .map(drop)
    }

    async fn set_fee(&self, caller: Address, fee: Amount) -> Result<(), ServiceError> {
        self.execute(RegistryCommand::SetFee { caller, fee })
            .await
            .map(drop)
    }

    async fn drain(&self, caller: Address) -> Result<Amount, ServiceError> {
        match self.execute(RegistryCommand::Drain { caller }).await? {
            CommandOutcome::Drained(amount) => Ok(amount),
            other => Err(unexpected(other)),
        }
    }

    async fn badge_by_id(&self, id: BadgeId) -> Result<BadgeById, RegistryError> {
        self.inner.lock().await.engine.badge_by_id(id)
    }

    async fn badge_by_address(&self, address: Address) -> Result<BadgeByAddress, RegistryError> {
        self.inner.lock().await.engine.badge_by_address(&address)
    }

    async fn badge_by_name(&self, name: BadgeName) -> Result<BadgeByName, RegistryError> {
        self.inner.lock().await.engine.badge_by_name(&name)
    }

    async fn get_meta(&self, id: BadgeId, key: &str) -> Result<String, RegistryError> {
        self.inner.lock().await.engine.get_meta(id, key)
    }

    async fn active_count(&self) -> u64 {
        self.inner.lock().await.engine.active_count()
    }

    async fn current_fee(&self) -> Amount {
        self.inner.lock().await.engine.current_fee()
    }

    async fn current_admin(&self) -> Address {
        self.inner.lock().await.engine.current_admin()
    }

    async fn balance(&self) -> Amount {
        self.inner.lock().await.engine.balance()
    }

    async fn next_id(&self) -> BadgeId {
        self.inner.lock().await.engine.next_id()
    }

    async fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.inner.lock().await.engine.events_since(from).to_vec()
    }
}
