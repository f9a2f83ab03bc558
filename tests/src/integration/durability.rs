//! # Durability
//!
//! A registry backed by a file journal comes back with the same state root
//! and event log after a restart, including after a crash that left a
//! partial frame behind.

#[cfg(test)]
mod tests {
    use badge_registry::prelude::*;
    use badge_registry::{
        replay, CommandJournal, FileJournal, JournalRecord, RegistryCommand, SettledTransfer,
    };
    use std::io::Write;
    use std::path::Path;

    const ADMIN: Address = Address::new([0xAD; 20]);
    const ALICE: Address = Address::new([0xA1; 20]);
    const BOB: Address = Address::new([0xB0; 20]);

    fn fee() -> Amount {
        Amount::exp10(18)
    }

    fn name(s: &str) -> BadgeName {
        BadgeName::try_from(s).unwrap()
    }

    fn config(path: &Path) -> RegistryConfig {
        RegistryConfig::for_testing(ADMIN).with_journal_path(path)
    }

    async fn populate(registry: &impl BadgeRegistryApi) {
        registry
            .register(ALICE, ALICE, name("alice"), fee())
            .await
            .unwrap();
        registry.register(BOB, BOB, name("bob"), fee()).await.unwrap();
        registry
            .set_meta(ALICE, 0, "site".into(), "https://alice.example".into())
            .await
            .unwrap();
        registry.unregister(ADMIN, 1).await.unwrap();
        registry.set_fee(ADMIN, Amount::from(7u64)).await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");

        let (root, events) = {
            let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
            populate(&registry).await;
            (registry.state_root().await.unwrap(), registry.events_since(0).await)
        };

        let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
        assert_eq!(registry.state_root().await.unwrap(), root);
        assert_eq!(registry.events_since(0).await, events);
        assert_eq!(registry.current_fee().await, Amount::from(7u64));
        assert_eq!(registry.next_id().await, 2);
        assert_eq!(
            registry.get_meta(0, "site").await.unwrap(),
            "https://alice.example"
        );

        // The recovered registry keeps journaling from where it stopped.
        registry
            .register(BOB, BOB, name("bob2"), Amount::from(7u64))
            .await
            .unwrap();
        let records = registry.journal_records().await.unwrap();
        assert_eq!(records.last().map(JournalRecord::seq), Some(5));
    }

    #[tokio::test]
    async fn test_refused_drain_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");

        {
            let ledger = InMemoryLedger::new();
            let registry = RegistryService::open(&config(&path), ledger.clone()).unwrap();
            registry
                .register(ALICE, ALICE, name("alice"), fee())
                .await
                .unwrap();
            ledger.set_refuse_transfers(true);
            assert!(registry.drain(ADMIN).await.is_err());
        }

        let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
        assert_eq!(registry.balance().await, fee());
    }

    #[tokio::test]
    async fn test_settled_drain_not_repaid_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");
        let ledger = InMemoryLedger::new();

        {
            let registry = RegistryService::open(&config(&path), ledger.clone()).unwrap();
            registry
                .register(ALICE, ALICE, name("alice"), fee())
                .await
                .unwrap();
            assert_eq!(registry.drain(ADMIN).await.unwrap(), fee());
        }

        let registry = RegistryService::open(&config(&path), ledger.clone()).unwrap();
        assert_eq!(registry.balance().await, Amount::zero());
        assert_eq!(registry.stats().await.in_doubt_drains, 0);
        assert_eq!(ledger.balance_of(&ADMIN), fee());
        assert_eq!(ledger.transfer_count(), 1);
    }

    #[tokio::test]
    async fn test_drain_without_outcome_keeps_balance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");

        {
            let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
            registry
                .register(ALICE, ALICE, name("alice"), fee())
                .await
                .unwrap();
        }
        // The process stopped after journaling a drain but before its outcome.
        {
            let mut journal = FileJournal::open(&path).unwrap();
            journal
                .append(JournalRecord::Command {
                    seq: 1,
                    command: RegistryCommand::Drain { caller: ADMIN },
                })
                .unwrap();
        }

        let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
        assert_eq!(registry.balance().await, fee());
        assert_eq!(registry.stats().await.in_doubt_drains, 1);
    }

    #[tokio::test]
    async fn test_partial_frame_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");

        let root = {
            let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
            populate(&registry).await;
            registry.state_root().await.unwrap()
        };

        // Simulate a crash in the middle of an append.
        {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&path)
                .unwrap();
            file.write_all(&[64, 0, 0, 0, 0xde, 0xad]).unwrap();
        }

        let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
        assert_eq!(registry.state_root().await.unwrap(), root);
    }

    #[tokio::test]
    async fn test_offline_replay_matches_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badges.journal");

        let root = {
            let registry = RegistryService::open(&config(&path), InMemoryLedger::new()).unwrap();
            populate(&registry).await;
            registry.state_root().await.unwrap()
        };

        let journal = FileJournal::open(&path).unwrap();
        let records = journal.records().unwrap();
        let engine = replay(
            &RegistryConfig::for_testing(ADMIN),
            &records,
            &mut SettledTransfer,
        )
        .unwrap();
        assert_eq!(engine.state_root().unwrap(), root);
        assert_eq!(engine.active_count(), 1);
    }
}
