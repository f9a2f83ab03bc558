//! # Registry Lifecycle Flow
//!
//! One registry walked through its whole lifecycle, each step building on
//! the state the previous one left behind:
//!
//! 1. Registration and the three lookups
//! 2. Address rebinding by the badge owner
//! 3. Metadata by the badge owner
//! 4. Collisions and unpaid registrations leave no trace
//! 5. Admin handover, fee change, unregistration, drain
//! 6. The unregistered badge is unreachable

#[cfg(test)]
mod tests {
    use badge_registry::prelude::*;
    use badge_registry::{EventRecord, InMemoryJournal, ServiceStats};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ACCOUNT_0: Address = Address::new([0x10; 20]);
    const ACCOUNT_1: Address = Address::new([0x11; 20]);

    type Service = RegistryService<InMemoryLedger, InMemoryJournal>;

    fn one_ether() -> Amount {
        Amount::exp10(18)
    }

    fn name(s: &str) -> BadgeName {
        BadgeName::try_from(s).unwrap()
    }

    fn deploy() -> (Service, InMemoryLedger) {
        let ledger = InMemoryLedger::new();
        let service = RegistryService::new(
            &RegistryConfig::for_testing(ACCOUNT_0),
            ledger.clone(),
            InMemoryJournal::new(),
        )
        .unwrap();
        (service, ledger)
    }

    fn events_with_topic<'a>(events: &'a [EventRecord], topic: &'a str) -> Vec<&'a RegistryEvent> {
        events
            .iter()
            .map(|r| &r.event)
            .filter(|e| e.topic() == topic)
            .collect()
    }

    fn registry_error<T: std::fmt::Debug>(
        result: Result<T, ServiceError>,
    ) -> RegistryError {
        result
            .unwrap_err()
            .as_registry()
            .cloned()
            .expect("expected a registry error")
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_full_registry_lifecycle() {
        let (registry, ledger) = deploy();
        let id = 0;

        // -- registration ------------------------------------------------------
        let issued = registry
            .register(ACCOUNT_0, ACCOUNT_0, name("awesome"), one_ether())
            .await
            .unwrap();
        assert_eq!(issued, id);
        assert_eq!(registry.active_count().await, 1);

        let events = registry.events_since(0).await;
        assert_eq!(
            events_with_topic(&events, badge_registry::events::topics::REGISTERED),
            vec![&RegistryEvent::Registered {
                id,
                address: ACCOUNT_0,
                name: name("awesome"),
            }]
        );

        let badge = registry.badge_by_id(id).await.unwrap();
        assert_eq!(
            (badge.address, badge.name, badge.owner),
            (ACCOUNT_0, name("awesome"), ACCOUNT_0)
        );
        let badge = registry.badge_by_address(ACCOUNT_0).await.unwrap();
        assert_eq!((badge.id, badge.owner), (id, ACCOUNT_0));
        let badge = registry.badge_by_name(name("awesome")).await.unwrap();
        assert_eq!((badge.id, badge.address), (id, ACCOUNT_0));

        // -- address change ----------------------------------------------------
        let err = registry_error(registry.set_address(ACCOUNT_1, id, ACCOUNT_1).await);
        assert_eq!(
            err,
            RegistryError::NotOwner {
                id,
                caller: ACCOUNT_1
            }
        );

        let seq = registry.events_since(0).await.len() as u64;
        registry.set_address(ACCOUNT_0, id, ACCOUNT_1).await.unwrap();
        let events = registry.events_since(seq).await;
        assert_eq!(
            events[0].event,
            RegistryEvent::AddressChanged {
                id,
                address: ACCOUNT_1,
            }
        );

        assert_eq!(registry.badge_by_address(ACCOUNT_1).await.unwrap().id, id);
        assert!(matches!(
            registry.badge_by_address(ACCOUNT_0).await,
            Err(RegistryError::InvariantViolation(_))
        ));

        let err = registry_error(registry.set_address(ACCOUNT_0, id, ACCOUNT_1).await);
        assert_eq!(err, RegistryError::AddressTaken(ACCOUNT_1));
        registry.set_address(ACCOUNT_0, id, ACCOUNT_0).await.unwrap();

        // -- metadata ----------------------------------------------------------
        let err = registry_error(
            registry
                .set_meta(ACCOUNT_1, id, "key".into(), "value".into())
                .await,
        );
        assert!(matches!(err, RegistryError::NotOwner { .. }));

        registry
            .set_meta(ACCOUNT_0, id, "key".into(), "value".into())
            .await
            .unwrap();
        assert_eq!(registry.get_meta(id, "key").await.unwrap(), "value");
        let events = registry.events_since(0).await;
        assert_eq!(
            events_with_topic(&events, badge_registry::events::topics::META_CHANGED).len(),
            1
        );

        // -- collisions --------------------------------------------------------
        let seq = registry.events_since(0).await.len() as u64;
        for (address, n) in [
            (ACCOUNT_0, "awesome"),
            (ACCOUNT_1, "awesome"),
            (ACCOUNT_0, "new_awesome"),
        ] {
            let err = registry_error(
                registry
                    .register(ACCOUNT_0, address, name(n), one_ether())
                    .await,
            );
            assert_eq!(err, RegistryError::AlreadyRegistered);
        }

        // -- unpaid ------------------------------------------------------------
        for paid in [Amount::zero(), one_ether() / Amount::from(2u64)] {
            let err = registry_error(
                registry
                    .register(ACCOUNT_1, ACCOUNT_1, name("badger"), paid)
                    .await,
            );
            assert!(matches!(err, RegistryError::InsufficientFee { .. }));
        }
        assert!(registry.events_since(seq).await.is_empty());
        assert_eq!(registry.active_count().await, 1);

        // -- admin handover ----------------------------------------------------
        let err = registry_error(registry.set_owner(ACCOUNT_1, ACCOUNT_1).await);
        assert_eq!(err, RegistryError::NotAdmin { caller: ACCOUNT_1 });
        assert_eq!(registry.current_admin().await, ACCOUNT_0);

        registry.set_owner(ACCOUNT_0, ACCOUNT_1).await.unwrap();
        assert_eq!(registry.current_admin().await, ACCOUNT_1);
        let events = registry.events_since(0).await;
        assert_eq!(
            events_with_topic(&events, badge_registry::events::topics::NEW_OWNER),
            vec![&RegistryEvent::NewOwner {
                old: ACCOUNT_0,
                current: ACCOUNT_1,
            }]
        );
        assert!(registry.set_owner(ACCOUNT_0, ACCOUNT_0).await.is_err());

        // -- fee ---------------------------------------------------------------
        assert!(registry.set_fee(ACCOUNT_0, Amount::from(10u64)).await.is_err());
        registry.set_fee(ACCOUNT_1, Amount::from(10u64)).await.unwrap();
        assert_eq!(registry.current_fee().await, Amount::from(10u64));

        // -- unregister --------------------------------------------------------
        assert!(registry.unregister(ACCOUNT_0, id).await.is_err());
        registry.unregister(ACCOUNT_1, id).await.unwrap();
        let events = registry.events_since(0).await;
        assert_eq!(
            events_with_topic(&events, badge_registry::events::topics::UNREGISTERED),
            vec![&RegistryEvent::Unregistered {
                id,
                name: name("awesome"),
            }]
        );
        assert_eq!(registry.active_count().await, 0);

        // -- drain -------------------------------------------------------------
        assert!(registry.drain(ACCOUNT_0).await.is_err());
        let before = ledger.balance_of(&ACCOUNT_1);
        let drained = registry.drain(ACCOUNT_1).await.unwrap();
        assert_eq!(drained, one_ether());
        assert_eq!(ledger.balance_of(&ACCOUNT_1), before + one_ether());
        assert_eq!(registry.balance().await, Amount::zero());

        // -- unregistered badge ------------------------------------------------
        assert_eq!(
            registry.badge_by_id(id).await.unwrap_err(),
            RegistryError::RecordNotFound(id)
        );
        assert!(matches!(
            registry.badge_by_address(ACCOUNT_0).await,
            Err(RegistryError::InvariantViolation(_))
        ));
        assert!(matches!(
            registry.badge_by_name(name("awesome")).await,
            Err(RegistryError::InvariantViolation(_))
        ));
        assert_eq!(
            registry.get_meta(id, "key").await.unwrap_err(),
            RegistryError::RecordNotFound(id)
        );

        // -- bookkeeping -------------------------------------------------------
        let stats: ServiceStats = registry.stats().await;
        assert_eq!(stats.fees_collected, one_ether());
        assert_eq!(stats.total_drained, one_ether());
        assert_eq!(stats.invariant_violations, 0);
        assert!(registry.verify().await.is_valid());
    }

    #[tokio::test]
    async fn test_freed_keys_can_be_reused() {
        let (registry, _) = deploy();
        registry
            .register(ACCOUNT_0, ACCOUNT_0, name("awesome"), one_ether())
            .await
            .unwrap();
        registry.unregister(ACCOUNT_0, 0).await.unwrap();

        let id = registry
            .register(ACCOUNT_1, ACCOUNT_0, name("awesome"), one_ether())
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.badge_by_name(name("awesome")).await.unwrap().owner, ACCOUNT_1);
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_overlong_name_rejected_before_registry() {
        let err = BadgeName::new(vec![b'x'; 33]).unwrap_err();
        assert!(matches!(err, RegistryError::NameTooLong { len: 33, max: 32 }));
    }
}
