//! Proptest strategies for registry commands.
//!
//! Callers, addresses and names are drawn from small pools so that random
//! sequences hit collisions, ownership checks and reuse of freed keys often.

use badge_registry::{Address, Amount, BadgeId, BadgeName, RegistryCommand};
use proptest::prelude::*;

/// Principal that administers the registry in generated runs.
pub const ADMIN: Address = Address::new([0xAD; 20]);

/// Fee the generated registries start with.
pub const FEE: u64 = 100;

/// One of five principals, the admin included.
pub fn arb_principal() -> impl Strategy<Value = Address> {
    prop::sample::select(vec![
        ADMIN,
        Address::new([1; 20]),
        Address::new([2; 20]),
        Address::new([3; 20]),
        Address::new([4; 20]),
    ])
}

/// One of four names.
pub fn arb_name() -> impl Strategy<Value = BadgeName> {
    prop::sample::select(vec!["alpha", "beta", "gamma", "delta"])
        .prop_map(|n| BadgeName::try_from(n).expect("pool names fit"))
}

/// Ids around the range a short run issues, including never-issued ones.
pub fn arb_id() -> impl Strategy<Value = BadgeId> {
    0u64..8
}

/// Payments below, at and above the fee.
pub fn arb_payment() -> impl Strategy<Value = Amount> {
    prop_oneof![
        Just(Amount::zero()),
        Just(Amount::from(FEE - 1)),
        Just(Amount::from(FEE)),
        (FEE..FEE * 3).prop_map(Amount::from),
    ]
}

/// Any of the seven commands.
pub fn arb_command() -> impl Strategy<Value = RegistryCommand> {
    prop_oneof![
        4 => (arb_principal(), arb_principal(), arb_name(), arb_payment()).prop_map(
            |(caller, address, name, paid)| RegistryCommand::Register {
                caller,
                address,
                name,
                paid,
            }
        ),
        2 => (arb_principal(), arb_id(), arb_principal()).prop_map(|(caller, id, address)| {
            RegistryCommand::SetAddress {
                caller,
                id,
                address,
            }
        }),
        2 => (arb_principal(), arb_id(), "[a-c]", "[a-z]{0,4}").prop_map(
            |(caller, id, key, value)| RegistryCommand::SetMeta {
                caller,
                id,
                key,
                value,
            }
        ),
        2 => (arb_principal(), arb_id())
            .prop_map(|(caller, id)| RegistryCommand::Unregister { caller, id }),
        1 => (arb_principal(), arb_principal())
            .prop_map(|(caller, new_owner)| RegistryCommand::SetOwner { caller, new_owner }),
        1 => (arb_principal(), (0u64..FEE * 2).prop_map(Amount::from))
            .prop_map(|(caller, fee)| RegistryCommand::SetFee { caller, fee }),
        1 => arb_principal().prop_map(|caller| RegistryCommand::Drain { caller }),
    ]
}

/// A command plus whether the payment oracle refuses transfers at that step.
pub fn arb_step() -> impl Strategy<Value = (RegistryCommand, bool)> {
    (arb_command(), prop::bool::weighted(0.2))
}

/// A run of up to `max` steps.
pub fn arb_run(max: usize) -> impl Strategy<Value = Vec<(RegistryCommand, bool)>> {
    prop::collection::vec(arb_step(), 1..max)
}
