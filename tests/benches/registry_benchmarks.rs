//! # Badge Registry Benchmarks
//!
//! | Operation | Expected cost |
//! |-----------|---------------|
//! | register | O(log n) index inserts |
//! | lookup by address / name | O(log n) |
//! | state root | O(state size) encode + Keccak-256 |
//! | replay | O(journal length) |

use badge_registry::{
    replay, Address, Amount, BadgeName, JournalRecord, RegistryCommand, RegistryConfig,
    RegistryEngine, SettledTransfer,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::time::Duration;

const ADMIN: Address = Address::new([0xAD; 20]);

fn address(i: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..8].copy_from_slice(&i.to_be_bytes());
    bytes[19] = 1;
    Address::new(bytes)
}

fn name(i: u64) -> BadgeName {
    BadgeName::new(format!("badge-{i}").into_bytes()).expect("short name")
}

fn bench_config() -> RegistryConfig {
    RegistryConfig {
        verify_invariants: false,
        ..RegistryConfig::for_testing(ADMIN)
    }
}

fn populated(size: u64) -> RegistryEngine {
    let mut engine = RegistryEngine::new(&bench_config());
    for i in 0..size {
        engine
            .register(address(i), address(i), name(i), Amount::exp10(18))
            .expect("unique keys");
    }
    engine
}

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("badge-registry-register");
    group.measurement_time(Duration::from_secs(5));

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("register_into", size), &size, |b, &size| {
            b.iter_batched(
                || populated(size),
                |mut engine| {
                    black_box(
                        engine.register(address(size), address(size), name(size), Amount::exp10(18)),
                    )
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("badge-registry-lookup");
    let size = 10_000u64;
    let engine = populated(size);
    let mut rng = rand::thread_rng();

    group.bench_function("badge_by_address", |b| {
        b.iter(|| {
            let i = rng.gen_range(0..size);
            black_box(engine.badge_by_address(&address(i)).is_ok())
        })
    });
    group.bench_function("badge_by_name", |b| {
        b.iter(|| {
            let i = rng.gen_range(0..size);
            black_box(engine.badge_by_name(&name(i)).is_ok())
        })
    });
    group.finish();
}

fn bench_state_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("badge-registry-state-root");
    for size in [100u64, 1_000, 10_000] {
        let engine = populated(size);
        group.bench_with_input(BenchmarkId::new("state_root", size), &engine, |b, engine| {
            b.iter(|| black_box(engine.state_root().is_ok()))
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("badge-registry-replay");
    let config = bench_config();

    for size in [1_000u64, 10_000] {
        let records: Vec<JournalRecord> = (0..size)
            .map(|i| JournalRecord::Command {
                seq: i,
                command: RegistryCommand::Register {
                    caller: address(i),
                    address: address(i),
                    name: name(i),
                    paid: Amount::exp10(18),
                },
            })
            .collect();

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("replay", size), &records, |b, records| {
            b.iter(|| black_box(replay(&config, records, &mut SettledTransfer).is_ok()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_register,
    bench_lookups,
    bench_state_root,
    bench_replay
);
criterion_main!(benches);
