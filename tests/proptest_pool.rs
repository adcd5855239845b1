use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use proptest::prelude::*;

use dhcpsim::{AuditKind, AuditSink, Config, LeasePool, MemoryAuditSink, RandomSelector};

const POOL_SIZE: u8 = 8;
const CLIENTS: usize = 12;

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Release(usize),
    Sweep(i64),
    ForceRelease,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..CLIENTS).prop_map(Op::Allocate),
        (0..CLIENTS).prop_map(Op::Release),
        (0i64..1200).prop_map(Op::Sweep),
        Just(Op::ForceRelease),
    ]
}

fn client(index: usize) -> String {
    format!("Device_{index}")
}

fn test_config() -> Config {
    Config {
        pool_start: Ipv4Addr::new(192, 168, 1, 100),
        pool_end: Ipv4Addr::new(192, 168, 1, 100 + POOL_SIZE - 1),
        ..Default::default()
    }
}

async fn apply(pool: &LeasePool, op: &Op) {
    match op {
        Op::Allocate(index) => {
            let _ = pool.allocate(&client(*index)).await;
        }
        Op::Release(index) => {
            let _ = pool.release(&client(*index)).await;
        }
        Op::Sweep(offset) => {
            pool.sweep(Utc::now() + TimeDelta::seconds(*offset)).await;
        }
        Op::ForceRelease => {
            pool.force_release().await;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn partition_invariant_holds_after_every_operation(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let config = Arc::new(test_config());
            let pool = LeasePool::new(
                Arc::clone(&config),
                Box::new(RandomSelector::seeded(seed)),
                Arc::new(MemoryAuditSink::new()) as Arc<dyn AuditSink>,
            );

            for op in &ops {
                apply(&pool, op).await;

                let free = pool.free_addresses().await;
                let active = pool.list_active(Utc::now()).await;

                // free and leased partition the configured range exactly.
                assert_eq!(
                    free.len() + active.len(),
                    config.pool_size() as usize,
                    "partition lost addresses after {op:?}"
                );

                let mut leased = HashSet::new();
                for entry in &active {
                    assert!(config.ip_in_pool(entry.address));
                    assert!(
                        !free.contains(&entry.address),
                        "address {} both free and leased after {op:?}",
                        entry.address
                    );
                    assert!(
                        leased.insert(entry.address),
                        "address {} leased twice after {op:?}",
                        entry.address
                    );
                    assert!(entry.remaining_seconds >= 0);
                }

                for address in &free {
                    assert!(config.ip_in_pool(*address));
                }
            }
        });
    }

    #[test]
    fn audit_trail_balances_registry_size(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let config = Arc::new(test_config());
            let sink = Arc::new(MemoryAuditSink::new());
            let pool = LeasePool::new(
                Arc::clone(&config),
                Box::new(RandomSelector::seeded(seed)),
                Arc::clone(&sink) as Arc<dyn AuditSink>,
            );

            for op in &ops {
                apply(&pool, op).await;
            }

            // Every lease entered the registry with one assigned event and
            // left it with exactly one released/expired/forced-failure event.
            let mut assigned = 0usize;
            let mut removed = 0usize;
            for event in sink.events() {
                match event.kind {
                    AuditKind::Assigned => assigned += 1,
                    AuditKind::Released | AuditKind::Expired | AuditKind::ForcedFailure => {
                        removed += 1;
                    }
                }
            }

            assert_eq!(assigned - removed, pool.active_lease_count().await);
        });
    }
}
