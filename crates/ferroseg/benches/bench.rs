use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ferroseg::{
    Keyspace, MemoryStore, OffsetAllocator, PageRequest, RuleFilter, RuleRepository,
    SequenceRepository, SequenceRuleDefinition, StoreSequenceRepository,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of reservations per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_RESERVATIONS: usize = 4096;
const STEP: u64 = 1000;

fn repo_with_rule() -> StoreSequenceRepository<MemoryStore> {
    let repo = StoreSequenceRepository::new(MemoryStore::new(), Keyspace::default());
    repo.insert_rule(SequenceRuleDefinition::new("order_id", STEP))
        .expect("fresh repository accepts the rule");
    repo
}

/// Hot path: one atomic increment per reservation.
fn bench_reserve(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve");
    group.throughput(Throughput::Elements(TOTAL_RESERVATIONS as u64));

    group.bench_function(format!("elems/{TOTAL_RESERVATIONS}"), |b| {
        let repo = repo_with_rule();
        b.iter(|| {
            for _ in 0..TOTAL_RESERVATIONS {
                black_box(repo.reserve("order_id", STEP).unwrap());
            }
        });
    });

    group.bench_function(format!("next_segment/elems/{TOTAL_RESERVATIONS}"), |b| {
        let repo = repo_with_rule();
        b.iter(|| {
            for _ in 0..TOTAL_RESERVATIONS {
                black_box(repo.next_segment("order_id").unwrap());
            }
        });
    });

    group.finish();
}

/// Every thread hammers the same key.
fn bench_reserve_contended(c: &mut Criterion) {
    let threads = num_cpus::get().max(2);
    let mut group = c.benchmark_group("reserve_contended");
    group.throughput(Throughput::Elements((TOTAL_RESERVATIONS * threads) as u64));

    group.bench_function(
        format!("threads/{threads}/elems/{TOTAL_RESERVATIONS}"),
        |b| {
            b.iter_custom(|iters| {
                let repo = repo_with_rule();
                let barrier = Arc::new(Barrier::new(threads + 1));
                let start = scope(|s| {
                    for _ in 0..threads {
                        let barrier = Arc::clone(&barrier);
                        let repo = &repo;
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..iters {
                                for _ in 0..TOTAL_RESERVATIONS {
                                    black_box(repo.reserve("order_id", STEP).unwrap());
                                }
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });
                start.elapsed()
            });
        },
    );

    group.finish();
}

/// Cold path: full scan + filter + page.
fn bench_list_by_page(c: &mut Criterion) {
    const RULES: usize = 1000;
    let repo = StoreSequenceRepository::new(MemoryStore::new(), Keyspace::default());
    for i in 0..RULES {
        repo.insert_rule(SequenceRuleDefinition::new(format!("rule_{i}"), 10))
            .expect("distinct keys");
    }

    let mut group = c.benchmark_group("list_by_page");
    group.bench_function(format!("rules/{RULES}"), |b| {
        b.iter(|| {
            black_box(
                repo.list_rules_by_page(&RuleFilter::all(), PageRequest::new(5, 50))
                    .unwrap(),
            )
        });
    });
    group.bench_function(format!("count/rules/{RULES}"), |b| {
        b.iter(|| black_box(repo.count_rules(&RuleFilter::all()).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_reserve,
    bench_reserve_contended,
    bench_list_by_page
);
criterion_main!(benches);
