//! Several independent repository handles over one backend, the way separate
//! allocator processes share one store in production.

use ferroseg::{
    Keyspace, MemoryStore, OffsetAllocator, RuleFilter, RuleRepository, RuleStatus, Segment,
    SequenceRepository, SequenceRuleDefinition, StoreSequenceRepository,
};
use std::collections::HashSet;
use std::thread::scope;

const INSTANCES: usize = 8;

fn instances(store: &MemoryStore) -> Vec<StoreSequenceRepository<MemoryStore>> {
    (0..INSTANCES)
        .map(|_| StoreSequenceRepository::new(store.clone(), Keyspace::default()))
        .collect()
}

#[test]
fn instances_reserve_disjoint_segments() {
    const SEGMENTS_PER_INSTANCE: usize = 200;
    const STEP: u64 = 64;

    let store = MemoryStore::new();
    let repos = instances(&store);
    repos[0]
        .insert_rule(SequenceRuleDefinition::new("order_id", STEP))
        .unwrap();

    let mut segments: Vec<Segment> = scope(|s| {
        let handles: Vec<_> = repos
            .iter()
            .map(|repo| {
                s.spawn(move || {
                    (0..SEGMENTS_PER_INSTANCE)
                        .map(|_| repo.next_segment("order_id").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    segments.sort();
    let total = (INSTANCES * SEGMENTS_PER_INSTANCE) as u64;
    assert_eq!(segments.len() as u64, total);
    assert_eq!(segments.first().map(Segment::start), Some(0));
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start(), "gap or overlap at {}", pair[0]);
    }
    assert_eq!(repos[INSTANCES - 1].get_offset("order_id").unwrap(), total * STEP);
}

#[test]
fn ids_issued_from_segments_are_unique() {
    const STEP: u64 = 10;
    const IDS_PER_INSTANCE: usize = 1_000;

    let store = MemoryStore::new();
    let repos = instances(&store);
    repos[0]
        .insert_rule(SequenceRuleDefinition::new("user_id", STEP))
        .unwrap();

    let ids: Vec<u64> = scope(|s| {
        let handles: Vec<_> = repos
            .iter()
            .map(|repo| {
                s.spawn(move || {
                    let mut issued = Vec::with_capacity(IDS_PER_INSTANCE);
                    let mut current = repo.next_segment("user_id").unwrap().into_iter();
                    while issued.len() < IDS_PER_INSTANCE {
                        match current.next() {
                            Some(id) => issued.push(id),
                            None => current = repo.next_segment("user_id").unwrap().into_iter(),
                        }
                    }
                    issued
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), INSTANCES * IDS_PER_INSTANCE);
}

#[test]
fn rule_changes_are_visible_to_every_instance() {
    let store = MemoryStore::new();
    let repos = instances(&store);

    let id = repos[1]
        .insert_rule(SequenceRuleDefinition::new("invoice", 5))
        .unwrap();
    let mut rule = repos[2].get_rule_by_key("invoice").unwrap().unwrap();
    assert_eq!(rule.id, id);

    rule.status = RuleStatus::Disabled;
    repos[3].update_rule_by_key(&rule).unwrap();

    for repo in &repos {
        assert_eq!(
            repo.count_rules(&RuleFilter::by_status(RuleStatus::Disabled))
                .unwrap(),
            1
        );
        assert!(repo.next_segment("invoice").is_err());
    }
}

#[test]
fn namespaces_isolate_repositories_on_one_store() {
    let store = MemoryStore::new();
    let tenant = |ns: &str| Keyspace::default().namespaced(ns).unwrap();
    let a = StoreSequenceRepository::new(store.clone(), tenant("a"));
    let b = StoreSequenceRepository::new(store, tenant("b"));

    assert_eq!(a.insert_rule(SequenceRuleDefinition::new("k", 1)).unwrap(), 1);
    assert_eq!(b.insert_rule(SequenceRuleDefinition::new("k", 1)).unwrap(), 1);

    a.increment_and_get("k", 100).unwrap();
    assert_eq!(b.get_offset("k").unwrap(), 0);
    assert_eq!(a.count_rules(&RuleFilter::all()).unwrap(), 1);
}
