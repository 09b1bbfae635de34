use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use portable_atomic::{AtomicU64, Ordering};

use crate::{CounterStore, StoreError};

#[cfg(feature = "cache-padded")]
type Counter = crossbeam_utils::CachePadded<AtomicU64>;
#[cfg(not(feature = "cache-padded"))]
type Counter = AtomicU64;

/// A thread-safe, in-process [`CounterStore`].
///
/// Counters are individual atomics, so increments on a key never take a lock
/// once the counter exists; creating a counter takes the table's write lock
/// once. Maps sit behind a single [`RwLock`] and every map method holds it for
/// exactly one call, which makes [`map_put_if_absent`] atomic.
///
/// Cloning is cheap and clones share state, which is how several simulated
/// allocator instances point at "the same backend".
///
/// Nothing is persisted: state lives as long as the last clone.
///
/// ## Recommended When
/// - Embedding the allocator in a single process
/// - Testing code written against [`CounterStore`]
///
/// [`map_put_if_absent`]: CounterStore::map_put_if_absent
#[derive(Clone, Default)]
pub struct MemoryStore {
    counters: Arc<RwLock<HashMap<String, Arc<Counter>>>>,
    maps: Arc<RwLock<HashMap<String, HashMap<String, Vec<u8>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, key: &str) -> Arc<Counter> {
        if let Some(counter) = self.counters.read().get(key) {
            return Arc::clone(counter);
        }
        let mut counters = self.counters.write();
        Arc::clone(
            counters
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Counter::default())),
        )
    }
}

impl core::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("counters", &self.counters.read().len())
            .field("maps", &self.maps.read().len())
            .finish()
    }
}

impl CounterStore for MemoryStore {
    fn incr_by(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let counter = self.counter(key);
        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(delta)
            })
            .map_err(|_| StoreError::Overflow {
                key: key.to_owned(),
            })?;
        // `fetch_update` only succeeds when `checked_add` did.
        Ok(previous + delta)
    }

    fn get_counter(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self
            .counters
            .read()
            .get(key)
            .map(|counter| counter.load(Ordering::Acquire)))
    }

    fn set_counter(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.counter(key).store(value, Ordering::Release);
        Ok(())
    }

    fn map_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .maps
            .read()
            .get(map)
            .and_then(|entries| entries.get(field))
            .cloned())
    }

    fn map_contains(&self, map: &str, field: &str) -> Result<bool, StoreError> {
        Ok(self
            .maps
            .read()
            .get(map)
            .is_some_and(|entries| entries.contains_key(field)))
    }

    fn map_put(&self, map: &str, field: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.maps
            .write()
            .entry(map.to_owned())
            .or_default()
            .insert(field.to_owned(), value);
        Ok(())
    }

    fn map_put_if_absent(
        &self,
        map: &str,
        field: &str,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let mut maps = self.maps.write();
        let entries = maps.entry(map.to_owned()).or_default();
        if entries.contains_key(field) {
            return Ok(false);
        }
        entries.insert(field.to_owned(), value);
        Ok(true)
    }

    fn map_entries(&self, map: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .maps
            .read()
            .get(map)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
