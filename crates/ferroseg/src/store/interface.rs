use std::sync::Arc;

use crate::StoreError;

/// The primitives a storage engine must provide to back a
/// [`StoreSequenceRepository`].
///
/// Every method is a single backend round trip and must be atomic on its own.
/// The repository never composes several calls into a larger critical
/// section, so correctness under many concurrent processes rests entirely on
/// these guarantees:
///
/// - [`incr_by`] adds and returns the new value indivisibly (Redis `INCRBY`,
///   an `UPDATE .. RETURNING`, an atomic fetch-add).
/// - [`map_put_if_absent`] writes only if the field is missing and reports
///   which happened (Redis `HSETNX`, `INSERT .. ON CONFLICT DO NOTHING`).
///
/// Counters and maps live in one flat namespace of string keys; the
/// repository's [`Keyspace`] keeps its names from colliding.
///
/// # Example
///
/// ```
/// use ferroseg::{CounterStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// assert_eq!(store.incr_by("hits", 5).unwrap(), 5);
/// assert_eq!(store.incr_by("hits", 5).unwrap(), 10);
/// assert!(store.map_put_if_absent("rules", "a", b"{}".to_vec()).unwrap());
/// assert!(!store.map_put_if_absent("rules", "a", b"[]".to_vec()).unwrap());
/// ```
///
/// [`StoreSequenceRepository`]: crate::StoreSequenceRepository
/// [`Keyspace`]: crate::Keyspace
/// [`incr_by`]: CounterStore::incr_by
/// [`map_put_if_absent`]: CounterStore::map_put_if_absent
pub trait CounterStore: Send + Sync {
    /// Atomically adds `delta` to the counter at `key`, creating it at zero
    /// if missing, and returns the post-increment value.
    ///
    /// # Errors
    /// - [`StoreError::Overflow`] if the result would not fit in `u64`.
    /// - [`StoreError::Unavailable`] on backend failure.
    fn incr_by(&self, key: &str, delta: u64) -> Result<u64, StoreError>;

    /// Reads the counter at `key`; `None` if it was never written.
    fn get_counter(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Unconditionally overwrites the counter at `key`.
    fn set_counter(&self, key: &str, value: u64) -> Result<(), StoreError>;

    fn map_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn map_contains(&self, map: &str, field: &str) -> Result<bool, StoreError>;

    /// Writes `value` at `field`, replacing any previous value.
    fn map_put(&self, map: &str, field: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Writes `value` at `field` only if the field is absent.
    ///
    /// Returns `true` if the value was written, `false` if the field already
    /// existed (in which case nothing changed).
    fn map_put_if_absent(&self, map: &str, field: &str, value: Vec<u8>)
    -> Result<bool, StoreError>;

    /// Every `(field, value)` pair in `map`, in no particular order. A missing
    /// map is empty.
    fn map_entries(&self, map: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}

impl<S> CounterStore for Arc<S>
where
    S: CounterStore + ?Sized,
{
    fn incr_by(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        (**self).incr_by(key, delta)
    }

    fn get_counter(&self, key: &str) -> Result<Option<u64>, StoreError> {
        (**self).get_counter(key)
    }

    fn set_counter(&self, key: &str, value: u64) -> Result<(), StoreError> {
        (**self).set_counter(key, value)
    }

    fn map_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).map_get(map, field)
    }

    fn map_contains(&self, map: &str, field: &str) -> Result<bool, StoreError> {
        (**self).map_contains(map, field)
    }

    fn map_put(&self, map: &str, field: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).map_put(map, field, value)
    }

    fn map_put_if_absent(
        &self,
        map: &str,
        field: &str,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        (**self).map_put_if_absent(map, field, value)
    }

    fn map_entries(&self, map: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        (**self).map_entries(map)
    }
}
