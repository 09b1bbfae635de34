use crate::{Error, PageRequest, Result, RuleFilter, RuleStatus, Segment, SequenceRuleDefinition};

/// Durable storage of [`SequenceRuleDefinition`]s keyed by business key.
///
/// Listings carry no backend order; implementations return rules sorted by
/// `id` so that consecutive pages are stable.
pub trait RuleRepository {
    /// Stores a new rule and returns its freshly assigned id.
    ///
    /// The id comes from an atomic counter and is never reused, even if this
    /// call ends up failing after the id was drawn.
    ///
    /// # Errors
    /// - [`Error::DuplicateKey`] if a rule with `rule.key` exists, including
    ///   when a concurrent insert of the same key wins the race.
    /// - [`Error::InvalidRule`] if the rule fails validation.
    fn insert_rule(&self, rule: SequenceRuleDefinition) -> Result<u64>;

    /// Overwrites the rule stored at `rule.key`, creating it if missing.
    ///
    /// `rule.id` is ignored. An existing rule keeps its stored id; a missing
    /// one is created with a freshly assigned id, as [`Self::insert_rule`]
    /// would. If a concurrent insert creates the key first, the update lands
    /// on that record and keeps its id.
    fn update_rule_by_key(&self, rule: &SequenceRuleDefinition) -> Result<()>;

    /// Looks a rule up by key. `Ok(None)` when absent.
    fn get_rule_by_key(&self, key: &str) -> Result<Option<SequenceRuleDefinition>>;

    fn list_rules_by_status(&self, status: RuleStatus) -> Result<Vec<SequenceRuleDefinition>>;

    /// Returns one page of the rules selected by `filter`.
    ///
    /// A key filter short-circuits to that rule alone (or nothing), ignoring
    /// the status filter and the page window. A page past the end is empty.
    fn list_rules_by_page(
        &self,
        filter: &RuleFilter,
        page: PageRequest,
    ) -> Result<Vec<SequenceRuleDefinition>>;

    /// Number of rules `filter` selects: always the total length of
    /// [`Self::list_rules_by_page`] over every page.
    fn count_rules(&self, filter: &RuleFilter) -> Result<u64>;
}

/// Atomic per-key offset counters from which segments are reserved.
pub trait OffsetAllocator {
    /// Atomically adds `delta` to the offset for `key` and returns the new
    /// value. The caller owns `[new - delta, new)`.
    ///
    /// # Errors
    /// - [`Error::InvalidRule`] if `delta` is zero or `key` is empty.
    /// - [`Error::OffsetOverflow`] if the counter would pass `u64::MAX`.
    fn increment_and_get(&self, key: &str, delta: u64) -> Result<u64>;

    /// Overwrites the offset for `key`.
    ///
    /// For offline resets and migrations only: racing this against
    /// [`Self::increment_and_get`] on the same key can hand out a range that
    /// overlaps one already granted. The caller must hold an external lock.
    fn set_offset(&self, key: &str, value: u64) -> Result<()>;

    /// Current offset for `key`; `0` if it was never written.
    fn get_offset(&self, key: &str) -> Result<u64>;

    /// Reserves the next `delta`-sized segment for `key`.
    ///
    /// # Example
    ///
    /// ```
    /// use ferroseg::{Keyspace, MemoryStore, OffsetAllocator, StoreSequenceRepository};
    ///
    /// let repo = StoreSequenceRepository::new(MemoryStore::new(), Keyspace::default());
    /// let first = repo.reserve("order_id", 1000).unwrap();
    /// let second = repo.reserve("order_id", 1000).unwrap();
    /// assert_eq!(first.as_range(), 0..1000);
    /// assert_eq!(second.as_range(), 1000..2000);
    /// ```
    fn reserve(&self, key: &str, delta: u64) -> Result<Segment> {
        let high = self.increment_and_get(key, delta)?;
        Ok(Segment::ending_at(high, delta))
    }
}

/// Rule storage and offset allocation behind one handle.
///
/// Implemented for anything that is both a [`RuleRepository`] and an
/// [`OffsetAllocator`].
pub trait SequenceRepository: RuleRepository + OffsetAllocator {
    /// Reserves the next segment for `key`, sized by the rule's `step`.
    ///
    /// # Errors
    /// - [`Error::RuleNotFound`] if no rule exists for `key`.
    /// - [`Error::RuleDisabled`] if the rule is disabled.
    fn next_segment(&self, key: &str) -> Result<Segment> {
        let rule = self
            .get_rule_by_key(key)?
            .ok_or_else(|| Error::RuleNotFound {
                key: key.to_owned(),
            })?;
        if !rule.status.is_enabled() {
            return Err(Error::RuleDisabled {
                key: key.to_owned(),
            });
        }
        self.reserve(key, rule.step)
    }
}

impl<R> SequenceRepository for R where R: RuleRepository + OffsetAllocator + ?Sized {}
