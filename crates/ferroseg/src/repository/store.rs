#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    CounterStore, Error, Keyspace, OffsetAllocator, PageRequest, Result, RuleFilter,
    RuleRepository, RuleStatus, SequenceRuleDefinition, StoreError,
};

/// A [`SequenceRepository`] over any [`CounterStore`].
///
/// Every guarantee is delegated to single backend calls:
///
/// - rule ids come from [`CounterStore::incr_by`] on the keyspace's id
///   counter;
/// - inserts land through [`CounterStore::map_put_if_absent`], so two racing
///   inserts of one key cannot both succeed;
/// - offsets advance through one [`CounterStore::incr_by`] per reservation.
///
/// There is no repository-side lock and no retry. Any number of instances,
/// in any number of processes, may share one backend.
///
/// # Example
///
/// ```
/// use ferroseg::{
///     Keyspace, MemoryStore, OffsetAllocator, RuleRepository, SequenceRuleDefinition,
///     StoreSequenceRepository,
/// };
///
/// let repo = StoreSequenceRepository::new(MemoryStore::new(), Keyspace::default());
///
/// assert_eq!(repo.insert_rule(SequenceRuleDefinition::new("order_id", 1000)).unwrap(), 1);
/// assert_eq!(repo.increment_and_get("order_id", 1000).unwrap(), 1000);
/// assert_eq!(repo.increment_and_get("order_id", 1000).unwrap(), 2000);
/// assert_eq!(repo.get_offset("order_id").unwrap(), 2000);
///
/// repo.set_offset("order_id", 5000).unwrap();
/// assert_eq!(repo.get_offset("order_id").unwrap(), 5000);
/// ```
///
/// [`SequenceRepository`]: crate::SequenceRepository
#[derive(Debug, Clone)]
pub struct StoreSequenceRepository<S>
where
    S: CounterStore,
{
    store: S,
    keyspace: Keyspace,
}

impl<S> StoreSequenceRepository<S>
where
    S: CounterStore,
{
    pub fn new(store: S, keyspace: Keyspace) -> Self {
        Self { store, keyspace }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Every stored rule, sorted by id.
    fn load_rules(&self) -> Result<Vec<SequenceRuleDefinition>> {
        let mut rules = self
            .store
            .map_entries(self.keyspace.rule_data_key())?
            .into_iter()
            .map(|(key, bytes)| SequenceRuleDefinition::decode(&key, &bytes))
            .collect::<Result<Vec<_>>>()?;
        rules.sort_unstable_by(|a, b| a.id.cmp(&b.id).then_with(|| a.key.cmp(&b.key)));
        Ok(rules)
    }

    /// The full result set of a non-key filter. Shared by listing and
    /// counting so the two can never disagree.
    fn filtered(&self, filter: &RuleFilter) -> Result<Vec<SequenceRuleDefinition>> {
        let mut rules = self.load_rules()?;
        rules.retain(|rule| filter.matches(rule));
        Ok(rules)
    }
}

impl<S> RuleRepository for StoreSequenceRepository<S>
where
    S: CounterStore,
{
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, rule), fields(key = %rule.key), err)
    )]
    fn insert_rule(&self, mut rule: SequenceRuleDefinition) -> Result<u64> {
        rule.validate()?;
        let data_key = self.keyspace.rule_data_key();

        // Cheap early exit so obvious duplicates don't burn an id. The
        // conditional write below is what actually enforces uniqueness.
        if self.store.map_contains(data_key, &rule.key)? {
            return Err(Error::DuplicateKey { key: rule.key });
        }

        let id = self.store.incr_by(self.keyspace.rule_id_key(), 1)?;
        rule.id = id;
        let record = rule.encode()?;

        if !self.store.map_put_if_absent(data_key, &rule.key, record)? {
            #[cfg(feature = "tracing")]
            tracing::debug!(id, "lost insert race, rule id left unused");
            return Err(Error::DuplicateKey { key: rule.key });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(id, step = rule.step, "inserted sequence rule");
        Ok(id)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, rule), fields(key = %rule.key), err)
    )]
    fn update_rule_by_key(&self, rule: &SequenceRuleDefinition) -> Result<()> {
        rule.validate()?;
        let data_key = self.keyspace.rule_data_key();
        let mut fresh_id: Option<u64> = None;

        // Terminates: a record, once written, is never removed, so a lost
        // conditional write always finds it on the next read.
        loop {
            if let Some(existing) = self.store.map_get(data_key, &rule.key)? {
                let existing = SequenceRuleDefinition::decode(&rule.key, &existing)?;
                let record = SequenceRuleDefinition {
                    id: existing.id,
                    ..rule.clone()
                }
                .encode()?;
                self.store.map_put(data_key, &rule.key, record)?;
                return Ok(());
            }

            // A missing rule is created with a freshly drawn id, never the
            // caller's.
            let id = match fresh_id {
                Some(id) => id,
                None => *fresh_id.insert(self.store.incr_by(self.keyspace.rule_id_key(), 1)?),
            };
            let record = SequenceRuleDefinition { id, ..rule.clone() }.encode()?;

            if self.store.map_put_if_absent(data_key, &rule.key, record)? {
                #[cfg(feature = "tracing")]
                tracing::debug!(id, "upserted missing sequence rule");
                return Ok(());
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(id, "lost upsert race, updating the stored rule");
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn get_rule_by_key(&self, key: &str) -> Result<Option<SequenceRuleDefinition>> {
        self.store
            .map_get(self.keyspace.rule_data_key(), key)?
            .map(|bytes| SequenceRuleDefinition::decode(key, &bytes))
            .transpose()
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn list_rules_by_status(&self, status: RuleStatus) -> Result<Vec<SequenceRuleDefinition>> {
        self.filtered(&RuleFilter::by_status(status))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn list_rules_by_page(
        &self,
        filter: &RuleFilter,
        page: PageRequest,
    ) -> Result<Vec<SequenceRuleDefinition>> {
        if let Some(key) = &filter.key {
            return Ok(self.get_rule_by_key(key)?.into_iter().collect());
        }
        let rules = self.filtered(filter)?;
        Ok(page.slice(&rules).to_vec())
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn count_rules(&self, filter: &RuleFilter) -> Result<u64> {
        if let Some(key) = &filter.key {
            return Ok(u64::from(self.get_rule_by_key(key)?.is_some()));
        }
        Ok(self.filtered(filter)?.len() as u64)
    }
}

impl<S> OffsetAllocator for StoreSequenceRepository<S>
where
    S: CounterStore,
{
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn increment_and_get(&self, key: &str, delta: u64) -> Result<u64> {
        require_key(key)?;
        if delta == 0 {
            return Err(Error::invalid(format!(
                "increment for [{key}] must be greater than 0"
            )));
        }
        self.store
            .incr_by(&self.keyspace.offset_key(key), delta)
            .map_err(|err| match err {
                StoreError::Overflow { .. } => Error::OffsetOverflow {
                    key: key.to_owned(),
                },
                other => other.into(),
            })
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), err))]
    fn set_offset(&self, key: &str, value: u64) -> Result<()> {
        require_key(key)?;
        self.store.set_counter(&self.keyspace.offset_key(key), value)?;
        #[cfg(feature = "tracing")]
        tracing::info!(key, value, "offset overwritten");
        Ok(())
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), err))]
    fn get_offset(&self, key: &str) -> Result<u64> {
        require_key(key)?;
        Ok(self
            .store
            .get_counter(&self.keyspace.offset_key(key))?
            .unwrap_or(0))
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid("key must not be empty"));
    }
    Ok(())
}
