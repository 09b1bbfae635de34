use core::ops::Range;

use ferroseg::{Result, SequenceRepository};

/// Hands out IDs from a locally held segment, reserving the next segment from
/// the repository only when the current one is spent.
///
/// This is the client half of segment allocation: one backend round trip per
/// `step` IDs.
pub struct SegmentCursor<'a, R>
where
    R: SequenceRepository,
{
    repo: &'a R,
    key: String,
    current: Range<u64>,
    reservations: u64,
}

impl<'a, R> SegmentCursor<'a, R>
where
    R: SequenceRepository,
{
    /// Creates an empty cursor; the first call to [`Self::next_id`] reserves.
    pub fn new(repo: &'a R, key: impl Into<String>) -> Self {
        Self {
            repo,
            key: key.into(),
            current: 0..0,
            reservations: 0,
        }
    }

    pub fn next_id(&mut self) -> Result<u64> {
        loop {
            if let Some(id) = self.current.next() {
                return Ok(id);
            }
            self.current = self.repo.next_segment(&self.key)?.as_range();
            self.reservations += 1;
        }
    }

    /// Segments reserved so far.
    pub fn reservations(&self) -> u64 {
        self.reservations
    }

    /// IDs left in the current segment.
    pub fn remaining(&self) -> u64 {
        self.current.end - self.current.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferroseg::{
        Error, Keyspace, MemoryStore, RuleRepository, RuleStatus, SequenceRuleDefinition,
        StoreSequenceRepository,
    };

    fn repo(step: u64) -> StoreSequenceRepository<MemoryStore> {
        let repo = StoreSequenceRepository::new(MemoryStore::new(), Keyspace::default());
        repo.insert_rule(SequenceRuleDefinition::new("k", step))
            .unwrap();
        repo
    }

    #[test]
    fn reserves_once_per_step() {
        let repo = repo(4);
        let mut cursor = SegmentCursor::new(&repo, "k");
        let ids: Vec<u64> = (0..10).map(|_| cursor.next_id().unwrap()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert_eq!(cursor.reservations(), 3);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn two_cursors_interleave_without_collisions() {
        let repo = repo(3);
        let mut a = SegmentCursor::new(&repo, "k");
        let mut b = SegmentCursor::new(&repo, "k");
        assert_eq!(a.next_id().unwrap(), 0);
        assert_eq!(b.next_id().unwrap(), 3);
        assert_eq!(a.next_id().unwrap(), 1);
        assert_eq!(b.next_id().unwrap(), 4);
    }

    #[test]
    fn disabled_rule_stops_the_cursor() {
        let repo = repo(2);
        let mut cursor = SegmentCursor::new(&repo, "k");
        cursor.next_id().unwrap();
        cursor.next_id().unwrap();

        let rule = SequenceRuleDefinition::new("k", 2).with_status(RuleStatus::Disabled);
        repo.update_rule_by_key(&rule).unwrap();
        assert!(matches!(cursor.next_id(), Err(Error::RuleDisabled { .. })));
    }
}
