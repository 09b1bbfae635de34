use std::{thread::scope, time::Instant};

use ferroseg::{Result, SequenceRepository};

use crate::sim::cursor::SegmentCursor;

/// What one simulated instance did.
#[derive(Debug)]
pub struct InstanceReport {
    pub instance: usize,
    pub ids: Vec<u64>,
    pub reservations: u64,
}

/// Outcome of a full run across all instances.
#[derive(Debug)]
pub struct RunSummary {
    pub issued: u64,
    pub unique: u64,
    pub reservations: u64,
    pub max_id: Option<u64>,
    pub elapsed_ms: u128,
}

impl RunSummary {
    pub fn duplicates(&self) -> u64 {
        self.issued - self.unique
    }
}

/// Issues `count` IDs for `key` through a fresh [`SegmentCursor`].
pub fn run_instance<R>(instance: usize, repo: &R, key: &str, count: u64) -> Result<InstanceReport>
where
    R: SequenceRepository,
{
    tracing::debug!("Instance {instance} started");

    let mut cursor = SegmentCursor::new(repo, key);
    let mut ids = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    for _ in 0..count {
        ids.push(cursor.next_id()?);
    }

    tracing::debug!(
        "Instance {instance} issued {} IDs over {} segments, {} left unused",
        ids.len(),
        cursor.reservations(),
        cursor.remaining()
    );
    Ok(InstanceReport {
        instance,
        ids,
        reservations: cursor.reservations(),
    })
}

/// Runs `instances` concurrent instances against `repo` and checks that no ID
/// was issued twice.
pub fn run_all<R>(repo: &R, key: &str, instances: usize, per_instance: u64) -> Result<RunSummary>
where
    R: SequenceRepository + Sync,
{
    let start = Instant::now();

    let reports = scope(|s| {
        let handles: Vec<_> = (0..instances)
            .map(|instance| s.spawn(move || run_instance(instance, repo, key, per_instance)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(report) => report,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let elapsed_ms = start.elapsed().as_millis();
    let mut reservations = 0;
    for report in &reports {
        tracing::trace!(
            "Instance {} reserved {} segments",
            report.instance,
            report.reservations
        );
        reservations += report.reservations;
    }
    let mut all: Vec<u64> = reports.into_iter().flat_map(|r| r.ids).collect();
    let issued = all.len() as u64;
    all.sort_unstable();
    all.dedup();

    Ok(RunSummary {
        issued,
        unique: all.len() as u64,
        reservations,
        max_id: all.last().copied(),
        elapsed_ms,
    })
}
