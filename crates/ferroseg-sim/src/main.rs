mod sim;

use clap::Parser;
use ferroseg::{
    MemoryStore, OffsetAllocator, RuleRepository, SequenceRuleDefinition, StoreSequenceRepository,
};
use sim::config::{CliArgs, SimConfig};
use sim::telemetry::init_telemetry;
use sim::worker::run_all;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let repo = StoreSequenceRepository::new(MemoryStore::new(), config.keyspace.clone());

    let rule = SequenceRuleDefinition::new(config.key.clone(), config.step)
        .with_description("ferroseg-sim load rule");
    let id = repo.insert_rule(rule)?;
    tracing::info!("Created rule [{}] with id {id}", config.key);

    if let Some(offset) = config.start_offset {
        // No instance is running yet, so the reset cannot race an allocation.
        repo.set_offset(&config.key, offset)?;
    }
    let base = repo.get_offset(&config.key)?;

    let summary = run_all(&repo, &config.key, config.instances, config.ids_per_instance)?;
    let final_offset = repo.get_offset(&config.key)?;

    tracing::info!(
        "Issued {} IDs ({} unique) from {} segments in {} ms",
        summary.issued,
        summary.unique,
        summary.reservations,
        summary.elapsed_ms
    );
    tracing::info!(
        "Offset for [{}] advanced {base} -> {final_offset}, highest ID {:?}",
        config.key,
        summary.max_id
    );

    if summary.duplicates() > 0 {
        anyhow::bail!("{} duplicate IDs were issued", summary.duplicates());
    }
    if final_offset - base != summary.reservations * config.step {
        anyhow::bail!(
            "offset advanced by {} but {} segments of {} were reserved",
            final_offset - base,
            summary.reservations,
            config.step
        );
    }

    tracing::info!("All IDs unique; segments tiled the offset range exactly");
    Ok(())
}

fn log_startup_info(config: &SimConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting simulation with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting simulation: {} instances x {} IDs ({} total), step {}",
            config.instances,
            config.ids_per_instance,
            config.total_ids(),
            config.step
        );
    }
}
