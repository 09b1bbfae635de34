use anyhow::bail;
use clap::Parser;
use ferroseg::{Keyspace, KeyspaceArgs};

/// Runtime configuration for the `ferroseg-sim` binary.
///
/// Each simulated instance behaves like one allocator process: it reserves a
/// `step`-sized segment, hands out IDs from it until it runs dry, then
/// reserves the next. All instances share one in-memory backend. Values are
/// parsed from CLI arguments or environment variables.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ferroseg-sim",
    version,
    about = "Race many segment allocators against one backend and check the IDs they issue"
)]
pub struct CliArgs {
    /// Number of allocator instances running concurrently.
    ///
    /// Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `NUM_INSTANCES`
    #[arg(long, env = "NUM_INSTANCES")]
    pub instances: Option<usize>,

    /// How many IDs each instance issues before stopping.
    ///
    /// Environment variable: `IDS_PER_INSTANCE`
    #[arg(long, env = "IDS_PER_INSTANCE", default_value_t = 100_000)]
    pub ids_per_instance: u64,

    /// Segment size configured on the rule.
    ///
    /// Environment variable: `SEQUENCE_STEP`
    #[arg(long, env = "SEQUENCE_STEP", default_value_t = 1000)]
    pub step: u64,

    /// Business key of the rule every instance allocates from.
    ///
    /// Environment variable: `SEQUENCE_KEY`
    #[arg(long, env = "SEQUENCE_KEY", default_value_t = String::from("order_id"))]
    pub key: String,

    /// Offset to set before any instance starts, as an administrative reset
    /// would.
    ///
    /// Environment variable: `START_OFFSET`
    #[arg(long, env = "START_OFFSET")]
    pub start_offset: Option<u64>,

    #[command(flatten)]
    pub keyspace: KeyspaceArgs,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub instances: usize,
    pub ids_per_instance: u64,
    pub step: u64,
    pub key: String,
    pub start_offset: Option<u64>,
    pub keyspace: Keyspace,
}

impl SimConfig {
    /// Total IDs issued across all instances.
    pub fn total_ids(&self) -> u64 {
        self.ids_per_instance * self.instances as u64
    }
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let instances = args.instances.unwrap_or_else(num_cpus::get);

        if instances == 0 {
            bail!("NUM_INSTANCES must be greater than 0");
        }

        if args.step == 0 {
            bail!("SEQUENCE_STEP must be greater than 0");
        }

        if args.key.is_empty() {
            bail!("SEQUENCE_KEY must not be empty");
        }

        let total = args
            .ids_per_instance
            .checked_mul(instances as u64)
            .ok_or_else(|| anyhow::anyhow!("Overflow in total ID computation"))?;

        // Every ID must fit below u64::MAX even if each instance leaves one
        // partially used segment behind.
        let slack = args
            .step
            .checked_mul(instances as u64)
            .ok_or_else(|| anyhow::anyhow!("Overflow in segment slack computation"))?;
        if args
            .start_offset
            .unwrap_or(0)
            .checked_add(total)
            .and_then(|n| n.checked_add(slack))
            .is_none()
        {
            bail!("START_OFFSET + total IDs would overflow the offset counter");
        }

        Ok(Self {
            instances,
            ids_per_instance: args.ids_per_instance,
            step: args.step,
            key: args.key,
            start_offset: args.start_offset,
            keyspace: Keyspace::try_from(args.keyspace)?,
        })
    }
}
