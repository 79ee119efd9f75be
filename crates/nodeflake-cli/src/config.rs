use anyhow::bail;
use clap::{Parser, Subcommand};
use nodeflake::{GeneratorConfig, NodeId};

/// Upper bound on `next --count`, keeps a typo from minting for minutes.
pub const MAX_COUNT: usize = 1_000_000;

/// Runtime configuration for the `nodeflake` binary.
///
/// Generator settings come from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeflake",
    version,
    about = "Mint, parse and describe Snowflake-style 64-bit IDs"
)]
pub struct CliArgs {
    /// Node ID in 0..=1023, unique per running generator in the cluster.
    ///
    /// When unset, it is derived from the host's network hardware addresses,
    /// or picked at random if none are available.
    ///
    /// Environment variable: `NODEFLAKE_NODE_ID`
    #[arg(long, env = "NODEFLAKE_NODE_ID", global = true, allow_negative_numbers = true)]
    pub node_id: Option<i64>,

    /// Epoch in milliseconds since the Unix epoch.
    ///
    /// Defaults to 1420070400000 (2015-01-01T00:00:00Z). Every node of a
    /// cluster must use the same value.
    ///
    /// Environment variable: `NODEFLAKE_EPOCH`
    #[arg(long, env = "NODEFLAKE_EPOCH", global = true)]
    pub epoch: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate new IDs, one per line.
    Next {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Print a JSON array of decoded IDs instead.
        #[arg(long)]
        json: bool,
    },
    /// Decode IDs into timestamp, node ID and sequence.
    Parse {
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the bit layout and the generator configuration.
    Describe,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub generator: GeneratorConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if let Some(node_id) = args.node_id {
            if let Err(e) = NodeId::try_from(node_id) {
                bail!("--node-id/NODEFLAKE_NODE_ID: {e}");
            }
        }

        if let Command::Next { count, .. } = args.command {
            if count == 0 {
                bail!("--count must be greater than 0");
            }
            if count > MAX_COUNT {
                bail!("--count ({count}) exceeds the maximum of {MAX_COUNT}");
            }
        }

        Ok(Self {
            generator: GeneratorConfig {
                node_id: args.node_id,
                epoch: args.epoch,
            },
            command: args.command,
        })
    }
}
