use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rpcfan",
    about = "rpcfan — load-balanced reads across blockchain RPC endpoints",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the endpoint pool comes from.
#[derive(Args)]
pub struct PoolArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Endpoint URL; repeat for more. Added to any endpoints in --config.
    #[arg(short, long = "endpoint")]
    pub endpoints: Vec<String>,
    /// Override the sharding threshold
    #[arg(long)]
    pub threshold: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every endpoint once and list the live ones, fastest first
    Probe {
        #[command(flatten)]
        pool: PoolArgs,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Time repeated block fetches on every live endpoint.
    ///
    /// Each endpoint fetches one random block below --height, --reps times.
    Benchmark {
        #[command(flatten)]
        pool: PoolArgs,
        /// Upper bound for the random block number
        #[arg(long)]
        height: u64,
        #[arg(long, default_value = "10")]
        reps: usize,
    },
    /// Fetch an inclusive block range, sharded across live endpoints
    Blocks {
        #[command(flatten)]
        pool: PoolArgs,
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rpcfan=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { pool, format } => commands::probe::probe(&pool, &format).await,
        Commands::Benchmark { pool, height, reps } => {
            commands::benchmark::benchmark(&pool, height, reps).await
        }
        Commands::Blocks {
            pool,
            start,
            end,
            format,
        } => commands::blocks::blocks(&pool, start, end, &format).await,
    }
}
