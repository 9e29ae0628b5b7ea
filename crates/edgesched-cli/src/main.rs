//! edgesched: run service-placement simulations over edge snapshots.
//!
//! # Usage
//!
//! ```text
//! edgesched run --input snapshot.json --algorithm thea --max-steps 50
//! edgesched validate --input snapshot.json
//! edgesched algorithms
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "info,edgesched=debug";

#[derive(Parser)]
#[command(
    name = "edgesched",
    about = "Edge service placement scheduler",
    version,
    propagate_version = true
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a placement simulation over a snapshot.
    Run {
        /// Infrastructure snapshot (JSON).
        #[arg(short, long)]
        input: PathBuf,
        /// Strategy name; overrides the config file.
        #[arg(short, long)]
        algorithm: Option<String>,
        /// Simulation config (TOML).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Step limit; overrides the config file.
        #[arg(long)]
        max_steps: Option<u64>,
        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format: json or text
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Check that a snapshot loads and is consistent.
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List registered placement strategies.
    Algorithms,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run {
            input,
            algorithm,
            config,
            max_steps,
            output,
            format,
        } => commands::run::run(&commands::run::RunArgs {
            input,
            algorithm,
            config,
            max_steps,
            output,
            format,
        }),
        Command::Validate { input } => commands::validate::validate(&input),
        Command::Algorithms => commands::algorithms(),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
