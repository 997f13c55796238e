//! pktforge CLI
//!
//! Template-replay traffic generator.
//!
//! # Usage
//!
//! ```bash
//! pktforge run -n 4 --count 10000000
//! pktforge -c imix.yaml run --report-interval-ms 500
//! pktforge -c raw.json templates --format table --hex
//! pktforge -c imix.yaml check
//! ```

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use pktforge_common::init_logging;
use std::path::PathBuf;

mod config;
mod output;
mod runner;

use config::RunConfig;

#[derive(Parser)]
#[command(name = "pktforge")]
#[command(version)]
#[command(about = "Template-replay packet generator", long_about = None)]
struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(long, short, env = "PKTFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Log as JSON lines
    #[arg(long, env = "PKTFORGE_LOG_JSON", value_parser = BoolishValueParser::new())]
    json: bool,

    /// Disable coloured log output
    #[arg(long, env = "NO_COLOR", value_parser = BoolishValueParser::new())]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate templates and replay them
    Run(RunArgs),
    /// Print the generated templates
    Templates {
        #[arg(long, short, default_value = "table")]
        format: output::OutputFormat,
        /// Include the full frame as hex
        #[arg(long)]
        hex: bool,
    },
    /// Validate the configuration and exit
    Check,
}

#[derive(Args)]
struct RunArgs {
    /// Number of execution contexts
    #[arg(short = 'n', long, env = "PKTFORGE_PARALLELISM")]
    parallelism: Option<usize>,

    /// Total frames across all contexts
    #[arg(long, env = "PKTFORGE_COUNT")]
    count: Option<u64>,

    /// Pin each worker to a CPU core
    #[arg(long, env = "PKTFORGE_PIN_CORES", value_parser = BoolishValueParser::new())]
    pin_cores: bool,

    /// Throughput report interval in milliseconds (0 disables)
    #[arg(long, env = "PKTFORGE_REPORT_INTERVAL_MS")]
    report_interval_ms: Option<u64>,

    /// Seed frame length in bytes
    #[arg(long, env = "PKTFORGE_INBOUND_LEN")]
    inbound_len: Option<usize>,
}

impl RunArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(n) = self.parallelism {
            config.parallelism = n;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        config.pin_cores |= self.pin_cores;
        if let Some(ms) = self.report_interval_ms {
            config.report_interval_ms = ms;
        }
        if let Some(len) = self.inbound_len {
            config.inbound_len = len;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RunConfig::default(),
    };
    config
        .logger
        .merge_flags(cli.json, cli.no_color, cli.verbose, cli.quiet);
    init_logging(&config.logger)?;

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            let summary = runner::run(&config)?;
            let t = summary.totals;
            println!(
                "sent {} frames ({} bytes, {} aborted) in {:.2}s: {:.0} xmit/s, {:.2} Mbps",
                t.tx_packets,
                t.tx_bytes,
                t.aborted,
                summary.elapsed_secs,
                t.packet_rate_pps(summary.elapsed_secs),
                t.throughput_mbps(summary.elapsed_secs),
            );
        }
        Commands::Templates { format, hex } => {
            config.generator.validate()?;
            let reports = runner::describe_templates(&config, hex)?;
            format.print_templates(&reports)?;
        }
        Commands::Check => {
            config.validate().context("configuration is invalid")?;
            let templates = runner::build_templates(&config)?;
            tracing::info!(templates = templates.len(), "configuration ok");
            println!("configuration ok: {} template(s)", templates.len());
        }
    }
    Ok(())
}
