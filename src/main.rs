use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use lobsim_rs::config::SimConfig;
use lobsim_rs::persist::{self, OutputFormat};
use lobsim_rs::sim::{run_ensemble, Simulation};
use lobsim_rs::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lobsim", version, about = "Synthetic limit order book simulator")]
struct Cli {
    /// Settings file (toml, yaml or json); defaults to ./lobsim.* when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the order generator; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the finished run
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Independent runs with consecutive seeds; only summaries are reported when > 1
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Default tracing filter, e.g. "info" or "lobsim_rs=debug"
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, default_value_t = 9000)]
    metrics_port: u16,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SimConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(format) = cli.format {
        config.output_format = format;
        if cli.output.is_none() {
            let extension = match format {
                OutputFormat::Csv => "csv",
                OutputFormat::Jsonl => "jsonl",
            };
            config.output_file.set_extension(extension);
        }
    }
    if let Some(output) = cli.output {
        config.output_file = output;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    telemetry::init_tracing(&config.log_level);
    telemetry::init_metrics(cli.metrics_port)?;

    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }
    if cli.runs > 1 {
        let summaries = run_ensemble(&config, cli.runs)?;
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let mut simulation = Simulation::new(&config)?;
    let summary = simulation.run()?;
    let rows = persist::export(simulation.history(), &config.output_file, config.output_format)?;
    info!(path = %config.output_file.display(), rows, format = ?config.output_format, "Exported run");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
