mod address;
mod cache;
mod error;
mod geometry;
mod policy;
mod report;
mod sim;
mod stats;
mod trace;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use geometry::{ASSOCIATIVITIES, CacheConfiguration, ReplacementKind};
use sim::Simulator;
use trace::TraceReader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Set-associative cache simulator for memory traces")]
struct Cli {
    /// Trace file to simulate
    #[arg(short = 'f', value_name = "TRACE")]
    trace_file: PathBuf,
    /// Cache size in KB (1 KB to 8 MB)
    #[arg(short = 's', value_name = "KB", value_parser = clap::value_parser!(u32).range(1..=8192))]
    cache_size_kb: u32,
    /// Block size in bytes (4 to 64)
    #[arg(short = 'b', value_name = "BYTES", value_parser = clap::value_parser!(u32).range(4..=64))]
    block_size: u32,
    /// Associativity (1, 2, 4, 8 or 16)
    #[arg(short = 'a', value_name = "WAYS", value_parser = parse_associativity)]
    associativity: u32,
    /// Replacement policy
    #[arg(short = 'r', value_name = "POLICY", value_enum)]
    replacement: ReplacementKind,
    /// CSV file the results row is appended to
    #[arg(long, value_name = "PATH", default_value = report::DEFAULT_RESULTS_FILE)]
    results: PathBuf,
    /// Skip appending to the CSV results file
    #[arg(long)]
    no_csv: bool,
    /// Seed for the random replacement policy (defaults to OS entropy)
    #[arg(long)]
    seed: Option<u64>,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_associativity(value: &str) -> Result<u32, String> {
    let ways: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if ASSOCIATIVITIES.contains(&ways) {
        Ok(ways)
    } else {
        Err(format!("{ways} is not one of 1, 2, 4, 8, 16"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = CacheConfiguration::new(
        &cli.trace_file,
        cli.cache_size_kb,
        cli.block_size,
        cli.associativity,
        cli.replacement,
    )?;
    let mut simulator = Simulator::new(config.clone(), cli.seed)?;

    let mut stdout = io::stdout().lock();
    report::write_configuration(&mut stdout, &config, simulator.geometry())?;

    let trace = TraceReader::open(&config.trace_file).with_context(|| {
        format!("Unable to open trace file {}", config.trace_file.display())
    })?;
    simulator
        .run_trace(trace)
        .with_context(|| format!("Failed to simulate {}", config.trace_file.display()))?;
    let result = simulator.finish();

    report::write_results(&mut stdout, &result.summary, &result.geometry)?;
    if !cli.no_csv {
        report::append_csv(&cli.results, &result).with_context(|| {
            format!("Unable to append results to {}", cli.results.display())
        })?;
        log::info!("appended results to {}", cli.results.display());
    }
    Ok(())
}
