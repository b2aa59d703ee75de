use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use microloan_sim::{CalendarConfig, HolidayCalendar, SimulationInput, Simulator};

/// Repayment schedule and TCEA of a micro-loan
#[derive(Parser)]
#[command(name = "microloan-sim", version)]
struct Cli {
    /// Simulation input as JSON, or `-` to read it from stdin
    #[arg(long, short)]
    input: String,

    /// Holiday calendar as JSON (defaults to the Peruvian calendar)
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let raw_input = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read input from stdin")?;
        buffer
    } else {
        read_file(Path::new(&cli.input))?
    };
    let input: SimulationInput =
        serde_json::from_str(&raw_input).context("failed to parse simulation input")?;

    let config = match &cli.calendar {
        Some(path) => CalendarConfig::from_json(&read_file(path)?)
            .with_context(|| format!("invalid calendar '{}'", path.display()))?,
        None => CalendarConfig::default(),
    };

    let result = Simulator::new(HolidayCalendar::new(config)).simulate(&input)?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}
